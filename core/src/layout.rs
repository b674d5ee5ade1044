use serde::{Deserialize, Serialize};

use crate::*;

/// Screen geometry derived from the viewport size.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    width: u32,
    height: u32,
    region: f32,
    dot_radius: f32,
    max_line_length: f32,
}

impl Layout {
    /// Fits a square `grid_len` × `grid_len` board into the smaller side of the viewport.
    pub fn new(width: u32, height: u32, grid_len: Coord, config: &LayoutConfig) -> Self {
        let side = width.min(height) as f32;
        let region = side / f32::from(grid_len.max(1));
        Self {
            width,
            height,
            region,
            dot_radius: region * config.dot_radius_ratio,
            max_line_length: region * config.max_line_factor,
        }
    }

    pub fn viewport(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Side length of the square region owned by one cell.
    pub fn region(&self) -> f32 {
        self.region
    }

    pub fn dot_radius(&self) -> f32 {
        self.dot_radius
    }

    pub fn max_line_length(&self) -> f32 {
        self.max_line_length
    }

    /// Cell centers lie in the middle of their region, `x` along rows and `y` along columns.
    pub fn center_of(&self, (row, col): Coord2) -> Point {
        let half = self.region / 2.;
        (
            f32::from(row) * self.region + half,
            f32::from(col) * self.region + half,
        )
    }
}
