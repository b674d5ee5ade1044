use crate::*;

/// Ordered path of selected cells built by a single touch interaction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GestureChain {
    cells: Vec<Coord2>,
    trailing: Point,
    interacting: bool,
}

impl GestureChain {
    pub fn new() -> Self {
        Default::default()
    }

    /// Whether a pointer is currently down.
    pub fn is_interacting(&self) -> bool {
        self.interacting
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn cells(&self) -> &[Coord2] {
        &self.cells
    }

    pub fn last(&self) -> Option<Coord2> {
        self.cells.last().copied()
    }

    pub fn contains(&self, coords: Coord2) -> bool {
        self.cells.contains(&coords)
    }

    /// Loose end of the line, from the last chained cell towards the pointer.
    pub fn trailing_point(&self) -> Point {
        self.trailing
    }

    pub(crate) fn begin(&mut self, point: Point) {
        assert!(
            self.cells.is_empty(),
            "gesture started with {} stale cells",
            self.cells.len()
        );
        self.interacting = true;
        self.trailing = point;
    }

    /// # Panics
    ///
    /// Panics if `coords` is already chained or is not adjacent to the current last cell.
    pub(crate) fn push(&mut self, coords: Coord2) {
        assert!(!self.contains(coords), "cell {coords:?} chained twice");
        if let Some(last) = self.last() {
            assert!(
                is_adjacent(last, coords),
                "cell {coords:?} is not adjacent to {last:?}"
            );
        }
        self.cells.push(coords);
    }

    pub(crate) fn set_trailing(&mut self, point: Point) {
        self.trailing = point;
    }

    /// Ends the interaction and hands back the chained cells in order.
    pub(crate) fn finish(&mut self) -> Vec<Coord2> {
        self.interacting = false;
        core::mem::take(&mut self.cells)
    }
}

/// Limits the loose end of the chain line to `max_len` from `start` on both axes.
///
/// When either axis overshoots, both offsets are divided by the larger overshoot factor, so the
/// dominant axis ends up exactly `max_len` away and the other keeps its proportion. Each axis keeps
/// the sign of the raw offset.
pub fn clamp_trailing_point(start: Point, end: Point, max_len: f32) -> Point {
    let (start_x, start_y) = start;
    let (end_x, end_y) = end;

    let diff_x = (start_x - end_x).abs();
    let diff_y = (start_y - end_y).abs();

    if diff_x <= max_len && diff_y <= max_len {
        return end;
    }

    let factor = diff_x.max(diff_y) / max_len;
    let step_x = diff_x / factor;
    let step_y = diff_y / factor;

    let x = if end_x < start_x {
        start_x - step_x
    } else {
        start_x + step_x
    };
    let y = if end_y < start_y {
        start_y - step_y
    } else {
        start_y + step_y
    };
    (x, y)
}

/// First visible cell, in row-major order, whose square grab area of half-width
/// `radius * grab_factor` contains `point`.
pub fn hit_test(grid: &Grid, point: Point, radius: f32, grab_factor: f32) -> Option<Coord2> {
    let reach = radius * grab_factor;
    grid.iter()
        .filter(|cell| cell.state().is_visible())
        .find(|cell| {
            let (center_x, center_y) = cell.center();
            (point.0 - center_x).abs() <= reach && (point.1 - center_y).abs() <= reach
        })
        .map(Cell::coords)
}
