use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::*;

/// Draw parameters for one dot.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellSprite {
    pub id: CellCount,
    pub coords: Coord2,
    pub center: Point,
    pub radius: f32,
    pub alpha: f32,
    pub state: CellState,
}

/// Line through the chained dots plus its loose end.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainPath {
    pub points: Vec<Point>,
    pub trailing: Point,
}

/// Everything a renderer needs for one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    pub cells: Vec<CellSprite>,
    pub chain: Option<ChainPath>,
    pub score: u32,
    pub missed_remaining: u32,
    pub game_over: bool,
}

/// Drawing target the game loop paints into once per tick.
///
/// A frame is always bracketed by [`begin_frame`](Self::begin_frame) and
/// [`end_frame`](Self::end_frame); `end_frame` is called whenever `begin_frame` succeeded, even if
/// drawing failed.
pub trait RenderSurface: Send {
    /// Whether there is currently anything to draw into.
    fn is_available(&self) -> bool {
        true
    }

    fn begin_frame(&mut self) -> core::result::Result<(), RenderError> {
        Ok(())
    }

    fn draw(&mut self, frame: &RenderFrame) -> core::result::Result<(), RenderError>;

    fn end_frame(&mut self) {}
}

/// Releases the frame on every way out of [`present`].
struct FrameGuard<'a> {
    surface: &'a mut dyn RenderSurface,
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        self.surface.end_frame();
    }
}

/// Paints `frame` into `surface`.
pub fn present(
    surface: &mut dyn RenderSurface,
    frame: &RenderFrame,
) -> core::result::Result<(), RenderError> {
    surface.begin_frame()?;
    let guard = FrameGuard { surface };
    guard.surface.draw(frame)
}

/// Radius and alpha of a dot given how long it has been in its state.
pub(crate) fn sprite_for(cell: &Cell, layout: &Layout, config: &GameConfig, now: Instant) -> CellSprite {
    use CellState::*;

    let radius = layout.dot_radius();
    let progress = || {
        let animation = config.animation().as_secs_f32();
        (cell.state_duration(now).as_secs_f32() / animation).clamp(0., 1.)
    };
    let (radius, alpha) = match cell.state() {
        Invisible => (radius * config.layout.placeholder_radius_scale, 1.),
        Appearing => {
            let factor = progress();
            (radius * factor, factor)
        }
        Visible => (radius, 1.),
        Selected => (radius * config.layout.selected_radius_scale, 1.),
        Disappearing => {
            let factor = 1. - progress();
            (radius * factor, factor)
        }
    };

    CellSprite {
        id: cell.id(),
        coords: cell.coords(),
        center: cell.center(),
        radius,
        alpha,
        state: cell.state(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::tests::drive_to;
    use web_time::Duration;

    #[derive(Default)]
    struct FlakySurface {
        fail_begin: bool,
        fail_draw: bool,
        begun: u32,
        ended: u32,
        drawn: u32,
    }

    impl RenderSurface for FlakySurface {
        fn begin_frame(&mut self) -> core::result::Result<(), RenderError> {
            if self.fail_begin {
                return Err(RenderError::Unavailable);
            }
            self.begun += 1;
            Ok(())
        }

        fn draw(&mut self, _frame: &RenderFrame) -> core::result::Result<(), RenderError> {
            if self.fail_draw {
                return Err(RenderError::Failed("lost context".into()));
            }
            self.drawn += 1;
            Ok(())
        }

        fn end_frame(&mut self) {
            self.ended += 1;
        }
    }

    fn empty_frame() -> RenderFrame {
        RenderFrame {
            cells: Vec::new(),
            chain: None,
            score: 0,
            missed_remaining: 15,
            game_over: false,
        }
    }

    #[test]
    fn failed_draw_still_releases_the_frame() {
        let mut surface = FlakySurface {
            fail_draw: true,
            ..Default::default()
        };

        let result = present(&mut surface, &empty_frame());

        assert_eq!(result, Err(RenderError::Failed("lost context".into())));
        assert_eq!((surface.begun, surface.drawn, surface.ended), (1, 0, 1));
    }

    #[test]
    fn failed_begin_never_ends() {
        let mut surface = FlakySurface {
            fail_begin: true,
            ..Default::default()
        };

        assert_eq!(present(&mut surface, &empty_frame()), Err(RenderError::Unavailable));
        assert_eq!(surface.ended, 0);
    }

    #[test]
    fn animations_scale_linearly() {
        let config = GameConfig::default();
        let layout = Layout::new(300, 300, 6, &config.layout);
        let now = Instant::now();
        let mut grid = Grid::new(6, now);
        drive_to(&mut grid, (0, 0), CellState::Appearing, now);
        drive_to(&mut grid, (0, 1), CellState::Disappearing, now);

        let halfway = now + Duration::from_millis(50);
        let appearing = sprite_for(&grid[(0, 0)], &layout, &config, halfway);
        let disappearing = sprite_for(&grid[(0, 1)], &layout, &config, halfway);
        assert!((appearing.alpha - 0.5).abs() < 1e-4);
        assert!((appearing.radius - layout.dot_radius() / 2.).abs() < 1e-4);
        assert!((disappearing.alpha - 0.5).abs() < 1e-4);

        // overshooting the animation clamps instead of going negative
        let late = now + Duration::from_millis(250);
        assert_eq!(sprite_for(&grid[(0, 0)], &layout, &config, late).alpha, 1.);
        assert_eq!(sprite_for(&grid[(0, 1)], &layout, &config, late).alpha, 0.);
    }

    #[test]
    fn selected_dots_are_enlarged() {
        let config = GameConfig::default();
        let layout = Layout::new(300, 300, 6, &config.layout);
        let now = Instant::now();
        let mut grid = Grid::new(6, now);
        drive_to(&mut grid, (2, 2), CellState::Selected, now);

        let sprite = sprite_for(&grid[(2, 2)], &layout, &config, now);
        assert!((sprite.radius - layout.dot_radius() * 1.15).abs() < 1e-4);
        assert_eq!(sprite.state, CellState::Selected);
    }
}
