use serde::{Deserialize, Serialize};
use web_time::{Duration, Instant};

use crate::*;

/// Visibility state of a single dot.
///
/// Valid transitions:
/// - Invisible -> Appearing
/// - Appearing -> Visible
/// - Visible -> Selected
/// - Visible -> Disappearing
/// - Selected -> Disappearing
/// - Disappearing -> Invisible
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    Invisible,
    Appearing,
    Visible,
    Selected,
    Disappearing,
}

impl CellState {
    /// Whether the cell counts as part of a cluster, i.e. anything but invisible.
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Invisible)
    }

    pub const fn is_visible(self) -> bool {
        matches!(self, Self::Visible)
    }

    pub const fn can_transition_to(self, next: Self) -> bool {
        use CellState::*;
        matches!(
            (self, next),
            (Invisible, Appearing)
                | (Appearing, Visible)
                | (Visible, Selected)
                | (Visible, Disappearing)
                | (Selected, Disappearing)
                | (Disappearing, Invisible)
        )
    }
}

impl Default for CellState {
    fn default() -> Self {
        Self::Invisible
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    id: CellCount,
    coords: Coord2,
    center: Point,
    state: CellState,
    entered_at: Instant,
}

impl Cell {
    pub(crate) fn new(id: CellCount, coords: Coord2, now: Instant) -> Self {
        Self {
            id,
            coords,
            center: (0., 0.),
            state: CellState::Invisible,
            entered_at: now,
        }
    }

    /// Row-major, 1-based identifier.
    pub fn id(&self) -> CellCount {
        self.id
    }

    pub fn coords(&self) -> Coord2 {
        self.coords
    }

    pub fn row(&self) -> Coord {
        self.coords.0
    }

    pub fn col(&self) -> Coord {
        self.coords.1
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn state(&self) -> CellState {
        self.state
    }

    pub fn entered_at(&self) -> Instant {
        self.entered_at
    }

    /// Time spent in the current state, zero if `now` predates the last transition.
    pub fn state_duration(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.entered_at)
    }

    /// Moves the cell along one edge of the state machine and restarts its state timer.
    ///
    /// # Panics
    ///
    /// Panics on any transition not listed on [`CellState`]; reaching one means the
    /// simulation itself is broken.
    pub(crate) fn transition(&mut self, next: CellState, now: Instant) {
        assert!(
            self.state.can_transition_to(next),
            "illegal transition {:?} -> {:?} for cell {}",
            self.state,
            next,
            self.id
        );
        log::trace!("cell {} {:?} -> {:?}", self.id, self.state, next);
        self.state = next;
        self.entered_at = now;
    }

    /// Drops the cell straight to invisible, outside of the state machine. Only used when the game ends.
    pub(crate) fn force_invisible(&mut self, now: Instant) {
        self.state = CellState::Invisible;
        self.entered_at = now;
    }

    /// Pushes the state timer forward without counting as a transition.
    pub(crate) fn shift_entered_at(&mut self, by: Duration) {
        self.entered_at += by;
    }

    /// Re-anchors a restored cell so that it has already spent `elapsed` in `state` at `now`.
    pub(crate) fn restore(&mut self, state: CellState, elapsed: Duration, now: Instant) {
        self.state = state;
        self.entered_at = now.checked_sub(elapsed).unwrap_or(now);
    }

    pub(crate) fn set_center(&mut self, center: Point) {
        self.center = center;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_resets_timer() {
        let t0 = Instant::now();
        let mut cell = Cell::new(1, (0, 0), t0);
        let later = t0 + Duration::from_millis(500);

        cell.transition(CellState::Appearing, later);

        assert_eq!(cell.state(), CellState::Appearing);
        assert_eq!(cell.state_duration(later), Duration::ZERO);
        assert_eq!(
            cell.state_duration(later + Duration::from_millis(30)),
            Duration::from_millis(30)
        );
    }

    #[test]
    #[should_panic(expected = "illegal transition")]
    fn skipping_an_edge_panics() {
        let t0 = Instant::now();
        let mut cell = Cell::new(1, (0, 0), t0);
        cell.transition(CellState::Visible, t0);
    }

    #[test]
    #[should_panic(expected = "illegal transition")]
    fn selected_cannot_return_to_visible() {
        let t0 = Instant::now();
        let mut cell = Cell::new(1, (0, 0), t0);
        cell.transition(CellState::Appearing, t0);
        cell.transition(CellState::Visible, t0);
        cell.transition(CellState::Selected, t0);
        cell.transition(CellState::Visible, t0);
    }

    #[test]
    fn shifting_is_not_a_transition() {
        let t0 = Instant::now();
        let mut cell = Cell::new(1, (0, 0), t0);
        cell.transition(CellState::Appearing, t0);

        cell.shift_entered_at(Duration::from_secs(2));

        assert_eq!(cell.state(), CellState::Appearing);
        assert_eq!(cell.state_duration(t0 + Duration::from_secs(2)), Duration::ZERO);
    }

    #[test]
    fn only_table_edges_are_legal() {
        use CellState::*;
        let all = [Invisible, Appearing, Visible, Selected, Disappearing];
        let legal = all
            .iter()
            .flat_map(|&from| all.iter().map(move |&to| (from, to)))
            .filter(|&(from, to)| from.can_transition_to(to))
            .count();
        assert_eq!(legal, 6);
        assert!(!Selected.can_transition_to(Selected));
        assert!(!Invisible.can_transition_to(Visible));
    }
}
