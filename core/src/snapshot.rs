use serde::{Deserialize, Serialize};

use crate::*;

/// Saved state of one dot: which state it is in and for how long it has been there.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub state: CellState,
    pub elapsed_ms: u64,
}

/// Plain, thread-independent copy of a game, cells in row-major order.
///
/// Time is stored relative to the moment the snapshot was taken, so a restored game continues
/// every animation and timeout where it left off no matter how long it sat on disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub config: GameConfig,
    pub viewport: (u32, u32),
    pub cells: Vec<CellSnapshot>,
    pub score: u32,
    pub missed: u32,
    pub game_over: bool,
}

impl GameSnapshot {
    pub fn validate(&self) -> Result<()> {
        if self.cells.len() != usize::from(self.config.total_cells()) {
            return Err(GameError::SnapshotMismatch);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_checks_cell_count() {
        let snapshot = GameSnapshot {
            config: GameConfig::default(),
            viewport: (0, 0),
            cells: vec![
                CellSnapshot {
                    state: CellState::Invisible,
                    elapsed_ms: 0,
                };
                35
            ],
            score: 0,
            missed: 0,
            game_over: false,
        };

        assert_eq!(snapshot.validate(), Err(GameError::SnapshotMismatch));
    }
}
