use serde::{Deserialize, Serialize};

use crate::*;

pub const DEFAULT_RANKS: usize = 5;

/// Best scores in descending order, a fixed number of ranks deep.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScores {
    scores: Vec<u32>,
}

impl HighScores {
    pub fn new(ranks: usize) -> Self {
        Self {
            scores: vec![0; ranks],
        }
    }

    pub fn ranks(&self) -> usize {
        self.scores.len()
    }

    pub fn get(&self, rank: usize) -> Result<u32> {
        self.scores.get(rank).copied().ok_or(GameError::InvalidRank)
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.scores.iter().copied()
    }

    /// Places `score` at the first rank it strictly beats, shifting lower ranks down.
    ///
    /// Returns the 0-based rank, or `None` if it did not make the table.
    pub fn record(&mut self, score: u32) -> Option<usize> {
        let rank = self.scores.iter().position(|&existing| score > existing)?;
        self.scores.insert(rank, score);
        self.scores.pop();
        log::debug!("new high score {} at rank {}", score, rank);
        Some(rank)
    }

    pub fn reset(&mut self) {
        self.scores.iter_mut().for_each(|score| *score = 0);
    }
}

impl Default for HighScores {
    fn default() -> Self {
        Self::new(DEFAULT_RANKS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_shifts_lower_ranks_down() {
        let mut scores = HighScores::default();

        assert_eq!(scores.record(50), Some(0));
        assert_eq!(scores.record(80), Some(0));
        assert_eq!(scores.record(60), Some(1));
        assert_eq!(scores.iter().collect::<Vec<_>>(), vec![80, 60, 50, 0, 0]);
    }

    #[test]
    fn ties_and_low_scores_do_not_enter_a_full_table() {
        let mut scores = HighScores::new(2);
        scores.record(10);
        scores.record(20);

        assert_eq!(scores.record(10), None);
        assert_eq!(scores.record(5), None);
        assert_eq!(scores.record(15), Some(1));
        assert_eq!(scores.iter().collect::<Vec<_>>(), vec![20, 15]);
    }

    #[test]
    fn zero_never_ranks() {
        let mut scores = HighScores::default();
        assert_eq!(scores.record(0), None);
    }

    #[test]
    fn get_and_reset() {
        let mut scores = HighScores::default();
        scores.record(9);

        assert_eq!(scores.get(0), Ok(9));
        assert_eq!(scores.get(5), Err(GameError::InvalidRank));

        scores.reset();
        assert_eq!(scores.get(0), Ok(0));
        assert_eq!(scores.ranks(), DEFAULT_RANKS);
    }

    #[test]
    fn serializes_as_plain_list() {
        let mut scores = HighScores::new(3);
        scores.record(4);
        let json = serde_json::to_string(&scores).unwrap();
        assert_eq!(json, r#"{"scores":[4,0,0]}"#);
        assert_eq!(serde_json::from_str::<HighScores>(&json).unwrap(), scores);
    }
}
