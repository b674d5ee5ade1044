use serde::{Deserialize, Serialize};

/// Outcome of a dot timing out.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MissOutcome {
    /// Counted, with this many misses left before the game ends.
    Counted { remaining: u32 },
    /// Counted, and it was the one that ended the game.
    GameOver,
    /// The game had already ended, nothing changed.
    Ignored,
}

impl MissOutcome {
    pub const fn has_update(self) -> bool {
        match self {
            Self::Counted { .. } => true,
            Self::GameOver => true,
            Self::Ignored => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scorer {
    score: u32,
    missed: u32,
    miss_threshold: u32,
    game_over: bool,
}

impl Scorer {
    pub fn new(miss_threshold: u32) -> Self {
        Self {
            score: 0,
            missed: 0,
            miss_threshold,
            game_over: false,
        }
    }

    pub(crate) fn restored(score: u32, missed: u32, miss_threshold: u32, game_over: bool) -> Self {
        Self {
            score,
            missed,
            miss_threshold,
            game_over: game_over || missed >= miss_threshold,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn missed(&self) -> u32 {
        self.missed
    }

    pub fn missed_remaining(&self) -> u32 {
        self.miss_threshold.saturating_sub(self.missed)
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Scores a released chain, `len²` points; returns the points awarded.
    pub fn record_chain(&mut self, len: usize) -> u32 {
        let len = u32::try_from(len).unwrap_or(u32::MAX);
        let points = len.saturating_mul(len);
        self.score = self.score.saturating_add(points);
        points
    }

    pub fn record_miss(&mut self) -> MissOutcome {
        if self.game_over {
            return MissOutcome::Ignored;
        }

        self.missed += 1;
        if self.missed >= self.miss_threshold {
            self.game_over = true;
            MissOutcome::GameOver
        } else {
            MissOutcome::Counted {
                remaining: self.missed_remaining(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_scores_square_of_length() {
        let mut scorer = Scorer::new(15);

        assert_eq!(scorer.record_chain(0), 0);
        assert_eq!(scorer.record_chain(1), 1);
        assert_eq!(scorer.record_chain(3), 9);
        assert_eq!(scorer.record_chain(5), 25);
        assert_eq!(scorer.score(), 35);
        assert_eq!(scorer.missed(), 0);
    }

    #[test]
    fn game_over_triggers_exactly_once() {
        let mut scorer = Scorer::new(15);

        for expected_remaining in (1..15).rev() {
            assert_eq!(
                scorer.record_miss(),
                MissOutcome::Counted {
                    remaining: expected_remaining
                }
            );
        }
        assert!(!scorer.is_game_over());

        assert_eq!(scorer.record_miss(), MissOutcome::GameOver);
        assert!(scorer.is_game_over());
        assert_eq!(scorer.missed_remaining(), 0);

        assert_eq!(scorer.record_miss(), MissOutcome::Ignored);
        assert_eq!(scorer.record_miss(), MissOutcome::Ignored);
        assert_eq!(scorer.missed(), 15);
    }

    #[test]
    fn restoring_past_the_threshold_is_over() {
        let scorer = Scorer::restored(40, 15, 15, false);
        assert!(scorer.is_game_over());
        assert_eq!(scorer.score(), 40);
    }
}
