use serde::{Deserialize, Serialize};
use std::sync::mpsc::Sender;

/// Audio/haptic cue, fired and forgotten.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedbackKind {
    CellSelected,
    ChainReleased,
    CellMissed,
    GameOver,
}

/// Notification produced by the simulation for the outside world.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    ScoreChanged(u32),
    MissedRemainingChanged(u32),
    GameOver { final_score: u32 },
    Feedback(FeedbackKind),
}

impl GameEvent {
    pub fn dispatch(self, listener: &dyn GameListener) {
        use GameEvent::*;
        match self {
            ScoreChanged(score) => listener.on_score_changed(score),
            MissedRemainingChanged(remaining) => listener.on_missed_remaining_changed(remaining),
            GameOver { final_score } => listener.on_game_over(final_score),
            Feedback(kind) => listener.on_feedback(kind),
        }
    }
}

/// Receiver of game notifications, called from both the loop worker and the input thread.
///
/// Every method defaults to doing nothing.
pub trait GameListener: Send + Sync {
    fn on_score_changed(&self, _score: u32) {}

    fn on_missed_remaining_changed(&self, _remaining: u32) {}

    fn on_game_over(&self, _final_score: u32) {}

    fn on_feedback(&self, _kind: FeedbackKind) {}
}

impl GameListener for () {}

/// Forwards every notification into a channel; a closed channel is ignored.
impl GameListener for Sender<GameEvent> {
    fn on_score_changed(&self, score: u32) {
        let _ = self.send(GameEvent::ScoreChanged(score));
    }

    fn on_missed_remaining_changed(&self, remaining: u32) {
        let _ = self.send(GameEvent::MissedRemainingChanged(remaining));
    }

    fn on_game_over(&self, final_score: u32) {
        let _ = self.send(GameEvent::GameOver { final_score });
    }

    fn on_feedback(&self, kind: FeedbackKind) {
        let _ = self.send(GameEvent::Feedback(kind));
    }
}
