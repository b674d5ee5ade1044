use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("High score rank out of range")]
    InvalidRank,
    #[error("Snapshot does not match its declared grid size")]
    SnapshotMismatch,
    #[error("Game loop is already running")]
    AlreadyRunning,
    #[error("Could not spawn the game loop worker: {0}")]
    WorkerSpawn(std::io::ErrorKind),
}

pub type Result<T> = core::result::Result<T, GameError>;

/// Failure reported by a [`RenderSurface`](crate::RenderSurface) while producing a frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Render target is not available")]
    Unavailable,
    #[error("Render target failed: {0}")]
    Failed(String),
}
