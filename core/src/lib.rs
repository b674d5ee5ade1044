use serde::{Deserialize, Serialize};
use web_time::Duration;

pub use cell::*;
pub use chain::*;
pub use error::*;
pub use events::*;
pub use game::*;
pub use game_loop::*;
pub use grid::*;
pub use highscores::*;
pub use layout::*;
pub use render::*;
pub use scorer::*;
pub use snapshot::*;
pub use spawner::*;
pub use types::*;

mod cell;
mod chain;
mod error;
mod events;
mod game;
mod game_loop;
mod grid;
mod highscores;
mod layout;
mod render;
mod scorer;
mod snapshot;
mod spawner;
mod types;

/// Tuning of the spawn probability model.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnConfig {
    /// Upper bound shared by the age and cluster probabilities.
    pub probability_cap: f64,
    /// Time invisible after which the age probability stops growing.
    pub age_threshold_ms: u64,
    /// Cluster size at which the cluster probability reaches zero.
    pub cluster_max: u32,
    /// Share of the age probability in the blend, the rest goes to the cluster probability.
    pub age_weight: f64,
}

impl SpawnConfig {
    pub const fn age_threshold(&self) -> Duration {
        Duration::from_millis(self.age_threshold_ms)
    }
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            probability_cap: 0.10,
            age_threshold_ms: 10_000,
            cluster_max: 9,
            age_weight: 0.5,
        }
    }
}

/// How forgiving touches are, relative to the dot radius.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GestureConfig {
    pub down_grab_factor: f32,
    pub move_grab_factor: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            down_grab_factor: 1.4,
            move_grab_factor: 1.0,
        }
    }
}

/// Proportions of the board, relative to the region owned by one cell.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub dot_radius_ratio: f32,
    pub max_line_factor: f32,
    pub selected_radius_scale: f32,
    pub placeholder_radius_scale: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            dot_radius_ratio: 1. / 3.,
            max_line_factor: 1.5,
            selected_radius_scale: 1.15,
            placeholder_radius_scale: 0.75,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub grid_len: Coord,
    pub animation_ms: u64,
    pub visible_ms: u64,
    pub miss_threshold: u32,
    pub tick_rate: u32,
    pub max_frame_skips: u32,
    pub spawn: SpawnConfig,
    pub gesture: GestureConfig,
    pub layout: LayoutConfig,
    /// Fixed spawner seed, random when absent.
    pub seed: Option<u64>,
}

impl GameConfig {
    pub fn validate(self) -> Result<Self> {
        use GameError::InvalidConfig;

        if self.grid_len == 0 {
            return Err(InvalidConfig("grid must have at least one cell"));
        }
        if self.animation_ms == 0 {
            return Err(InvalidConfig("animation duration must be positive"));
        }
        if self.miss_threshold == 0 {
            return Err(InvalidConfig("miss threshold must be positive"));
        }
        if self.tick_rate == 0 {
            return Err(InvalidConfig("tick rate must be positive"));
        }
        if !(0. ..=1.).contains(&self.spawn.probability_cap) {
            return Err(InvalidConfig("probability cap must be within 0..=1"));
        }
        if !(0. ..=1.).contains(&self.spawn.age_weight) {
            return Err(InvalidConfig("age weight must be within 0..=1"));
        }
        if self.spawn.cluster_max < 2 {
            return Err(InvalidConfig("cluster bound must be at least 2"));
        }
        Ok(self)
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.grid_len, self.grid_len)
    }

    pub const fn animation(&self) -> Duration {
        Duration::from_millis(self.animation_ms)
    }

    pub const fn visible(&self) -> Duration {
        Duration::from_millis(self.visible_ms)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate.max(1)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_len: 6,
            animation_ms: 100,
            visible_ms: 2000,
            miss_threshold: 15,
            tick_rate: 30,
            max_frame_skips: 5,
            spawn: Default::default(),
            gesture: Default::default(),
            layout: Default::default(),
            seed: None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    /// Gesture aborted or pointer left the bounds.
    Cancel,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub x: f32,
    pub y: f32,
}

impl PointerEvent {
    pub const fn new(kind: PointerKind, x: f32, y: f32) -> Self {
        Self { kind, x, y }
    }

    pub const fn down(x: f32, y: f32) -> Self {
        Self::new(PointerKind::Down, x, y)
    }

    pub const fn moved(x: f32, y: f32) -> Self {
        Self::new(PointerKind::Move, x, y)
    }

    pub const fn up(x: f32, y: f32) -> Self {
        Self::new(PointerKind::Up, x, y)
    }

    pub const fn cancel(x: f32, y: f32) -> Self {
        Self::new(PointerKind::Cancel, x, y)
    }

    pub const fn point(&self) -> Point {
        (self.x, self.y)
    }
}
