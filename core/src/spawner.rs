use rand::prelude::*;
use rand::rngs::StdRng;
use web_time::{Duration, Instant};

use crate::*;

/// Spawn chance from time spent invisible: linear from zero, capped once the threshold is reached.
pub fn age_probability(config: &SpawnConfig, invisible_for: Duration) -> f64 {
    let threshold = config.age_threshold().as_secs_f64();
    if threshold <= 0. {
        return config.probability_cap;
    }
    let slope = config.probability_cap / threshold;
    (slope * invisible_for.as_secs_f64()).min(config.probability_cap)
}

/// Spawn chance from the size of the neighboring cluster.
///
/// Downward parabola that starts at the cap for a single-cell cluster and reaches zero at
/// `cluster_max`. Sizes outside `1..=cluster_max` give zero.
pub fn cluster_probability(config: &SpawnConfig, cluster_size: usize) -> f64 {
    let max = config.cluster_max as usize;
    if cluster_size == 0 || cluster_size > max {
        return 0.;
    }
    let spread = (max - 1) as f64;
    let t = (cluster_size - 1) as f64 / spread;
    (config.probability_cap * (1. - t * t)).max(0.)
}

/// Weighted blend of both probabilities; stays within `0..=probability_cap`.
pub fn combined_probability(config: &SpawnConfig, age: f64, cluster: f64) -> f64 {
    config.age_weight * age + (1. - config.age_weight) * cluster
}

/// Randomly promotes invisible cells to appearing.
#[derive(Debug)]
pub struct Spawner {
    rng: StdRng,
    last_second: Option<u64>,
}

impl Spawner {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            last_second: None,
        }
    }

    /// Claims the given whole second of game time, `false` if a pass already ran in it.
    pub fn claim_second(&mut self, second: u64) -> bool {
        if self.last_second == Some(second) {
            false
        } else {
            self.last_second = Some(second);
            true
        }
    }

    /// Rolls once for every invisible cell and returns how many started appearing.
    pub fn spawn_pass(&mut self, grid: &mut Grid, config: &SpawnConfig, now: Instant) -> usize {
        let len = grid.len();
        let mut promoted = 0;

        for row in 0..len {
            for col in 0..len {
                let coords = (row, col);
                let cell = &grid[coords];
                if cell.state() != CellState::Invisible {
                    continue;
                }

                let age = age_probability(config, cell.state_duration(now));
                let cluster = match self.cluster_size_near(grid, coords) {
                    Some(size) => cluster_probability(config, size),
                    None => 0.,
                };
                let chance = combined_probability(config, age, cluster);

                if self.rng.random::<f64>() < chance {
                    grid[coords].transition(CellState::Appearing, now);
                    promoted += 1;
                }
            }
        }

        if promoted > 0 {
            log::trace!("spawned {} cells", promoted);
        }
        promoted
    }

    /// Cluster size reached from a random active neighbor of `coords`, `None` if it has none.
    ///
    /// An invisible cell can bridge separate clusters, so picking one neighbor at random keeps the
    /// estimate unbiased towards any one of them.
    fn cluster_size_near(&mut self, grid: &Grid, coords: Coord2) -> Option<usize> {
        let neighbors = grid.active_neighbors(coords);
        if neighbors.is_empty() {
            return None;
        }
        let seed = neighbors[self.rng.random_range(0..neighbors.len())];
        Some(grid.cluster_size_from(seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::tests::drive_to;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn age_ramps_then_caps() {
        let config = SpawnConfig::default();

        assert_eq!(age_probability(&config, Duration::ZERO), 0.);
        assert!(close(age_probability(&config, Duration::from_secs(5)), 0.05));
        assert!(close(age_probability(&config, Duration::from_secs(10)), 0.10));
        assert!(close(age_probability(&config, Duration::from_secs(60)), 0.10));
    }

    #[test]
    fn cluster_parabola_peaks_small_and_vanishes_at_max() {
        let config = SpawnConfig::default();

        assert_eq!(cluster_probability(&config, 0), 0.);
        assert!(close(cluster_probability(&config, 1), 0.10));
        assert!(close(cluster_probability(&config, 5), 0.10 * 0.75));
        assert!(close(cluster_probability(&config, 9), 0.));
        assert_eq!(cluster_probability(&config, 10), 0.);

        let mut previous = f64::MAX;
        for size in 1..=9 {
            let p = cluster_probability(&config, size);
            assert!(p <= previous);
            previous = p;
        }
    }

    #[test]
    fn combined_stays_within_cap() {
        let config = SpawnConfig::default();
        for age in [0., 0.05, 0.10] {
            for cluster in [0., 0.05, 0.10] {
                let p = combined_probability(&config, age, cluster);
                assert!((0. ..=config.probability_cap + 1e-12).contains(&p));
            }
        }
        assert!(close(combined_probability(&config, 0.10, 0.10), 0.10));
    }

    #[test]
    fn one_pass_per_second() {
        let mut spawner = Spawner::new(7);
        assert!(spawner.claim_second(0));
        assert!(!spawner.claim_second(0));
        assert!(spawner.claim_second(1));
        assert!(!spawner.claim_second(1));
    }

    #[test]
    fn zero_cap_never_spawns() {
        let now = Instant::now();
        let mut grid = Grid::new(6, now);
        let config = SpawnConfig {
            probability_cap: 0.,
            ..Default::default()
        };
        let mut spawner = Spawner::new(1);

        let later = now + Duration::from_secs(60);
        assert_eq!(spawner.spawn_pass(&mut grid, &config, later), 0);
        assert!(grid.iter().all(|cell| cell.state() == CellState::Invisible));
    }

    #[test]
    fn certain_spawn_promotes_every_invisible_cell() {
        let now = Instant::now();
        let mut grid = Grid::new(4, now);
        drive_to(&mut grid, (0, 0), CellState::Visible, now);
        let config = SpawnConfig {
            probability_cap: 1.,
            age_weight: 1.,
            ..Default::default()
        };
        let mut spawner = Spawner::new(3);

        let later = now + Duration::from_secs(20);
        assert_eq!(spawner.spawn_pass(&mut grid, &config, later), 15);
        assert_eq!(grid[(0, 0)].state(), CellState::Visible);
        assert!(
            grid.iter()
                .filter(|cell| cell.coords() != (0, 0))
                .all(|cell| cell.state() == CellState::Appearing)
        );
    }

    #[test]
    fn cluster_term_only_applies_next_to_active_cells() {
        let now = Instant::now();
        let mut grid = Grid::new(6, now);
        drive_to(&mut grid, (0, 0), CellState::Visible, now);
        // pure cluster weighting and a certain single-cell cluster
        let config = SpawnConfig {
            probability_cap: 1.,
            age_weight: 0.,
            ..Default::default()
        };
        let mut spawner = Spawner::new(11);

        let promoted = spawner.spawn_pass(&mut grid, &config, now);

        // promotions grow a single cluster that stops growing once it hits the max bound
        assert!(promoted >= 1);
        assert_eq!(grid[(0, 1)].state(), CellState::Appearing);
        let active = grid.iter().filter(|cell| cell.state().is_active()).count();
        let cluster = grid.cluster_size_from((0, 0));
        assert_eq!(active, cluster);
        assert!(cluster <= config.cluster_max as usize);
    }

    #[test]
    fn same_seed_same_spawns() {
        let now = Instant::now();
        let config = SpawnConfig {
            probability_cap: 0.5,
            ..Default::default()
        };
        let later = now + Duration::from_secs(30);

        let mut a = Grid::new(6, now);
        let mut b = Grid::new(6, now);
        Spawner::new(42).spawn_pass(&mut a, &config, later);
        Spawner::new(42).spawn_pass(&mut b, &config, later);

        let states = |grid: &Grid| grid.iter().map(Cell::state).collect::<Vec<_>>();
        assert_eq!(states(&a), states(&b));
    }
}
