use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use web_time::{Duration, Instant};

use crate::*;

/// What the loop worker does once a tick has been drawn.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickPlan {
    /// Ahead of schedule, wait out the rest of the period.
    Sleep(Duration),
    /// Behind schedule, run this many extra update passes without drawing.
    CatchUp(u32),
}

/// Fixed-timestep pacing with a bounded number of catch-up passes per tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TickPacer {
    period: Duration,
    max_skips: u32,
}

impl TickPacer {
    pub fn new(period: Duration, max_skips: u32) -> Self {
        Self { period, max_skips }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.tick_period(), config.max_frame_skips)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn max_skips(&self) -> u32 {
        self.max_skips
    }

    /// Plans the rest of a tick that took `elapsed` to update and draw.
    ///
    /// An overrun of `deficit` asks for `ceil(deficit / period)` update passes, never more than
    /// `max_skips`.
    pub fn plan(&self, elapsed: Duration) -> TickPlan {
        if elapsed <= self.period {
            return TickPlan::Sleep(self.period - elapsed);
        }

        let deficit = (elapsed - self.period).as_nanos();
        let passes = deficit.div_ceil(self.period.as_nanos().max(1));
        TickPlan::CatchUp(passes.min(u128::from(self.max_skips)) as u32)
    }
}

struct LoopState {
    game: Game,
    stop_requested: bool,
}

struct Shared {
    state: Mutex<LoopState>,
    wake: Condvar,
    listener: Arc<dyn GameListener>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, LoopState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            log::warn!("game state lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn dispatch(&self, events: Vec<GameEvent>) {
        for event in events {
            event.dispatch(self.listener.as_ref());
        }
    }
}

/// Owns a [`Game`] and drives it from a dedicated worker thread at a fixed tick rate.
///
/// Input, lifecycle and snapshot calls may come from any other thread. All of them go through
/// the same lock as the worker, and listener callbacks always run after that lock is released.
pub struct GameLoop {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<Box<dyn RenderSurface>>>,
}

impl GameLoop {
    pub fn new(config: GameConfig, listener: Arc<dyn GameListener>) -> Result<Self> {
        let game = Game::new(config, Instant::now())?;
        Ok(Self::with_game(game, listener))
    }

    /// Loop around a game rebuilt from `snapshot`. Not started yet.
    pub fn restore(snapshot: GameSnapshot, listener: Arc<dyn GameListener>) -> Result<Self> {
        let game = Game::restore(snapshot, Instant::now())?;
        Ok(Self::with_game(game, listener))
    }

    pub fn with_game(game: Game, listener: Arc<dyn GameListener>) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(LoopState {
                    game,
                    stop_requested: false,
                }),
                wake: Condvar::new(),
                listener,
            }),
            worker: None,
        }
    }

    /// Spawns the worker, which draws into `surface` until stopped or the game ends.
    pub fn start(&mut self, surface: Box<dyn RenderSurface>) -> Result<()> {
        if self.is_running() {
            return Err(GameError::AlreadyRunning);
        }
        // reap a worker that ended on its own
        self.stop();
        self.shared.lock().stop_requested = false;

        let shared = Arc::clone(&self.shared);
        let worker = thread::Builder::new()
            .name("spots-loop".into())
            .spawn(move || run(shared, surface))
            .map_err(|err| {
                log::error!("failed to spawn game loop: {err}");
                GameError::WorkerSpawn(err.kind())
            })?;
        self.worker = Some(worker);
        Ok(())
    }

    /// Asks the worker to finish, waits for it and hands back its surface.
    pub fn stop(&mut self) -> Option<Box<dyn RenderSurface>> {
        let worker = self.worker.take()?;
        self.shared.lock().stop_requested = true;
        self.shared.wake.notify_all();

        match worker.join() {
            Ok(surface) => Some(surface),
            Err(_) => {
                log::error!("game loop worker panicked");
                None
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.is_finished())
    }

    pub fn pause(&self) {
        self.shared.lock().game.pause(Instant::now());
    }

    pub fn resume(&self) {
        let paused_for = self.shared.lock().game.resume(Instant::now());
        log::trace!("resume compensated {:?}", paused_for);
        self.shared.wake.notify_all();
    }

    pub fn is_paused(&self) -> bool {
        self.shared.lock().game.is_paused()
    }

    pub fn is_game_over(&self) -> bool {
        self.shared.lock().game.is_game_over()
    }

    pub fn pointer_event(&self, event: PointerEvent) -> bool {
        let (handled, events) = {
            let mut state = self.shared.lock();
            let handled = state.game.pointer_event(event, Instant::now());
            (handled, state.game.drain_events())
        };
        self.shared.dispatch(events);
        handled
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.shared.lock().game.resize(width, height);
    }

    pub fn set_quit_requested(&self, quit_requested: bool) {
        self.shared.lock().game.set_quit_requested(quit_requested);
    }

    pub fn snapshot(&self) -> GameSnapshot {
        self.shared.lock().game.snapshot(Instant::now())
    }

    pub fn persistable_snapshot(&self) -> Option<GameSnapshot> {
        self.shared.lock().game.persistable_snapshot(Instant::now())
    }

    /// Current picture of the board, as the worker would draw it.
    pub fn frame(&self) -> RenderFrame {
        self.shared.lock().game.render_frame(Instant::now())
    }

    /// Runs `f` against the game under the loop lock.
    pub fn with<R>(&self, f: impl FnOnce(&Game) -> R) -> R {
        f(&self.shared.lock().game)
    }
}

impl Drop for GameLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(shared: Arc<Shared>, mut surface: Box<dyn RenderSurface>) -> Box<dyn RenderSurface> {
    let pacer = TickPacer::from_config(shared.lock().game.config());
    log::debug!("game loop started, period: {:?}", pacer.period());

    loop {
        let (started, frame, events, game_over) = {
            let mut state = shared.lock();
            while state.game.is_paused() && !state.stop_requested {
                state = shared
                    .wake
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            if state.stop_requested {
                break;
            }

            let now = Instant::now();
            state.game.update(now);
            let frame = surface
                .is_available()
                .then(|| state.game.render_frame(now));
            (now, frame, state.game.drain_events(), state.game.is_game_over())
        };

        shared.dispatch(events);
        if let Some(frame) = frame {
            if let Err(err) = present(surface.as_mut(), &frame) {
                log::warn!("dropped frame: {err}");
            }
        }
        if game_over {
            log::debug!("game over, leaving loop");
            break;
        }

        match pacer.plan(started.elapsed()) {
            TickPlan::Sleep(rest) => {
                let state = shared.lock();
                if !state.stop_requested {
                    drop(shared.wake.wait_timeout(state, rest));
                }
            }
            TickPlan::CatchUp(passes) => {
                log::trace!("behind schedule, {passes} catch-up passes");
                let events = {
                    let mut state = shared.lock();
                    for _ in 0..passes {
                        state.game.update(Instant::now());
                    }
                    state.game.drain_events()
                };
                shared.dispatch(events);
            }
        }
    }

    log::debug!("game loop stopped");
    surface
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn early_ticks_sleep_the_remainder() {
        let pacer = TickPacer::new(ms(33), 5);
        assert_eq!(pacer.plan(ms(10)), TickPlan::Sleep(ms(23)));
        assert_eq!(pacer.plan(ms(33)), TickPlan::Sleep(Duration::ZERO));
    }

    #[test]
    fn late_ticks_catch_up_per_period() {
        let pacer = TickPacer::new(ms(33), 5);
        assert_eq!(pacer.plan(ms(34)), TickPlan::CatchUp(1));
        assert_eq!(pacer.plan(ms(66)), TickPlan::CatchUp(1));
        assert_eq!(pacer.plan(ms(67)), TickPlan::CatchUp(2));
    }

    #[test]
    fn catch_up_is_bounded() {
        let pacer = TickPacer::new(ms(33), 5);
        assert_eq!(pacer.plan(ms(10_000)), TickPlan::CatchUp(5));

        let strict = TickPacer::new(ms(33), 0);
        assert_eq!(strict.plan(ms(100)), TickPlan::CatchUp(0));
    }

    #[test]
    fn pacer_follows_config() {
        let pacer = TickPacer::from_config(&GameConfig::default());
        assert_eq!(pacer.period(), Duration::from_nanos(33_333_333));
        assert_eq!(pacer.max_skips(), 5);
    }
}
