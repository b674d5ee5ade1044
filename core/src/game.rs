use web_time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::*;

/// Complete simulation state of one game.
///
/// Pure state with no thread affinity: every operation takes the current time explicitly and
/// queues its notifications until [`drain_events`](Self::drain_events) is called.
#[derive(Debug)]
pub struct Game {
    config: GameConfig,
    grid: Grid,
    chain: GestureChain,
    spawner: Spawner,
    scorer: Scorer,
    layout: Layout,
    origin: Instant,
    paused_at: Option<Instant>,
    quit_requested: bool,
    events: Vec<GameEvent>,
}

impl Game {
    pub fn new(config: GameConfig, now: Instant) -> Result<Self> {
        let config = config.validate()?;
        let seed = config.seed.unwrap_or_else(entropy_seed);
        log::debug!("new {0}x{0} game, seed: {1}", config.grid_len, seed);

        Ok(Self {
            grid: Grid::new(config.grid_len, now),
            chain: GestureChain::new(),
            spawner: Spawner::new(seed),
            scorer: Scorer::new(config.miss_threshold),
            layout: Layout::default(),
            origin: now,
            paused_at: None,
            quit_requested: false,
            events: Vec::new(),
            config,
        })
    }

    /// Rebuilds a game from a snapshot, re-anchoring every cell timer at `now`.
    pub fn restore(snapshot: GameSnapshot, now: Instant) -> Result<Self> {
        snapshot.validate()?;
        let mut game = Self::new(snapshot.config, now)?;

        for (cell, saved) in game.grid.iter_mut().zip(&snapshot.cells) {
            let (state, elapsed) = match saved.state {
                // no gesture survives a restore
                CellState::Selected => (CellState::Disappearing, Duration::ZERO),
                state => (state, Duration::from_millis(saved.elapsed_ms)),
            };
            cell.restore(state, elapsed, now);
        }

        game.scorer = Scorer::restored(
            snapshot.score,
            snapshot.missed,
            game.config.miss_threshold,
            snapshot.game_over,
        );
        if game.scorer.is_game_over() {
            for cell in game.grid.iter_mut() {
                cell.force_invisible(now);
            }
        }

        let (width, height) = snapshot.viewport;
        game.resize(width, height);
        log::debug!(
            "restored game, score: {}, missed: {}",
            game.scorer.score(),
            game.scorer.missed()
        );
        Ok(game)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn chain(&self) -> &GestureChain {
        &self.chain
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn score(&self) -> u32 {
        self.scorer.score()
    }

    pub fn missed(&self) -> u32 {
        self.scorer.missed()
    }

    pub fn missed_remaining(&self) -> u32 {
        self.scorer.missed_remaining()
    }

    pub fn is_game_over(&self) -> bool {
        self.scorer.is_game_over()
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn is_quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Marks the game as abandoned so it is no longer offered for persistence.
    pub fn set_quit_requested(&mut self, quit_requested: bool) {
        self.quit_requested = quit_requested;
    }

    /// Takes every notification queued since the last call.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        core::mem::take(&mut self.events)
    }

    /// One state-update pass: ages every cell, counts timeouts, then gives the spawner a chance.
    ///
    /// Does nothing while paused or once the game is over.
    pub fn update(&mut self, now: Instant) {
        use CellState::*;

        if self.is_game_over() || self.is_paused() {
            return;
        }

        let animation = self.config.animation();
        let visible = self.config.visible();
        let mut timed_out = 0;

        for cell in self.grid.iter_mut() {
            let in_state = cell.state_duration(now);
            match cell.state() {
                Appearing if in_state > animation => cell.transition(Visible, now),
                Visible if in_state > visible => {
                    cell.transition(Disappearing, now);
                    timed_out += 1;
                }
                Disappearing if in_state > animation => cell.transition(Invisible, now),
                // selected cells are held until the gesture ends
                _ => {}
            }
        }

        for _ in 0..timed_out {
            if self.record_miss(now) {
                return;
            }
        }

        let second = now.saturating_duration_since(self.origin).as_secs();
        if self.spawner.claim_second(second) {
            self.spawner
                .spawn_pass(&mut self.grid, &self.config.spawn, now);
        }
    }

    /// Applies a pointer event. Always reports the event as handled, even when it was ignored
    /// because the game is paused or over.
    pub fn pointer_event(&mut self, event: PointerEvent, now: Instant) -> bool {
        if self.is_paused() || self.is_game_over() {
            log::trace!("ignoring {:?}, game inactive", event.kind);
            return true;
        }

        let point = event.point();
        match event.kind {
            PointerKind::Down => self.on_down(point, now),
            PointerKind::Move => self.on_move(point, now),
            PointerKind::Up => self.on_up(now),
            PointerKind::Cancel => self.on_cancel(now),
        }
        true
    }

    /// Recomputes the board geometry for a new viewport size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.layout = Layout::new(width, height, self.config.grid_len, &self.config.layout);
        self.grid.apply_layout(&self.layout);
        log::debug!(
            "resized to {}x{}, region: {}",
            width,
            height,
            self.layout.region()
        );
    }

    pub fn pause(&mut self, now: Instant) {
        if self.paused_at.is_none() {
            self.paused_at = Some(now);
            log::debug!("paused");
        }
    }

    /// Resumes the game and pushes the timer of every active cell forward by the paused
    /// interval, so nothing ages while paused. Returns that interval.
    pub fn resume(&mut self, now: Instant) -> Duration {
        let Some(paused_at) = self.paused_at.take() else {
            return Duration::ZERO;
        };

        let paused_for = now.saturating_duration_since(paused_at);
        for cell in self.grid.iter_mut() {
            if cell.state().is_active() {
                cell.shift_entered_at(paused_for);
            }
        }
        log::debug!("resumed after {:?}", paused_for);
        paused_for
    }

    pub fn render_frame(&self, now: Instant) -> RenderFrame {
        // animations stay frozen while paused
        let now = self.paused_at.unwrap_or(now);

        let cells = self
            .grid
            .iter()
            .map(|cell| sprite_for(cell, &self.layout, &self.config, now))
            .collect();

        let chain = (self.chain.is_interacting() && !self.chain.is_empty()).then(|| ChainPath {
            points: self
                .chain
                .cells()
                .iter()
                .map(|&coords| self.grid[coords].center())
                .collect(),
            trailing: self.chain.trailing_point(),
        });

        RenderFrame {
            cells,
            chain,
            score: self.scorer.score(),
            missed_remaining: self.scorer.missed_remaining(),
            game_over: self.scorer.is_game_over(),
        }
    }

    pub fn snapshot(&self, now: Instant) -> GameSnapshot {
        let now = self.paused_at.unwrap_or(now);

        let cells = self
            .grid
            .iter()
            .map(|cell| match cell.state() {
                CellState::Selected => CellSnapshot {
                    state: CellState::Disappearing,
                    elapsed_ms: 0,
                },
                state => CellSnapshot {
                    state,
                    elapsed_ms: cell
                        .state_duration(now)
                        .as_millis()
                        .try_into()
                        .unwrap_or(u64::MAX),
                },
            })
            .collect();

        GameSnapshot {
            config: self.config,
            viewport: self.layout.viewport(),
            cells,
            score: self.scorer.score(),
            missed: self.scorer.missed(),
            game_over: self.scorer.is_game_over(),
        }
    }

    /// Snapshot worth saving, `None` once the game is over or the player quit.
    pub fn persistable_snapshot(&self, now: Instant) -> Option<GameSnapshot> {
        if self.is_game_over() || self.quit_requested {
            None
        } else {
            Some(self.snapshot(now))
        }
    }

    fn on_down(&mut self, point: Point, now: Instant) {
        if self.chain.is_interacting() {
            log::debug!("pointer down during a gesture, dropping the old chain");
            self.on_cancel(now);
        }

        self.chain.begin(point);
        let radius = self.layout.dot_radius();
        if let Some(coords) = hit_test(&self.grid, point, radius, self.config.gesture.down_grab_factor) {
            self.select(coords, now);
        }
    }

    fn on_move(&mut self, point: Point, now: Instant) {
        if !self.chain.is_interacting() {
            return;
        }
        let Some(last) = self.chain.last() else {
            return;
        };

        let start = self.grid[last].center();
        self.chain
            .set_trailing(clamp_trailing_point(start, point, self.layout.max_line_length()));

        let radius = self.layout.dot_radius();
        if let Some(coords) = hit_test(&self.grid, point, radius, self.config.gesture.move_grab_factor) {
            if !self.chain.contains(coords) && is_adjacent(last, coords) {
                self.select(coords, now);
            }
        }
    }

    fn on_up(&mut self, now: Instant) {
        if !self.chain.is_interacting() {
            return;
        }

        let cells = self.chain.finish();
        if cells.is_empty() {
            return;
        }

        let points = self.scorer.record_chain(cells.len());
        log::debug!("chain of {} released for {} points", cells.len(), points);
        for coords in cells {
            self.grid[coords].transition(CellState::Disappearing, now);
        }
        self.events.push(GameEvent::ScoreChanged(self.scorer.score()));
        self.events.push(GameEvent::Feedback(FeedbackKind::ChainReleased));
    }

    fn on_cancel(&mut self, now: Instant) {
        for coords in self.chain.finish() {
            self.grid[coords].transition(CellState::Disappearing, now);
        }
    }

    fn select(&mut self, coords: Coord2, now: Instant) {
        self.chain.push(coords);
        self.grid[coords].transition(CellState::Selected, now);
        self.events.push(GameEvent::Feedback(FeedbackKind::CellSelected));
    }

    /// Counts one timeout; returns `true` when the game is over and the pass must stop.
    fn record_miss(&mut self, now: Instant) -> bool {
        match self.scorer.record_miss() {
            MissOutcome::Counted { remaining } => {
                self.events.push(GameEvent::MissedRemainingChanged(remaining));
                self.events.push(GameEvent::Feedback(FeedbackKind::CellMissed));
                false
            }
            MissOutcome::GameOver => {
                self.events.push(GameEvent::MissedRemainingChanged(0));
                self.events.push(GameEvent::Feedback(FeedbackKind::CellMissed));
                self.end_game(now);
                true
            }
            MissOutcome::Ignored => true,
        }
    }

    fn end_game(&mut self, now: Instant) {
        let final_score = self.scorer.score();
        log::debug!("game over, final score: {}", final_score);

        self.chain.finish();
        for cell in self.grid.iter_mut() {
            cell.force_invisible(now);
        }
        self.events.push(GameEvent::GameOver { final_score });
        self.events.push(GameEvent::Feedback(FeedbackKind::GameOver));
    }
}

fn entropy_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|since_epoch| since_epoch.as_nanos() as u64)
        .unwrap_or(0x5eed)
}
