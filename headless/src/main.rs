use anyhow::{Context, Result};
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use spots_core::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

mod player;

use player::AutoPlayer;

#[derive(Parser, Debug)]
#[command(version, about = "Plays the dot game headless with a scripted player", long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of games to play
    #[arg(short, long, default_value_t = 1)]
    rounds: u32,

    /// Give up on a game after this many seconds
    #[arg(long, default_value_t = 30)]
    seconds: u64,

    /// Cells along one side of the board
    #[arg(short, long, default_value_t = 6)]
    grid: Coord,

    /// Delay between two gestures of the player
    #[arg(long, default_value_t = 400)]
    reaction_ms: u64,

    /// Side of the square viewport, in pixels
    #[arg(long, default_value_t = 600)]
    viewport: u32,

    /// Continue the first round from a saved game
    #[arg(long)]
    resume: Option<PathBuf>,

    /// Save the last unfinished game here
    #[arg(long)]
    save: Option<PathBuf>,

    /// High score table to load and update
    #[arg(long)]
    highscores: Option<PathBuf>,
}

/// Logs every notification and remembers the latest score.
#[derive(Default)]
struct LogListener {
    score: AtomicU64,
}

impl GameListener for LogListener {
    fn on_score_changed(&self, score: u32) {
        self.score.store(score.into(), Ordering::Relaxed);
        log::info!("score: {score}");
    }

    fn on_missed_remaining_changed(&self, remaining: u32) {
        log::info!("misses left: {remaining}");
    }

    fn on_game_over(&self, final_score: u32) {
        log::info!("game over, final score: {final_score}");
    }

    fn on_feedback(&self, kind: FeedbackKind) {
        log::trace!("feedback: {kind:?}");
    }
}

/// Surface that only counts what it is asked to draw.
struct NullSurface {
    frames: Arc<AtomicU64>,
}

impl RenderSurface for NullSurface {
    fn draw(&mut self, frame: &RenderFrame) -> std::result::Result<(), RenderError> {
        let drawn = self.frames.fetch_add(1, Ordering::Relaxed) + 1;
        if drawn % 300 == 0 {
            log::debug!(
                "{drawn} frames, {} dots showing",
                frame
                    .cells
                    .iter()
                    .filter(|sprite| sprite.state.is_active())
                    .count()
            );
        }
        Ok(())
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("could not read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("could not parse {}", path.display()))
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text).with_context(|| format!("could not write {}", path.display()))
}

fn play_round(
    args: &Args,
    round: u32,
    resume: Option<GameSnapshot>,
) -> Result<(u32, Option<GameSnapshot>)> {
    let seed = args.seed.map(|seed| seed.wrapping_add(round.into()));
    let listener = Arc::new(LogListener::default());
    let mut game_loop = match resume {
        Some(snapshot) => GameLoop::restore(snapshot, listener.clone())?,
        None => {
            let config = GameConfig {
                grid_len: args.grid,
                seed,
                ..Default::default()
            };
            GameLoop::new(config, listener.clone())?
        }
    };
    game_loop.resize(args.viewport, args.viewport);

    let frames = Arc::new(AtomicU64::new(0));
    game_loop.start(Box::new(NullSurface {
        frames: frames.clone(),
    }))?;

    let mut player = AutoPlayer::new(seed.unwrap_or(u64::from(round)));
    let reaction = Duration::from_millis(args.reaction_ms);
    let deadline = Instant::now() + Duration::from_secs(args.seconds);
    while Instant::now() < deadline && !game_loop.is_game_over() {
        thread::sleep(reaction);
        let Some(gesture) = player.plan(&game_loop.frame()) else {
            continue;
        };
        for event in gesture {
            game_loop.pointer_event(event);
            thread::sleep(Duration::from_millis(15));
        }
    }

    game_loop.pause();
    let unfinished = game_loop.persistable_snapshot();
    game_loop.stop();

    let score = game_loop.with(|game| game.score());
    log::info!(
        "round {} ended with {} points after {} frames (last reported {})",
        round + 1,
        score,
        frames.load(Ordering::Relaxed),
        listener.score.load(Ordering::Relaxed)
    );
    Ok((score, unfinished))
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();
    log::debug!("args: {:?}", args);

    let mut highscores = match &args.highscores {
        Some(path) if path.exists() => read_json(path)?,
        _ => HighScores::default(),
    };
    let mut resume = args
        .resume
        .as_deref()
        .map(read_json::<GameSnapshot>)
        .transpose()?;

    let mut unfinished = None;
    for round in 0..args.rounds {
        let (score, snapshot) = play_round(&args, round, resume.take())?;
        unfinished = snapshot;
        if let Some(rank) = highscores.record(score) {
            log::info!("new high score #{}: {}", rank + 1, score);
        }
    }

    for (rank, score) in highscores.iter().enumerate() {
        log::info!("#{}: {}", rank + 1, score);
    }
    if let Some(path) = &args.highscores {
        write_json(path, &highscores)?;
    }
    match (&args.save, unfinished) {
        (Some(path), Some(snapshot)) => {
            write_json(path, &snapshot)?;
            log::info!("saved unfinished game to {}", path.display());
        }
        (Some(_), None) => log::info!("last game is over, nothing to save"),
        _ => {}
    }
    Ok(())
}
