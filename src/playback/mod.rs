//! Slideshow and grid sequencing.
//!
//! The state machines in [`slideshow`] and [`grid`] are synchronous and
//! time-free; [`crate::tasks::sequencer`] owns one of them on a dedicated task
//! together with a [`clock::PlaybackClock`] and turns ticks, commands and
//! session changes into [`PlaybackEvent`]s for the renderer.

pub mod clock;
pub mod grid;
pub mod order;
pub mod slideshow;

use anyhow::{Context, Result};
use rand::{SeedableRng, rngs::StdRng};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info};

use crate::config::PlaybackConfiguration;
use crate::error::Error;
use crate::events::{DisplayUpdate, KeyAction, PlaybackEvent, StopReason};
use crate::library::ImageItem;
use crate::session::SessionController;
use crate::tasks::sequencer::{self, Command};

pub use grid::GridRefreshSequencer;
pub use slideshow::SlideshowSequencer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Idle,
    Running,
    Paused,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Display(DisplayUpdate),
    /// Non-looping playback ran out of images; the sequencer is now stopped.
    Finished,
    /// The sequencer is not running; nothing changed.
    Ignored,
}

/// Result of a manual next/previous step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigated {
    /// `None` when the order had nowhere to go and the screen stays as is.
    pub update: Option<DisplayUpdate>,
    /// Whether the clock should be re-armed (navigation never unpauses).
    pub rearm: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    Sequential,
    Grid { rows: usize, columns: usize },
}

/// Common surface of the two playback state machines.
pub trait Sequencer: Send + 'static {
    fn mode(&self) -> PlaybackMode;
    fn state(&self) -> SequencerState;
    /// Leave `Idle` and return the initial screen contents.
    fn start(&mut self) -> Vec<DisplayUpdate>;
    fn on_tick(&mut self) -> TickOutcome;
    fn pause(&mut self) -> bool;
    fn resume(&mut self) -> bool;
    /// `None` when navigation is not valid in the current state or mode.
    fn next(&mut self) -> Option<Navigated>;
    fn previous(&mut self) -> Option<Navigated>;
    /// Returns `true` only on the transition into `Stopped`.
    fn stop(&mut self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackSummary {
    pub mode: PlaybackMode,
    pub displayed: usize,
    pub reason: StopReason,
}

pub(crate) fn session_rng(config: &PlaybackConfiguration) -> StdRng {
    match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Start single-image playback over `images`.
///
/// The session flag must already be raised (see [`SessionController::start`]).
/// Must be called from within a Tokio runtime.
pub fn start_sequential_playback(
    images: &[ImageItem],
    config: PlaybackConfiguration,
    session: &SessionController,
    events: mpsc::Sender<PlaybackEvent>,
) -> Result<SequencerHandle, Error> {
    let seq = SlideshowSequencer::new(images.len(), &config, session_rng(&config))?;
    spawn(seq, config, session, events)
}

/// Start the auto-refreshing `rows × columns` grid over `images`.
pub fn start_grid_playback(
    images: &[ImageItem],
    config: PlaybackConfiguration,
    rows: usize,
    columns: usize,
    session: &SessionController,
    events: mpsc::Sender<PlaybackEvent>,
) -> Result<SequencerHandle, Error> {
    let seq = GridRefreshSequencer::new(
        images.len(),
        rows,
        columns,
        &config,
        session_rng(&config),
    )?;
    spawn(seq, config, session, events)
}

/// Start whichever mode `config.grid_mode` selects.
pub fn start_playback(
    images: &[ImageItem],
    config: PlaybackConfiguration,
    session: &SessionController,
    events: mpsc::Sender<PlaybackEvent>,
) -> Result<SequencerHandle, Error> {
    if config.grid_mode {
        start_grid_playback(images, config, config.rows, config.columns, session, events)
    } else {
        start_sequential_playback(images, config, session, events)
    }
}

fn spawn<S: Sequencer>(
    seq: S,
    config: PlaybackConfiguration,
    session: &SessionController,
    events: mpsc::Sender<PlaybackEvent>,
) -> Result<SequencerHandle, Error> {
    let Some(epoch) = session.current() else {
        return Err(Error::SessionNotRunning);
    };
    let mode = seq.mode();
    let (commands_tx, commands_rx) = mpsc::channel(16);
    let teardown = CancellationToken::new();
    let task = tokio::spawn(sequencer::run(
        seq,
        config,
        commands_rx,
        events,
        session.clone(),
        epoch,
        teardown.clone(),
    ));
    info!(?mode, epoch, delay = ?config.delay, shuffle = config.shuffle, looping = config.loop_playback, "playback started");
    Ok(SequencerHandle {
        mode,
        control: SequencerControl {
            commands: commands_tx,
            mode,
        },
        task,
        teardown: teardown.drop_guard(),
    })
}

/// Owning handle of a running sequencer.
///
/// Dropping the handle tears the session down the same way `stop()` does.
#[derive(Debug)]
pub struct SequencerHandle {
    mode: PlaybackMode,
    control: SequencerControl,
    task: JoinHandle<Result<PlaybackSummary>>,
    teardown: DropGuard,
}

impl SequencerHandle {
    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    /// A cloneable sender for input sources such as a key reader.
    pub fn control(&self) -> SequencerControl {
        self.control.clone()
    }

    pub async fn pause(&self) {
        self.control.pause().await;
    }

    pub async fn resume(&self) {
        self.control.resume().await;
    }

    pub async fn next(&self) {
        self.control.next().await;
    }

    pub async fn previous(&self) {
        self.control.previous().await;
    }

    pub async fn stop(&self) {
        self.control.stop().await;
    }

    pub async fn apply_key(&self, key: KeyAction) {
        self.control.apply_key(key).await;
    }

    /// Wait for the sequencer to stop on its own or through a stop request.
    pub async fn finished(self) -> Result<PlaybackSummary> {
        let Self { task, teardown, .. } = self;
        let summary = task.await.context("sequencer task failed to join")?;
        drop(teardown);
        summary
    }
}

#[derive(Debug, Clone)]
pub struct SequencerControl {
    commands: mpsc::Sender<Command>,
    mode: PlaybackMode,
}

impl SequencerControl {
    async fn send(&self, command: Command) {
        if self.commands.send(command).await.is_err() {
            debug!(?command, "sequencer already stopped; ignoring command");
        }
    }

    pub async fn pause(&self) {
        self.send(Command::Pause).await;
    }

    pub async fn resume(&self) {
        self.send(Command::Resume).await;
    }

    pub async fn toggle_pause(&self) {
        self.send(Command::TogglePause).await;
    }

    pub async fn next(&self) {
        self.send(Command::Next).await;
    }

    pub async fn previous(&self) {
        self.send(Command::Previous).await;
    }

    pub async fn stop(&self) {
        self.send(Command::Stop).await;
    }

    pub async fn apply_key(&self, key: KeyAction) {
        match key {
            KeyAction::TogglePause => self.toggle_pause().await,
            KeyAction::Stop => self.stop().await,
            KeyAction::Next => self.next().await,
            KeyAction::Previous => match self.mode {
                PlaybackMode::Sequential => self.previous().await,
                PlaybackMode::Grid { .. } => debug!("previous is not available in grid mode"),
            },
        }
    }
}

/// Plan up to `iterations` ticks of the mode selected by `config`, without
/// timing. The first entries are the initial screen contents.
pub fn simulate(
    image_count: usize,
    config: &PlaybackConfiguration,
    iterations: usize,
) -> Result<Vec<DisplayUpdate>, Error> {
    let rng = session_rng(config);
    let mut seq: Box<dyn Sequencer> = if config.grid_mode {
        Box::new(GridRefreshSequencer::new(
            image_count,
            config.rows,
            config.columns,
            config,
            rng,
        )?)
    } else {
        Box::new(SlideshowSequencer::new(image_count, config, rng)?)
    };
    let mut plan = seq.start();
    for _ in 0..iterations {
        match seq.on_tick() {
            TickOutcome::Display(update) => plan.push(update),
            TickOutcome::Finished | TickOutcome::Ignored => break,
        }
    }
    Ok(plan)
}
