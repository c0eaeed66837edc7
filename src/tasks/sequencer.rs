use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::PlaybackConfiguration;
use crate::events::{DisplayUpdate, NoticeKind, PlaybackEvent, StopReason};
use crate::playback::clock::PlaybackClock;
use crate::playback::{Navigated, PlaybackSummary, Sequencer, SequencerState, TickOutcome};
use crate::session::SessionController;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    Pause,
    Resume,
    TogglePause,
    Next,
    Previous,
    Stop,
}

/// Owns one sequencer and its clock; the only place its state is touched.
///
/// Rules:
/// - Ticks are chained: the clock is re-armed after each display, never on a
///   fixed period.
/// - Pause, navigation and stop cancel the pending tick first; ticks from a
///   canceled schedule are dropped by the clock's generation check.
/// - A lowered session flag, a newer session epoch, a stop command, teardown
///   of the handle or a gone renderer all end the session through the same
///   stop path.
/// - Session changes are polled before commands and ticks, so at most one
///   tick can land after a stop was requested elsewhere.
pub(crate) async fn run<S: Sequencer>(
    mut seq: S,
    config: PlaybackConfiguration,
    mut commands: Receiver<Command>,
    events: Sender<PlaybackEvent>,
    session: SessionController,
    epoch: u64,
    teardown: CancellationToken,
) -> Result<PlaybackSummary> {
    let mode = seq.mode();
    let (mut clock, mut ticks) = PlaybackClock::new(config.delay);
    let mut session_rx = session.subscribe();
    let mut out = Output {
        events,
        notice_duration: config.notice_duration,
        displayed: 0,
    };

    let reason = 'session: {
        if !session_rx.borrow_and_update().is_current(epoch) {
            break 'session StopReason::SessionEnded;
        }
        for update in seq.start() {
            if !out.display(update).await {
                break 'session StopReason::TornDown;
            }
        }
        clock.arm();

        loop {
            select! {
                biased;

                _ = teardown.cancelled() => break 'session StopReason::TornDown,

                changed = session_rx.changed() => {
                    if changed.is_err() || !session_rx.borrow_and_update().is_current(epoch) {
                        break 'session StopReason::SessionEnded;
                    }
                }

                maybe_cmd = commands.recv() => {
                    let Some(cmd) = maybe_cmd else {
                        break 'session StopReason::TornDown;
                    };
                    debug!(?cmd, state = ?seq.state(), "sequencer command");
                    let delivered = match cmd {
                        Command::Stop => break 'session StopReason::Requested,
                        Command::Pause => pause(&mut seq, &mut clock, &mut out).await,
                        Command::Resume => resume(&mut seq, &mut clock, &mut out).await,
                        Command::TogglePause => match seq.state() {
                            SequencerState::Running => pause(&mut seq, &mut clock, &mut out).await,
                            SequencerState::Paused => resume(&mut seq, &mut clock, &mut out).await,
                            _ => true,
                        },
                        Command::Next => navigate(&mut seq, &mut clock, &mut out, S::next).await,
                        Command::Previous => navigate(&mut seq, &mut clock, &mut out, S::previous).await,
                    };
                    if !delivered {
                        break 'session StopReason::TornDown;
                    }
                }

                Some(tick) = ticks.recv(), if clock.is_armed() => {
                    if clock.accept(tick) {
                        match seq.on_tick() {
                            TickOutcome::Display(update) => {
                                if !out.display(update).await {
                                    break 'session StopReason::TornDown;
                                }
                                clock.arm();
                            }
                            TickOutcome::Finished => break 'session StopReason::Completed,
                            TickOutcome::Ignored => {}
                        }
                    }
                }
            }
        }
    };

    clock.cancel();
    seq.stop();
    // Only our own session; a newer one may already be running.
    session.end(epoch);
    // The renderer may already be gone; closing is best effort.
    let _ = out.events.send(PlaybackEvent::Closed(reason)).await;
    info!(?mode, ?reason, displayed = out.displayed, "playback stopped");

    Ok(PlaybackSummary {
        mode,
        displayed: out.displayed,
        reason,
    })
}

struct Output {
    events: Sender<PlaybackEvent>,
    notice_duration: std::time::Duration,
    displayed: usize,
}

impl Output {
    /// Returns `false` once the renderer has hung up.
    async fn display(&mut self, update: DisplayUpdate) -> bool {
        if self.events.send(PlaybackEvent::Display(update)).await.is_err() {
            warn!("renderer channel closed");
            return false;
        }
        self.displayed += 1;
        true
    }

    async fn notice(&mut self, kind: NoticeKind) -> bool {
        let event = PlaybackEvent::Notice {
            kind,
            visible_for: self.notice_duration,
        };
        if self.events.send(event).await.is_err() {
            warn!("renderer channel closed");
            return false;
        }
        true
    }
}

async fn pause<S: Sequencer>(seq: &mut S, clock: &mut PlaybackClock, out: &mut Output) -> bool {
    if !seq.pause() {
        return true;
    }
    clock.pause();
    info!("playback paused");
    out.notice(NoticeKind::Paused).await
}

async fn resume<S: Sequencer>(seq: &mut S, clock: &mut PlaybackClock, out: &mut Output) -> bool {
    if !seq.resume() {
        return true;
    }
    clock.resume();
    info!("playback resumed");
    out.notice(NoticeKind::Resumed).await
}

async fn navigate<S: Sequencer>(
    seq: &mut S,
    clock: &mut PlaybackClock,
    out: &mut Output,
    step: fn(&mut S) -> Option<Navigated>,
) -> bool {
    // Nowhere to go: the screen and the pending tick stay as they are.
    let Some(Navigated {
        update: Some(update),
        rearm,
    }) = step(seq)
    else {
        return true;
    };
    clock.cancel();
    if !out.display(update).await {
        return false;
    }
    if rearm {
        clock.arm();
    }
    true
}
