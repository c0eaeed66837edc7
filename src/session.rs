//! The shared "is a playback session running" flag.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::Error;

/// Snapshot of the session flag.
///
/// `epoch` is bumped by every successful [`SessionController::start`], so a
/// stop followed by a restart is never mistaken for "still running".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionState {
    pub epoch: u64,
    pub running: bool,
}

impl SessionState {
    /// Whether the session started under `epoch` is the one still running.
    pub fn is_current(&self, epoch: u64) -> bool {
        self.running && self.epoch == epoch
    }
}

/// Single source of truth for whether a slideshow or grid session is active.
///
/// Cloning yields another handle to the same flag. Sequencers and the shell
/// observe it through [`SessionController::subscribe`]; every receiver sees
/// each real transition exactly once.
#[derive(Debug, Clone)]
pub struct SessionController {
    state: Arc<watch::Sender<SessionState>>,
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionController {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::default());
        Self {
            state: Arc::new(tx),
        }
    }

    /// Raise the flag and return the new session's epoch. Fails with
    /// [`Error::SessionBusy`] if a session is already active.
    pub fn start(&self) -> Result<u64, Error> {
        let mut epoch = None;
        self.state.send_if_modified(|state| {
            if state.running {
                return false;
            }
            state.epoch = state.epoch.wrapping_add(1);
            state.running = true;
            epoch = Some(state.epoch);
            true
        });
        match epoch {
            Some(epoch) => {
                info!(epoch, "playback session started");
                Ok(epoch)
            }
            None => Err(Error::SessionBusy),
        }
    }

    /// Lower the flag whatever session is running. Returns `true` only for
    /// the call that actually ended it; later calls do not notify observers.
    pub fn request_stop(&self) -> bool {
        self.lower(|_| true)
    }

    /// Lower the flag only if the session started under `epoch` is still the
    /// running one. A newer session is left alone.
    pub fn end(&self, epoch: u64) -> bool {
        self.lower(|state| state.epoch == epoch)
    }

    fn lower(&self, applies: impl FnOnce(&SessionState) -> bool) -> bool {
        let stopped = self.state.send_if_modified(|state| {
            if !state.running || !applies(state) {
                return false;
            }
            state.running = false;
            true
        });
        if stopped {
            info!(epoch = self.state.borrow().epoch, "playback session stop requested");
        } else {
            debug!("stop requested with no matching running session");
        }
        stopped
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().running
    }

    /// Epoch of the running session, if any.
    pub fn current(&self) -> Option<u64> {
        let state = *self.state.borrow();
        state.running.then_some(state.epoch)
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Resolve once the flag is down (immediately if it already is).
    pub async fn stopped(&self) {
        let mut rx = self.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|state| !state.running).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_one_session_at_a_time() {
        let session = SessionController::new();
        assert!(!session.is_running());
        session.start().expect("first start succeeds");
        assert!(matches!(session.start(), Err(Error::SessionBusy)));
        assert!(session.request_stop());
        session.start().expect("restart after stop");
    }

    #[test]
    fn stop_is_idempotent() {
        let session = SessionController::new();
        assert!(!session.request_stop());
        session.start().unwrap();
        assert!(session.request_stop());
        assert!(!session.request_stop());
        assert!(!session.is_running());
    }

    #[test]
    fn each_observer_sees_a_stop_once() {
        let session = SessionController::new();
        session.start().unwrap();
        let mut ui = session.subscribe();
        let mut sequencer = session.clone().subscribe();

        session.request_stop();
        session.request_stop();

        for rx in [&mut ui, &mut sequencer] {
            assert!(rx.has_changed().unwrap());
            assert!(!rx.borrow_and_update().running);
            assert!(!rx.has_changed().unwrap(), "second stop must not notify again");
        }
    }

    #[tokio::test]
    async fn stopped_resolves_after_request() {
        let session = SessionController::new();
        session.start().unwrap();
        let waiter = {
            let session = session.clone();
            tokio::spawn(async move { session.stopped().await })
        };
        tokio::task::yield_now().await;
        session.request_stop();
        waiter.await.unwrap();
    }

    #[test]
    fn restart_moves_to_a_new_epoch() {
        let session = SessionController::new();
        let first = session.start().unwrap();
        let mut observer = session.subscribe();

        session.request_stop();
        let second = session.start().unwrap();
        assert_ne!(first, second);
        assert_eq!(session.current(), Some(second));

        // The observer only sees the latest value, but the epoch tells it the
        // session it was watching is gone.
        assert!(observer.has_changed().unwrap());
        let state = *observer.borrow_and_update();
        assert!(state.running);
        assert!(!state.is_current(first));
        assert!(state.is_current(second));

        assert!(!session.end(first), "a stale epoch cannot end the new session");
        assert!(session.is_running());
        assert!(session.end(second));
        assert_eq!(session.current(), None);
    }
}
