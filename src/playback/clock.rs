use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, sleep_until};
use tracing::trace;

/// A fired schedule, delivered on the clock's tick channel.
///
/// Carries the generation it was armed under so the owner can discard ticks
/// that were superseded while they were in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    generation: u64,
}

/// Single-pending-timer clock for one sequencer.
///
/// At most one schedule is armed at a time: arming again cancels the previous
/// one. Pausing forgets elapsed time, so resuming always waits the full delay.
#[derive(Debug)]
pub struct PlaybackClock {
    delay: Duration,
    generation: u64,
    pending: Option<JoinHandle<()>>,
    ticks: mpsc::Sender<Tick>,
}

impl PlaybackClock {
    /// Create a clock and the receiver its ticks arrive on.
    pub fn new(delay: Duration) -> (Self, mpsc::Receiver<Tick>) {
        let (ticks, rx) = mpsc::channel(4);
        (
            Self {
                delay,
                generation: 0,
                pending: None,
                ticks,
            },
            rx,
        )
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Arm a tick `after` from now, replacing any pending one.
    pub fn schedule(&mut self, after: Duration) -> Tick {
        self.cancel();
        let tick = Tick {
            generation: self.generation,
        };
        let deadline = Instant::now() + after;
        let ticks = self.ticks.clone();
        self.pending = Some(tokio::spawn(async move {
            sleep_until(deadline).await;
            // Receiver gone means the sequencer already shut down.
            let _ = ticks.send(tick).await;
        }));
        trace!(generation = tick.generation, ?after, "clock armed");
        tick
    }

    /// Arm with the configured delay.
    pub fn arm(&mut self) -> Tick {
        self.schedule(self.delay)
    }

    /// Disarm without firing. Ticks already in flight become stale.
    pub fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }

    pub fn pause(&mut self) {
        self.cancel();
    }

    pub fn resume(&mut self) -> Tick {
        self.arm()
    }

    /// Claim a received tick. Returns `false` for ticks from a canceled or
    /// replaced schedule; those must be ignored.
    pub fn accept(&mut self, tick: Tick) -> bool {
        if self.pending.is_some() && tick.generation == self.generation {
            self.pending = None;
            true
        } else {
            trace!(
                stale = tick.generation,
                current = self.generation,
                "discarding stale tick"
            );
            false
        }
    }
}

impl Drop for PlaybackClock {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let (mut clock, mut rx) = PlaybackClock::new(Duration::from_secs(2));
        let start = Instant::now();
        clock.arm();
        let tick = rx.recv().await.expect("tick");
        assert_eq!(start.elapsed().as_millis(), 2000);
        assert!(clock.accept(tick));
        assert!(!clock.is_armed());
        assert!(!clock.accept(tick), "a tick is claimed only once");
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_replaces_pending_timer() {
        let (mut clock, mut rx) = PlaybackClock::new(Duration::from_secs(1));
        let start = Instant::now();
        clock.arm();
        let second = clock.schedule(Duration::from_secs(3));
        let tick = rx.recv().await.expect("tick");
        assert_eq!(tick, second);
        assert_eq!(start.elapsed().as_millis(), 3000);
        assert!(clock.accept(tick));
    }

    #[tokio::test(start_paused = true)]
    async fn late_tick_after_cancel_is_ignored() {
        let (mut clock, mut rx) = PlaybackClock::new(Duration::from_secs(1));
        clock.arm();
        // Let it fire into the channel without consuming it.
        tokio::time::sleep(Duration::from_secs(2)).await;
        clock.cancel();
        clock.arm();
        let late = rx.recv().await.expect("late tick");
        assert!(!clock.accept(late));
        let fresh = rx.recv().await.expect("fresh tick");
        assert!(clock.accept(fresh));
    }

    #[tokio::test(start_paused = true)]
    async fn resume_waits_the_full_delay() {
        let (mut clock, mut rx) = PlaybackClock::new(Duration::from_secs(2));
        let start = Instant::now();
        clock.arm();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        clock.pause();
        assert!(!clock.is_armed());
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err(), "paused clock must not fire");
        clock.resume();
        let tick = rx.recv().await.expect("tick");
        assert!(clock.accept(tick));
        assert_eq!(start.elapsed().as_millis(), 13_500);
    }
}
