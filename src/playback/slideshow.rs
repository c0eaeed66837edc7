use rand::rngs::StdRng;
use tracing::debug;

use super::order::PlaylistOrder;
use super::{Navigated, PlaybackMode, Sequencer, SequencerState, TickOutcome};
use crate::config::PlaybackConfiguration;
use crate::error::Error;
use crate::events::DisplayUpdate;

/// Single-image playback: `Idle → Running ⇄ Paused → Stopped`.
#[derive(Debug)]
pub struct SlideshowSequencer {
    order: PlaylistOrder,
    state: SequencerState,
    fade: bool,
}

impl SlideshowSequencer {
    pub fn new(
        image_count: usize,
        config: &PlaybackConfiguration,
        rng: StdRng,
    ) -> Result<Self, Error> {
        if image_count == 0 {
            return Err(Error::NoImages);
        }
        Ok(Self {
            order: PlaylistOrder::new(image_count, config.shuffle, config.loop_playback, rng),
            state: SequencerState::Idle,
            fade: config.fade_transition,
        })
    }

    pub fn current(&self) -> Option<usize> {
        self.order.current()
    }

    fn goto(&mut self, to: SequencerState) -> bool {
        if self.state == to {
            return false;
        }
        debug!(from = ?self.state, ?to, "slideshow state change");
        self.state = to;
        true
    }

    fn navigate(&mut self, step: impl FnOnce(&mut PlaylistOrder) -> Option<usize>) -> Option<Navigated> {
        if !matches!(self.state, SequencerState::Running | SequencerState::Paused) {
            return None;
        }
        let update = step(&mut self.order).map(|index| DisplayUpdate::single(index, self.fade));
        Some(Navigated {
            update,
            rearm: self.state == SequencerState::Running,
        })
    }
}

impl Sequencer for SlideshowSequencer {
    fn mode(&self) -> PlaybackMode {
        PlaybackMode::Sequential
    }

    fn state(&self) -> SequencerState {
        self.state
    }

    fn start(&mut self) -> Vec<DisplayUpdate> {
        if self.state != SequencerState::Idle {
            return Vec::new();
        }
        let Some(first) = self.order.first() else {
            self.goto(SequencerState::Stopped);
            return Vec::new();
        };
        self.goto(SequencerState::Running);
        vec![DisplayUpdate::single(first, false)]
    }

    fn on_tick(&mut self) -> TickOutcome {
        if self.state != SequencerState::Running {
            return TickOutcome::Ignored;
        }
        match self.order.next() {
            Some(index) => {
                debug!(index, "slideshow advance");
                TickOutcome::Display(DisplayUpdate::single(index, self.fade))
            }
            None => {
                self.goto(SequencerState::Stopped);
                TickOutcome::Finished
            }
        }
    }

    fn pause(&mut self) -> bool {
        self.state == SequencerState::Running && self.goto(SequencerState::Paused)
    }

    fn resume(&mut self) -> bool {
        self.state == SequencerState::Paused && self.goto(SequencerState::Running)
    }

    fn next(&mut self) -> Option<Navigated> {
        self.navigate(PlaylistOrder::next)
    }

    fn previous(&mut self) -> Option<Navigated> {
        self.navigate(PlaylistOrder::previous)
    }

    fn stop(&mut self) -> bool {
        self.goto(SequencerState::Stopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn sequencer(len: usize, shuffle: bool, looping: bool) -> SlideshowSequencer {
        let config = PlaybackConfiguration {
            shuffle,
            loop_playback: looping,
            fade_transition: true,
            ..PlaybackConfiguration::default()
        };
        SlideshowSequencer::new(len, &config, StdRng::seed_from_u64(11)).unwrap()
    }

    fn shown(update: TickOutcome) -> usize {
        match update {
            TickOutcome::Display(u) => u.image_index,
            other => panic!("expected a display, got {other:?}"),
        }
    }

    #[test]
    fn rejects_empty_collection() {
        let err = SlideshowSequencer::new(0, &PlaybackConfiguration::default(), StdRng::seed_from_u64(0));
        assert!(matches!(err, Err(Error::NoImages)));
    }

    #[test]
    fn linear_run_visits_each_index_once_then_finishes() {
        let mut seq = sequencer(5, false, false);
        let first = seq.start();
        assert_eq!(first, vec![DisplayUpdate::single(0, false)]);
        let rest: Vec<usize> = (0..4).map(|_| shown(seq.on_tick())).collect();
        assert_eq!(rest, vec![1, 2, 3, 4]);
        assert_eq!(seq.on_tick(), TickOutcome::Finished);
        assert_eq!(seq.state(), SequencerState::Stopped);
        assert_eq!(seq.on_tick(), TickOutcome::Ignored);
    }

    #[test]
    fn shuffled_run_is_a_permutation() {
        let mut seq = sequencer(12, true, false);
        let mut visited: HashSet<usize> = seq.start().iter().map(|u| u.image_index).collect();
        loop {
            match seq.on_tick() {
                TickOutcome::Display(u) => assert!(visited.insert(u.image_index)),
                TickOutcome::Finished => break,
                TickOutcome::Ignored => panic!("running sequencer ignored a tick"),
            }
        }
        assert_eq!(visited.len(), 12);
    }

    #[test]
    fn later_displays_fade_when_configured() {
        let mut seq = sequencer(3, false, true);
        assert!(!seq.start()[0].use_fade);
        let TickOutcome::Display(update) = seq.on_tick() else {
            panic!("expected display");
        };
        assert!(update.use_fade);
    }

    #[test]
    fn pause_and_resume_only_from_valid_states() {
        let mut seq = sequencer(3, false, false);
        assert!(!seq.pause(), "idle cannot pause");
        seq.start();
        assert!(!seq.resume(), "running cannot resume");
        assert!(seq.pause());
        assert!(!seq.pause());
        assert_eq!(seq.on_tick(), TickOutcome::Ignored);
        assert!(seq.resume());
        assert_eq!(shown(seq.on_tick()), 1, "pause neither skips nor repeats");
    }

    #[test]
    fn navigation_while_paused_keeps_paused() {
        let mut seq = sequencer(4, false, false);
        seq.start();
        seq.pause();
        let nav = seq.next().expect("paused allows navigation");
        assert_eq!(nav.update.map(|u| u.image_index), Some(1));
        assert!(!nav.rearm);
        assert_eq!(seq.state(), SequencerState::Paused);
    }

    #[test]
    fn previous_right_after_start_stays_on_first_image() {
        let mut seq = sequencer(4, false, false);
        seq.start();
        let nav = seq.previous().unwrap();
        assert_eq!(nav.update, None);
        assert!(nav.rearm);
        assert_eq!(seq.current(), Some(0));
    }

    #[test]
    fn manual_next_at_the_end_does_not_stop() {
        let mut seq = sequencer(2, false, false);
        seq.start();
        seq.next();
        let nav = seq.next().unwrap();
        assert_eq!(nav.update, None);
        assert_eq!(seq.state(), SequencerState::Running);
        assert_eq!(seq.on_tick(), TickOutcome::Finished);
    }

    #[test]
    fn stop_is_terminal_and_idempotent() {
        let mut seq = sequencer(3, false, true);
        seq.start();
        assert!(seq.stop());
        assert!(!seq.stop());
        assert!(seq.next().is_none());
        assert!(!seq.resume());
        assert!(seq.start().is_empty());
    }
}
