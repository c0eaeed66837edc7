use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use tracing::debug;

use super::{Navigated, PlaybackMode, Sequencer, SequencerState, TickOutcome};
use crate::config::PlaybackConfiguration;
use crate::error::Error;
use crate::events::DisplayUpdate;

/// Auto-refreshing photo grid.
///
/// Every tick swaps the image in one cell. Fairness rules:
/// - A cycle starts with the visible images counted as shown and ends once
///   every image has appeared, i.e. after `images - cells` refreshes.
/// - Refreshes pick among images neither shown this cycle nor visible.
/// - Cells are refreshed in passes; no cell is picked twice in a pass.
#[derive(Debug)]
pub struct GridRefreshSequencer {
    image_count: usize,
    rows: usize,
    columns: usize,
    cells: Vec<usize>,
    shown: HashSet<usize>,
    refreshed_cells: HashSet<usize>,
    looping: bool,
    fade: bool,
    state: SequencerState,
    rng: StdRng,
}

impl GridRefreshSequencer {
    pub fn new(
        image_count: usize,
        rows: usize,
        columns: usize,
        config: &PlaybackConfiguration,
        rng: StdRng,
    ) -> Result<Self, Error> {
        if image_count == 0 {
            return Err(Error::NoImages);
        }
        let rows = rows.max(1);
        let columns = columns.max(1);
        Ok(Self {
            image_count,
            rows,
            columns,
            cells: Vec::new(),
            shown: HashSet::new(),
            refreshed_cells: HashSet::new(),
            looping: config.loop_playback,
            fade: config.fade_transition,
            state: SequencerState::Idle,
            rng,
        })
    }

    /// Image index per visible cell, row-major.
    pub fn cells(&self) -> &[usize] {
        &self.cells
    }

    fn begin_cycle(&mut self) {
        self.shown.clear();
        self.shown.extend(self.cells.iter().copied());
    }

    fn cycle_complete(&self) -> bool {
        self.shown.len() >= self.image_count
    }

    fn refresh(&mut self) -> DisplayUpdate {
        if self.cycle_complete() {
            debug!(images = self.image_count, "grid cycle restarted");
            self.begin_cycle();
        }
        if self.refreshed_cells.len() >= self.cells.len() {
            self.refreshed_cells.clear();
        }

        let refreshed = &self.refreshed_cells;
        let cell = (0..self.cells.len())
            .filter(|c| !refreshed.contains(c))
            .choose(&mut self.rng)
            .unwrap_or(0);

        let shown = &self.shown;
        let visible = &self.cells;
        let image = (0..self.image_count)
            .filter(|i| !shown.contains(i) && !visible.contains(i))
            .choose(&mut self.rng)
            .unwrap_or(self.cells[cell]);

        self.cells[cell] = image;
        self.shown.insert(image);
        self.refreshed_cells.insert(cell);
        debug!(
            cell,
            image,
            shown = self.shown.len(),
            refreshed_cells = self.refreshed_cells.len(),
            "grid refresh"
        );
        DisplayUpdate::in_cell(cell, image, self.fade)
    }

    fn goto(&mut self, to: SequencerState) -> bool {
        if self.state == to {
            return false;
        }
        debug!(from = ?self.state, ?to, "grid state change");
        self.state = to;
        true
    }
}

impl Sequencer for GridRefreshSequencer {
    fn mode(&self) -> PlaybackMode {
        PlaybackMode::Grid {
            rows: self.rows,
            columns: self.columns,
        }
    }

    fn state(&self) -> SequencerState {
        self.state
    }

    fn start(&mut self) -> Vec<DisplayUpdate> {
        if self.state != SequencerState::Idle {
            return Vec::new();
        }
        let visible = self.rows.saturating_mul(self.columns).min(self.image_count);
        self.cells = (0..visible).collect();
        self.refreshed_cells.clear();
        self.begin_cycle();
        self.goto(SequencerState::Running);
        self.cells
            .iter()
            .enumerate()
            .map(|(cell, &image)| DisplayUpdate::in_cell(cell, image, false))
            .collect()
    }

    fn on_tick(&mut self) -> TickOutcome {
        if self.state != SequencerState::Running {
            return TickOutcome::Ignored;
        }
        if self.cycle_complete() && !self.looping {
            self.goto(SequencerState::Stopped);
            return TickOutcome::Finished;
        }
        TickOutcome::Display(self.refresh())
    }

    fn pause(&mut self) -> bool {
        self.state == SequencerState::Running && self.goto(SequencerState::Paused)
    }

    fn resume(&mut self) -> bool {
        self.state == SequencerState::Paused && self.goto(SequencerState::Running)
    }

    /// Refresh one cell right away. At the end of a non-looping cycle the
    /// grid stays as is and the next tick ends the session.
    fn next(&mut self) -> Option<Navigated> {
        if !matches!(self.state, SequencerState::Running | SequencerState::Paused) {
            return None;
        }
        let update = if self.cycle_complete() && !self.looping {
            None
        } else {
            Some(self.refresh())
        };
        Some(Navigated {
            update,
            rearm: self.state == SequencerState::Running,
        })
    }

    /// The grid only moves forward.
    fn previous(&mut self) -> Option<Navigated> {
        None
    }

    fn stop(&mut self) -> bool {
        self.goto(SequencerState::Stopped)
    }
}
