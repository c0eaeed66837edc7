use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use tracing::warn;

/// Shortest per-image delay the settings layer lets through.
pub const MIN_DELAY: Duration = Duration::from_secs(1);
/// Longest per-image delay the settings layer lets through.
pub const MAX_DELAY: Duration = Duration::from_secs(60);
/// Largest number of grid rows or columns accepted from configuration.
pub const MAX_GRID_SIDE: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct GridSettings {
    /// Run the auto-refreshing grid instead of the single-image slideshow.
    pub enabled: bool,
    pub rows: usize,
    pub columns: usize,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            rows: 3,
            columns: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Configuration {
    /// Directories scanned for images, in order.
    pub photo_library_paths: Vec<PathBuf>,
    /// Descend into subdirectories while scanning.
    pub recursive: bool,
    /// Time each image (or grid state) stays on screen before the next tick.
    #[serde(with = "humantime_serde")]
    pub delay: Duration,
    pub shuffle: bool,
    #[serde(rename = "loop")]
    pub loop_playback: bool,
    pub fade_transition: bool,
    pub grid: GridSettings,
    /// How long the transient "paused"/"resumed" overlay stays visible.
    #[serde(with = "humantime_serde")]
    pub notice_duration: Duration,
    /// Deterministic RNG seed for shuffles and grid refreshes.
    pub seed: Option<u64>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            photo_library_paths: Vec::new(),
            recursive: true,
            delay: Duration::from_secs(3),
            shuffle: false,
            loop_playback: false,
            fade_transition: false,
            grid: GridSettings::default(),
            notice_duration: Duration::from_secs(1),
            seed: None,
        }
    }
}

impl Configuration {
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let cfg: Self = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(cfg)
    }

    /// Check invariants and clamp the delay into `MIN_DELAY..=MAX_DELAY`.
    pub fn validated(mut self) -> Result<Self> {
        ensure!(
            !self.photo_library_paths.is_empty(),
            "photo-library-paths must list at least one directory"
        );
        ensure!(
            (1..=MAX_GRID_SIDE).contains(&self.grid.rows)
                && (1..=MAX_GRID_SIDE).contains(&self.grid.columns),
            "grid rows and columns must be between 1 and {MAX_GRID_SIDE} (got {}x{})",
            self.grid.rows,
            self.grid.columns
        );
        let clamped = clamp_delay(self.delay);
        if clamped != self.delay {
            warn!(
                requested = ?self.delay,
                clamped = ?clamped,
                "delay outside supported range; clamping"
            );
            self.delay = clamped;
        }
        Ok(self)
    }

    pub fn playback(&self) -> PlaybackConfiguration {
        PlaybackConfiguration {
            delay: self.delay,
            shuffle: self.shuffle,
            loop_playback: self.loop_playback,
            fade_transition: self.fade_transition,
            grid_mode: self.grid.enabled,
            rows: self.grid.rows,
            columns: self.grid.columns,
            notice_duration: self.notice_duration,
            seed: self.seed,
        }
    }
}

pub fn clamp_delay(delay: Duration) -> Duration {
    delay.clamp(MIN_DELAY, MAX_DELAY)
}

/// Immutable per-session settings handed to a sequencer.
///
/// Changing any of these requires stopping the session and starting a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackConfiguration {
    pub delay: Duration,
    pub shuffle: bool,
    pub loop_playback: bool,
    pub fade_transition: bool,
    pub grid_mode: bool,
    pub rows: usize,
    pub columns: usize,
    pub notice_duration: Duration,
    pub seed: Option<u64>,
}

impl Default for PlaybackConfiguration {
    fn default() -> Self {
        Configuration::default().playback()
    }
}

impl PlaybackConfiguration {
    pub fn cell_count(&self) -> usize {
        self.rows.saturating_mul(self.columns)
    }
}
