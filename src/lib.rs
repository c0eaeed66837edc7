pub mod config;
pub mod error;
pub mod events;
pub mod library;
pub mod playback;
pub mod scan;
pub mod session;
pub mod tasks {
    pub mod keys;
    pub mod presenter;
    pub(crate) mod sequencer;
}

pub use error::Error;
pub use playback::{
    PlaybackSummary, SequencerControl, SequencerHandle, start_grid_playback, start_playback,
    start_sequential_playback,
};
pub use session::SessionController;
