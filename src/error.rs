use thiserror::Error;

/// Library error type for playback and library operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A session cannot start over an empty image collection.
    #[error("cannot start playback without images")]
    NoImages,

    /// Another slideshow or grid session is already running.
    #[error("a playback session is already running")]
    SessionBusy,

    /// The sequencer was asked to start while the session flag is down.
    #[error("playback session is not running")]
    SessionNotRunning,

    /// One or more configured photo directories are invalid or unreadable.
    #[error("invalid photo directory: {0}")]
    BadDir(String),

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
