use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort session startup. There is no degraded capture mode.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid session configuration: {0}")]
    InvalidConfig(String),

    #[error("no default audio input device available")]
    NoInputDevice,

    #[error("failed to query input device: {0}")]
    DeviceQuery(String),

    #[error("failed to open input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start input stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("failed to stop input stream: {0}")]
    PauseStream(#[from] cpal::PauseStreamError),
}

/// Recoverable failures while opening an audio file. The active source is
/// left untouched whenever one of these is returned.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open audio file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to probe audio format of {path}: {source}")]
    Probe {
        path: PathBuf,
        source: symphonia::core::errors::Error,
    },

    #[error("no audio tracks found in {0}")]
    NoTrack(PathBuf),

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: symphonia::core::errors::Error,
    },

    #[error("{0} contains no audio samples")]
    Empty(PathBuf),
}
