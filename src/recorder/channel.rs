//! Capture process trait
//!
//! Defines the interface to the external screen-capture process that runs
//! alongside cursor sampling.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during recording
#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("Already recording")]
    AlreadyRecording,

    #[error("Not recording")]
    NotRecording,

    #[error("Invalid recorder state: {0}")]
    InvalidState(String),

    #[error("Capture error: {0}")]
    CaptureError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Result type for recording operations
pub type RecordingResult<T> = Result<T, RecordingError>;

/// An external process producing the screen recording
///
/// `stop` must not return before the process has exited and its output file
/// is complete. The recorder relies on that to decide when the cursor
/// samples may be frozen.
#[async_trait]
pub trait CaptureProcess: Send + Sync {
    /// Identifier used in logs (e.g. "ffmpeg-avfoundation")
    fn id(&self) -> &str;

    /// Begin writing the recording to `output`
    async fn start(&mut self, output: &Path) -> RecordingResult<()>;

    /// Ask the process to finish and wait for it to exit
    async fn stop(&mut self) -> RecordingResult<()>;

    /// Check if the process is currently capturing
    fn is_recording(&self) -> bool;
}
