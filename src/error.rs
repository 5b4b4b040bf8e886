//! Error types for post-recording processing
//!
//! Path smoothing, timeline construction and the render pipeline all report
//! failures through [`ProcessingError`]. Recorder lifecycle errors live in
//! [`crate::recorder::RecordingError`], and failures of external tools are
//! described by [`crate::export::RenderError`].

use crate::export::RenderError;
use crate::processing::timeline::EffectKind;
use std::fmt;
use thiserror::Error;

/// Result type for processing operations
pub type ProcessingResult<T> = Result<T, ProcessingError>;

/// Which step of segment-based rendering failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentOperation {
    /// Reading duration/dimensions of a stage input
    Probe,
    /// Verbatim copy of an untouched span
    Extract,
    /// Re-encoding a window through the segment renderer
    Render,
    /// Joining the segments of one stage
    Concat,
}

impl fmt::Display for SegmentOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentOperation::Probe => write!(f, "probe"),
            SegmentOperation::Extract => write!(f, "extract"),
            SegmentOperation::Render => write!(f, "render"),
            SegmentOperation::Concat => write!(f, "concat"),
        }
    }
}

/// Errors that can occur while smoothing, building timelines or rendering
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("Insufficient data: need at least {required} cursor samples, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{kind} {operation} failed for window [{start:.3}s, {end:.3}s]: {source}")]
    RenderFailure {
        kind: EffectKind,
        operation: SegmentOperation,
        start: f64,
        end: f64,
        #[source]
        source: RenderError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Operation cancelled")]
    Cancelled,
}

impl ProcessingError {
    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        ProcessingError::InvalidConfig(message.into())
    }

    /// Window bounds of a render failure, if this error carries them
    pub fn window_bounds(&self) -> Option<(f64, f64)> {
        match self {
            ProcessingError::RenderFailure { start, end, .. } => Some((*start, *end)),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProcessingError::Cancelled)
    }
}
