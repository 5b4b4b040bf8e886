use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one recording
///
/// `Idle -> Recording -> Stopping -> Done`. Cursor samples are only frozen
/// on the way into `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordingState {
    #[default]
    Idle,
    Recording,
    Stopping,
    Done,
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordingState::Idle => write!(f, "idle"),
            RecordingState::Recording => write!(f, "recording"),
            RecordingState::Stopping => write!(f, "stopping"),
            RecordingState::Done => write!(f, "done"),
        }
    }
}
