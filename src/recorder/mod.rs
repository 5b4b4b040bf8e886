//! Recording lifecycle
//!
//! Coordinates the screen-capture process with cursor sampling and freezes
//! the collected samples once the capture has fully stopped.

pub mod channel;
pub mod coordinator;
pub mod state;

pub use channel::{CaptureProcess, RecordingError, RecordingResult};
pub use coordinator::{Recorder, RecordingSession};
pub use state::RecordingState;
