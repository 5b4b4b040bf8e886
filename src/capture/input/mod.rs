//! Input tracking (cursor position and clicks)
//!
//! Collects cursor samples from independent producers through a single
//! writer and freezes them into a [`SampleStore`] for later processing
//! (path smoothing, effect timelines).

pub mod channel;
pub mod store;
pub mod types;

pub use channel::{CursorPositionSource, InputTracker, SampleSink, SharedCursorPosition};
pub use store::SampleStore;
pub use types::{CursorSample, Point, SampleKind};
