//! Capture during recording
//!
//! Screen capture runs as an external ffmpeg process; cursor input is
//! sampled in-process and funnelled into a single sample store.

pub mod input;
pub mod screen;

pub use input::{InputTracker, SampleSink, SampleStore};
pub use screen::FfmpegScreenCapture;
