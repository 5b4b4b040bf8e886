//! Screen Effects - cursor smoothing and click-driven effects for screen recordings.
//!
//! A recording yields a video file plus a frozen [`SampleStore`] of cursor
//! positions and clicks. From the samples this crate derives a smooth cursor
//! path ([`PathSmoother`]) and a timeline of zoom, blur and follow windows
//! ([`TimelineBuilder`]), which the [`PipelineOrchestrator`] renders onto the
//! video segment by segment.

pub mod capture;
pub mod commands;
pub mod error;
pub mod export;
pub mod processing;
pub mod project;
pub mod recorder;

pub use capture::input::{CursorSample, Point, SampleKind, SampleStore};
pub use error::{ProcessingError, ProcessingResult};
pub use export::{PipelineContext, PipelineOrchestrator, SegmentRenderer, SegmentTools};
pub use processing::{EffectKind, EffectParams, EffectWindow, PathSmoother, SmoothedPoint, Timeline, TimelineBuilder};
pub use project::ProjectConfig;
pub use recorder::{Recorder, RecordingState};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber
///
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "screen_effects=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
