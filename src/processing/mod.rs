//! Processing module for post-recording transformations
//!
//! Everything here runs on a frozen [`SampleStore`](crate::capture::input::SampleStore):
//! cursor path smoothing and effect timeline construction.

pub mod cursor_smoothing;
pub mod spline;
pub mod spring;
pub mod timeline;

pub use cursor_smoothing::{export_path_csv, PathSmoother, SmoothedPoint};
pub use spline::{CentripetalSpline, ControlPoint, SplineSegment};
pub use spring::{Spring2D, SpringParams, SpringState};
pub use timeline::{merge_windows, EffectKind, EffectParams, EffectWindow, Timeline, TimelineBuilder};
