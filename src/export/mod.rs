//! Rendering effect timelines onto recordings

pub mod command;
pub mod pipeline;
pub mod renderer;
pub mod tools;

pub use command::FfmpegCommand;
pub use pipeline::{
    plan_stage, CancelHandle, PipelineContext, PipelineOrchestrator, PipelineProgress,
    ProgressCallback, VideoSegmentDescriptor,
};
pub use renderer::{FfmpegSegmentRenderer, RenderError, RenderRequest, SegmentRenderer};
pub use tools::{FfmpegTools, SegmentTools, VideoInfo};
