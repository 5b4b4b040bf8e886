//! Per-window effect rendering
//!
//! A [`SegmentRenderer`] re-encodes one effect window of a stage input into a
//! standalone segment. The pipeline treats it as opaque; the ffmpeg-backed
//! implementation below builds one bounded filter expression per window.

use crate::export::command::{format_number, FfmpegCommand};
use crate::export::tools::{resolve_tool, VideoInfo};
use crate::processing::timeline::{EffectParams, EffectWindow};
use crate::project::schema::RenderConfig;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Longest ease-in/ease-out at either edge of a window, in seconds
const MAX_RAMP_SECS: f64 = 0.5;

/// Failures of the external video tools
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("{0} not found in PATH")]
    ToolNotFound(String),

    #[error("{program} exited with code {exit_code:?}: {stderr}")]
    Failed {
        program: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Could not read video info: {0}")]
    Probe(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything needed to render one window
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    /// Stage input, the full-length video
    pub input: &'a Path,
    /// Where the rendered segment goes
    pub output: &'a Path,
    /// Bounds, parameters and anchor of the window
    pub window: &'a EffectWindow,
    pub frame_rate: f64,
    /// Dimensions and duration of `input`
    pub video: VideoInfo,
}

#[async_trait]
pub trait SegmentRenderer: Send + Sync {
    /// Produce `request.output` covering exactly the window's span
    async fn apply(&self, request: &RenderRequest<'_>) -> Result<(), RenderError>;
}

/// Renders windows by running ffmpeg once per window
#[derive(Debug, Clone)]
pub struct FfmpegSegmentRenderer {
    ffmpeg: PathBuf,
    preset: String,
    crf: u8,
}

impl FfmpegSegmentRenderer {
    pub fn new(ffmpeg: impl Into<PathBuf>, preset: impl Into<String>, crf: u8) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            preset: preset.into(),
            crf,
        }
    }

    pub fn from_config(config: &RenderConfig) -> Result<Self, RenderError> {
        Ok(Self::new(
            resolve_tool(config.ffmpeg_path.as_deref(), "ffmpeg")?,
            config.preset.clone(),
            config.crf,
        ))
    }
}

#[async_trait]
impl SegmentRenderer for FfmpegSegmentRenderer {
    async fn apply(&self, request: &RenderRequest<'_>) -> Result<(), RenderError> {
        let window = request.window;
        let filter = effect_filter(window, request.video, request.frame_rate);

        tracing::debug!(
            "Rendering {} window [{:.3}s, {:.3}s] with filter {}",
            window.kind(),
            window.start,
            window.end,
            filter
        );

        FfmpegCommand::new(request.input, request.output)
            .seek(window.start)
            .duration(window.duration())
            .video_filter(filter)
            .video_codec("libx264")
            .preset(self.preset.clone())
            .crf(self.crf)
            .frame_rate(request.frame_rate)
            .audio_codec("copy")
            .run(&self.ffmpeg)
            .await
    }
}

/// Filter chain for one window, in window-local time
///
/// Zoom and follow ease in from and out to the full frame over the first and
/// last ramp of the window. Blur is applied at full strength throughout.
pub fn effect_filter(window: &EffectWindow, video: VideoInfo, frame_rate: f64) -> String {
    let duration = window.duration();
    let ramp = MAX_RAMP_SECS.min(duration / 2.0).max(1e-3);
    let d = format_number(duration);
    let r = format_number(ramp);
    let ax = format_number(window.anchor.x);
    let ay = format_number(window.anchor.y);
    let size = format!("{}x{}", video.width, video.height);

    let chain = match window.params {
        EffectParams::Zoom { factor } => {
            // Eased weight in [0, 1] over the window
            let ease = format!("min(1,min(it/{r},({d}-it)/{r}))");
            format!(
                "zoompan=z='1+({f}-1)*{ease}':x='max(0,min(iw-iw/zoom,{ax}-iw/zoom/2))':y='max(0,min(ih-ih/zoom,{ay}-ih/zoom/2))':d=1:s={size}:fps={fps}",
                f = format_number(factor),
                fps = format_number(frame_rate),
            )
        }
        EffectParams::Follow { scale } => {
            let ease = format!("min(1,min(t/{r},({d}-t)/{r}))");
            let s = format_number(scale);
            format!(
                "crop=w=iw/{s}:h=ih/{s}:x='clip(iw/2+({ax}-iw/2)*{ease}-ow/2,0,iw-ow)':y='clip(ih/2+({ay}-ih/2)*{ease}-oh/2,0,ih-oh)',scale={w}:{h}",
                w = video.width,
                h = video.height,
            )
        }
        EffectParams::Blur { radius } => format!("boxblur={radius}:1"),
    };

    format!("{chain},format=yuv420p")
}
