//! Stream-level video operations used between rendered windows
//!
//! Probing, verbatim span extraction and concatenation. None of these
//! re-encode; only the [`SegmentRenderer`](crate::export::SegmentRenderer)
//! touches pixels.

use crate::export::command::{program_name, stderr_tail, FfmpegCommand};
use crate::export::renderer::RenderError;
use crate::project::schema::RenderConfig;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Basic facts about a video file
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    /// Container duration in seconds
    pub duration: f64,
    pub width: u32,
    pub height: u32,
}

#[async_trait]
pub trait SegmentTools: Send + Sync {
    async fn probe(&self, input: &Path) -> Result<VideoInfo, RenderError>;

    /// Copy `[start, end)` of `input` without re-encoding; `None` runs to the end
    async fn copy_span(
        &self,
        input: &Path,
        output: &Path,
        start: f64,
        end: Option<f64>,
    ) -> Result<(), RenderError>;

    /// Join `segments` in order into `output`, using `list_path` as scratch
    async fn concat(
        &self,
        segments: &[PathBuf],
        list_path: &Path,
        output: &Path,
    ) -> Result<(), RenderError>;
}

/// [`SegmentTools`] backed by the ffmpeg and ffprobe binaries
#[derive(Debug, Clone)]
pub struct FfmpegTools {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegTools {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Use configured binaries, falling back to a PATH lookup
    pub fn discover(config: &RenderConfig) -> Result<Self, RenderError> {
        Ok(Self::new(
            resolve_tool(config.ffmpeg_path.as_deref(), "ffmpeg")?,
            resolve_tool(config.ffprobe_path.as_deref(), "ffprobe")?,
        ))
    }
}

pub(crate) fn resolve_tool(explicit: Option<&Path>, name: &str) -> Result<PathBuf, RenderError> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => which::which(name).map_err(|_| RenderError::ToolNotFound(name.to_string())),
    }
}

#[async_trait]
impl SegmentTools for FfmpegTools {
    async fn probe(&self, input: &Path) -> Result<VideoInfo, RenderError> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height:format=duration",
                "-of",
                "json",
            ])
            .arg(input)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(RenderError::Failed {
                program: program_name(&self.ffprobe),
                exit_code: output.status.code(),
                stderr: stderr_tail(&output.stderr),
            });
        }

        parse_probe_output(&String::from_utf8_lossy(&output.stdout))
    }

    async fn copy_span(
        &self,
        input: &Path,
        output: &Path,
        start: f64,
        end: Option<f64>,
    ) -> Result<(), RenderError> {
        let mut cmd = FfmpegCommand::new(input, output).seek(start);
        if let Some(end) = end {
            cmd = cmd.duration(end - start);
        }

        cmd.stream_copy()
            .output_arg("-avoid_negative_ts")
            .output_arg("make_zero")
            .run(&self.ffmpeg)
            .await
    }

    async fn concat(
        &self,
        segments: &[PathBuf],
        list_path: &Path,
        output: &Path,
    ) -> Result<(), RenderError> {
        tokio::fs::write(list_path, concat_list(segments)).await?;

        FfmpegCommand::new(list_path, output)
            .input_args(["-f", "concat", "-safe", "0"])
            .stream_copy()
            .run(&self.ffmpeg)
            .await
    }
}

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Parse `ffprobe -of json` output into [`VideoInfo`]
pub fn parse_probe_output(json: &str) -> Result<VideoInfo, RenderError> {
    let parsed: ProbeOutput =
        serde_json::from_str(json).map_err(|e| RenderError::Probe(e.to_string()))?;

    let stream = parsed
        .streams
        .first()
        .ok_or_else(|| RenderError::Probe("no video stream".to_string()))?;
    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(RenderError::Probe("missing frame size".to_string())),
    };

    let duration = parsed
        .format
        .and_then(|f| f.duration)
        .ok_or_else(|| RenderError::Probe("missing duration".to_string()))?;
    let duration: f64 = duration
        .trim()
        .parse()
        .map_err(|_| RenderError::Probe(format!("invalid duration '{duration}'")))?;

    Ok(VideoInfo {
        duration,
        width,
        height,
    })
}

/// Body of an ffmpeg concat demuxer list
pub fn concat_list(segments: &[PathBuf]) -> String {
    segments
        .iter()
        .map(|path| {
            let escaped = path.to_string_lossy().replace('\'', "'\\''");
            format!("file '{escaped}'\n")
        })
        .collect()
}
