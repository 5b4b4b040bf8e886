//! Screen capture through an ffmpeg child process
//!
//! ffmpeg grabs the desktop with the platform's capture device and encodes
//! straight to the output file. Stopping sends `q` on stdin, which makes
//! ffmpeg flush and finalize the container before it exits.

use crate::export::command::FfmpegCommand;
use crate::recorder::channel::{CaptureProcess, RecordingError, RecordingResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

/// How long ffmpeg gets to finalize the file after `q`
const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Input format and device for the current platform
fn platform_device() -> (&'static str, &'static str) {
    if cfg!(target_os = "macos") {
        ("avfoundation", "1:none")
    } else if cfg!(target_os = "windows") {
        ("gdigrab", "desktop")
    } else {
        ("x11grab", ":0.0")
    }
}

pub struct FfmpegScreenCapture {
    ffmpeg: PathBuf,
    input_format: String,
    device: String,
    frame_rate: f64,
    stop_timeout: Duration,
    child: Option<Child>,
    stderr_task: Option<JoinHandle<()>>,
}

impl FfmpegScreenCapture {
    pub fn new(ffmpeg: impl Into<PathBuf>, frame_rate: f64) -> Self {
        let (input_format, device) = platform_device();
        Self {
            ffmpeg: ffmpeg.into(),
            input_format: input_format.to_string(),
            device: device.to_string(),
            frame_rate,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            child: None,
            stderr_task: None,
        }
    }

    /// Override the capture input, e.g. `("x11grab", ":1.0")`
    pub fn with_device(mut self, input_format: impl Into<String>, device: impl Into<String>) -> Self {
        self.input_format = input_format.into();
        self.device = device.into();
        self
    }

    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    pub fn build_command(&self, output: &Path) -> FfmpegCommand {
        FfmpegCommand::new(&self.device, output)
            .input_args([
                "-f".to_string(),
                self.input_format.clone(),
                "-framerate".to_string(),
                format!("{}", self.frame_rate),
            ])
            .video_codec("libx264")
            .preset("ultrafast")
            .output_arg("-pix_fmt")
            .output_arg("yuv420p")
    }
}

#[async_trait]
impl CaptureProcess for FfmpegScreenCapture {
    fn id(&self) -> &str {
        &self.input_format
    }

    async fn start(&mut self, output: &Path) -> RecordingResult<()> {
        if self.child.is_some() {
            return Err(RecordingError::AlreadyRecording);
        }

        let args = self.build_command(output).build_args();
        tracing::debug!("Starting capture: {} {}", self.ffmpeg.display(), args.join(" "));

        let mut child = Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(stderr) = child.stderr.take() {
            self.stderr_task = Some(tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::debug!(target: "screen_effects::ffmpeg", "{}", line);
                }
            }));
        }

        self.child = Some(child);
        tracing::info!("Screen capture started ({} {})", self.input_format, self.device);
        Ok(())
    }

    async fn stop(&mut self) -> RecordingResult<()> {
        let mut child = self.child.take().ok_or(RecordingError::NotRecording)?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(b"q\n").await {
                tracing::warn!("Could not ask ffmpeg to quit: {}", e);
            }
        }

        let status = match tokio::time::timeout(self.stop_timeout, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                tracing::warn!("ffmpeg did not exit within {:?}, killing it", self.stop_timeout);
                child.kill().await?;
                child.wait().await?
            }
        };

        if let Some(task) = self.stderr_task.take() {
            let _ = task.await;
        }

        if status.success() {
            tracing::info!("Screen capture stopped");
            Ok(())
        } else {
            Err(RecordingError::CaptureError(format!(
                "ffmpeg exited with {status}"
            )))
        }
    }

    fn is_recording(&self) -> bool {
        self.child.is_some()
    }
}
