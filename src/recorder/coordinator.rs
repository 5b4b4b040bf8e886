//! Recording coordinator
//!
//! Runs the capture process and the cursor input tracker side by side and
//! enforces the recorder state machine. Stopping waits for the capture
//! process to exit before the sample funnel is frozen, so every sample that
//! belongs to the recording is in the store handed to processing.

use crate::capture::input::channel::MIN_SAMPLE_INTERVAL;
use crate::capture::input::{CursorPositionSource, InputTracker, SampleSink, SampleStore};
use crate::recorder::channel::{CaptureProcess, RecordingError, RecordingResult};
use crate::recorder::state::RecordingState;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Everything a finished recording yields
#[derive(Debug, Clone)]
pub struct RecordingSession {
    pub id: Uuid,
    pub samples: SampleStore,
    pub started_at: DateTime<Utc>,
    pub video_path: PathBuf,
}

pub struct Recorder {
    capture: Box<dyn CaptureProcess>,
    positions: Arc<dyn CursorPositionSource>,
    sample_interval: Duration,
    state: RecordingState,
    tracker: Option<InputTracker>,
    started_at: Option<DateTime<Utc>>,
    output_path: Option<PathBuf>,
    session: Option<RecordingSession>,
}

impl Recorder {
    /// Create a recorder sampling `positions` once per output frame
    pub fn new(
        capture: Box<dyn CaptureProcess>,
        positions: Arc<dyn CursorPositionSource>,
        frame_rate: f64,
    ) -> RecordingResult<Self> {
        if !frame_rate.is_finite() || frame_rate <= 0.0 {
            return Err(RecordingError::ConfigurationError(format!(
                "frame rate must be positive, got {frame_rate}"
            )));
        }

        let sample_interval = Duration::try_from_secs_f64(1.0 / frame_rate)
            .ok()
            .filter(|interval| *interval >= MIN_SAMPLE_INTERVAL)
            .ok_or_else(|| {
                RecordingError::ConfigurationError(format!(
                    "frame rate {frame_rate} is out of range for cursor sampling"
                ))
            })?;

        Ok(Self {
            capture,
            positions,
            sample_interval,
            state: RecordingState::Idle,
            tracker: None,
            started_at: None,
            output_path: None,
            session: None,
        })
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecordingState::Recording
    }

    pub fn is_done(&self) -> bool {
        self.state == RecordingState::Done
    }

    /// Start capture and cursor sampling
    ///
    /// Returns a sink for the click hook. Fails unless the recorder is idle.
    pub async fn start(&mut self, output: &Path) -> RecordingResult<SampleSink> {
        match self.state {
            RecordingState::Idle => {}
            RecordingState::Recording => return Err(RecordingError::AlreadyRecording),
            other => {
                return Err(RecordingError::InvalidState(format!(
                    "cannot start while {other}"
                )))
            }
        }

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        self.capture.start(output).await?;

        let tracker = InputTracker::start(self.positions.clone(), self.sample_interval);
        let sink = tracker.sink();

        self.tracker = Some(tracker);
        self.started_at = Some(Utc::now());
        self.output_path = Some(output.to_path_buf());
        self.state = RecordingState::Recording;

        tracing::info!(
            "Recording started with {} -> {:?}",
            self.capture.id(),
            output
        );
        Ok(sink)
    }

    /// Stop capture, wait for it to exit, then freeze the samples
    ///
    /// A capture error is returned after the samples have been frozen; the
    /// recorder still ends in `Done`.
    pub async fn stop(&mut self) -> RecordingResult<()> {
        if self.state != RecordingState::Recording {
            return Err(RecordingError::NotRecording);
        }
        self.state = RecordingState::Stopping;

        let mut tracker = self
            .tracker
            .take()
            .ok_or_else(|| RecordingError::InvalidState("input tracker missing".to_string()))?;

        tracker.stop_sampling().await;

        let capture_result = self.capture.stop().await;
        if let Err(e) = &capture_result {
            tracing::error!("Capture process {} failed to stop cleanly: {}", self.capture.id(), e);
        }

        let samples = match tracker.freeze().await {
            Ok(samples) => samples,
            Err(e) => {
                self.state = RecordingState::Idle;
                return Err(e);
            }
        };

        let session = RecordingSession {
            id: Uuid::new_v4(),
            samples,
            started_at: self.started_at.take().unwrap_or_else(Utc::now),
            video_path: self.output_path.take().unwrap_or_default(),
        };

        tracing::info!(
            "Recording {} done ({} samples over {:.2}s)",
            session.id,
            session.samples.len(),
            session.samples.duration().as_secs_f64()
        );

        self.session = Some(session);
        self.state = RecordingState::Done;

        capture_result
    }

    /// Hand out the finished session and return to idle
    pub fn take_session(&mut self) -> RecordingResult<RecordingSession> {
        if self.state != RecordingState::Done {
            return Err(RecordingError::InvalidState(format!(
                "no finished recording while {}",
                self.state
            )));
        }

        let session = self
            .session
            .take()
            .ok_or_else(|| RecordingError::InvalidState("session already taken".to_string()))?;
        self.state = RecordingState::Idle;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::input::SharedCursorPosition;
    use async_trait::async_trait;
    use parking_lot::Mutex as ParkingMutex;

    /// Capture stand-in that delivers one late click while shutting down
    struct FakeCapture {
        running: bool,
        late_click: Arc<ParkingMutex<Option<SampleSink>>>,
        fail_stop: bool,
    }

    #[async_trait]
    impl CaptureProcess for FakeCapture {
        fn id(&self) -> &str {
            "fake"
        }

        async fn start(&mut self, _output: &Path) -> RecordingResult<()> {
            self.running = true;
            Ok(())
        }

        async fn stop(&mut self) -> RecordingResult<()> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            if let Some(sink) = self.late_click.lock().take() {
                sink.record_click(99.0, 99.0);
            }
            self.running = false;
            if self.fail_stop {
                return Err(RecordingError::CaptureError("exit status 1".to_string()));
            }
            Ok(())
        }

        fn is_recording(&self) -> bool {
            self.running
        }
    }

    fn make_recorder(fail_stop: bool) -> (Recorder, Arc<ParkingMutex<Option<SampleSink>>>) {
        let late_click = Arc::new(ParkingMutex::new(None));
        let capture = FakeCapture {
            running: false,
            late_click: late_click.clone(),
            fail_stop,
        };
        let cursor = SharedCursorPosition::new();
        cursor.update(1.0, 1.0);
        let recorder = Recorder::new(Box::new(capture), Arc::new(cursor), 200.0).unwrap();
        (recorder, late_click)
    }

    #[test]
    fn test_unsamplable_frame_rates_rejected() {
        for frame_rate in [0.0, -30.0, f64::NAN, f64::INFINITY, 1e12, f64::MAX, 1e-300] {
            let capture = FakeCapture {
                running: false,
                late_click: Arc::new(ParkingMutex::new(None)),
                fail_stop: false,
            };
            let result = Recorder::new(
                Box::new(capture),
                Arc::new(SharedCursorPosition::new()),
                frame_rate,
            );
            assert!(
                matches!(result, Err(RecordingError::ConfigurationError(_))),
                "frame rate {frame_rate} accepted"
            );
        }
    }

    #[tokio::test]
    async fn test_full_cycle_freezes_after_capture_exit() {
        let dir = tempfile::tempdir().unwrap();
        let (mut recorder, late_click) = make_recorder(false);

        let sink = recorder.start(&dir.path().join("out.mp4")).await.unwrap();
        assert!(recorder.is_recording());
        *late_click.lock() = Some(sink.clone());

        sink.record_click(5.0, 5.0);
        tokio::time::sleep(Duration::from_millis(20)).await;

        recorder.stop().await.unwrap();
        assert!(recorder.is_done());

        let session = recorder.take_session().unwrap();
        assert_eq!(recorder.state(), RecordingState::Idle);
        assert_eq!(session.samples.clicks().count(), 2);
        assert!(session.samples.clicks().any(|c| c.x == 99.0));
        assert!(session.samples.positions().count() > 0);
        assert_eq!(session.video_path, dir.path().join("out.mp4"));
    }

    #[tokio::test]
    async fn test_state_guards() {
        let dir = tempfile::tempdir().unwrap();
        let (mut recorder, _) = make_recorder(false);

        assert!(matches!(
            recorder.stop().await,
            Err(RecordingError::NotRecording)
        ));
        assert!(recorder.take_session().is_err());

        recorder.start(&dir.path().join("a.mp4")).await.unwrap();
        assert!(matches!(
            recorder.start(&dir.path().join("b.mp4")).await,
            Err(RecordingError::AlreadyRecording)
        ));

        recorder.stop().await.unwrap();
        assert!(matches!(
            recorder.start(&dir.path().join("c.mp4")).await,
            Err(RecordingError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_capture_failure_still_freezes() {
        let dir = tempfile::tempdir().unwrap();
        let (mut recorder, _) = make_recorder(true);

        let sink = recorder.start(&dir.path().join("out.mp4")).await.unwrap();
        sink.record_click(1.0, 2.0);

        assert!(matches!(
            recorder.stop().await,
            Err(RecordingError::CaptureError(_))
        ));
        assert!(recorder.is_done());
        assert_eq!(recorder.take_session().unwrap().samples.clicks().count(), 1);
    }

    #[test]
    fn test_invalid_frame_rate() {
        let capture = FakeCapture {
            running: false,
            late_click: Arc::new(ParkingMutex::new(None)),
            fail_stop: false,
        };
        let result = Recorder::new(Box::new(capture), Arc::new(SharedCursorPosition::new()), 0.0);
        assert!(matches!(result, Err(RecordingError::ConfigurationError(_))));
    }
}
