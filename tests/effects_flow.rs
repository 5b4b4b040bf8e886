//! Recording to rendered output with stand-in video tools

use async_trait::async_trait;
use parking_lot::Mutex;
use screen_effects::capture::input::{InputTracker, SharedCursorPosition};
use screen_effects::export::{RenderError, RenderRequest, VideoInfo};
use screen_effects::project::{EffectsConfig, SmoothingConfig};
use screen_effects::{
    CursorSample, EffectKind, PathSmoother, PipelineContext, PipelineOrchestrator, SampleStore,
    SegmentRenderer, SegmentTools, TimelineBuilder,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

struct TextTools;

#[async_trait]
impl SegmentTools for TextTools {
    async fn probe(&self, _input: &Path) -> Result<VideoInfo, RenderError> {
        Ok(VideoInfo {
            duration: 8.0,
            width: 1920,
            height: 1080,
        })
    }

    async fn copy_span(
        &self,
        _input: &Path,
        output: &Path,
        start: f64,
        end: Option<f64>,
    ) -> Result<(), RenderError> {
        let end = end.unwrap_or(8.0);
        tokio::fs::write(output, format!("copy {start:.1}-{end:.1}\n")).await?;
        Ok(())
    }

    async fn concat(
        &self,
        segments: &[PathBuf],
        _list_path: &Path,
        output: &Path,
    ) -> Result<(), RenderError> {
        let mut joined = Vec::new();
        for segment in segments {
            joined.extend(tokio::fs::read(segment).await?);
        }
        tokio::fs::write(output, joined).await?;
        Ok(())
    }
}

#[derive(Default)]
struct RecordingRenderer {
    windows: Mutex<Vec<(EffectKind, f64, f64)>>,
}

#[async_trait]
impl SegmentRenderer for RecordingRenderer {
    async fn apply(&self, request: &RenderRequest<'_>) -> Result<(), RenderError> {
        let w = request.window;
        self.windows.lock().push((w.kind(), w.start, w.end));
        tokio::fs::write(
            request.output,
            format!("{} {:.1}-{:.1}\n", w.kind(), w.start, w.end),
        )
        .await?;
        Ok(())
    }
}

fn orchestrator_windows(
    orchestrator: &PipelineOrchestrator<RecordingRenderer, TextTools>,
) -> Vec<(EffectKind, f64, f64)> {
    orchestrator
        .renderer()
        .windows
        .lock()
        .iter()
        .map(|(kind, start, end)| (*kind, (start * 10.0).round() / 10.0, (end * 10.0).round() / 10.0))
        .collect()
}

fn scripted_session() -> SampleStore {
    let mut samples: Vec<CursorSample> = (0..=120)
        .map(|i| {
            let t = Duration::from_millis(i * 50);
            CursorSample::position(200.0 + i as f64 * 5.0, 300.0, t)
        })
        .collect();
    samples.push(CursorSample::click(300.0, 300.0, Duration::from_millis(1000)));
    samples.push(CursorSample::click(320.0, 300.0, Duration::from_millis(1400)));
    samples.push(CursorSample::click(700.0, 300.0, Duration::from_millis(5000)));
    SampleStore::from_samples(samples)
}

#[tokio::test]
async fn test_samples_to_rendered_video() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("recording.mp4");
    std::fs::write(&source, b"raw").unwrap();
    let output = dir.path().join("edited.mp4");

    let samples = scripted_session();

    let smoothing = SmoothingConfig::default();
    let path = PathSmoother::new(smoothing).unwrap().smooth(&samples).unwrap();
    assert_eq!(path.len(), (6.0f64 * smoothing.frame_rate).floor() as usize + 1);

    let mut effects = EffectsConfig::none();
    effects.zoom.enabled = true;
    effects.blur.enabled = true;
    effects.blur.movement_threshold = None;
    let timeline = TimelineBuilder::new(&effects).unwrap().build(&samples);

    assert_eq!(timeline.zoom.len(), 2);
    assert_eq!(timeline.blur.len(), 2);

    let renderer = RecordingRenderer::default();
    let orchestrator = PipelineOrchestrator::new(renderer, TextTools);
    let (ctx, _cancel) = PipelineContext::new();

    let written = orchestrator
        .process(&source, &timeline, smoothing.frame_rate, &output, &ctx)
        .await;
    tokio_test::assert_ok!(written);

    let windows = orchestrator_windows(&orchestrator);
    assert_eq!(
        windows,
        vec![
            (EffectKind::Zoom, 0.0, 3.4),
            (EffectKind::Zoom, 4.0, 7.0),
            (EffectKind::Blur, 0.0, 3.4),
            (EffectKind::Blur, 4.0, 7.0),
        ]
    );

    // The blur stage rewrites the zoom stage output, so only its segments remain
    let content = std::fs::read_to_string(&output).unwrap();
    assert_eq!(
        content,
        "blur 0.0-3.4\ncopy 3.4-4.0\nblur 4.0-7.0\ncopy 7.0-8.0\n"
    );

    let mut names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    names.sort();
    assert_eq!(names, vec!["edited.mp4", "recording.mp4"]);
}

#[tokio::test]
async fn test_live_tracker_feeds_processing() {
    let cursor = SharedCursorPosition::new();
    cursor.update(0.0, 0.0);
    let tracker = InputTracker::start(Arc::new(cursor.clone()), Duration::from_millis(5));
    let clicks = tracker.sink();

    for step in 1..=10 {
        tokio::time::sleep(Duration::from_millis(6)).await;
        cursor.update(step as f64 * 20.0, 0.0);
        if step == 5 {
            clicks.record_click(100.0, 0.0);
        }
    }
    tokio::time::sleep(Duration::from_millis(10)).await;

    let store = tokio_test::assert_ok!(tracker.freeze().await);
    assert!(store.len() >= 4);
    assert_eq!(store.clicks().count(), 1);

    let path = PathSmoother::new(SmoothingConfig::default())
        .unwrap()
        .smooth(&store)
        .unwrap();
    assert!(!path.is_empty());

    let timeline = TimelineBuilder::new(&EffectsConfig::default())
        .unwrap()
        .build(&store);
    assert_eq!(timeline.zoom.len(), 1);
    assert_eq!(timeline.zoom[0].start, 0.0);
}
