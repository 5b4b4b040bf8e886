//! Segment-based effect pipeline
//!
//! Effects are applied one stage at a time in [`EffectKind::PIPELINE_ORDER`].
//! A stage cuts its input into untouched spans (copied verbatim) and effect
//! windows (re-encoded by the [`SegmentRenderer`]), then concatenates them;
//! the result is the input of the next stage. All intermediate files live in
//! a per-call temporary directory next to the requested output, and the
//! output path is only written by the final rename.

use crate::error::{ProcessingError, ProcessingResult, SegmentOperation};
use crate::export::renderer::{RenderError, RenderRequest, SegmentRenderer};
use crate::export::tools::SegmentTools;
use crate::processing::timeline::{EffectKind, EffectWindow, Timeline};
use crate::project::schema::check_frame_rate;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;

/// Spans shorter than this are dropped from a stage plan
const MIN_SEGMENT_SECS: f64 = 1e-3;

/// One piece of a stage, written to `output_path`
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSegmentDescriptor {
    pub source_path: PathBuf,
    pub start: f64,
    pub end: f64,
    pub output_path: PathBuf,
    /// Window to render; `None` means a verbatim copy
    pub window: Option<EffectWindow>,
}

impl VideoSegmentDescriptor {
    pub fn is_rendered(&self) -> bool {
        self.window.is_some()
    }
}

/// Cut a stage input of `duration` seconds into copy and render segments
///
/// Windows are clamped to `[0, duration]`; windows and gaps shorter than a
/// millisecond are skipped.
pub fn plan_stage(
    source: &Path,
    windows: &[EffectWindow],
    duration: f64,
    dir: &Path,
    extension: &str,
) -> Vec<VideoSegmentDescriptor> {
    let mut spans: Vec<(f64, f64, Option<EffectWindow>)> = Vec::new();
    let mut cursor = 0.0f64;

    for window in windows {
        let start = window.start.max(cursor);
        let end = window.end.min(duration);
        if end - start < MIN_SEGMENT_SECS {
            tracing::warn!(
                "Dropping {} window [{:.3}s, {:.3}s] outside the {:.3}s input",
                window.kind(),
                window.start,
                window.end,
                duration
            );
            continue;
        }

        if start - cursor >= MIN_SEGMENT_SECS {
            spans.push((cursor, start, None));
        }
        spans.push((
            start,
            end,
            Some(EffectWindow {
                start,
                end,
                ..*window
            }),
        ));
        cursor = end;
    }

    if duration - cursor >= MIN_SEGMENT_SECS {
        spans.push((cursor, duration, None));
    }

    spans
        .into_iter()
        .enumerate()
        .map(|(i, (start, end, window))| VideoSegmentDescriptor {
            source_path: source.to_path_buf(),
            start,
            end,
            output_path: dir.join(format!("seg-{i:04}.{extension}")),
            window,
        })
        .collect()
}

/// Progress of a running pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineProgress {
    pub stage: EffectKind,
    /// Windows of this stage rendered so far
    pub window_index: usize,
    pub window_count: usize,
    /// Overall completion in `[0, 1]`
    pub fraction: f64,
}

pub type ProgressCallback = Arc<dyn Fn(&PipelineProgress) + Send + Sync>;

/// Cancels the pipeline run that owns the matching [`PipelineContext`]
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Per-call cancellation and progress reporting
#[derive(Clone)]
pub struct PipelineContext {
    cancel: watch::Receiver<bool>,
    progress: Option<ProgressCallback>,
}

impl PipelineContext {
    pub fn new() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        (
            Self {
                cancel: rx,
                progress: None,
            },
            CancelHandle { tx: Arc::new(tx) },
        )
    }

    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&PipelineProgress) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    fn report(&self, progress: PipelineProgress) {
        if let Some(callback) = &self.progress {
            callback(&progress);
        }
    }

    /// Run `work` until it finishes or the pipeline is cancelled
    ///
    /// On cancellation `work` is dropped, which kills any child process it
    /// spawned.
    async fn run<F, T>(&self, work: F) -> ProcessingResult<T>
    where
        F: Future<Output = ProcessingResult<T>>,
    {
        if self.is_cancelled() {
            return Err(ProcessingError::Cancelled);
        }

        let mut cancel = self.cancel.clone();
        tokio::select! {
            biased;
            _ = wait_for_cancel(&mut cancel) => Err(ProcessingError::Cancelled),
            result = work => result,
        }
    }
}

async fn wait_for_cancel(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|cancelled| *cancelled).await.is_err() {
        // Every handle is gone, so nobody can cancel any more
        std::future::pending::<()>().await;
    }
}

fn failure(
    kind: EffectKind,
    operation: SegmentOperation,
    start: f64,
    end: f64,
) -> impl FnOnce(RenderError) -> ProcessingError {
    move |source| ProcessingError::RenderFailure {
        kind,
        operation,
        start,
        end,
        source,
    }
}

pub struct PipelineOrchestrator<R, T> {
    renderer: R,
    tools: T,
}

impl<R, T> PipelineOrchestrator<R, T>
where
    R: SegmentRenderer,
    T: SegmentTools,
{
    pub fn new(renderer: R, tools: T) -> Self {
        Self { renderer, tools }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Apply every stage of `timeline` to `source` and write the result to `output`
    ///
    /// Aborts on the first failure. Temporary files are removed on every exit
    /// path, and `output` is either untouched or complete.
    pub async fn process(
        &self,
        source: &Path,
        timeline: &Timeline,
        frame_rate: f64,
        output: &Path,
        ctx: &PipelineContext,
    ) -> ProcessingResult<PathBuf> {
        check_frame_rate(frame_rate)?;
        if ctx.is_cancelled() {
            return Err(ProcessingError::Cancelled);
        }

        let parent = match output.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&parent).await?;

        let scratch = tempfile::Builder::new()
            .prefix(".screen-effects-")
            .tempdir_in(&parent)?;
        let extension = source
            .extension()
            .map(|ext| ext.to_string_lossy().to_string())
            .unwrap_or_else(|| "mp4".to_string());

        tracing::info!(
            "Processing {:?} -> {:?} ({} effect windows)",
            source,
            output,
            timeline.window_count()
        );

        let stages: Vec<(EffectKind, &[EffectWindow])> = timeline
            .stages()
            .filter(|(_, windows)| !windows.is_empty())
            .collect();

        let mut current = source.to_path_buf();
        for (index, (kind, windows)) in stages.iter().enumerate() {
            let stage_dir = scratch.path().join(format!("{index:02}-{kind}"));
            tokio::fs::create_dir(&stage_dir).await?;

            let progress = StageProgress {
                stage: *kind,
                index,
                stage_count: stages.len(),
            };
            if let Some(stage_output) = self
                .run_stage(&current, *kind, windows, frame_rate, &stage_dir, &extension, progress, ctx)
                .await?
            {
                current = stage_output;
            }
        }

        if current == source {
            // Nothing rendered; the result is the source itself
            let copy = scratch.path().join(format!("passthrough.{extension}"));
            ctx.run(async {
                tokio::fs::copy(source, &copy).await?;
                Ok::<_, ProcessingError>(())
            })
            .await?;
            current = copy;
        }

        if ctx.is_cancelled() {
            return Err(ProcessingError::Cancelled);
        }
        tokio::fs::rename(&current, output).await?;

        tracing::info!("Wrote {:?}", output);
        Ok(output.to_path_buf())
    }

    /// Run one stage; `None` when no window intersects the input
    #[allow(clippy::too_many_arguments)]
    async fn run_stage(
        &self,
        input: &Path,
        kind: EffectKind,
        windows: &[EffectWindow],
        frame_rate: f64,
        dir: &Path,
        extension: &str,
        progress: StageProgress,
        ctx: &PipelineContext,
    ) -> ProcessingResult<Option<PathBuf>> {
        let video = ctx
            .run(async {
                self.tools
                    .probe(input)
                    .await
                    .map_err(failure(kind, SegmentOperation::Probe, 0.0, 0.0))
            })
            .await?;

        let plan = plan_stage(input, windows, video.duration, dir, extension);
        let render_count = plan.iter().filter(|s| s.is_rendered()).count();
        if render_count == 0 {
            tracing::warn!("{} stage: no window inside the {:.3}s input, skipping", kind, video.duration);
            return Ok(None);
        }

        tracing::info!(
            "{} stage: {} windows, {} segments",
            kind,
            render_count,
            plan.len()
        );
        ctx.report(progress.at(0, render_count));

        let last = plan.len() - 1;
        let mut rendered = 0;
        for (i, segment) in plan.iter().enumerate() {
            match &segment.window {
                Some(window) => {
                    let request = RenderRequest {
                        input,
                        output: &segment.output_path,
                        window,
                        frame_rate,
                        video,
                    };
                    ctx.run(async {
                        self.renderer.apply(&request).await.map_err(failure(
                            kind,
                            SegmentOperation::Render,
                            window.start,
                            window.end,
                        ))
                    })
                    .await?;

                    rendered += 1;
                    ctx.report(progress.at(rendered, render_count));
                }
                None => {
                    let end = (i != last).then_some(segment.end);
                    ctx.run(async {
                        self.tools
                            .copy_span(input, &segment.output_path, segment.start, end)
                            .await
                            .map_err(failure(
                                kind,
                                SegmentOperation::Extract,
                                segment.start,
                                segment.end,
                            ))
                    })
                    .await?;
                }
            }
        }

        let segments: Vec<PathBuf> = plan.into_iter().map(|s| s.output_path).collect();
        let list_path = dir.join("segments.txt");
        let stage_output = dir.with_extension(extension);

        ctx.run(async {
            self.tools
                .concat(&segments, &list_path, &stage_output)
                .await
                .map_err(failure(kind, SegmentOperation::Concat, 0.0, video.duration))
        })
        .await?;

        Ok(Some(stage_output))
    }
}

#[derive(Debug, Clone, Copy)]
struct StageProgress {
    stage: EffectKind,
    index: usize,
    stage_count: usize,
}

impl StageProgress {
    fn at(&self, window_index: usize, window_count: usize) -> PipelineProgress {
        let within = window_index as f64 / window_count as f64;
        PipelineProgress {
            stage: self.stage,
            window_index,
            window_count,
            fraction: (self.index as f64 + within) / self.stage_count as f64,
        }
    }
}
