//! File-level processing commands
//!
//! Each command reads its inputs from disk, runs one processing step and
//! writes the result, so the binary stays a thin argument parser.

use crate::capture::input::SampleStore;
use crate::export::{FfmpegSegmentRenderer, FfmpegTools, PipelineContext, PipelineOrchestrator};
use crate::processing::cursor_smoothing::{export_path_csv, PathSmoother, SmoothedPoint};
use crate::processing::timeline::{Timeline, TimelineBuilder};
use crate::project::schema::{EffectsConfig, ProjectConfig, SmoothingConfig};
use anyhow::Context;
use std::path::{Path, PathBuf};

/// Where the effect windows for a render come from
#[derive(Debug, Clone)]
pub enum TimelineSource {
    /// A timeline JSON file written by [`build_timeline_file`]
    File(PathBuf),
    /// Build the timeline from recorded samples with the project's effect settings
    Samples(PathBuf),
}

fn load_samples(path: &Path) -> anyhow::Result<SampleStore> {
    SampleStore::load_json(path).with_context(|| format!("Failed to read cursor samples from {:?}", path))
}

/// Smooth recorded samples and write the path as JSON, or CSV for `.csv` outputs
pub async fn smooth_cursor_file(
    input: &Path,
    output: &Path,
    config: SmoothingConfig,
) -> anyhow::Result<Vec<SmoothedPoint>> {
    let samples = load_samples(input)?;

    tracing::info!(
        "Smoothing {} samples at {}fps (alpha={}, responsiveness={}, smoothness={})",
        samples.len(),
        config.frame_rate,
        config.alpha,
        config.responsiveness,
        config.smoothness
    );

    let path = PathSmoother::new(config)?.smooth(&samples)?;

    let is_csv = output
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        export_path_csv(output, &path)?;
    } else {
        let data = serde_json::to_vec_pretty(&path)?;
        tokio::fs::write(output, data)
            .await
            .with_context(|| format!("Failed to write {:?}", output))?;
    }

    tracing::info!("Wrote {} smoothed frames to {:?}", path.len(), output);
    Ok(path)
}

/// Build effect windows from recorded samples and write them as JSON
pub async fn build_timeline_file(
    input: &Path,
    output: &Path,
    effects: &EffectsConfig,
) -> anyhow::Result<Timeline> {
    let samples = load_samples(input)?;
    let timeline = TimelineBuilder::new(effects)?.build(&samples);

    timeline
        .save_json(output)
        .with_context(|| format!("Failed to write timeline to {:?}", output))?;
    Ok(timeline)
}

/// Render the timeline's effects onto `source` with ffmpeg
pub async fn render_effects(
    source: &Path,
    timeline: TimelineSource,
    output: &Path,
    config: &ProjectConfig,
    ctx: &PipelineContext,
) -> anyhow::Result<PathBuf> {
    let timeline = match timeline {
        TimelineSource::File(path) => Timeline::load_json(&path)
            .with_context(|| format!("Failed to read timeline from {:?}", path))?,
        TimelineSource::Samples(path) => {
            TimelineBuilder::new(&config.effects)?.build(&load_samples(&path)?)
        }
    };

    let renderer = FfmpegSegmentRenderer::from_config(&config.render)?;
    let tools = FfmpegTools::discover(&config.render)?;
    let orchestrator = PipelineOrchestrator::new(renderer, tools);

    let written = orchestrator
        .process(source, &timeline, config.smoothing.frame_rate, output, ctx)
        .await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::input::CursorSample;
    use std::time::Duration;

    fn write_samples(dir: &Path) -> PathBuf {
        let samples: Vec<CursorSample> = (0..10)
            .map(|i| CursorSample::position(i as f64 * 10.0, 0.0, Duration::from_millis(i * 50)))
            .chain([CursorSample::click(45.0, 0.0, Duration::from_millis(220))])
            .collect();
        let path = dir.join("samples.json");
        SampleStore::from_samples(samples).save_json(&path).unwrap();
        path
    }

    #[tokio::test]
    async fn test_smooth_cursor_file_json_and_csv() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_samples(dir.path());

        let json_out = dir.path().join("path.json");
        let path = smooth_cursor_file(&input, &json_out, SmoothingConfig::default())
            .await
            .unwrap();
        let parsed: Vec<SmoothedPoint> =
            serde_json::from_slice(&std::fs::read(&json_out).unwrap()).unwrap();
        assert_eq!(parsed, path);

        let csv_out = dir.path().join("path.CSV");
        smooth_cursor_file(&input, &csv_out, SmoothingConfig::default())
            .await
            .unwrap();
        let csv = std::fs::read_to_string(&csv_out).unwrap();
        assert!(csv.starts_with("x,y,t_ms\n"));
        assert_eq!(csv.lines().count(), path.len() + 1);
    }

    #[tokio::test]
    async fn test_build_timeline_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_samples(dir.path());
        let output = dir.path().join("timeline.json");

        let timeline = build_timeline_file(&input, &output, &EffectsConfig::default())
            .await
            .unwrap();

        assert_eq!(timeline.zoom.len(), 1);
        assert_eq!(Timeline::load_json(&output).unwrap(), timeline);
    }

    #[tokio::test]
    async fn test_missing_samples_file_has_context() {
        let dir = tempfile::tempdir().unwrap();
        let err = build_timeline_file(
            &dir.path().join("missing.json"),
            &dir.path().join("out.json"),
            &EffectsConfig::default(),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("Failed to read cursor samples"));
    }
}
