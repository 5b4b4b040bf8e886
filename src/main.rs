use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use screen_effects::commands::{self, TimelineSource};
use screen_effects::export::PipelineContext;
use screen_effects::ProjectConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    screen_effects::init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    tracing::info!("Starting screen-effects v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Smooth { samples, output } => {
            commands::smooth_cursor_file(&samples, &output, config.smoothing).await?;
        }
        Commands::Timeline { samples, output } => {
            let timeline = commands::build_timeline_file(&samples, &output, &config.effects).await?;
            tracing::info!(
                follow = timeline.follow.len(),
                zoom = timeline.zoom.len(),
                blur = timeline.blur.len(),
                "timeline written to {:?}",
                output
            );
        }
        Commands::Render {
            video,
            samples,
            timeline,
            output,
        } => {
            let source = match (timeline, samples) {
                (Some(path), _) => TimelineSource::File(path),
                (None, Some(path)) => TimelineSource::Samples(path),
                (None, None) => anyhow::bail!("render needs --timeline or --samples"),
            };
            run_render(&video, source, &output, &config).await?;
        }
    }

    Ok(())
}

async fn run_render(
    video: &Path,
    timeline: TimelineSource,
    output: &Path,
    config: &ProjectConfig,
) -> anyhow::Result<()> {
    let (ctx, cancel) = PipelineContext::new();
    let ctx = ctx.with_progress(|p| {
        tracing::info!(
            "{} {}/{} ({:.0}%)",
            p.stage,
            p.window_index,
            p.window_count,
            p.fraction * 100.0
        );
    });

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling render");
            cancel.cancel();
        }
    });

    let written = commands::render_effects(video, timeline, output, config, &ctx).await?;
    tracing::info!("Rendered {:?}", written);
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ProjectConfig> {
    match path {
        Some(path) => ProjectConfig::load(path)
            .with_context(|| format!("Failed to load project config {:?}", path)),
        None => Ok(ProjectConfig::default()),
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Cursor smoothing and click effects for screen recordings", long_about = None)]
struct Cli {
    /// Project configuration (JSON); defaults apply when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Smooth recorded cursor samples into one point per output frame.
    Smooth {
        /// Cursor samples JSON written at the end of a recording.
        samples: PathBuf,
        /// Output path; `.csv` writes CSV, anything else JSON.
        output: PathBuf,
    },
    /// Build the merged zoom, blur and follow windows for a recording.
    Timeline {
        samples: PathBuf,
        output: PathBuf,
    },
    /// Render effect windows onto a recording.
    Render {
        /// Source video.
        video: PathBuf,
        /// Cursor samples to build the timeline from.
        #[arg(long, conflicts_with = "timeline")]
        samples: Option<PathBuf>,
        /// Prebuilt timeline JSON.
        #[arg(long)]
        timeline: Option<PathBuf>,
        /// Where the edited video is written.
        #[arg(short, long)]
        output: PathBuf,
    },
}
