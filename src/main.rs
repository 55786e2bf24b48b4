use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn, Level};

use gif_forge::{
    composition::RenderPipeline,
    config::Config,
    project::Project,
    store::{DirectoryStore, FrameStore},
};

#[derive(Parser)]
#[command(
    name = "gif-forge",
    version,
    about = "Turn still images into animated GIFs with transitions",
    long_about = "gif-forge renders a project of uploaded still images into an animated GIF, inserting crossfade, fade or slide frames between them while enforcing per-session resource quotas."
)]
struct Cli {
    /// Project file (JSON)
    #[arg(short, long)]
    project: PathBuf,

    /// User data directory holding one folder per session
    #[arg(short, long)]
    uploads: PathBuf,

    /// Session whose uploads the project refers to
    #[arg(short, long)]
    session: String,

    /// Output GIF path
    #[arg(short, long)]
    output: PathBuf,

    /// Render a short preview instead of the full animation
    #[arg(long)]
    preview: bool,

    /// Frames rendered in preview mode (defaults to the configured limit)
    #[arg(long, requires = "preview")]
    max_frames: Option<usize>,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    info!("Starting gif-forge v{}", env!("CARGO_PKG_VERSION"));
    info!("Project: {:?}", cli.project);
    info!("Session: {} in {:?}", cli.session, cli.uploads);
    info!("Output: {:?}", cli.output);

    // Load configuration
    let config = match cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(&config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };

    let project = Project::load(&cli.project)
        .with_context(|| format!("Failed to load project {:?}", cli.project))?;

    let store = Arc::new(DirectoryStore::new(&cli.uploads, &cli.session)?);
    let pipeline = RenderPipeline::new(config, store.clone())?;

    let result = if cli.preview {
        let max_frames = cli.max_frames.or(pipeline.config().preview.max_frames);
        pipeline.generate_preview(&project, max_frames)
    } else {
        pipeline.generate_full(&project)
    };

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            error!("{}", e.user_message());
            return Err(e.into());
        }
    };

    std::fs::write(&cli.output, &output.encoded)
        .with_context(|| format!("Failed to write {:?}", cli.output))?;

    for warning in &output.warnings {
        warn!("{}", warning);
    }

    let summary = output.summary;
    info!("Animation saved to: {:?}", cli.output);
    info!("   Canvas: {}x{}", summary.width, summary.height);
    info!("   Frames: {} of {}", summary.rendered_frames, summary.planned_frames);
    info!("   Duration: {:.2}s", summary.total_duration_ms as f64 / 1000.0);
    info!("   Size: {:.1} KB", output.encoded_size_bytes as f64 / 1024.0);

    if !cli.preview {
        let report = pipeline.quota_guard().storage_report(store.storage_used()?);
        info!("   Session storage: {:.1}% of {} bytes used", report.percentage, report.limit);
    }

    Ok(())
}
