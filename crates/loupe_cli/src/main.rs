//! Loupe CLI
//!
//! Replay recorded gesture scripts against the gallery and inspect its
//! configuration.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use loupe_gallery::{Gallery, GalleryConfig, GalleryEvent};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod script;

use script::Script;

#[derive(Parser)]
#[command(name = "loupe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Loupe gesture gallery tools", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a gesture script, printing one JSON frame per line
    Replay {
        /// Script file (JSON)
        script: PathBuf,

        /// Gallery configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of frames to replay
        #[arg(long)]
        frames: Option<usize>,

        /// Display refresh rate
        #[arg(long, default_value = "60")]
        fps: f64,

        /// Write frames here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the default gallery configuration
    Config,

    /// Validate a gallery configuration file
    Check {
        /// Configuration file (TOML)
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout carries frame output
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Replay {
            script,
            config,
            frames,
            fps,
            output,
        } => cmd_replay(&script, config.as_deref(), frames, fps, output.as_deref()),

        Commands::Config => cmd_config(),

        Commands::Check { config } => cmd_check(&config),
    }
}

fn load_config(path: Option<&Path>) -> Result<GalleryConfig> {
    match path {
        Some(path) => GalleryConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(GalleryConfig::default()),
    }
}

fn cmd_replay(
    script_path: &Path,
    config: Option<&Path>,
    frames: Option<usize>,
    fps: f64,
    output: Option<&Path>,
) -> Result<()> {
    if !(fps.is_finite() && fps > 0.0) {
        anyhow::bail!("Invalid frame rate {}", fps);
    }

    let config = load_config(config)?;
    let script = Script::load(script_path)?;
    let frame_count = script.frame_count(frames);
    let mut gallery = Gallery::new(config, script.images.clone())
        .context("Failed to create gallery")?;

    let mut out: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    info!(
        "Replaying {} ({} steps, {} frames at {} fps)",
        script_path.display(),
        script.steps.len(),
        frame_count,
        fps
    );

    let frame_ms = 1000.0 / fps;
    let mut failed = 0;
    let mut events = 0;
    let mut closed = false;

    for frame in 0..frame_count {
        for step in script.steps_at(frame) {
            debug!(frame, action = ?step.action, "step");
            if let Err(err) = step.action.apply(&mut gallery) {
                warn!("Step at frame {} failed: {:#}", frame, err);
                failed += 1;
            }
        }

        let record = gallery.tick((frame + 1) as f64 * frame_ms);
        events += record.events.len();
        closed |= record.events.contains(&GalleryEvent::RequestClose);

        serde_json::to_writer(&mut out, &record).context("Failed to write frame")?;
        out.write_all(b"\n")?;
    }
    out.flush()?;

    info!(
        "Replayed {} frames: {} events, {} failed steps{}",
        frame_count,
        events,
        failed,
        if closed { ", gallery closed" } else { "" }
    );
    Ok(())
}

fn cmd_config() -> Result<()> {
    let toml = GalleryConfig::default()
        .to_toml_string()
        .context("Failed to serialize default config")?;
    print!("{}", toml);
    Ok(())
}

fn cmd_check(path: &Path) -> Result<()> {
    let config = GalleryConfig::load(path)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    info!(
        "{} is valid (screen {}x{})",
        path.display(),
        config.screen.width,
        config.screen.height
    );
    Ok(())
}
