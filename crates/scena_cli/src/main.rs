//! Scena CLI - inspect, edit and preview scene documents
//!
//! Every editing command opens the document into a session, applies one
//! operation and saves it back. Nothing is written when the operation is
//! rejected.

mod commands;
mod config;
mod preview;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::ScenaConfig;
use scena_core::{ElementKey, Vec2};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Scene document editor and previewer
#[derive(Parser, Debug)]
#[command(name = "scena")]
#[command(about = "Edit and preview frame-by-frame scene documents")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./scena.toml when present)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new document with empty frames
    New {
        file: PathBuf,
        /// Number of frames to create
        #[arg(short, long, default_value = "1")]
        frames: usize,
    },

    /// Print a summary of every frame
    Inspect { file: PathBuf },

    /// Check that a document loads
    Validate { file: PathBuf },

    /// Print the effective configuration
    Config,

    /// Append an empty frame, inheriting the previous chapter
    AddFrame { file: PathBuf },

    /// Append a sprite showing an image
    AddSprite {
        file: PathBuf,
        #[arg(short, long)]
        frame: usize,
        image: String,
    },

    /// Append a copy of a sprite
    DuplicateSprite {
        file: PathBuf,
        #[arg(short, long)]
        frame: usize,
        #[arg(short, long)]
        slot: usize,
    },

    /// Remove a sprite; later sprites move down one slot
    DeleteSprite {
        file: PathBuf,
        #[arg(short, long)]
        frame: usize,
        #[arg(short, long)]
        slot: usize,
    },

    /// Rebuild the sprite list in the order of the given display identifiers
    ReorderSprites {
        file: PathBuf,
        #[arg(short, long)]
        frame: usize,
        #[arg(required = true)]
        order: Vec<String>,
    },

    /// Change the image or rest transform of an element
    Place {
        file: PathBuf,
        #[arg(short, long)]
        frame: usize,
        /// `background` or a sprite slot
        #[arg(short, long, value_parser = parse_element)]
        element: ElementKey,
        #[arg(long)]
        image: Option<String>,
        /// Rest position as `x,y`
        #[arg(long, value_parser = parse_vec2, allow_hyphen_values = true)]
        position: Option<Vec2>,
        /// Rest scale as `x,y`
        #[arg(long, value_parser = parse_vec2, allow_hyphen_values = true)]
        scale: Option<Vec2>,
    },

    /// Configure animation of an element
    Animate {
        file: PathBuf,
        #[arg(short, long)]
        frame: usize,
        /// `background` or a sprite slot
        #[arg(short, long, value_parser = parse_element)]
        element: ElementKey,
        /// Switch animation off instead of on
        #[arg(long, conflicts_with_all = ["duration", "to", "to_scale"])]
        off: bool,
        /// Duration in milliseconds
        #[arg(long)]
        duration: Option<u64>,
        /// Target position as `x,y`
        #[arg(long, value_parser = parse_vec2, allow_hyphen_values = true)]
        to: Option<Vec2>,
        /// Target scale as `x,y`
        #[arg(long, value_parser = parse_vec2, allow_hyphen_values = true)]
        to_scale: Option<Vec2>,
    },

    /// Set speaker and dialogue
    Text {
        file: PathBuf,
        #[arg(short, long)]
        frame: usize,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        dialogue: Option<String>,
    },

    /// Set time of day, chapter and emotion overlay
    Ui {
        file: PathBuf,
        #[arg(short, long)]
        frame: usize,
        /// Morning, Afternoon, Evening, Night, or empty to unset
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        chapter: Option<String>,
        /// Take the previous frame's chapter if this one has none
        #[arg(long)]
        inherit_chapter: bool,
        /// Switch the emotion overlay on or off
        #[arg(long)]
        emotion: Option<bool>,
        #[arg(long)]
        emotion_image: Option<String>,
        #[arg(long)]
        emotion_background: Option<String>,
        #[arg(long, value_parser = parse_vec2, allow_hyphen_values = true)]
        emotion_position: Option<Vec2>,
        #[arg(long, value_parser = parse_vec2, allow_hyphen_values = true)]
        emotion_scale: Option<Vec2>,
    },

    /// Play a frame's animation in the terminal
    Preview {
        file: PathBuf,
        #[arg(short, long, default_value = "0")]
        frame: usize,
        /// Tick rate, overriding the configuration
        #[arg(long)]
        hz: Option<u32>,
    },
}

/// Parse `background` or a sprite slot number
fn parse_element(s: &str) -> std::result::Result<ElementKey, String> {
    if s.eq_ignore_ascii_case("background") || s.eq_ignore_ascii_case("bg") {
        return Ok(ElementKey::Background);
    }
    s.trim_start_matches("sprite:")
        .trim()
        .parse::<usize>()
        .map(ElementKey::Sprite)
        .map_err(|_| format!("expected `background` or a sprite slot, got {s:?}"))
}

/// Parse `x,y`
fn parse_vec2(s: &str) -> std::result::Result<Vec2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got {s:?}"))?;
    let x = x.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let y = y.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let value = Vec2::new(x, y);
    if !value.is_finite() {
        return Err(format!("coordinates must be finite, got {s:?}"));
    }
    Ok(value)
}

fn init_logging(config: &ScenaConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log.level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ScenaConfig::load(cli.config.as_deref())?;
    init_logging(&config);

    info!(easing = config.playback.easing.name(), "scena starting");
    commands::run(cli.command, &config)
}
