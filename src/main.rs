//! Matrixfall: a handheld-style falling-block puzzle with a frame-exact simulation, in the terminal.

mod app;
mod assets;
mod audio;
mod das;
mod form;
mod input;
mod matrix;
mod piece;
mod rng;
mod round;
mod scene;
mod scoring;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use assets::Assets;
use audio::Audio;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Options derived from the command line that shape the session.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub fps: u32,
    pub seed: Option<u32>,
    pub level: u8,
    pub music: bool,
    pub sound: bool,
    pub skip_title: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            fps: 50,
            seed: None,
            level: 0,
            music: true,
            sound: true,
            skip_title: false,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }

    let theme = match theme::Theme::load(args.theme.as_deref(), args.palette) {
        Ok(theme) => theme,
        Err(err) => {
            warn!(%err, "theme unreadable, using defaults");
            theme::Theme::default_for_palette(args.palette)
        }
    };
    let assets = Assets::load(args.assets.as_deref(), &theme);
    let config = GameConfig {
        fps: args.fps,
        seed: args.seed,
        level: args.level,
        music: !args.no_music,
        sound: !args.no_sound,
        skip_title: args.skip_title,
    };
    info!(?config, "configured");

    let mut app = App::new(config, theme, assets, audio_backend());
    app.run()?;
    Ok(())
}

/// Tracing goes to a file; the terminal belongs to the game.
fn init_logging(path: &std::path::Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .init();
    Ok(())
}

#[cfg(feature = "audio")]
fn audio_backend() -> Box<dyn Audio> {
    match audio::RodioAudio::new() {
        Ok(audio) => Box::new(audio),
        Err(err) => {
            warn!(%err, "no audio device, falling back to terminal bell");
            Box::new(audio::TerminalAudio::default())
        }
    }
}

#[cfg(not(feature = "audio"))]
fn audio_backend() -> Box<dyn Audio> {
    Box::new(audio::TerminalAudio::default())
}

fn parse_seed(s: &str) -> Result<u32, String> {
    let s = s.trim().trim_start_matches("0x");
    if s.is_empty() || s.len() > form::SEED_LENGTH {
        return Err(format!("expected 1 to {} hex digits", form::SEED_LENGTH));
    }
    u32::from_str_radix(s, 16).map_err(|e| e.to_string())
}

/// Handheld-style falling-block puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "matrixfall",
    version,
    about = "Handheld-style falling-block puzzle in the terminal. Same seed, same game.",
    long_about = "Matrixfall is a falling-block puzzle built around a 24x10 matrix and a \
        fixed-rate frame loop. Every game is reproducible from its eight-digit hex seed.\n\n\
        CONTROLS:\n  Left/Right  Shift     Down       Soft drop   Up         Hard drop\n  \
        X / K / Enter  Rotate right (A)   Z / J / Backspace  Rotate left (B)\n  \
        M  Toggle music   N  Toggle sound   Esc  End game   Q  Quit\n\n\
        Hold a direction to auto-shift. Use --assets to point at a directory with a sounds/ folder."
)]
pub struct Args {
    /// Pre-fill the options screen with this seed (hex, up to 8 digits).
    #[arg(long, value_name = "HEX", value_parser = parse_seed)]
    pub seed: Option<u32>,

    /// Starting level.
    #[arg(long, default_value = "0", value_name = "N", value_parser = clap::value_parser!(u8).range(0..=20))]
    pub level: u8,

    /// Start with music off.
    #[arg(long)]
    pub no_music: bool,

    /// Start with sound effects off.
    #[arg(long)]
    pub no_sound: bool,

    /// Go straight to the options screen.
    #[arg(long)]
    pub skip_title: bool,

    /// Simulation frames per second. Timings are tuned for 50.
    #[arg(long, default_value = "50", value_name = "RATE", value_parser = clap::value_parser!(u32).range(10..=240))]
    pub fps: u32,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Directory holding sounds/ (samples and music). Without it the terminal bell stands in.
    #[arg(long, value_name = "DIR")]
    pub assets: Option<PathBuf>,

    /// Write logs to this file. Filter with RUST_LOG.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
