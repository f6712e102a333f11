//! Assets context: block tiles, the top-out cover tile, sound samples and the
//! music track. Built once at startup and handed to the scenes.
//!
//! Missing files never abort the game. They are logged and the matching cue
//! is skipped.

use crate::piece::Piece;
use crate::round::Sound;
use crate::theme::Theme;
use ratatui::style::Color;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    Missing(PathBuf),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("empty asset file: {0}")]
    Empty(PathBuf),
}

/// A matrix cell's look: two terminal columns of glyphs in one colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub glyph: &'static str,
    pub color: Color,
}

/// A loaded sound effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sample {
    /// No asset directory: fall back to the terminal bell.
    Bell,
    Clip { path: PathBuf, bytes: Arc<[u8]> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub path: PathBuf,
    pub bytes: Arc<[u8]>,
}

const WHOOP: &str = "sounds/8-bit_whoop.wav";
const KICK: &str = "sounds/8-bit_kick14.wav";
const PERC: &str = "sounds/8-bit_perc.wav";
const MUSIC_STEM: &str = "sounds/its-raining-pixels";
const MUSIC_EXTENSIONS: [&str; 4] = ["wav", "ogg", "mp3", "flac"];

#[derive(Debug, Clone)]
pub struct Assets {
    tiles: [Tile; 7],
    cover: Tile,
    whoop: Option<Sample>,
    kick: Option<Sample>,
    perc: Option<Sample>,
    music: Option<Track>,
}

/// Tile glyphs in picker order, echoing the handheld's block textures.
const GLYPHS: [&str; 7] = [
    "[]", // O: box
    "▚▚", // I: chessboard
    "()", // S: open target
    "<>", // Z: closed target
    "▓▓", // T: eye
    "╫╫", // L: tracks
    "╪╪", // J: tracks reversed
];

impl Assets {
    /// Tiles only, bell for every sample, no music.
    pub fn builtin(theme: &Theme) -> Self {
        Self {
            tiles: tiles(theme),
            cover: cover(theme),
            whoop: Some(Sample::Bell),
            kick: Some(Sample::Bell),
            perc: Some(Sample::Bell),
            music: None,
        }
    }

    /// Loads samples and music from `dir`. Anything missing is logged and left out.
    pub fn load(dir: Option<&Path>, theme: &Theme) -> Self {
        let Some(dir) = dir else {
            debug!("no asset directory, using terminal bell");
            return Self::builtin(theme);
        };
        let sample = |name: &str| match load_bytes(&dir.join(name)) {
            Ok(bytes) => Some(Sample::Clip {
                path: dir.join(name),
                bytes,
            }),
            Err(err) => {
                warn!(%err, "sample unavailable");
                None
            }
        };
        Self {
            tiles: tiles(theme),
            cover: cover(theme),
            whoop: sample(WHOOP),
            kick: sample(KICK),
            perc: sample(PERC),
            music: load_music(dir),
        }
    }

    pub fn tile(&self, piece: Piece) -> Option<Tile> {
        Piece::ALL
            .iter()
            .position(|&p| p == piece)
            .map(|i| self.tiles[i])
    }

    pub fn cover(&self) -> Tile {
        self.cover
    }

    pub fn sample(&self, sound: Sound) -> Option<&Sample> {
        match sound {
            Sound::Rotate => self.whoop.as_ref(),
            Sound::Settle | Sound::TopOut => self.kick.as_ref(),
            Sound::LineFlash => self.perc.as_ref(),
        }
    }

    pub fn music(&self) -> Option<&Track> {
        self.music.as_ref()
    }
}

fn tiles(theme: &Theme) -> [Tile; 7] {
    std::array::from_fn(|i| Tile {
        glyph: GLYPHS[i],
        color: theme.piece_color(Piece::ALL[i]),
    })
}

fn cover(theme: &Theme) -> Tile {
    Tile {
        glyph: "▥▥",
        color: theme.inactive_fg,
    }
}

fn load_bytes(path: &Path) -> Result<Arc<[u8]>, AssetError> {
    if !path.exists() {
        return Err(AssetError::Missing(path.to_path_buf()));
    }
    let bytes = std::fs::read(path).map_err(|source| AssetError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if bytes.is_empty() {
        return Err(AssetError::Empty(path.to_path_buf()));
    }
    Ok(bytes.into())
}

fn load_music(dir: &Path) -> Option<Track> {
    for ext in MUSIC_EXTENSIONS {
        let path = dir.join(MUSIC_STEM).with_extension(ext);
        if !path.exists() {
            continue;
        }
        match load_bytes(&path) {
            Ok(bytes) => return Some(Track { path, bytes }),
            Err(err) => warn!(%err, "music unavailable"),
        }
    }
    warn!(stem = %dir.join(MUSIC_STEM).display(), "no music track found");
    None
}
