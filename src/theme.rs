//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::piece::Piece;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Block colours for the seven kinds plus the UI chrome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Indexed in picker order: O, I, S, Z, T, L, J.
    pub pieces: [Color; 7],
    /// Playfield background.
    pub bg: Color,
    /// Box borders.
    pub div_line: Color,
    /// Box contents (score, level, lines, seed).
    pub main_fg: Color,
    /// Titles and the focused form field.
    pub title: Color,
    /// Unfocused form fields and the top-out cover.
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

const ONEDARK_PIECES: [Color; 7] = [
    rgb(0xE5C07B), // O yellow
    rgb(0x56B6C2), // I cyan
    rgb(0x98C379), // S green
    rgb(0xE06C75), // Z red
    rgb(0xC678DD), // T magenta
    rgb(0xD19A66), // L orange
    rgb(0x61AFEF), // J blue
];

const HIGH_CONTRAST_PIECES: [Color; 7] = [
    rgb(0xFFFF00),
    rgb(0x00FFFF),
    rgb(0x00FF00),
    rgb(0xFF0000),
    rgb(0xFF00FF),
    rgb(0xFF8800),
    rgb(0x0088FF),
];

// Paul Tol's bright scheme; never relies on red/green alone.
const COLORBLIND_PIECES: [Color; 7] = [
    rgb(0xCCBB44),
    rgb(0x66CCEE),
    rgb(0x228833),
    rgb(0xEE6677),
    rgb(0xAA3377),
    rgb(0xEE7733),
    rgb(0x4477AA),
];

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

impl Theme {
    /// One Dark values from onedark.theme.
    pub fn onedark_default() -> Self {
        Self {
            pieces: ONEDARK_PIECES,
            bg: rgb(0x282C34),
            div_line: rgb(0x3F444F),
            main_fg: rgb(0xABB2BF),
            title: rgb(0xE5C07B),
            inactive_fg: rgb(0x5C6370),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or the file is missing.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    pub fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::onedark_default();
        t.apply_palette(palette);
        t
    }

    /// Override block colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.pieces = HIGH_CONTRAST_PIECES;
                self.main_fg = Color::White;
            }
            crate::Palette::Colorblind => self.pieces = COLORBLIND_PIECES,
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| {
            map.get(key)
                .and_then(|v| parse_hex(v.trim_matches('"').trim_matches('\'').trim()).ok())
        };
        let d = Self::onedark_default();
        Self {
            pieces: [
                get("title").or_else(|| get("cpu_mid")).unwrap_or(d.pieces[0]),
                get("hi_fg").or_else(|| get("proc_misc")).unwrap_or(d.pieces[1]),
                get("mem_box").or_else(|| get("cpu_start")).unwrap_or(d.pieces[2]),
                get("cpu_end").or_else(|| get("temp_end")).unwrap_or(d.pieces[3]),
                get("net_box").unwrap_or(d.pieces[4]),
                get("temp_mid").or_else(|| get("used_mid")).unwrap_or(d.pieces[5]),
                get("cpu_box").unwrap_or(d.pieces[6]),
            ],
            bg: get("main_bg").unwrap_or(d.bg),
            div_line: get("div_line").unwrap_or(d.div_line),
            main_fg: get("main_fg").unwrap_or(d.main_fg),
            title: get("title").unwrap_or(d.title),
            inactive_fg: get("inactive_fg").unwrap_or(d.inactive_fg),
        }
    }

    /// Block colour for a piece kind; the background for `Piece::Empty`.
    #[inline]
    pub fn piece_color(&self, piece: Piece) -> Color {
        Piece::ALL
            .iter()
            .position(|&p| p == piece)
            .map_or(self.bg, |i| self.pieces[i])
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(eq) = rest.find('=') {
            let value = rest[eq + 1..]
                .trim()
                .trim_matches('"')
                .trim_matches('\'')
                .to_string();
            if !value.is_empty() {
                map.insert(key.to_string(), value);
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    if !s.is_ascii() {
        return Err(invalid());
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&s[range], 16).map_err(|_| invalid())
    };
    let (r, g, b) = match s.len() {
        6 => (channel(0..2)?, channel(2..4)?, channel(4..6)?),
        3 => (channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17),
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#98C379").unwrap();
        assert!(matches!(c, Color::Rgb(0x98, 0xC3, 0x79)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("#GGGGGG").is_err());
        assert!(parse_hex("#ÄÄÄ").is_err());
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[main_bg]="#31353F""##);
        assert_eq!(map.get("main_bg"), Some(&"#31353F".to_string()));
    }

    #[test]
    fn test_theme_file_overrides_defaults() {
        let map = parse_theme_file(
            "# comment\ntheme[cpu_box]=\"#010203\"\ntheme[main_bg]='#000000'\n",
        );
        let theme = Theme::from_map(&map);
        assert_eq!(theme.piece_color(Piece::J), Color::Rgb(1, 2, 3));
        assert_eq!(theme.bg, Color::Rgb(0, 0, 0));
        assert_eq!(theme.piece_color(Piece::O), ONEDARK_PIECES[0]);
    }

    #[test]
    fn test_piece_colors_follow_picker_order() {
        let theme = Theme::default();
        for (i, piece) in Piece::ALL.into_iter().enumerate() {
            assert_eq!(theme.piece_color(piece), theme.pieces[i]);
        }
        assert_eq!(theme.piece_color(Piece::Empty), theme.bg);
    }

    #[test]
    fn test_palettes_swap_piece_colors() {
        let hc = Theme::default_for_palette(crate::Palette::HighContrast);
        assert_eq!(hc.pieces, HIGH_CONTRAST_PIECES);
        let cb = Theme::default_for_palette(crate::Palette::Colorblind);
        assert_eq!(cb.pieces, COLORBLIND_PIECES);
    }
}
