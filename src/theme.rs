//! Theme colors with optional user overrides from
//! ~/.config/paddo/theme.toml (hex values, e.g. accent = "#fab387").

use ratatui::style::Color;
use serde::Deserialize;
use std::path::PathBuf;

/// Theme colors for the UI
#[derive(Debug, Clone)]
pub struct Theme {
    pub accent: Color,      // Active borders, cursor cell
    pub danger: Color,      // Delete confirmation, errors
    pub success: Color,     // Save confirmations
    pub warning: Color,     // Status messages
    pub text: Color,        // Primary text
    pub text_dim: Color,    // Hints, empty slots
    pub tile_bg: Color,     // Tile background when none is set
    pub bg_selected: Color, // Drag hover background
    pub inactive: Color,    // Inactive borders
    pub header: Color,      // Popup field titles
}

impl Default for Theme {
    fn default() -> Self {
        // Catppuccin-inspired fallback palette
        Self {
            accent: Color::Rgb(250, 179, 135),
            danger: Color::Rgb(243, 139, 168),
            success: Color::Rgb(166, 218, 149),
            warning: Color::Rgb(249, 226, 175),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            tile_bg: Color::Rgb(49, 50, 68),
            bg_selected: Color::Rgb(69, 71, 90),
            inactive: Color::Rgb(88, 91, 112),
            header: Color::Rgb(243, 139, 168),
        }
    }
}

/// On-disk shape: every field optional, unknown fields ignored.
#[derive(Debug, Default, Deserialize)]
struct ThemeFile {
    accent: Option<String>,
    danger: Option<String>,
    success: Option<String>,
    warning: Option<String>,
    text: Option<String>,
    text_dim: Option<String>,
    tile_bg: Option<String>,
    bg_selected: Option<String>,
    inactive: Option<String>,
    header: Option<String>,
}

impl Theme {
    /// Load the default palette with any user overrides applied.
    pub fn load() -> Self {
        match Self::theme_path().and_then(|p| std::fs::read_to_string(p).ok()) {
            Some(content) => match toml::from_str::<ThemeFile>(&content) {
                Ok(file) => Self::default().with_overrides(&file),
                Err(e) => {
                    tracing::warn!("Failed to parse theme.toml: {}", e);
                    Self::default()
                }
            },
            None => Self::default(),
        }
    }

    fn theme_path() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join("paddo").join("theme.toml"))
    }

    fn with_overrides(mut self, file: &ThemeFile) -> Self {
        let apply = |slot: &mut Color, value: &Option<String>| {
            if let Some(color) = value.as_deref().and_then(parse_hex_color) {
                *slot = color;
            }
        };
        apply(&mut self.accent, &file.accent);
        apply(&mut self.danger, &file.danger);
        apply(&mut self.success, &file.success);
        apply(&mut self.warning, &file.warning);
        apply(&mut self.text, &file.text);
        apply(&mut self.text_dim, &file.text_dim);
        apply(&mut self.tile_bg, &file.tile_bg);
        apply(&mut self.bg_selected, &file.bg_selected);
        apply(&mut self.inactive, &file.inactive);
        apply(&mut self.header, &file.header);
        self
    }
}

/// Parse "#rrggbb" (or "rrggbb") into a terminal color. Also used for
/// per-tile backgrounds stored in the snapshot.
pub fn parse_hex_color(s: &str) -> Option<Color> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_variants() {
        assert_eq!(parse_hex_color("#ffffff"), Some(Color::Rgb(255, 255, 255)));
        assert_eq!(parse_hex_color("1e1e2e"), Some(Color::Rgb(30, 30, 46)));
        assert_eq!(parse_hex_color(" #AABBCC "), Some(Color::Rgb(170, 187, 204)));
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("#gggggg"), None);
        assert_eq!(parse_hex_color(""), None);
    }

    #[test]
    fn overrides_apply_and_bad_values_are_ignored() {
        let file: ThemeFile = toml::from_str(
            r##"
            accent = "#112233"
            danger = "not-a-color"
            "##,
        )
        .unwrap();
        let theme = Theme::default().with_overrides(&file);
        assert_eq!(theme.accent, Color::Rgb(17, 34, 51));
        assert_eq!(theme.danger, Theme::default().danger);
    }
}
