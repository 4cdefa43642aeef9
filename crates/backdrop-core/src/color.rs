//! Theme colors.

use ratatui::style::Color;

/// Rain color used when no valid color is configured.
pub const DEFAULT_RAIN_COLOR: ThemeColor = ThemeColor::new(0x00, 0xf2, 0xff);

/// The classic green override.
pub const CLASSIC_GREEN: ThemeColor = ThemeColor::new(0x00, 0xff, 0x41);

/// An RGB theme color as picked in the settings panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Default for ThemeColor {
    fn default() -> Self {
        DEFAULT_RAIN_COLOR
    }
}

impl ThemeColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn parse(text: &str) -> Option<Self> {
        let hex = text.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Parse, falling back to the default rain color.
    pub fn parse_or_default(text: &str) -> Self {
        Self::parse(text).unwrap_or_default()
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Multiply every channel by `factor` (clamped to 0.0-1.0).
    pub fn scaled(self, factor: f32) -> Self {
        let factor = factor.clamp(0.0, 1.0);
        let scale = |c: u8| (c as f32 * factor).round() as u8;
        Self::new(scale(self.r), scale(self.g), scale(self.b))
    }

    /// Convert to a terminal color.
    pub fn color(self) -> Color {
        Color::Rgb(self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(ThemeColor::parse("#00FF41"), Some(CLASSIC_GREEN));
        assert_eq!(ThemeColor::parse("00f2ff"), Some(DEFAULT_RAIN_COLOR));
        assert_eq!(ThemeColor::parse("#0f0"), None);
        assert_eq!(ThemeColor::parse("#gg0000"), None);
        assert_eq!(ThemeColor::parse_or_default("red"), DEFAULT_RAIN_COLOR);
    }

    #[test]
    fn test_scaled_and_hex() {
        let c = ThemeColor::new(200, 100, 0).scaled(0.5);
        assert_eq!(c, ThemeColor::new(100, 50, 0));
        assert_eq!(CLASSIC_GREEN.to_hex(), "#00ff41");
    }
}
