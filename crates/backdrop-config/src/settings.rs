//! The configuration record.

use backdrop_core::{
    Alphabet, CLASSIC_GREEN, ClockOptions, DEFAULT_RAIN_COLOR, ScaleMode, ThemeColor,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::store::SettingsStore;

/// Every user-adjustable option. Missing keys take their default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Rain color as `#rrggbb`.
    pub rain_color: String,
    /// Rain tick interval in milliseconds.
    pub rain_speed: u64,
    /// Scale of the main clock panel.
    pub ui_scale: f32,
    /// Scale of the date and quote text.
    pub text_scale: f32,
    pub show_minutes: bool,
    pub show_seconds: bool,
    pub use_24_hour: bool,
    /// Force the classic green instead of `rain_color`.
    pub matrix_green: bool,
    /// Rain with binary digits only.
    pub binary: bool,
    pub cyberpunk_font: bool,
    /// New random hue for every glyph on every tick.
    pub flashing: bool,
    /// Draw the clock panel without a fill.
    pub transparent: bool,
    pub glow: bool,
    pub scanline: bool,
    /// Dim the rain behind the panel.
    pub bg_filter: bool,
    pub glitch: bool,
    /// Maximum glitch offset in cells.
    pub glitch_intensity: u16,
    /// Backdrop fit, one of `cover`, `contain`, `fill`.
    pub scale_mode: String,
    pub cycle_quotes: bool,
    pub custom_quote: String,
    /// Floating sentinel sprites.
    pub sprites: bool,
    pub phone_enabled: bool,
    /// Minutes between incoming calls.
    pub phone_frequency: u32,
    pub chat_enabled: bool,
    pub feed_enabled: bool,
    /// Subreddits joined with `+`.
    pub feed_subreddits: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rain_color: DEFAULT_RAIN_COLOR.to_hex(),
            rain_speed: 35,
            ui_scale: 1.0,
            text_scale: 1.2,
            show_minutes: true,
            show_seconds: false,
            use_24_hour: false,
            matrix_green: false,
            binary: false,
            cyberpunk_font: false,
            flashing: false,
            transparent: false,
            glow: false,
            scanline: false,
            bg_filter: false,
            glitch: false,
            glitch_intensity: 5,
            scale_mode: ScaleMode::Cover.as_str().to_string(),
            cycle_quotes: false,
            custom_quote: String::new(),
            sprites: false,
            phone_enabled: true,
            phone_frequency: 3,
            chat_enabled: true,
            feed_enabled: false,
            feed_subreddits: "matrix+cyberpunk".to_string(),
        }
    }
}

impl Settings {
    /// Merge a stored, possibly partial record over the defaults.
    ///
    /// Keys are applied one at a time so a single value of the wrong type
    /// only loses that key. Unknown keys are ignored.
    pub fn merged_over_defaults(stored: &toml::Table) -> Self {
        let defaults = Self::default();
        let Ok(toml::Value::Table(mut merged)) = toml::Value::try_from(&defaults) else {
            return defaults;
        };

        for (key, value) in stored {
            if !merged.contains_key(key) {
                continue;
            }
            let mut candidate = merged.clone();
            candidate.insert(key.clone(), value.clone());
            if toml::Value::Table(candidate.clone()).try_into::<Self>().is_ok() {
                merged = candidate;
            } else {
                warn!(key = %key, "ignoring stored setting with unexpected type");
            }
        }

        toml::Value::Table(merged)
            .try_into()
            .unwrap_or(defaults)
    }

    /// Every key of the record in stored form.
    pub fn keys() -> Vec<String> {
        match toml::Value::try_from(Self::default()) {
            Ok(toml::Value::Table(table)) => table.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// The stored form of a single key, for writing one key at a time.
    pub fn value_of(&self, key: &str) -> Option<toml::Value> {
        match toml::Value::try_from(self) {
            Ok(toml::Value::Table(mut table)) => table.remove(key),
            _ => None,
        }
    }

    /// The color the rain and theme actually use.
    pub fn effective_rain_color(&self) -> ThemeColor {
        if self.matrix_green {
            CLASSIC_GREEN
        } else {
            ThemeColor::parse_or_default(&self.rain_color)
        }
    }

    pub fn alphabet(&self) -> Alphabet {
        Alphabet::from_binary(self.binary)
    }

    pub fn clock_options(&self) -> ClockOptions {
        ClockOptions {
            use_24_hour: self.use_24_hour,
            show_minutes: self.show_minutes,
            show_seconds: self.show_seconds,
        }
    }

    pub fn scale_mode(&self) -> ScaleMode {
        ScaleMode::parse(&self.scale_mode)
    }
}

/// Normalize user input for the subreddit list: commas become `+` and
/// whitespace is removed.
pub fn normalize_subreddits(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '+' } else { c })
        .collect()
}

/// Load the effective settings from a store, falling back to defaults.
pub fn load_settings(store: &dyn SettingsStore) -> Settings {
    match store.get_all() {
        Ok(Some(table)) => Settings::merged_over_defaults(&table),
        Ok(None) => Settings::default(),
        Err(e) => {
            warn!(error = %e, "failed to read settings, using defaults");
            Settings::default()
        }
    }
}
