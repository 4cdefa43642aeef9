//! Background media scale mode.

/// How an uploaded backdrop is fitted to the screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScaleMode {
    #[default]
    Cover,
    Contain,
    Fill,
}

impl ScaleMode {
    /// Parse the stored value, defaulting to cover.
    pub fn parse(text: &str) -> Self {
        match text.trim().to_ascii_lowercase().as_str() {
            "contain" => ScaleMode::Contain,
            "fill" | "100% 100%" => ScaleMode::Fill,
            _ => ScaleMode::Cover,
        }
    }

    /// Value as stored in the settings file.
    pub fn as_str(self) -> &'static str {
        match self {
            ScaleMode::Cover => "cover",
            ScaleMode::Contain => "contain",
            ScaleMode::Fill => "fill",
        }
    }

    /// Cycle to the next mode.
    pub fn next(self) -> Self {
        match self {
            ScaleMode::Cover => ScaleMode::Contain,
            ScaleMode::Contain => ScaleMode::Fill,
            ScaleMode::Fill => ScaleMode::Cover,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_known_modes() {
        for mode in [ScaleMode::Cover, ScaleMode::Contain, ScaleMode::Fill] {
            assert_eq!(ScaleMode::parse(mode.as_str()), mode);
        }
        assert_eq!(ScaleMode::parse("stretch"), ScaleMode::Cover);
    }
}
