//! Clock and date text formatting.

use std::fmt::Write;

use chrono::NaiveDate;

/// The three clock toggles from the settings panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockOptions {
    pub use_24_hour: bool,
    pub show_minutes: bool,
    pub show_seconds: bool,
}

impl Default for ClockOptions {
    fn default() -> Self {
        Self {
            use_24_hour: false,
            show_minutes: true,
            show_seconds: false,
        }
    }
}

/// Format a wall-clock time.
///
/// Hours are never zero padded. In 12-hour mode midnight and noon show as
/// `12` and an ` AM`/` PM` suffix is appended.
pub fn format_time(hour: u32, minute: u32, second: u32, opts: ClockOptions) -> String {
    let meridiem = if hour >= 12 { "PM" } else { "AM" };
    let hour = if opts.use_24_hour {
        hour
    } else {
        match hour % 12 {
            0 => 12,
            h => h,
        }
    };

    let mut text = hour.to_string();
    if opts.show_minutes {
        let _ = write!(text, ":{minute:02}");
    }
    if opts.show_seconds {
        let _ = write!(text, ":{second:02}");
    }
    if !opts.use_24_hour {
        text.push(' ');
        text.push_str(meridiem);
    }
    text
}

/// Long date, e.g. `Friday, October 16, 2026`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}
