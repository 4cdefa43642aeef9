//! Core types shared by the backdrop crates.
//!
//! Nothing in here touches the terminal or the filesystem: glyph
//! alphabets, theme colors, clock formatting and the timer handles every
//! component uses to schedule its own work from the main loop.

mod alphabet;
mod clock;
mod color;
mod scale;
mod timer;

pub use alphabet::{Alphabet, BINARY_GLYPHS, MATRIX_GLYPHS, scramble};
pub use clock::{ClockOptions, format_date, format_time};
pub use color::{CLASSIC_GREEN, DEFAULT_RAIN_COLOR, ThemeColor};
pub use scale::ScaleMode;
pub use timer::{Interval, Timeout};
