//! The quote line under the clock.

use std::time::{Duration, Instant};

use backdrop_core::{Interval, Timeout};

pub const QUOTES: [&str; 8] = [
    "There is no spoon.",
    "Free your mind.",
    "I know kung fu.",
    "Follow the white rabbit.",
    "The answer is out there.",
    "Welcome to the desert of the real.",
    "Ignorance is bliss.",
    "Choice is an illusion.",
];

pub const DEFAULT_QUOTE: &str = QUOTES[0];

pub const CYCLE_PERIOD: Duration = Duration::from_secs(15);
pub const FADE: Duration = Duration::from_millis(500);

/// Shows a custom quote, the default, or the cycling list.
///
/// Cycling fades the current quote out, swaps the text after [`FADE`],
/// and fades back in. The list restarts from the top every time cycling
/// is switched on.
#[derive(Debug, Clone)]
pub struct QuoteCycler {
    text: String,
    next_index: usize,
    cycle: Interval,
    swap: Timeout,
    faded: bool,
}

impl Default for QuoteCycler {
    fn default() -> Self {
        Self {
            text: DEFAULT_QUOTE.to_string(),
            next_index: 0,
            cycle: Interval::new(CYCLE_PERIOD),
            swap: Timeout::default(),
            faded: false,
        }
    }
}

impl QuoteCycler {
    /// Apply the quote settings. A non-empty custom quote wins over
    /// cycling.
    pub fn configure(&mut self, custom: &str, cycling: bool, now: Instant) {
        self.stop();
        if !custom.trim().is_empty() {
            self.text = custom.to_string();
        } else if cycling {
            self.next_index = 0;
            self.cycle.start(now);
        } else {
            self.text = DEFAULT_QUOTE.to_string();
        }
    }

    pub fn stop(&mut self) {
        self.cycle.cancel();
        self.swap.cancel();
        self.faded = false;
    }

    #[cfg(test)]
    pub fn is_cycling(&self) -> bool {
        self.cycle.is_active()
    }

    /// The text without quotation marks.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// True during the fade-out half second.
    pub fn is_faded(&self) -> bool {
        self.faded
    }

    pub fn tick(&mut self, now: Instant) {
        if self.cycle.poll(now) {
            self.faded = true;
            self.swap.set(now, FADE);
        }
        if self.swap.poll(now) {
            self.text = QUOTES[self.next_index].to_string();
            self.next_index = (self.next_index + 1) % QUOTES.len();
            self.faded = false;
        }
    }
}
