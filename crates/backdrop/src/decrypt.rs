//! Scramble-then-resolve text animation for feed titles.
//!
//! The reveal counter is fractional: it grows by a third of a character
//! per tick while hovered and shrinks by half a character per tick
//! otherwise. Position `i` shows the real character when `i < counter`,
//! so fractional counters behave as if truncated.

use std::time::{Duration, Instant};

use backdrop_core::{Alphabet, Interval, scramble};
use rand::Rng;

/// Animation cadence.
pub const DECRYPT_TICK: Duration = Duration::from_millis(30);

const REVEAL_STEP: f64 = 1.0 / 3.0;
const CONCEAL_STEP: f64 = 1.0 / 2.0;

#[derive(Debug, Clone)]
pub struct Decrypt {
    target: Vec<char>,
    iteration: f64,
    hovering: bool,
    timer: Interval,
    display: String,
}

impl Decrypt {
    /// A fully scrambled title.
    pub fn new(target: &str, rng: &mut impl Rng) -> Self {
        Self {
            target: target.chars().collect(),
            iteration: 0.0,
            hovering: false,
            timer: Interval::new(DECRYPT_TICK),
            display: scramble(target, rng),
        }
    }

    /// What to show right now.
    pub fn display(&self) -> &str {
        &self.display
    }

    #[cfg(test)]
    pub fn iteration(&self) -> f64 {
        self.iteration
    }

    pub fn is_animating(&self) -> bool {
        self.timer.is_active()
    }

    /// Start revealing (`true`) or concealing (`false`) from wherever the
    /// counter is now, replacing any animation in progress.
    pub fn hover(&mut self, hovering: bool, now: Instant) {
        self.hovering = hovering;
        self.timer.restart(DECRYPT_TICK, now);
    }

    /// Advance the animation if a tick is due. Returns true on change.
    pub fn tick(&mut self, now: Instant, rng: &mut impl Rng) -> bool {
        if !self.timer.poll(now) {
            return false;
        }
        self.step(rng);
        true
    }

    fn step(&mut self, rng: &mut impl Rng) {
        let iteration = self.iteration;
        self.display = self
            .target
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                if (i as f64) < iteration {
                    c
                } else {
                    Alphabet::Matrix.random_glyph(rng)
                }
            })
            .collect();

        let len = self.target.len() as f64;
        if self.hovering {
            self.iteration += REVEAL_STEP;
            if self.iteration >= len {
                self.iteration = len;
                self.display = self.target.iter().collect();
                self.timer.cancel();
            }
        } else {
            self.iteration -= CONCEAL_STEP;
            if self.iteration <= 0.0 {
                self.iteration = 0.0;
                let target: String = self.target.iter().collect();
                self.display = scramble(&target, rng);
                self.timer.cancel();
            }
        }
    }
}
