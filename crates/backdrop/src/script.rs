//! Timed playback of scripted lines.
//!
//! Scripts are plain static tables; the player only knows when the next
//! line is due. What a line means (text on screen, speech, a chat entry)
//! is up to the caller.

use std::time::{Duration, Instant};

use backdrop_core::Timeout;

/// Something the player produced on a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptEvent<'a, L> {
    /// The next line is due.
    Line(&'a L),
    /// A poll came due after the last line.
    Finished,
}

/// Plays a static script one line at a time.
#[derive(Debug)]
pub struct ScriptPlayer<L: 'static> {
    lines: &'static [L],
    next: usize,
    timer: Timeout,
}

impl<L: 'static> ScriptPlayer<L> {
    /// Start playing `lines`, the first one due after `first_delay`.
    pub fn start(lines: &'static [L], now: Instant, first_delay: Duration) -> Self {
        let mut timer = Timeout::default();
        timer.set(now, first_delay);
        Self {
            lines,
            next: 0,
            timer,
        }
    }

    /// All lines have been emitted.
    pub fn is_exhausted(&self) -> bool {
        self.next >= self.lines.len()
    }

    /// Whether the player is still waiting on its timer.
    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.timer.is_pending()
    }

    /// Check the timer. When it fires, emit the next line and wait
    /// `next_delay()` before the following poll can fire, or report the
    /// end of the script and stop.
    pub fn poll(
        &mut self,
        now: Instant,
        next_delay: impl FnOnce() -> Duration,
    ) -> Option<ScriptEvent<'static, L>> {
        if !self.timer.poll(now) {
            return None;
        }
        match self.lines.get(self.next) {
            Some(line) => {
                self.next += 1;
                self.timer.set(now, next_delay());
                Some(ScriptEvent::Line(line))
            }
            None => Some(ScriptEvent::Finished),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static LINES: [&str; 2] = ["ESTABLISHING LINK...", "GOODBYE."];

    #[test]
    fn test_lines_then_finished() {
        let t0 = Instant::now();
        let step = Duration::from_millis(100);
        let mut player = ScriptPlayer::start(&LINES, t0, step);

        assert_eq!(player.poll(t0, || step), None);
        assert_eq!(
            player.poll(t0 + step, || step),
            Some(ScriptEvent::Line(&"ESTABLISHING LINK..."))
        );
        assert_eq!(
            player.poll(t0 + step * 2, || step),
            Some(ScriptEvent::Line(&"GOODBYE."))
        );
        assert!(player.is_exhausted());
        assert!(player.is_running());
        assert_eq!(player.poll(t0 + step * 3, || step), Some(ScriptEvent::Finished));
        assert!(!player.is_running());
        assert_eq!(player.poll(t0 + step * 10, || step), None);
    }
}
