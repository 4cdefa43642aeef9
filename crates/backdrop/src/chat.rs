//! The scripted chat terminal.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use backdrop_core::Timeout;
use rand::{Rng, seq::IndexedRandom};
use ratatui::style::Color;

use crate::audio::{AudioOutput, Cue};
use crate::script::{ScriptEvent, ScriptPlayer};

/// Oldest lines are dropped beyond this many.
const MAX_LOG_LINES: usize = 200;

/// Who is talking, for coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Morpheus,
    Trinity,
    Neo,
    Smith,
    Oracle,
}

impl Tone {
    pub fn color(self) -> Color {
        match self {
            Tone::Morpheus => Color::Rgb(0, 200, 255),
            Tone::Trinity => Color::Rgb(255, 0, 200),
            Tone::Neo => Color::Rgb(0, 255, 65),
            Tone::Smith => Color::Rgb(255, 60, 60),
            Tone::Oracle => Color::Rgb(255, 200, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatLine {
    pub speaker: &'static str,
    pub text: &'static str,
    pub tone: Tone,
}

const fn line(speaker: &'static str, text: &'static str, tone: Tone) -> ChatLine {
    ChatLine {
        speaker,
        text,
        tone,
    }
}

pub static CHAT_SCRIPTS: [&[ChatLine]; 6] = [
    &[
        line("MORPHEUS", "Neo, sooner or later you're going to realize...", Tone::Morpheus),
        line(
            "MORPHEUS",
            "...there's a difference between knowing the path and walking the path.",
            Tone::Morpheus,
        ),
    ],
    &[
        line("TRINITY", "Please, Neo. You have to trust me.", Tone::Trinity),
        line("NEO", "Why?", Tone::Neo),
        line(
            "TRINITY",
            "Because you have been down there, Neo. You know that road.",
            Tone::Trinity,
        ),
    ],
    &[
        line("AGENT SMITH", "It is purpose that created us.", Tone::Smith),
        line("AGENT SMITH", "Purpose that connects us. Purpose that pulls us.", Tone::Smith),
        line("AGENT SMITH", "It is purpose that defines us.", Tone::Smith),
    ],
    &[
        line("ORACLE", "I'd ask you to sit down, but you're not going to anyway.", Tone::Oracle),
        line("ORACLE", "And don't worry about the vase.", Tone::Oracle),
        line("NEO", "What vase?", Tone::Neo),
    ],
    &[
        line(
            "MORPHEUS",
            "This is your last chance. After this, there is no turning back.",
            Tone::Morpheus,
        ),
        line("MORPHEUS", "You take the blue pill, the story ends.", Tone::Morpheus),
        line("MORPHEUS", "You take the red pill, you stay in Wonderland.", Tone::Morpheus),
    ],
    &[
        line("TRINITY", "The answer is out there, Neo.", Tone::Trinity),
        line(
            "TRINITY",
            "It's looking for you, and it will find you if you want it to.",
            Tone::Trinity,
        ),
    ],
];

fn line_delay(rng: &mut impl Rng) -> Duration {
    Duration::from_millis(rng.random_range(2000..4000))
}

fn rest_delay(rng: &mut impl Rng) -> Duration {
    Duration::from_millis(rng.random_range(10_000..20_000))
}

/// Emits random dialogues into a scrolling log.
#[derive(Debug, Default)]
pub struct ChatSimulator {
    enabled: bool,
    player: Option<ScriptPlayer<ChatLine>>,
    /// Pause between two dialogues.
    rest: Timeout,
    log: VecDeque<&'static ChatLine>,
}

impl ChatSimulator {
    pub fn log(&self) -> &VecDeque<&'static ChatLine> {
        &self.log
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turning the chat on starts a dialogue; turning it off stops before
    /// the next line. Lines already shown stay.
    pub fn set_enabled(&mut self, enabled: bool, now: Instant, rng: &mut impl Rng) {
        if enabled && !self.enabled {
            self.enabled = true;
            self.start_script(now, rng);
        } else if !enabled {
            self.enabled = false;
            self.player = None;
            self.rest.cancel();
        }
    }

    fn start_script(&mut self, now: Instant, rng: &mut impl Rng) {
        self.rest.cancel();
        let script = CHAT_SCRIPTS.choose(rng).copied().unwrap_or(&[]);
        self.player = Some(ScriptPlayer::start(script, now, line_delay(rng)));
    }

    pub fn tick(&mut self, now: Instant, audio: &mut dyn AudioOutput, rng: &mut impl Rng) {
        if !self.enabled {
            return;
        }

        if self.rest.poll(now) {
            self.start_script(now, rng);
        }

        let Some(player) = &mut self.player else {
            return;
        };
        match player.poll(now, || line_delay(rng)) {
            Some(ScriptEvent::Line(line)) => {
                self.log.push_back(line);
                if self.log.len() > MAX_LOG_LINES {
                    self.log.pop_front();
                }
                audio.play_cue(Cue::Beep);
                if player.is_exhausted() {
                    self.player = None;
                    self.rest.set(now, rest_delay(rng));
                }
            }
            Some(ScriptEvent::Finished) => {
                // empty script
                self.player = None;
                self.rest.set(now, rest_delay(rng));
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::tests::RecordingAudio;
    use rand::{SeedableRng, rngs::StdRng};

    fn run_for(
        chat: &mut ChatSimulator,
        t0: Instant,
        secs: u64,
        audio: &mut RecordingAudio,
        rng: &mut StdRng,
    ) {
        for ms in (0..secs * 1000).step_by(100) {
            chat.tick(t0 + Duration::from_millis(ms), audio, rng);
        }
    }

    #[test]
    fn test_first_dialogue_plays_in_full() {
        let t0 = Instant::now();
        let mut rng = StdRng::seed_from_u64(1);
        let mut audio = RecordingAudio::default();
        let mut chat = ChatSimulator::default();
        chat.set_enabled(true, t0, &mut rng);

        // three lines at most 4 s apart, then a rest of at least 10 s
        run_for(&mut chat, t0, 13, &mut audio, &mut rng);
        let len = chat.log().len();
        assert!((2..=3).contains(&len));
        let matches_script = |script: &&[ChatLine]| {
            script.len() == len && script.iter().zip(chat.log()).all(|(a, b)| a == *b)
        };
        assert!(CHAT_SCRIPTS.iter().any(matches_script));
        assert_eq!(audio.cues, vec![Cue::Beep; len]);
    }

    #[test]
    fn test_dialogues_repeat_after_rest() {
        let t0 = Instant::now();
        let mut rng = StdRng::seed_from_u64(2);
        let mut audio = RecordingAudio::default();
        let mut chat = ChatSimulator::default();
        chat.set_enabled(true, t0, &mut rng);

        run_for(&mut chat, t0, 120, &mut audio, &mut rng);
        assert!(chat.log().len() > 6);
    }

    #[test]
    fn test_disable_stops_without_rewinding() {
        let t0 = Instant::now();
        let mut rng = StdRng::seed_from_u64(3);
        let mut audio = RecordingAudio::default();
        let mut chat = ChatSimulator::default();
        chat.set_enabled(true, t0, &mut rng);

        let mut at = t0;
        while chat.log().is_empty() {
            at += Duration::from_millis(100);
            chat.tick(at, &mut audio, &mut rng);
        }
        let shown = chat.log().len();

        chat.set_enabled(false, at, &mut rng);
        for s in 1..60 {
            chat.tick(at + Duration::from_secs(s), &mut audio, &mut rng);
        }
        assert_eq!(chat.log().len(), shown);
    }

    #[test]
    fn test_log_is_capped() {
        let t0 = Instant::now();
        let mut rng = StdRng::seed_from_u64(4);
        let mut audio = RecordingAudio::default();
        let mut chat = ChatSimulator::default();
        chat.set_enabled(true, t0, &mut rng);

        // a two-line dialogue plus its rest takes at most 28 s
        run_for(&mut chat, t0, 3000, &mut audio, &mut rng);
        assert!(audio.cues.len() > MAX_LOG_LINES);
        assert_eq!(chat.log().len(), MAX_LOG_LINES);
    }
}
