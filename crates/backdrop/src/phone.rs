//! The incoming-call easter egg.
//!
//! `Idle -> Ringing -> Receiving -> Idle`. A ring interval fires every few
//! minutes; answering plays a stored voice message or narrates one of the
//! built-in scripts, then hangs up.

use std::time::{Duration, Instant};

use backdrop_core::{Interval, Timeout};
use rand::{Rng, seq::IndexedRandom};
use tracing::debug;

use crate::audio::{AudioOutput, Cue, Narrator, Playback};
use crate::script::{ScriptEvent, ScriptPlayer};

/// Delay between narrated lines.
const LINE_DELAY: Duration = Duration::from_millis(1800);
/// Pause after the last line before hanging up.
const HANGUP_DELAY: Duration = Duration::from_millis(2500);
/// Time from the hangup cue until the phone is idle again.
const RESET_DELAY: Duration = Duration::from_millis(1200);

pub const IDLE_TEXT: &str = "INCOMING SIGNAL...";
pub const RECORDING_TEXT: &str = "ENCRYPTED TRANSMISSION...";

/// Narrated call scripts.
pub static CALL_SCRIPTS: [&[&str]; 2] = [
    &[
        "ESTABLISHING LINK...",
        "CONNECTION SECURED.",
        "THEY'RE WATCHING YOU, NEO.",
        "GOODBYE.",
    ],
    &[
        "SYSTEM BREACH...",
        "KNOCK, KNOCK, NEO.",
        "FOLLOW THE WHITE RABBIT.",
        "RUN.",
    ],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhoneState {
    Idle,
    Ringing,
    Receiving,
}

/// The call simulator.
pub struct Phone {
    state: PhoneState,
    /// Set from answering until the phone is idle again.
    busy: bool,
    enabled: bool,
    text: String,
    ring: Interval,
    script: Option<ScriptPlayer<&'static str>>,
    playback: Option<Box<dyn Playback>>,
    hangup: Timeout,
    reset: Timeout,
}

impl std::fmt::Debug for Phone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Phone")
            .field("state", &self.state)
            .field("busy", &self.busy)
            .field("enabled", &self.enabled)
            .field("text", &self.text)
            .finish_non_exhaustive()
    }
}

impl Default for Phone {
    fn default() -> Self {
        Self {
            state: PhoneState::Idle,
            busy: false,
            enabled: false,
            text: IDLE_TEXT.to_string(),
            ring: Interval::new(Duration::from_secs(180)),
            script: None,
            playback: None,
            hangup: Timeout::default(),
            reset: Timeout::default(),
        }
    }
}

impl Phone {
    pub fn state(&self) -> PhoneState {
        self.state
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    #[cfg(test)]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Apply the enabled flag and ring frequency. The previous ring timer
    /// is always cancelled first.
    pub fn configure(
        &mut self,
        enabled: bool,
        frequency_minutes: u32,
        now: Instant,
        audio: &mut dyn AudioOutput,
    ) {
        self.enabled = enabled;
        self.ring.cancel();
        if enabled {
            let minutes = u64::from(frequency_minutes.max(1));
            self.ring.restart(Duration::from_secs(minutes * 60), now);
        } else if self.state == PhoneState::Ringing {
            self.state = PhoneState::Idle;
            audio.stop_ring();
        }
    }

    /// Start ringing unless disabled or a call is in progress.
    pub fn ring(&mut self, audio: &mut dyn AudioOutput) {
        if self.busy || !self.enabled || self.state != PhoneState::Idle {
            return;
        }
        self.state = PhoneState::Ringing;
        audio.play_cue(Cue::Ring);
    }

    /// Pick up a ringing phone. Returns false when there was nothing to
    /// answer or a call is already in progress.
    pub fn answer(
        &mut self,
        now: Instant,
        voice_messages: Vec<Vec<u8>>,
        audio: &mut dyn AudioOutput,
        rng: &mut impl Rng,
    ) -> bool {
        if self.state != PhoneState::Ringing || self.busy {
            return false;
        }
        self.busy = true;
        self.state = PhoneState::Receiving;
        audio.stop_ring();

        if let Some(clip) = voice_messages.choose(rng) {
            self.text = RECORDING_TEXT.to_string();
            match audio.play_clip(clip.clone()) {
                Ok(playback) => self.playback = Some(playback),
                Err(e) => {
                    debug!(error = %e, "voice message playback failed");
                    self.finish(now, audio);
                }
            }
        } else {
            let script = CALL_SCRIPTS.choose(rng).copied().unwrap_or(&[]);
            self.script = Some(ScriptPlayer::start(script, now, LINE_DELAY));
        }
        true
    }

    /// Drive the timers.
    pub fn tick(&mut self, now: Instant, audio: &mut dyn AudioOutput, narrator: &mut dyn Narrator) {
        if self.ring.poll(now) {
            self.ring(audio);
        }

        if let Some(script) = &mut self.script {
            match script.poll(now, || LINE_DELAY) {
                Some(ScriptEvent::Line(line)) => {
                    self.text = (*line).to_string();
                    narrator.speak(line);
                }
                Some(ScriptEvent::Finished) => {
                    self.script = None;
                    self.hangup.set(now, HANGUP_DELAY);
                }
                None => {}
            }
        }

        if self.playback.as_ref().is_some_and(|p| p.is_finished()) {
            self.playback = None;
            self.finish(now, audio);
        }

        if self.hangup.poll(now) {
            self.finish(now, audio);
        }

        if self.reset.poll(now) {
            self.state = PhoneState::Idle;
            self.text = IDLE_TEXT.to_string();
            self.busy = false;
        }
    }

    fn finish(&mut self, now: Instant, audio: &mut dyn AudioOutput) {
        audio.play_cue(Cue::Hangup);
        self.reset.set(now, RESET_DELAY);
    }
}
