//! Sound cues, voice message playback and speech.
//!
//! Every failure here is logged at debug level and otherwise ignored; a
//! feature without sound still works visually.

use std::io::Write;
use std::process::{Child, Command, Stdio};

use tracing::debug;

/// Short sound effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Ring,
    Hangup,
    Beep,
}

/// A clip that is playing.
pub trait Playback {
    fn is_finished(&self) -> bool;
}

/// Where sounds go.
pub trait AudioOutput {
    fn play_cue(&mut self, cue: Cue);
    /// Silence the ring started by [`Cue::Ring`].
    fn stop_ring(&mut self);
    /// Start playing an encoded audio clip.
    fn play_clip(&mut self, bytes: Vec<u8>) -> Result<Box<dyn Playback>, String>;
}

/// Speech synthesis.
pub trait Narrator {
    fn speak(&mut self, text: &str);
}

/// Cues as terminal bells; clips cannot be played.
#[derive(Debug, Default)]
pub struct TerminalBell;

impl AudioOutput for TerminalBell {
    fn play_cue(&mut self, cue: Cue) {
        let mut out = std::io::stdout();
        if let Err(e) = out.write_all(b"\x07").and_then(|_| out.flush()) {
            debug!(?cue, error = %e, "bell failed");
        }
    }

    fn stop_ring(&mut self) {}

    fn play_clip(&mut self, _bytes: Vec<u8>) -> Result<Box<dyn Playback>, String> {
        Err("no audio backend".to_string())
    }
}

/// Keep only what a speech engine should read out: lowercase letters,
/// spaces and basic punctuation.
pub fn speech_text(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || matches!(c, ' ' | ',' | '.' | '?' | '!'))
        .collect()
}

/// Speech through the `espeak` command at a low pitch and slow rate.
#[derive(Debug, Default)]
pub struct EspeakNarrator {
    children: Vec<Child>,
}

impl Narrator for EspeakNarrator {
    fn speak(&mut self, text: &str) {
        // reap finished speakers
        self.children
            .retain_mut(|child| matches!(child.try_wait(), Ok(None)));

        let spawned = Command::new("espeak")
            .args(["-p", "5", "-s", "140"])
            .arg(speech_text(text))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(child) => self.children.push(child),
            Err(e) => debug!(error = %e, "speech unavailable"),
        }
    }
}

#[cfg(feature = "audio")]
pub use rodio_output::RodioOutput;

#[cfg(feature = "audio")]
mod rodio_output {
    use std::io::Cursor;
    use std::time::Duration;

    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source, source::SineWave};
    use tracing::{debug, warn};

    use super::{AudioOutput, Cue, Playback};

    struct SinkPlayback(Sink);

    impl Playback for SinkPlayback {
        fn is_finished(&self) -> bool {
            self.0.empty()
        }
    }

    /// Audio through the default output device.
    pub struct RodioOutput {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        ring: Option<Sink>,
        cues: Vec<Sink>,
    }

    impl RodioOutput {
        pub fn try_default() -> Option<Self> {
            match OutputStream::try_default() {
                Ok((stream, handle)) => Some(Self {
                    _stream: stream,
                    handle,
                    ring: None,
                    cues: Vec::new(),
                }),
                Err(e) => {
                    warn!(error = %e, "audio output unavailable");
                    None
                }
            }
        }

        fn tone(&mut self, freq: f32, millis: u64, repeats: usize) -> Option<Sink> {
            let sink = Sink::try_new(&self.handle)
                .map_err(|e| debug!(error = %e, "cue sink failed"))
                .ok()?;
            for _ in 0..repeats {
                sink.append(
                    SineWave::new(freq)
                        .take_duration(Duration::from_millis(millis))
                        .amplify(0.15),
                );
                sink.append(
                    SineWave::new(freq)
                        .take_duration(Duration::from_millis(millis))
                        .amplify(0.0),
                );
            }
            Some(sink)
        }
    }

    impl AudioOutput for RodioOutput {
        fn play_cue(&mut self, cue: Cue) {
            self.cues.retain(|sink| !sink.empty());
            match cue {
                Cue::Ring => self.ring = self.tone(440.0, 400, 6),
                Cue::Hangup => {
                    if let Some(sink) = self.tone(300.0, 150, 3) {
                        self.cues.push(sink);
                    }
                }
                Cue::Beep => {
                    if let Some(sink) = self.tone(1200.0, 40, 1) {
                        self.cues.push(sink);
                    }
                }
            }
        }

        fn stop_ring(&mut self) {
            if let Some(sink) = self.ring.take() {
                sink.stop();
            }
        }

        fn play_clip(&mut self, bytes: Vec<u8>) -> Result<Box<dyn Playback>, String> {
            let source = Decoder::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;
            let sink = Sink::try_new(&self.handle).map_err(|e| e.to_string())?;
            sink.append(source);
            Ok(Box::new(SinkPlayback(sink)))
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Records cues; clips "play" until `finish` is set.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingAudio {
        pub cues: Vec<Cue>,
        pub clips: usize,
        pub ring_stopped: usize,
        pub fail_clips: bool,
        pub finish: Rc<Cell<bool>>,
    }

    struct FlagPlayback(Rc<Cell<bool>>);

    impl Playback for FlagPlayback {
        fn is_finished(&self) -> bool {
            self.0.get()
        }
    }

    impl AudioOutput for RecordingAudio {
        fn play_cue(&mut self, cue: Cue) {
            self.cues.push(cue);
        }

        fn stop_ring(&mut self) {
            self.ring_stopped += 1;
        }

        fn play_clip(&mut self, _bytes: Vec<u8>) -> Result<Box<dyn Playback>, String> {
            if self.fail_clips {
                return Err("undecodable".into());
            }
            self.clips += 1;
            Ok(Box::new(FlagPlayback(self.finish.clone())))
        }
    }

    #[derive(Debug, Default)]
    pub(crate) struct RecordingNarrator {
        pub spoken: Vec<String>,
    }

    impl Narrator for RecordingNarrator {
        fn speak(&mut self, text: &str) {
            self.spoken.push(text.to_string());
        }
    }

    #[test]
    fn test_speech_text_strips_symbols() {
        assert_eq!(speech_text("THEY'RE WATCHING YOU, NEO."), "theyre watching you, neo.");
        assert_eq!(speech_text("SYSTEM BREACH..."), "system breach...");
    }
}
