//! Turns one raw chat line into a transcript line and, depending on the voice
//! mode, speech.

use std::io::Write;

use tracing::{debug, warn};

use crate::differ::Cursor;
use crate::error::SpeakerError;
use crate::parser::{self, ParsedMessage, Unparsed};
use crate::speech::SpeechEngine;
use crate::voice_map::VoiceMode;

/// What happened to a dispatched line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// All-mode: queued as "<from> says <body>".
    Narrated,
    /// Filtered mode: spoken with the sender's voice.
    Voiced(String),
    /// Filtered mode, sender has no voice.
    TranscriptOnly,
    /// Not a chat message.
    NonVerbalized,
}

pub struct Dispatcher {
    mode: VoiceMode,
    engine: Box<dyn SpeechEngine>,
    transcript: Box<dyn Write>,
}

impl Dispatcher {
    pub fn new(mode: VoiceMode, engine: Box<dyn SpeechEngine>) -> Self {
        Self::with_transcript(mode, engine, Box::new(std::io::stdout()))
    }

    pub fn with_transcript(
        mode: VoiceMode,
        engine: Box<dyn SpeechEngine>,
        transcript: Box<dyn Write>,
    ) -> Self {
        Self {
            mode,
            engine,
            transcript,
        }
    }

    /// Handle one raw line. The cursor moves to `raw` before anything is
    /// spoken, so a re-check during speech can't pick the line up again.
    pub fn dispatch(&mut self, raw: &str, cursor: &mut Cursor) -> Dispatch {
        cursor.advance(raw);

        let message = match parser::parse(raw) {
            Ok(message) => message,
            Err(Unparsed(text)) => {
                self.print(format_args!("Non-verbalized message: {text}"));
                return Dispatch::NonVerbalized;
            }
        };

        let ParsedMessage { from, body } = &message;
        self.print(format_args!("{from}: {body}"));

        let outcome = match &self.mode {
            VoiceMode::All => Dispatch::Narrated,
            VoiceMode::Filtered(map) => match map.voice_for(from) {
                Some(voice) => Dispatch::Voiced(voice.to_string()),
                None => Dispatch::TranscriptOnly,
            },
        };

        match &outcome {
            Dispatch::Narrated => {
                if let Err(e) = self.engine.speak_async(&format!("{from} says {body}")) {
                    warn!("Failed to queue speech for {from}: {e}");
                }
            }
            Dispatch::Voiced(voice) => {
                if let Err(e) = self.speak_as(voice, body) {
                    warn!("Failed to speak message from {from} with {voice}: {e}");
                }
            }
            Dispatch::TranscriptOnly | Dispatch::NonVerbalized => {}
        }

        debug!("Dispatched message from {from}: {outcome:?}");
        outcome
    }

    /// Speak with `voice`, then put the previous voice back even if speaking failed.
    fn speak_as(&mut self, voice: &str, text: &str) -> Result<(), SpeakerError> {
        let previous = self.engine.current_voice();
        self.engine.select_voice(Some(voice))?;
        let spoken = self.engine.speak(text);
        self.engine.select_voice(previous.as_deref())?;
        spoken
    }

    fn print(&mut self, line: std::fmt::Arguments<'_>) {
        if let Err(e) = writeln!(self.transcript, "{line}").and_then(|_| self.transcript.flush()) {
            warn!("Failed to write transcript: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::testing::{Call, RecordingEngine, SharedEngine};
    use crate::voice_map::VoiceMap;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Transcript sink the test can read back after handing it to the dispatcher.
    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    struct Harness {
        dispatcher: Dispatcher,
        engine: Rc<RefCell<RecordingEngine>>,
        transcript: SharedBuf,
    }

    fn harness(mode: VoiceMode, engine: RecordingEngine) -> Harness {
        let engine = SharedEngine::new(engine);
        let transcript = SharedBuf::default();
        let dispatcher = Dispatcher::with_transcript(
            mode,
            Box::new(engine.clone()),
            Box::new(transcript.clone()),
        );
        Harness {
            dispatcher,
            engine: engine.0,
            transcript,
        }
    }

    fn filtered(pairs: &[(&str, &str)]) -> VoiceMode {
        let mut map = VoiceMap::default();
        for (speaker, voice) in pairs {
            map.insert(speaker, voice);
        }
        VoiceMode::Filtered(map)
    }

    #[test]
    fn all_mode_narrates_asynchronously() {
        let mut h = harness(VoiceMode::All, RecordingEngine::default());
        let mut cursor = Cursor::default();

        let outcome = h.dispatcher.dispatch("From Alice, Hi, sent on today", &mut cursor);

        assert_eq!(outcome, Dispatch::Narrated);
        assert_eq!(h.transcript.text(), "Alice: Hi\n");
        assert_eq!(
            h.engine.borrow().calls,
            vec![Call::SpeakAsync {
                voice: None,
                text: "Alice says Hi".into()
            }]
        );
        assert_eq!(cursor.get(), Some("From Alice, Hi, sent on today"));
    }

    #[test]
    fn unmapped_sender_is_transcript_only() {
        let mut h = harness(
            filtered(&[("alice", "VoiceA")]),
            RecordingEngine::with_voices(&["VoiceA"]),
        );
        let mut cursor = Cursor::default();

        let outcome = h.dispatcher.dispatch("From Bob, yo, sent on today", &mut cursor);

        assert_eq!(outcome, Dispatch::TranscriptOnly);
        assert_eq!(h.transcript.text(), "Bob: yo\n");
        assert!(h.engine.borrow().calls.is_empty());
        assert_eq!(cursor.get(), Some("From Bob, yo, sent on today"));
    }

    #[test]
    fn mapped_sender_speaks_body_with_voice_then_restores() {
        let mut engine = RecordingEngine::with_voices(&["Default", "VoiceA"]);
        engine.voice = Some("Default".into());
        let mut h = harness(filtered(&[("Alice", "VoiceA")]), engine);
        let mut cursor = Cursor::default();

        let outcome = h.dispatcher.dispatch("From ALICE, see you, sent on today", &mut cursor);

        assert_eq!(outcome, Dispatch::Voiced("VoiceA".into()));
        assert_eq!(
            h.engine.borrow().calls,
            vec![
                Call::Select(Some("VoiceA".into())),
                Call::Speak {
                    voice: Some("VoiceA".into()),
                    text: "see you".into()
                },
                Call::Select(Some("Default".into())),
            ]
        );
        assert_eq!(h.transcript.text(), "ALICE: see you\n");
    }

    #[test]
    fn failed_speech_still_restores_voice_and_advances_cursor() {
        let mut engine = RecordingEngine::with_voices(&["VoiceA"]);
        engine.fail_speech = true;
        let mut h = harness(filtered(&[("alice", "VoiceA")]), engine);
        let mut cursor = Cursor::default();

        let outcome = h.dispatcher.dispatch("From Alice, hi, sent on now", &mut cursor);

        assert_eq!(outcome, Dispatch::Voiced("VoiceA".into()));
        assert_eq!(h.engine.borrow().voice, None);
        assert_eq!(cursor.get(), Some("From Alice, hi, sent on now"));
    }

    #[test]
    fn unparsable_line_is_echoed_not_spoken() {
        let mut h = harness(VoiceMode::All, RecordingEngine::default());
        let mut cursor = Cursor::default();

        let outcome = h.dispatcher.dispatch("Alice joined the conversation", &mut cursor);

        assert_eq!(outcome, Dispatch::NonVerbalized);
        assert_eq!(
            h.transcript.text(),
            "Non-verbalized message: Alice joined the conversation\n"
        );
        assert!(h.engine.borrow().spoken().is_empty());
        assert_eq!(cursor.get(), Some("Alice joined the conversation"));
    }

    #[test]
    fn cursor_keeps_raw_text_not_stripped_text() {
        let mut h = harness(VoiceMode::All, RecordingEngine::default());
        let mut cursor = Cursor::default();
        let raw = "From Alice, read http://example.com/a now, sent on 1";

        h.dispatcher.dispatch(raw, &mut cursor);

        assert_eq!(cursor.get(), Some(raw));
        assert_eq!(h.transcript.text(), "Alice: read example.com/ now\n");
    }
}
