//! Speaker → voice routing built from the command-line pairs.

use std::collections::HashMap;

use crate::error::SpeakerError;

/// Lowercase speaker name → voice identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceMap {
    voices: HashMap<String, String>,
}

impl VoiceMap {
    pub fn insert(&mut self, speaker: &str, voice: &str) {
        self.voices.insert(speaker.to_lowercase(), voice.to_string());
    }

    /// Voice for a sender, matched case-insensitively.
    pub fn voice_for(&self, speaker: &str) -> Option<&str> {
        self.voices.get(&speaker.to_lowercase()).map(String::as_str)
    }

    pub fn voices(&self) -> impl Iterator<Item = &str> {
        self.voices.values().map(String::as_str)
    }

    /// Fail on the first mapped voice the engine does not have installed.
    pub fn validate(&self, installed: &[String]) -> Result<(), SpeakerError> {
        let mut voices: Vec<&str> = self.voices().collect();
        voices.sort_unstable();
        match voices.into_iter().find(|v| !installed.iter().any(|i| i.as_str() == *v)) {
            Some(missing) => Err(SpeakerError::into_voice_not_found(missing, installed)),
            None => Ok(()),
        }
    }
}

/// How messages are routed to the speech engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceMode {
    /// No mapping: every sender is narrated as "<from> says <body>".
    All,
    /// Only mapped senders are spoken, each with its own voice.
    Filtered(VoiceMap),
}

impl VoiceMode {
    /// Build from `<SpeakerName> <VoiceIdentifier>` pairs. No pairs means All-mode.
    pub fn from_pairs<S: AsRef<str>>(args: &[S]) -> Result<Self, SpeakerError> {
        if args.is_empty() {
            return Ok(VoiceMode::All);
        }
        if args.len() % 2 != 0 {
            return Err(SpeakerError::OddArguments(args.len()));
        }

        let mut map = VoiceMap::default();
        for pair in args.chunks_exact(2) {
            map.insert(pair[0].as_ref(), pair[1].as_ref());
        }
        Ok(VoiceMode::Filtered(map))
    }
}
