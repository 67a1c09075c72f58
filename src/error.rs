//! Error type shared by the chat source, speech engine and startup path.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpeakerError {
    #[error("No top-level window with class name '{0}' was found. Is the chat application running?")]
    WindowNotFound(String),
    #[error("No element named '{0}' was found in the chat window")]
    RegionNotFound(String),
    #[error("UI Automation call failed: {0}")]
    Automation(String),
    #[error("Chat source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("No voice was found with the name '{voice}' (installed: {})", installed.join(", "))]
    VoiceNotFound { voice: String, installed: Vec<String> },
    #[error("Speech engine failed: {0}")]
    Speech(String),
    #[error("Speaker names and voices must come in pairs, got {0} arguments")]
    OddArguments(usize),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SpeakerError {
    pub fn into_voice_not_found(voice: &str, installed: &[String]) -> Self {
        SpeakerError::VoiceNotFound {
            voice: voice.to_owned(),
            installed: installed.to_vec(),
        }
    }
}
