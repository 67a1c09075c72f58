//! Configuration management for chat-speaker-rs.
//!
//! Loads config from a YAML file in standard locations. Every field has a
//! default, so running without any config file attaches to the chat window
//! with the built-in class and region names.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Where chat messages are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// UI Automation on Windows, replay file elsewhere.
    Auto,
    Uia,
    Replay,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub source: SourceKind,
    pub window_class: String,
    pub content_name: String,
    pub replay_path: PathBuf,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Auto,
            window_class: "tSkMainForm".into(),
            content_name: "Chat Content List".into(),
            replay_path: PathBuf::from("chat.txt"),
        }
    }
}

impl ChatConfig {
    pub fn resolved_source(&self) -> SourceKind {
        match self.source {
            SourceKind::Auto if cfg!(windows) => SourceKind::Uia,
            SourceKind::Auto => SourceKind::Replay,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    pub poll_interval_ms: u64,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechBackendKind {
    /// System.Speech on Windows, espeak-ng elsewhere.
    Auto,
    System,
    Espeak,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub backend: SpeechBackendKind,
    /// Overrides the executable the backend runs (powershell / espeak-ng).
    pub program: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            backend: SpeechBackendKind::Auto,
            program: String::new(),
        }
    }
}

impl SpeechConfig {
    pub fn resolved_backend(&self) -> SpeechBackendKind {
        match self.backend {
            SpeechBackendKind::Auto if cfg!(windows) => SpeechBackendKind::System,
            SpeechBackendKind::Auto => SpeechBackendKind::Espeak,
            other => other,
        }
    }

    pub fn program_override(&self) -> Option<&str> {
        let program = self.program.trim();
        (!program.is_empty()).then_some(program)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub chat: ChatConfig,
    pub observer: ObserverConfig,
    pub speech: SpeechConfig,
}

impl Config {
    /// Load configuration from YAML file.
    ///
    /// Searches standard locations if no path is provided:
    /// 1. ./config.yaml
    /// 2. ~/.config/chat-speaker/config.yaml
    /// 3. /etc/chat-speaker/config.yaml
    pub fn load(path: Option<&Path>) -> Self {
        let resolved = path.map(PathBuf::from).or_else(|| {
            let candidates = [
                std::env::current_dir().ok().map(|d| d.join("config.yaml")),
                dirs::home_dir().map(|h| h.join(".config/chat-speaker/config.yaml")),
                Some(PathBuf::from("/etc/chat-speaker/config.yaml")),
            ];
            candidates.into_iter().flatten().find(|p| p.exists())
        });

        let Some(config_path) = resolved else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match serde_yml::from_str(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {e}, using defaults", config_path.display());
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}, using defaults", config_path.display());
                Self::default()
            }
        }
    }
}
