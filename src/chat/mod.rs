//! Chat window access.
//!
//! A `ChatSource` exposes the chat container as node texts read newest
//! first, plus an optional change notification. Backends:
//! - `uia`: the live chat window through UI Automation (Windows)
//! - `replay`: a text file, one node per line

pub mod replay;
#[cfg(windows)]
pub mod uia;

use tokio::sync::mpsc;
use tracing::debug;

use crate::config::{ChatConfig, SourceKind};
use crate::error::SpeakerError;

/// Why a check was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    StructureChanged,
    Timer,
}

/// Handed to a source so its change callback can request a re-check.
///
/// Backed by a capacity-1 channel: a notification arriving while one is
/// already pending is dropped, which coalesces bursts into a single check.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    tx: mpsc::Sender<Trigger>,
}

impl ChangeNotifier {
    pub fn new(tx: mpsc::Sender<Trigger>) -> Self {
        Self { tx }
    }

    /// Safe to call from any thread.
    pub fn notify(&self) {
        if self.tx.try_send(Trigger::StructureChanged).is_err() {
            debug!("Re-check already pending, notification coalesced");
        }
    }
}

pub trait ChatSource {
    /// Node texts starting at the last child and walking to earlier siblings.
    fn newest_first(&self) -> Result<Box<dyn Iterator<Item = String> + '_>, SpeakerError>;

    /// Register for change notifications. Sources without any rely on the timer.
    fn subscribe(&mut self, _notifier: ChangeNotifier) -> Result<(), SpeakerError> {
        Ok(())
    }
}

/// Attach to the source named in the config. Lookup failures are fatal.
pub fn from_config(config: &ChatConfig) -> Result<Box<dyn ChatSource>, SpeakerError> {
    match config.resolved_source() {
        SourceKind::Replay => Ok(Box::new(replay::ReplaySource::open(&config.replay_path)?)),
        #[cfg(windows)]
        _ => Ok(Box::new(uia::UiaSource::attach(
            &config.window_class,
            &config.content_name,
        )?)),
        #[cfg(not(windows))]
        _ => Err(SpeakerError::SourceUnavailable(format!(
            "cannot attach to '{}' in {} windows: UI Automation is only available on Windows, \
             set chat.source to replay",
            config.content_name, config.window_class
        ))),
    }
}
