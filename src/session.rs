//! The one check routine: read the chat container, diff it against the
//! cursor, dispatch whatever is new.

use tracing::{debug, warn};

use crate::chat::{ChangeNotifier, ChatSource};
use crate::differ::{self, Cursor};
use crate::dispatcher::{Dispatch, Dispatcher};
use crate::error::SpeakerError;

pub struct Session {
    source: Box<dyn ChatSource>,
    dispatcher: Dispatcher,
    cursor: Cursor,
}

impl Session {
    pub fn new(source: Box<dyn ChatSource>, dispatcher: Dispatcher) -> Self {
        Self {
            source,
            dispatcher,
            cursor: Cursor::default(),
        }
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn subscribe(&mut self, notifier: ChangeNotifier) -> Result<(), SpeakerError> {
        self.source.subscribe(notifier)
    }

    /// Dispatch every message appended since the last check, oldest first.
    pub fn check(&mut self) -> Result<Vec<Dispatch>, SpeakerError> {
        let fresh = differ::new_messages(self.source.newest_first()?, &mut self.cursor);
        if !fresh.is_empty() {
            debug!("{} new message(s)", fresh.len());
        }

        Ok(fresh
            .iter()
            .map(|raw| self.dispatcher.dispatch(raw, &mut self.cursor))
            .collect())
    }

    /// `check`, logging instead of failing; the next trigger re-reads the tree.
    pub fn check_logged(&mut self) -> Vec<Dispatch> {
        self.check().unwrap_or_else(|e| {
            warn!("Failed to read chat messages: {e}");
            Vec::new()
        })
    }
}
