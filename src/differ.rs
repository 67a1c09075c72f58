//! Incremental diff of the chat container against the last seen message.
//!
//! The chat window re-renders already-seen lines with extra text (a trailing
//! " New" marker, for instance), so "seen" is a two-way substring match
//! against the cursor rather than equality.

const TYPING_SUFFIX: &str = " is typing";

/// The most recently observed raw message text.
///
/// Always holds the unparsed node text so containment checks against later
/// tree reads stay valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor(Option<String>);

impl Cursor {
    pub fn get(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    pub fn advance(&mut self, raw: &str) {
        self.0 = Some(raw.to_string());
    }

    /// True when `message` is the cursor, a superset of it, or a fragment of it.
    pub fn overlaps(&self, message: &str) -> bool {
        match &self.0 {
            Some(last) => message.contains(last.as_str()) || last.contains(message),
            None => false,
        }
    }
}

pub fn is_typing_indicator(message: &str) -> bool {
    message.ends_with(TYPING_SUFFIX)
}

/// Nodes with no text. Every string contains the empty string, so one of these
/// as a cursor would match everything after it.
fn is_blank(message: &str) -> bool {
    message.trim().is_empty()
}

/// Collect messages newer than the cursor, oldest first.
///
/// `newest_first` yields node texts starting from the last child. Blank nodes
/// and typing indicators are skipped. On the very first call (no cursor yet)
/// the newest real message becomes the baseline and nothing is returned. Apart from that baseline the cursor is left for the
/// dispatcher to advance.
pub fn new_messages<I>(newest_first: I, cursor: &mut Cursor) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut pending = Vec::new();

    for message in newest_first {
        if is_blank(&message) {
            continue;
        }
        if cursor.overlaps(&message) {
            break;
        }
        if is_typing_indicator(&message) {
            continue;
        }
        if !cursor.is_set() {
            cursor.advance(&message);
            break;
        }
        pending.push(message);
    }

    pending.reverse();
    pending
}
