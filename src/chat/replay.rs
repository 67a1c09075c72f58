//! File-backed chat source.
//!
//! Each non-empty line of the file is one chat container node, oldest at the
//! top. The file is re-read on every check, so appending lines to it (or
//! piping a captured conversation into it) behaves like new chat messages.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::ChatSource;
use crate::error::SpeakerError;

pub struct ReplaySource {
    path: PathBuf,
}

impl ReplaySource {
    /// The file has to exist at startup; later read errors only fail that check.
    pub fn open(path: &Path) -> Result<Self, SpeakerError> {
        if !path.is_file() {
            return Err(SpeakerError::SourceUnavailable(format!(
                "replay file {} does not exist",
                path.display()
            )));
        }
        info!("Reading chat lines from {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl ChatSource for ReplaySource {
    fn newest_first(&self) -> Result<Box<dyn Iterator<Item = String> + '_>, SpeakerError> {
        let contents = fs::read_to_string(&self.path)?;
        let lines: Vec<String> = contents
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect();
        Ok(Box::new(lines.into_iter().rev()))
    }
}
