//! services/api/src/adapters/history.rs
//!
//! The notes history: a flat, append-only text file. Each entry is written as
//! a blank line, a timestamp line and the note body.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use study_notes_core::{
    domain::GeneratedNote,
    ports::{HistoryStore, PortError, PortResult},
};
use tokio::{fs, io::AsyncWriteExt};

/// Timestamp layout used for history entries.
pub const HISTORY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Clone, Debug)]
pub struct FileHistoryLog {
    path: PathBuf,
}

impl FileHistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Formats one entry exactly as it is appended to the log.
pub fn format_entry(note: &GeneratedNote) -> String {
    format!(
        "\n\n{}\n{}",
        note.created_at.format(HISTORY_TIMESTAMP_FORMAT),
        note.body
    )
}

#[async_trait]
impl HistoryStore for FileHistoryLog {
    async fn append(&self, note: &GeneratedNote) -> PortResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PortError::Unexpected(format!("create {}: {}", parent.display(), e)))?;
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| PortError::Unexpected(format!("open {}: {}", self.path.display(), e)))?;

        file.write_all(format_entry(note).as_bytes())
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn read_all(&self) -> PortResult<Option<String>> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PortError::Unexpected(e.to_string())),
        }
    }
}
