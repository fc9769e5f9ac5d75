//! crates/study_notes_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the completion API, the tokenizer and the file system.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::domain::GeneratedNote;
use crate::prompt::NotePrompt;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (network, disk).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The service could not be reached or is temporarily refusing work.
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    /// The service understood the request and refused it.
    #[error("Request rejected: {0}")]
    Rejected(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    /// Whether resubmitting the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, PortError::Unavailable(_))
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait NoteGenerationService: Send + Sync {
    /// Sends one completion request and returns the generated notes text.
    async fn generate_notes(&self, prompt: &NotePrompt) -> PortResult<String>;
}

/// Estimates token counts for usage accounting.
pub trait TokenCounter: Send + Sync {
    fn count_tokens(&self, text: &str) -> usize;
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Appends one note to the end of the log.
    async fn append(&self, note: &GeneratedNote) -> PortResult<()>;

    /// Returns the whole log, or `None` when nothing has been saved yet.
    async fn read_all(&self) -> PortResult<Option<String>>;
}

#[async_trait]
pub trait NoteExporter: Send + Sync {
    /// Renders the note and overwrites the export slot. Returns where it was written.
    async fn export(&self, note: &GeneratedNote) -> PortResult<PathBuf>;

    /// Returns the bytes of the latest export, or `None` when there is none.
    async fn latest(&self) -> PortResult<Option<Vec<u8>>>;
}
