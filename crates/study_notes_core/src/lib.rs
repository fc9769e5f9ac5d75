pub mod domain;
pub mod ports;
pub mod prompt;
pub mod usage;

pub use domain::{
    word_count, DocumentKind, GeneratedNote, NoteRequest, NoteStyle, SessionUsage, StudentLevel,
    UnknownSelection,
};
pub use ports::{HistoryStore, NoteExporter, NoteGenerationService, PortError, PortResult, TokenCounter};
pub use prompt::{build_prompt, NotePrompt};
pub use usage::{UsageGuard, UsageRejection};
