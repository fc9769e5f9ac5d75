pub mod extractor;
pub mod history;
pub mod notes_llm;
pub mod pdf_export;
pub mod tokenizer;

pub use extractor::{extract_text, ExtractError};
pub use history::FileHistoryLog;
pub use notes_llm::OpenAiNotesAdapter;
pub use pdf_export::PdfNoteExporter;
pub use tokenizer::TiktokenCounter;
