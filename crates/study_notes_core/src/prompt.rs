//! crates/study_notes_core/src/prompt.rs
//!
//! Builds the instruction text sent to the completion service.

use crate::domain::{NoteRequest, NoteStyle, StudentLevel};

/// The system message sent with every generation request.
pub const SYSTEM_INSTRUCTION: &str = "You are an expert academic notes generator.";

/// Formatting rules appended after the style and level directives.
pub const FORMAT_INSTRUCTIONS: &str = "Format output with:
- Headings
- Bullet points
- Important keywords highlighted";

pub fn style_directive(style: NoteStyle) -> &'static str {
    match style {
        NoteStyle::QuickRevision => "Short revision notes in simple bullet points.",
        NoteStyle::Detailed => "Detailed structured notes with headings.",
        NoteStyle::ExamBullets => "Exam-focused bullet point notes with key facts.",
    }
}

pub fn level_directive(level: StudentLevel) -> &'static str {
    match level {
        StudentLevel::School => "Use simple easy language.",
        StudentLevel::College => "Use academic explanation.",
        StudentLevel::Professional => "Use professional concise tone.",
    }
}

/// The two messages of a completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotePrompt {
    pub system: String,
    pub user: String,
}

/// Composes the prompt for a request: style directive, level directive,
/// formatting rules, then the raw text exactly as submitted.
pub fn build_prompt(request: &NoteRequest) -> NotePrompt {
    let user = format!(
        "{}\n{}\n\n{}\n\nContent:\n{}",
        style_directive(request.style),
        level_directive(request.level),
        FORMAT_INSTRUCTIONS,
        request.raw_text
    );

    NotePrompt {
        system: SYSTEM_INSTRUCTION.to_string(),
        user,
    }
}
