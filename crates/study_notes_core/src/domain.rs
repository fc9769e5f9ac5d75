//! crates/study_notes_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any transport or storage format.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

//=========================================================================================
// Note Selections
//=========================================================================================

/// The summary style a user picks for their notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteStyle {
    QuickRevision,
    Detailed,
    ExamBullets,
}

impl NoteStyle {
    /// The label shown to the user in the style picker.
    pub fn label(self) -> &'static str {
        match self {
            NoteStyle::QuickRevision => "Quick Revision",
            NoteStyle::Detailed => "Detailed Notes",
            NoteStyle::ExamBullets => "Exam Bullet Points",
        }
    }
}

/// The audience the notes should be written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentLevel {
    School,
    College,
    Professional,
}

impl StudentLevel {
    pub fn label(self) -> &'static str {
        match self {
            StudentLevel::School => "School",
            StudentLevel::College => "College",
            StudentLevel::Professional => "Professional",
        }
    }
}

/// Returned when a form value does not name a known style or level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: '{value}'")]
pub struct UnknownSelection {
    pub kind: &'static str,
    pub value: String,
}

/// Lowercases and collapses separators so "Quick Revision", "quick-revision"
/// and "quick_revision" all compare equal.
fn normalize_selection(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

impl FromStr for NoteStyle {
    type Err = UnknownSelection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_selection(s).as_str() {
            "quick_revision" => Ok(NoteStyle::QuickRevision),
            "detailed" | "detailed_notes" => Ok(NoteStyle::Detailed),
            "exam_bullets" | "exam_bullet_points" => Ok(NoteStyle::ExamBullets),
            _ => Err(UnknownSelection {
                kind: "style",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for StudentLevel {
    type Err = UnknownSelection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_selection(s).as_str() {
            "school" => Ok(StudentLevel::School),
            "college" => Ok(StudentLevel::College),
            "professional" => Ok(StudentLevel::Professional),
            _ => Err(UnknownSelection {
                kind: "level",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for NoteStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for StudentLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

//=========================================================================================
// Requests, Notes and Documents
//=========================================================================================

/// A single user submission. Built fresh per action and never mutated.
#[derive(Debug, Clone)]
pub struct NoteRequest {
    pub raw_text: String,
    pub style: NoteStyle,
    pub level: StudentLevel,
}

impl NoteRequest {
    pub fn new(raw_text: impl Into<String>, style: NoteStyle, level: StudentLevel) -> Self {
        Self {
            raw_text: raw_text.into(),
            style,
            level,
        }
    }

    /// True when the text holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.raw_text.trim().is_empty()
    }
}

/// The notes produced by the completion service for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedNote {
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// The kind of an uploaded document, which decides how its text is extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
}

impl DocumentKind {
    /// Resolves the kind from the upload's media type, falling back to the
    /// file extension when the media type is missing or generic.
    pub fn detect(content_type: Option<&str>, file_name: Option<&str>) -> Option<Self> {
        let by_type = content_type.and_then(|ct| {
            let essence = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
            match essence.as_str() {
                "application/pdf" => Some(DocumentKind::Pdf),
                "text/plain" => Some(DocumentKind::PlainText),
                _ => None,
            }
        });

        by_type.or_else(|| {
            let name = file_name?.to_ascii_lowercase();
            if name.ends_with(".pdf") {
                Some(DocumentKind::Pdf)
            } else if name.ends_with(".txt") {
                Some(DocumentKind::PlainText)
            } else {
                None
            }
        })
    }
}

/// Counts whitespace-separated words, as shown next to the input box.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

//=========================================================================================
// Session Usage
//=========================================================================================

/// Per-session usage bookkeeping. Lives in memory for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUsage {
    pub request_count: u32,
    /// `None` until the first request passes the guard.
    pub last_request_time: Option<DateTime<Utc>>,
    pub tokens_used: u64,
    /// The UTC day `request_count` belongs to. Only consulted when daily
    /// rollover is enabled.
    pub quota_day: NaiveDate,
}

impl SessionUsage {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            request_count: 0,
            last_request_time: None,
            tokens_used: 0,
            quota_day: now.date_naive(),
        }
    }
}
