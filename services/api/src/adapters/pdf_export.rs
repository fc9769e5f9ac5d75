//! services/api/src/adapters/pdf_export.rs
//!
//! Renders a note into a paginated A4 PDF with `printpdf`. Each line of the
//! note body becomes one paragraph, word-wrapped to the page width. The file
//! lives in a single slot and is overwritten by every export.
//!
//! Text is set in the built-in Helvetica face, which only covers the WinAnsi
//! character set. Characters outside it are not substituted.

use async_trait::async_trait;
use printpdf::{BuiltinFont, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use study_notes_core::{
    domain::GeneratedNote,
    ports::{NoteExporter, PortError, PortResult},
};
use tokio::fs;
use tracing::info;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const FONT_SIZE: f32 = 11.0;
const LINE_HEIGHT: f32 = 5.5;
const PARAGRAPH_GAP: f32 = 2.0;
/// Roughly how many Helvetica characters at `FONT_SIZE` fit between the margins.
const MAX_LINE_CHARS: usize = 90;
const LAYER_NAME: &str = "Notes";

#[derive(Clone, Debug)]
pub struct PdfNoteExporter {
    path: PathBuf,
}

impl PdfNoteExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl NoteExporter for PdfNoteExporter {
    async fn export(&self, note: &GeneratedNote) -> PortResult<PathBuf> {
        let body = note.body.clone();
        let bytes = tokio::task::spawn_blocking(move || render_pdf(&body))
            .await
            .map_err(|e| PortError::Unexpected(format!("PDF render task failed: {}", e)))??;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PortError::Unexpected(format!("create {}: {}", parent.display(), e)))?;
        }
        fs::write(&self.path, &bytes)
            .await
            .map_err(|e| PortError::Unexpected(format!("write {}: {}", self.path.display(), e)))?;

        info!("Exported notes PDF ({} bytes) to {}", bytes.len(), self.path.display());
        Ok(self.path.clone())
    }

    async fn latest(&self) -> PortResult<Option<Vec<u8>>> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PortError::Unexpected(e.to_string())),
        }
    }
}

//=========================================================================================
// Rendering
//=========================================================================================

/// Lays the note body out on as many pages as it needs and returns the PDF bytes.
pub fn render_pdf(body: &str) -> PortResult<Vec<u8>> {
    let (doc, page, layer) =
        PdfDocument::new("AI Notes", Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER_NAME);
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

    let mut writer = PageWriter {
        layer: doc.get_page(page).get_layer(layer),
        cursor: PAGE_HEIGHT - MARGIN,
        pages: 1,
    };

    for paragraph in body.split('\n') {
        for line in wrap_paragraph(paragraph, MAX_LINE_CHARS) {
            writer.ensure_room(&doc, LINE_HEIGHT);
            if !line.is_empty() {
                writer
                    .layer
                    .use_text(line, FONT_SIZE, Mm(MARGIN), Mm(writer.cursor), &font);
            }
            writer.cursor -= LINE_HEIGHT;
        }
        writer.cursor -= PARAGRAPH_GAP;
    }

    tracing::debug!("Rendered notes onto {} page(s)", writer.pages);
    doc.save_to_bytes()
        .map_err(|e| PortError::Unexpected(e.to_string()))
}

struct PageWriter {
    layer: PdfLayerReference,
    cursor: f32,
    pages: usize,
}

impl PageWriter {
    /// Starts a new page when the next line would cross the bottom margin.
    fn ensure_room(&mut self, doc: &PdfDocumentReference, needed: f32) {
        if self.cursor - needed >= MARGIN {
            return;
        }
        let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER_NAME);
        self.layer = doc.get_page(page).get_layer(layer);
        self.cursor = PAGE_HEIGHT - MARGIN;
        self.pages += 1;
    }
}

/// Greedy word wrap. A single word longer than `width` is split hard.
/// An empty paragraph yields one empty line so blank lines keep their space.
pub fn wrap_paragraph(paragraph: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in paragraph.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let needed = if current.is_empty() { word.len() } else { word.len() + 1 };
        if current_len + needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current_len += word.len();
        current.extend(word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn wrap_respects_width_and_keeps_words() {
        let lines = wrap_paragraph("alpha beta gamma delta", 11);
        assert_eq!(lines, vec!["alpha beta", "gamma delta"]);
    }

    #[test]
    fn wrap_splits_overlong_words() {
        let lines = wrap_paragraph("abcdefghij xy", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij", "xy"]);
    }

    #[test]
    fn blank_paragraph_is_one_empty_line() {
        assert_eq!(wrap_paragraph("   ", 10), vec![String::new()]);
    }

    #[test]
    fn long_notes_span_several_pages() {
        let body = (0..200)
            .map(|i| format!("- Key point number {i} about the topic"))
            .collect::<Vec<_>>()
            .join("\n");

        let bytes = render_pdf(&body).unwrap();
        assert!(bytes.starts_with(b"%PDF"));

        let parsed = lopdf::Document::load_mem(&bytes).unwrap();
        assert!(parsed.get_pages().len() > 1);
    }

    #[tokio::test]
    async fn export_overwrites_the_single_slot() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = PdfNoteExporter::new(dir.path().join("downloads/AI_Notes.pdf"));
        assert!(exporter.latest().await.unwrap().is_none());

        let first = GeneratedNote {
            body: "# Cells\n- Nucleus".into(),
            created_at: Utc::now(),
        };
        let path = exporter.export(&first).await.unwrap();
        assert_eq!(path, exporter.path());

        let second = GeneratedNote {
            body: "# Atoms\n- Protons\n- Neutrons".into(),
            created_at: Utc::now(),
        };
        exporter.export(&second).await.unwrap();

        let entries = std::fs::read_dir(dir.path().join("downloads")).unwrap().count();
        assert_eq!(entries, 1);
        assert!(exporter.latest().await.unwrap().unwrap().starts_with(b"%PDF"));
    }
}
