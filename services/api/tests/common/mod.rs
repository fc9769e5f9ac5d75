//! Shared fakes for the service tests.

#![allow(dead_code)]

use async_trait::async_trait;
use notes_api_lib::{
    adapters::{FileHistoryLog, PdfNoteExporter},
    config::Config,
    web::state::{AppState, SessionRegistry},
};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use study_notes_core::{
    ports::{HistoryStore, NoteExporter, NoteGenerationService, PortError, PortResult, TokenCounter},
    GeneratedNote, NotePrompt, UsageGuard,
};

/// Replays scripted completion results and records every prompt it receives.
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<PortResult<String>>>,
    pub prompts: Mutex<Vec<NotePrompt>>,
    calls: AtomicUsize,
}

impl ScriptedLlm {
    pub fn replying(replies: Vec<PortResult<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NoteGenerationService for ScriptedLlm {
    async fn generate_notes(&self, prompt: &NotePrompt) -> PortResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("# Notes\n- point".to_string()))
    }
}

/// One token per whitespace-separated word.
pub struct WordTokens;

impl TokenCounter for WordTokens {
    fn count_tokens(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

/// An exporter whose target is never writable.
pub struct BrokenExporter;

#[async_trait]
impl NoteExporter for BrokenExporter {
    async fn export(&self, _note: &GeneratedNote) -> PortResult<PathBuf> {
        Err(PortError::Unexpected("disk full".to_string()))
    }

    async fn latest(&self) -> PortResult<Option<Vec<u8>>> {
        Ok(None)
    }
}

pub fn test_config(root: &Path) -> Config {
    let mut config = Config::from_lookup(|_| None).unwrap();
    config.history_path = root.join("data/history.txt");
    config.export_path = root.join("downloads/AI_Notes.pdf");
    config
}

pub struct Harness {
    pub state: Arc<AppState>,
    pub llm: Arc<ScriptedLlm>,
    pub dir: tempfile::TempDir,
}

/// Builds an app state backed by real file adapters in a temp directory.
pub fn harness(llm: ScriptedLlm, guard: UsageGuard) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let llm = Arc::new(llm);

    let state = Arc::new(AppState {
        guard,
        notes_adapter: llm.clone(),
        token_counter: Arc::new(WordTokens),
        history: Arc::new(FileHistoryLog::new(config.history_path.clone())),
        exporter: Arc::new(PdfNoteExporter::new(config.export_path.clone())),
        sessions: Arc::new(SessionRegistry::new()),
        config: Arc::new(config),
    });

    Harness { state, llm, dir }
}

/// Same as `harness` but with a custom history store and exporter.
pub fn harness_with(
    llm: ScriptedLlm,
    guard: UsageGuard,
    history: Arc<dyn HistoryStore>,
    exporter: Arc<dyn NoteExporter>,
) -> Harness {
    let mut h = harness(llm, guard);
    let state = Arc::get_mut(&mut h.state).expect("state not shared yet");
    state.history = history;
    state.exporter = exporter;
    h
}
