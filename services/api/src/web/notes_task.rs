//! services/api/src/web/notes_task.rs
//!
//! This module contains the "worker" function that runs one note request from
//! validation to export:
//!
//! Validating (quota, cooldown, non-empty input) -> Generating -> Exporting.
//!
//! A rejection or failure ends the request without restoring any counter;
//! the session simply waits for the next submission.

use crate::error::NoteError;
use crate::web::state::{AppState, SessionState};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use study_notes_core::{build_prompt, GeneratedNote, NoteRequest, SessionUsage};
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Everything the caller needs to show after a successful request.
#[derive(Debug)]
pub struct NoteOutcome {
    pub note: GeneratedNote,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub usage: SessionUsage,
    pub exported_to: Option<PathBuf>,
    pub warnings: Vec<String>,
}

/// Runs the usage guard for a session and stamps the request time when it
/// passes. Returns the session id for logging.
pub async fn admit_request(
    app_state: &AppState,
    session_state_lock: &Mutex<SessionState>,
    now: DateTime<Utc>,
) -> Result<Uuid, NoteError> {
    let mut session = session_state_lock.lock().await;
    session.touch(now);
    if let Err(rejection) = app_state.guard.admit(&mut session.usage, now) {
        warn!("Session {} rejected: {}", session.session_id, rejection);
        return Err(rejection.into());
    }
    Ok(session.session_id)
}

/// Runs a single note request for a session, admission included.
pub async fn notes_process(
    app_state: &AppState,
    session_state_lock: Arc<Mutex<SessionState>>,
    request: NoteRequest,
    now: DateTime<Utc>,
) -> Result<NoteOutcome, NoteError> {
    let session_id = admit_request(app_state, &session_state_lock, now).await?;
    generate_admitted(app_state, session_state_lock, session_id, request).await
}

/// Runs a request that already passed `admit_request`.
///
/// The session lock is only held while the counters are booked, never across
/// the completion call.
pub async fn generate_admitted(
    app_state: &AppState,
    session_state_lock: Arc<Mutex<SessionState>>,
    session_id: Uuid,
    request: NoteRequest,
) -> Result<NoteOutcome, NoteError> {
    if request.is_blank() {
        warn!("Session {} submitted empty input.", session_id);
        return Err(NoteError::InputEmpty);
    }

    info!(
        "Generating {} notes at {} level for session {}.",
        request.style, request.level, session_id
    );
    let prompt = build_prompt(&request);
    let input_tokens = app_state.token_counter.count_tokens(&prompt.user) as u64;

    let llm_start = Instant::now();
    let body = app_state
        .notes_adapter
        .generate_notes(&prompt)
        .await
        .map_err(|e| {
            error!("Generation failed for session {}: {}", session_id, e);
            NoteError::generation(e)
        })?;
    info!("⏱️ LLM took: {:?}", llm_start.elapsed());

    let output_tokens = app_state.token_counter.count_tokens(&body) as u64;

    let usage = {
        let mut session = session_state_lock.lock().await;
        app_state
            .guard
            .record_success(&mut session.usage, input_tokens, output_tokens);
        session.usage.clone()
    };

    let note = GeneratedNote {
        body,
        created_at: Utc::now(),
    };

    // Both side effects are best effort and independent of each other.
    let mut warnings = Vec::new();
    if let Err(e) = app_state.history.append(&note).await {
        warn!("Failed to append notes to history: {}", e);
        warnings.push(format!("History was not saved: {}", e));
    }
    let exported_to = match app_state.exporter.export(&note).await {
        Ok(path) => Some(path),
        Err(e) => {
            warn!("Failed to export notes PDF: {}", e);
            warnings.push(format!("PDF export failed: {}", e));
            None
        }
    };

    Ok(NoteOutcome {
        note,
        input_tokens,
        output_tokens,
        usage,
        exported_to,
        warnings,
    })
}
