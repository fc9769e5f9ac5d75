//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged between the browser page and the API server.

use chrono::{DateTime, Utc};
use serde::Serialize;
use study_notes_core::{SessionUsage, UsageGuard};
use utoipa::ToSchema;
use uuid::Uuid;

/// The response payload sent after successfully creating a session.
#[derive(Serialize, Debug, ToSchema)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
}

/// The counters shown on the usage dashboard.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct UsageResponse {
    pub requests_used: u32,
    pub daily_limit: u32,
    pub tokens_used: u64,
    pub cooldown_seconds: i64,
}

impl UsageResponse {
    pub fn snapshot(usage: &SessionUsage, guard: &UsageGuard) -> Self {
        Self {
            requests_used: usage.request_count,
            daily_limit: guard.daily_limit(),
            tokens_used: usage.tokens_used,
            cooldown_seconds: guard.cooldown().num_seconds(),
        }
    }
}

/// Returned after notes were generated.
///
/// `warnings` lists history or export side effects that failed; the notes
/// themselves are still valid.
#[derive(Serialize, Debug, ToSchema)]
pub struct NotesResponse {
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub usage: UsageResponse,
    pub export_available: bool,
    pub warnings: Vec<String>,
}

/// Returned by the extraction preview.
#[derive(Serialize, Debug, ToSchema)]
pub struct ExtractResponse {
    pub text: String,
    pub word_count: usize,
}
