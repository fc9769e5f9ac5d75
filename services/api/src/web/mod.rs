pub mod notes_task;
pub mod protocol;
pub mod rest;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

// Re-export the handlers to make them easily accessible
// to the binary that builds the web server router.
pub use rest::{
    create_session_handler, delete_session_handler, extract_handler, generate_notes_handler,
    history_handler, latest_export_handler, usage_handler,
};
pub use state::AppState;

/// Builds the API router. CORS and Swagger UI are layered on by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    let body_limit = app_state.config.max_upload_bytes;

    Router::new()
        .route("/sessions", post(create_session_handler))
        .route("/sessions/{session_id}", delete(delete_session_handler))
        .route("/sessions/{session_id}/usage", get(usage_handler))
        .route("/sessions/{session_id}/notes", post(generate_notes_handler))
        .route("/extract", post(extract_handler))
        .route("/history", get(history_handler))
        .route("/exports/latest", get(latest_export_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(app_state)
}
