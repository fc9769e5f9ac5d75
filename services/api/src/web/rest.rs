//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::adapters::extractor::extract_text;
use crate::error::{ErrorBody, NoteError};
use crate::web::{
    notes_task::{admit_request, generate_admitted},
    protocol::{CreateSessionResponse, ExtractResponse, NotesResponse, UsageResponse},
    state::AppState,
};
use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use bytes::Bytes;
use chrono::Utc;
use std::sync::Arc;
use study_notes_core::{word_count, DocumentKind, NoteRequest, NoteStyle, StudentLevel};
use tracing::{error, info};
use utoipa::OpenApi;
use uuid::Uuid;

/// Attachment name used for the PDF download.
pub const EXPORT_FILE_NAME: &str = "AI_Notes.pdf";

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        create_session_handler,
        usage_handler,
        delete_session_handler,
        generate_notes_handler,
        extract_handler,
        history_handler,
        latest_export_handler,
    ),
    components(
        schemas(CreateSessionResponse, UsageResponse, NotesResponse, ExtractResponse, ErrorBody)
    ),
    tags(
        (name = "Study Notes API", description = "Turn pasted text or uploaded documents into study notes.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Multipart Form Parsing
//=========================================================================================

/// An uploaded document as received from the form.
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// The fields of the note form. Unknown fields are ignored.
#[derive(Default)]
pub struct NoteForm {
    pub text: Option<String>,
    pub file: Option<Upload>,
    pub style: Option<String>,
    pub level: Option<String>,
}

async fn read_upload(field: Field<'_>) -> Result<Option<Upload>, NoteError> {
    let file_name = field.file_name().map(str::to_string);
    let content_type = field.content_type().map(str::to_string);
    let data = field
        .bytes()
        .await
        .map_err(|e| NoteError::BadRequest(format!("Failed to read file bytes: {}", e)))?;

    // Browsers send an empty part when no file was picked.
    if data.is_empty() && file_name.as_deref().unwrap_or("").is_empty() {
        return Ok(None);
    }
    Ok(Some(Upload {
        file_name,
        content_type,
        data,
    }))
}

async fn read_text(field: Field<'_>) -> Result<String, NoteError> {
    field
        .text()
        .await
        .map_err(|e| NoteError::BadRequest(format!("Failed to read form field: {}", e)))
}

pub async fn read_note_form(mut multipart: Multipart) -> Result<NoteForm, NoteError> {
    let mut form = NoteForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| NoteError::BadRequest(format!("Failed to read multipart data: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => form.file = read_upload(field).await?,
            "text" => form.text = Some(read_text(field).await?),
            "style" => form.style = Some(read_text(field).await?),
            "level" => form.level = Some(read_text(field).await?),
            _ => {}
        }
    }

    Ok(form)
}

/// Extracts an upload's text off the async runtime; PDF parsing is CPU bound.
pub async fn extract_upload(upload: Upload) -> Result<String, NoteError> {
    let kind = DocumentKind::detect(upload.content_type.as_deref(), upload.file_name.as_deref())
        .ok_or_else(|| NoteError::BadRequest("Upload a PDF or TXT file".to_string()))?;

    tokio::task::spawn_blocking(move || extract_text(kind, &upload.data))
        .await
        .map_err(|e| NoteError::Extraction(e.to_string()))?
        .map_err(NoteError::from)
}

impl NoteForm {
    /// Parses the style and level fields. Missing fields fall back to the
    /// first option of each list.
    pub fn selections(&self) -> Result<(NoteStyle, StudentLevel), NoteError> {
        let style = match self.style.as_deref() {
            Some(raw) => raw
                .parse::<NoteStyle>()
                .map_err(|e| NoteError::BadRequest(e.to_string()))?,
            None => NoteStyle::QuickRevision,
        };
        let level = match self.level.as_deref() {
            Some(raw) => raw
                .parse::<StudentLevel>()
                .map_err(|e| NoteError::BadRequest(e.to_string()))?,
            None => StudentLevel::School,
        };
        Ok((style, level))
    }

    /// Resolves the source text. An uploaded file takes precedence over
    /// pasted text.
    pub async fn into_raw_text(self) -> Result<String, NoteError> {
        match self.file {
            Some(upload) => extract_upload(upload).await,
            None => Ok(self.text.unwrap_or_default()),
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Start a new session with zeroed usage counters.
#[utoipa::path(
    post,
    path = "/sessions",
    responses(
        (status = 201, description = "Session created successfully", body = CreateSessionResponse)
    )
)]
pub async fn create_session_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let session_id = app_state.sessions.create(Utc::now()).await;
    info!("Created session {}", session_id);
    (StatusCode::CREATED, Json(CreateSessionResponse { session_id }))
}

/// Read the usage dashboard of a session.
#[utoipa::path(
    get,
    path = "/sessions/{session_id}/usage",
    params(("session_id" = Uuid, Path, description = "The session id.")),
    responses(
        (status = 200, description = "Current counters", body = UsageResponse),
        (status = 404, description = "Unknown session", body = ErrorBody)
    )
)]
pub async fn usage_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<UsageResponse>, NoteError> {
    let session = app_state
        .sessions
        .get(session_id)
        .await
        .ok_or(NoteError::SessionNotFound)?;
    let mut state = session.lock().await;
    state.touch(Utc::now());
    Ok(Json(UsageResponse::snapshot(&state.usage, &app_state.guard)))
}

/// End a session and discard its counters.
#[utoipa::path(
    delete,
    path = "/sessions/{session_id}",
    params(("session_id" = Uuid, Path, description = "The session id.")),
    responses(
        (status = 204, description = "Session ended"),
        (status = 404, description = "Unknown session", body = ErrorBody)
    )
)]
pub async fn delete_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, NoteError> {
    if app_state.sessions.remove(session_id).await {
        info!("Ended session {}", session_id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(NoteError::SessionNotFound)
    }
}

/// Generate study notes from pasted text or an uploaded PDF/TXT file.
///
/// Multipart fields: `text`, `file`, `style`, `level`.
#[utoipa::path(
    post,
    path = "/sessions/{session_id}/notes",
    params(("session_id" = Uuid, Path, description = "The session id.")),
    request_body(content_type = "multipart/form-data", description = "Text or file plus style and level."),
    responses(
        (status = 200, description = "Notes generated", body = NotesResponse),
        (status = 400, description = "Empty input or invalid form", body = ErrorBody),
        (status = 404, description = "Unknown session", body = ErrorBody),
        (status = 422, description = "The uploaded file could not be read", body = ErrorBody),
        (status = 429, description = "Quota reached or cooldown active", body = ErrorBody),
        (status = 502, description = "The completion service rejected the request", body = ErrorBody),
        (status = 503, description = "The completion service is busy or unreachable", body = ErrorBody)
    )
)]
pub async fn generate_notes_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<NotesResponse>, NoteError> {
    let session = app_state
        .sessions
        .get(session_id)
        .await
        .ok_or(NoteError::SessionNotFound)?;

    let form = read_note_form(multipart).await?;
    let (style, level) = form.selections()?;

    // Admission runs before the upload is parsed so a throttled session never
    // pays for PDF extraction.
    let admitted = admit_request(&app_state, &session, Utc::now()).await?;
    let raw_text = form.into_raw_text().await?;
    let request = NoteRequest::new(raw_text, style, level);
    let outcome = generate_admitted(&app_state, session, admitted, request).await?;

    Ok(Json(NotesResponse {
        notes: outcome.note.body,
        created_at: outcome.note.created_at,
        input_tokens: outcome.input_tokens,
        output_tokens: outcome.output_tokens,
        usage: UsageResponse::snapshot(&outcome.usage, &app_state.guard),
        export_available: outcome.exported_to.is_some(),
        warnings: outcome.warnings,
    }))
}

/// Preview the text and word count of an uploaded file.
#[utoipa::path(
    post,
    path = "/extract",
    request_body(content_type = "multipart/form-data", description = "A single `file` part."),
    responses(
        (status = 200, description = "Extracted text", body = ExtractResponse),
        (status = 400, description = "No file or unsupported type", body = ErrorBody),
        (status = 422, description = "The file could not be read", body = ErrorBody)
    )
)]
pub async fn extract_handler(multipart: Multipart) -> Result<Json<ExtractResponse>, NoteError> {
    let upload = read_note_form(multipart)
        .await?
        .file
        .ok_or_else(|| NoteError::BadRequest("Multipart form must include a file".to_string()))?;

    let text = extract_upload(upload).await?;
    Ok(Json(ExtractResponse {
        word_count: word_count(&text),
        text,
    }))
}

/// Read the whole notes history as plain text.
#[utoipa::path(
    get,
    path = "/history",
    responses(
        (status = 200, description = "History log", content_type = "text/plain", body = String),
        (status = 404, description = "No saved notes yet")
    )
)]
pub async fn history_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match app_state.history.read_all().await {
        Ok(Some(contents)) => Ok((
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            contents,
        )),
        Ok(None) => Err((StatusCode::NOT_FOUND, "No saved notes yet".to_string())),
        Err(e) => {
            error!("Failed to read history: {:?}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read history".to_string(),
            ))
        }
    }
}

/// Download the most recent notes PDF.
#[utoipa::path(
    get,
    path = "/exports/latest",
    responses(
        (status = 200, description = "The latest export", content_type = "application/pdf"),
        (status = 404, description = "Nothing exported yet")
    )
)]
pub async fn latest_export_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match app_state.exporter.latest().await {
        Ok(Some(bytes)) => Ok((
            [
                (header::CONTENT_TYPE, "application/pdf".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
                ),
            ],
            bytes,
        )),
        Ok(None) => Err((StatusCode::NOT_FOUND, "No notes exported yet".to_string())),
        Err(e) => {
            error!("Failed to read latest export: {:?}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read latest export".to_string(),
            ))
        }
    }
}
