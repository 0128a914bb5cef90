use super::state::AppState;
use crate::extract::UploadedFile;
use crate::session::GenerateError;
use crate::store::{MeetingId, MeetingRecord};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{error, info, warn};

/// Characters of summary (or notes) shown on a dashboard card
const CARD_PREVIEW_CHARS: usize = 150;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub name: String,
    #[serde(default)]
    pub mime: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoadParams {
    #[serde(default)]
    pub edit: bool,
}

#[derive(Debug, Serialize)]
pub struct MeetingCard {
    pub id: MeetingId,
    pub title: String,
    pub date: String,
    pub preview: String,
}

impl From<&MeetingRecord> for MeetingCard {
    fn from(record: &MeetingRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            date: record.date.clone(),
            preview: record.preview(CARD_PREVIEW_CHARS),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MergeResponse {
    pub merged: bool,
}

#[derive(Debug, Serialize)]
pub struct EditModeResponse {
    pub start_in_edit_mode: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

async fn session_response(state: &AppState) -> Response {
    (StatusCode::OK, Json(state.engine.snapshot().await)).into_response()
}

// ============================================================================
// Session handlers
// ============================================================================

/// GET /session
pub async fn get_session(State(state): State<AppState>) -> impl IntoResponse {
    session_response(&state).await
}

/// PUT /session/title
pub async fn set_title(
    State(state): State<AppState>,
    Json(req): Json<TextRequest>,
) -> impl IntoResponse {
    state.engine.set_title(req.text).await;
    session_response(&state).await
}

/// PUT /session/notes
pub async fn set_notes(
    State(state): State<AppState>,
    Json(req): Json<TextRequest>,
) -> impl IntoResponse {
    state.engine.set_notes(req.text).await;
    session_response(&state).await
}

/// PUT /session/summary
pub async fn set_summary(
    State(state): State<AppState>,
    Json(req): Json<TextRequest>,
) -> impl IntoResponse {
    state.engine.set_summary(req.text).await;
    session_response(&state).await
}

/// POST /session/generate
/// Generate minutes from the notes, recording and attached file
pub async fn generate(State(state): State<AppState>) -> impl IntoResponse {
    match state.engine.generate().await {
        Ok(()) => session_response(&state).await,
        Err(e @ GenerateError::AlreadyGenerating) => {
            error_response(StatusCode::CONFLICT, e.to_string())
        }
        Err(e @ GenerateError::NothingToSummarize) => {
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e @ GenerateError::QuotaExceeded) => {
            error_response(StatusCode::PAYMENT_REQUIRED, e.to_string())
        }
        Err(e @ GenerateError::SummarizationFailure(_)) => {
            error_response(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}

/// GET /session/export
/// Download the summary as a markdown file
pub async fn export_summary(State(state): State<AppState>) -> impl IntoResponse {
    match state.engine.export_summary().await {
        Some(artifact) => {
            let disposition = format!("attachment; filename=\"{}\"", artifact.filename);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, artifact.mime_type.to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                artifact.content,
            )
                .into_response()
        }
        None => error_response(StatusCode::NOT_FOUND, "There is no summary to export"),
    }
}

/// POST /session/reset
pub async fn reset_session(State(state): State<AppState>) -> impl IntoResponse {
    state.engine.reset_session().await;
    session_response(&state).await
}

/// POST /session/edit-mode
/// Consume the one-shot "open the summary editor" flag
pub async fn take_edit_mode(State(state): State<AppState>) -> impl IntoResponse {
    let start_in_edit_mode = state.engine.take_start_in_edit_mode().await;
    (StatusCode::OK, Json(EditModeResponse { start_in_edit_mode }))
}

// ============================================================================
// Attachment handlers
// ============================================================================

/// POST /session/upload?name=&mime=
/// Attach a file sent as the raw request body
pub async fn upload_file(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> impl IntoResponse {
    if params.name.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "File name is required");
    }

    info!("Upload received: {} ({} bytes)", params.name, body.len());
    let file = UploadedFile::new(params.name, params.mime, body.to_vec());

    match state.engine.handle_file_selected(file).await {
        Ok(()) => session_response(&state).await,
        Err(e) => {
            warn!("Upload rejected: {}", e);
            error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
    }
}

/// DELETE /session/upload
pub async fn cancel_upload(State(state): State<AppState>) -> impl IntoResponse {
    state.engine.cancel_upload().await;
    session_response(&state).await
}

/// POST /session/upload/merge
pub async fn merge_upload(State(state): State<AppState>) -> impl IntoResponse {
    let merged = state.engine.merge_extracted_text_into_notes().await;
    (StatusCode::OK, Json(MergeResponse { merged }))
}

// ============================================================================
// Recording handlers
// ============================================================================

/// POST /session/recording/start
pub async fn start_recording(State(state): State<AppState>) -> impl IntoResponse {
    match state.engine.start_recording().await {
        Ok(()) => session_response(&state).await,
        Err(e) => {
            error!("Failed to start recording: {:#}", e);
            error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Failed to start recording: {}", e),
            )
        }
    }
}

/// POST /session/recording/pause
pub async fn pause_recording(State(state): State<AppState>) -> impl IntoResponse {
    match state.engine.pause_recording().await {
        Ok(()) => session_response(&state).await,
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to pause recording: {}", e),
        ),
    }
}

/// POST /session/recording/resume
pub async fn resume_recording(State(state): State<AppState>) -> impl IntoResponse {
    match state.engine.resume_recording().await {
        Ok(()) => session_response(&state).await,
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to resume recording: {}", e),
        ),
    }
}

/// POST /session/recording/stop
pub async fn stop_recording(State(state): State<AppState>) -> impl IntoResponse {
    match state.engine.stop_recording().await {
        Ok(()) => session_response(&state).await,
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to stop recording: {}", e),
        ),
    }
}

/// DELETE /session/recording
pub async fn clear_recording(State(state): State<AppState>) -> impl IntoResponse {
    state.engine.clear_recording().await;
    session_response(&state).await
}

// ============================================================================
// Dashboard handlers
// ============================================================================

/// GET /meetings?q=
/// Saved meetings, newest day first, optionally filtered
pub async fn list_meetings(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let query = params.q.unwrap_or_default();
    match state.engine.meetings().search(&query).await {
        Ok(records) => {
            let cards: Vec<MeetingCard> = records.iter().map(MeetingCard::from).collect();
            (StatusCode::OK, Json(cards)).into_response()
        }
        Err(e) => {
            error!("Failed to list meetings: {:#}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to list meetings: {}", e),
            )
        }
    }
}

/// GET /meetings/calendar
/// Meetings grouped by day, keyed by ISO date
pub async fn meetings_calendar(State(state): State<AppState>) -> impl IntoResponse {
    match state.engine.meetings().by_day().await {
        Ok(days) => {
            let calendar: BTreeMap<String, Vec<MeetingCard>> = days
                .iter()
                .map(|(day, records)| {
                    (
                        day.format("%Y-%m-%d").to_string(),
                        records.iter().map(MeetingCard::from).collect(),
                    )
                })
                .collect();
            (StatusCode::OK, Json(calendar)).into_response()
        }
        Err(e) => {
            error!("Failed to group meetings: {:#}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to group meetings: {}", e),
            )
        }
    }
}

/// DELETE /meetings/:meeting_id
pub async fn delete_meeting(
    State(state): State<AppState>,
    Path(meeting_id): Path<String>,
) -> impl IntoResponse {
    match state.engine.delete_meeting(&MeetingId::new(meeting_id.clone())).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => error_response(
            StatusCode::NOT_FOUND,
            format!("Meeting {} not found", meeting_id),
        ),
        Err(e) => {
            error!("Failed to delete meeting {}: {:#}", meeting_id, e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to delete meeting: {}", e),
            )
        }
    }
}

/// POST /meetings/:meeting_id/load?edit=
/// Open a saved meeting in the session
pub async fn load_meeting(
    State(state): State<AppState>,
    Path(meeting_id): Path<String>,
    Query(params): Query<LoadParams>,
) -> impl IntoResponse {
    let id = MeetingId::new(meeting_id.clone());
    match state.engine.meetings().find(&id).await {
        Ok(Some(record)) => {
            state.engine.load_meeting(record, params.edit).await;
            session_response(&state).await
        }
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            format!("Meeting {} not found", meeting_id),
        ),
        Err(e) => {
            error!("Failed to load meeting {}: {:#}", meeting_id, e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to load meeting: {}", e),
            )
        }
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
