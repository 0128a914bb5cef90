use super::handlers;
use super::state::AppState;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session editing
        .route("/session", get(handlers::get_session))
        .route("/session/title", put(handlers::set_title))
        .route("/session/notes", put(handlers::set_notes))
        .route("/session/summary", put(handlers::set_summary))
        .route("/session/generate", post(handlers::generate))
        .route("/session/export", get(handlers::export_summary))
        .route("/session/reset", post(handlers::reset_session))
        .route("/session/edit-mode", post(handlers::take_edit_mode))
        // Attachments
        .route(
            "/session/upload",
            post(handlers::upload_file).delete(handlers::cancel_upload),
        )
        .route("/session/upload/merge", post(handlers::merge_upload))
        // Recording control
        .route("/session/recording", delete(handlers::clear_recording))
        .route("/session/recording/start", post(handlers::start_recording))
        .route("/session/recording/pause", post(handlers::pause_recording))
        .route("/session/recording/resume", post(handlers::resume_recording))
        .route("/session/recording/stop", post(handlers::stop_recording))
        // Dashboard
        .route("/meetings", get(handlers::list_meetings))
        .route("/meetings/calendar", get(handlers::meetings_calendar))
        .route("/meetings/:meeting_id", delete(handlers::delete_meeting))
        .route("/meetings/:meeting_id/load", post(handlers::load_meeting))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
