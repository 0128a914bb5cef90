//! HTTP API for the presentation layer
//!
//! Session editing:
//! - GET /session - Snapshot of the live session
//! - PUT /session/{title,notes,summary} - Edit a text field
//! - POST /session/generate - Generate minutes
//! - GET /session/export - Download the summary as markdown
//! - POST /session/reset - Start over
//!
//! Attachments and recording:
//! - POST /session/upload?name=&mime= - Attach a file (raw body)
//! - DELETE /session/upload - Drop the attached file
//! - POST /session/upload/merge - Copy extracted text into the notes
//! - POST /session/recording/{start,pause,resume,stop} - Recorder control
//! - DELETE /session/recording - Discard the recording
//!
//! Dashboard:
//! - GET /meetings?q= - Saved meetings, newest day first
//! - GET /meetings/calendar - Meetings grouped by day
//! - DELETE /meetings/:id - Delete a saved meeting
//! - POST /meetings/:id/load?edit= - Open a saved meeting
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
