//! Meeting session engine
//!
//! This module provides the `SessionEngine` that manages:
//! - The live title, notes, summary and attachments
//! - Debounced persistence of the session and its dashboard record
//! - Meeting identity (which saved meeting the session overwrites)
//! - Summary generation against a lifetime quota
//! - Recording lifecycle and elapsed-time clock

mod config;
mod debounce;
mod error;
mod export;
mod identity;
mod session;
mod state;
mod stats;

pub use config::SessionSettings;
pub use error::GenerateError;
pub use export::{sanitize_file_stem, ExportArtifact, MARKDOWN_MIME, UNTITLED_FILE_STEM};
pub use identity::MeetingLink;
pub use session::{
    Collaborators, SessionEngine, CHANGES_SAVED_STATUS, SAVED_TO_DASHBOARD_STATUS, SAVING_STATUS,
};
pub use state::AttachedFile;
pub use stats::{AttachedFileInfo, SessionSnapshot};
