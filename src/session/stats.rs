use serde::Serialize;

use super::identity::MeetingLink;
use super::state::SessionState;
use crate::recorder::RecordingPhase;

/// Point-in-time view of the session for the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub title: String,
    pub notes: String,
    /// Markdown minutes, empty until generated
    pub summary: String,

    pub link: MeetingLink,

    pub recording_phase: RecordingPhase,
    pub recording_elapsed_secs: u64,
    pub has_audio: bool,
    pub audio_duration_secs: Option<f64>,

    pub attached_file: Option<AttachedFileInfo>,
    pub is_uploading: bool,
    pub upload_progress: u8,

    pub is_generating: bool,
    pub generation_error: Option<String>,
    pub summaries_used: u32,
    pub free_summary_limit: u32,

    pub note_save_status: String,
    pub record_save_status: String,
}

/// Attached file without its bytes
#[derive(Debug, Clone, Serialize)]
pub struct AttachedFileInfo {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: usize,
    pub is_audio: bool,
    pub extracted_text: Option<String>,
    pub text_merged: bool,
}

impl SessionSnapshot {
    pub(crate) fn capture(state: &SessionState, free_summary_limit: u32) -> Self {
        Self {
            title: state.title.clone(),
            notes: state.notes.clone(),
            summary: state.summary.clone(),
            link: state.link.clone(),
            recording_phase: state.recording_phase,
            recording_elapsed_secs: state.recording_elapsed_secs,
            has_audio: state.audio.is_some(),
            audio_duration_secs: state.audio.as_ref().map(|a| a.duration_secs),
            attached_file: state.file.as_ref().map(|attached| AttachedFileInfo {
                name: attached.file.name.clone(),
                mime_type: attached.file.mime_type.clone(),
                size_bytes: attached.file.data.len(),
                is_audio: attached.file.is_audio(),
                extracted_text: attached.extracted_text.clone(),
                text_merged: attached.text_merged,
            }),
            is_uploading: state.is_uploading,
            upload_progress: state.upload_progress,
            is_generating: state.is_generating,
            generation_error: state.generation_error.clone(),
            summaries_used: state.summaries_used,
            free_summary_limit,
            note_save_status: state.note_save_status.clone(),
            record_save_status: state.record_save_status.clone(),
        }
    }

    pub fn summaries_remaining(&self) -> u32 {
        self.free_summary_limit.saturating_sub(self.summaries_used)
    }

    pub fn is_quota_exhausted(&self) -> bool {
        self.summaries_used >= self.free_summary_limit
    }
}
