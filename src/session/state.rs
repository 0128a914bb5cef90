use std::sync::Arc;

use super::config::SessionSettings;
use super::debounce::{Debouncer, Ticker};
use super::identity::MeetingLink;
use crate::extract::UploadedFile;
use crate::recorder::{AudioArtifact, RecordingPhase};

/// Document or audio file attached to the session
#[derive(Debug, Clone)]
pub struct AttachedFile {
    pub file: Arc<UploadedFile>,
    /// Text pulled out of a document, `None` for audio or while extracting
    pub extracted_text: Option<String>,
    /// Whether `extracted_text` has been copied into the notes
    pub text_merged: bool,
}

impl AttachedFile {
    pub fn new(file: Arc<UploadedFile>) -> Self {
        Self {
            file,
            extracted_text: None,
            text_merged: false,
        }
    }

    /// Header line that introduces this file's text in the notes
    pub fn content_header(&self) -> String {
        format!("--- Content from {} ---\n", self.file.name)
    }

    /// Extracted text with its header, if extracted and not yet merged
    pub fn unmerged_content(&self) -> Option<String> {
        match &self.extracted_text {
            Some(text) if !self.text_merged => Some(format!("{}{}", self.content_header(), text)),
            _ => None,
        }
    }
}

/// The live editing session plus the timers that act on it
#[derive(Debug)]
pub struct SessionState {
    pub title: String,
    pub notes: String,
    pub summary: String,
    pub audio: Option<AudioArtifact>,
    pub file: Option<AttachedFile>,
    pub recording_phase: RecordingPhase,
    pub recording_elapsed_secs: u64,
    pub link: MeetingLink,
    pub summaries_used: u32,

    pub is_generating: bool,
    pub generation_error: Option<String>,
    pub is_uploading: bool,
    pub upload_progress: u8,
    pub note_save_status: String,
    pub record_save_status: String,
    pub start_in_edit_mode: bool,

    pub(crate) note_writer: Debouncer,
    pub(crate) record_writer: Debouncer,
    pub(crate) status_clear: Debouncer,
    pub(crate) ticker: Ticker,
    /// Bumped whenever the attached file is replaced or discarded, so a
    /// late extraction result for an old upload is ignored
    pub(crate) upload_epoch: u64,
}

impl SessionState {
    pub fn new(settings: &SessionSettings) -> Self {
        Self {
            title: String::new(),
            notes: String::new(),
            summary: String::new(),
            audio: None,
            file: None,
            recording_phase: RecordingPhase::Idle,
            recording_elapsed_secs: 0,
            link: MeetingLink::Unbound,
            summaries_used: 0,
            is_generating: false,
            generation_error: None,
            is_uploading: false,
            upload_progress: 0,
            note_save_status: String::new(),
            record_save_status: String::new(),
            start_in_edit_mode: false,
            note_writer: Debouncer::new(settings.autosave_delay()),
            record_writer: Debouncer::new(settings.autosave_delay()),
            status_clear: Debouncer::new(settings.status_clear_delay()),
            ticker: Ticker::default(),
            upload_epoch: 0,
        }
    }

    /// Return every field to its default, keeping the lifetime summary count.
    /// Timers are canceled in place so their epochs keep increasing.
    pub fn reset(&mut self) {
        self.note_writer.cancel();
        self.record_writer.cancel();
        self.status_clear.cancel();
        self.clear_recording();
        self.clear_file();

        self.title.clear();
        self.notes.clear();
        self.summary.clear();
        self.link = MeetingLink::Unbound;
        self.is_generating = false;
        self.generation_error = None;
        self.note_save_status.clear();
        self.record_save_status.clear();
        self.start_in_edit_mode = false;
    }

    /// Anything the summarizer could work from
    pub fn has_input(&self) -> bool {
        !self.notes.trim().is_empty() || self.audio.is_some() || self.file.is_some()
    }

    /// Both fields the record writer requires
    pub fn is_record_ready(&self) -> bool {
        !self.summary.trim().is_empty() && !self.title.trim().is_empty()
    }

    /// Discard the attached file and invalidate any extraction in flight
    pub fn clear_file(&mut self) {
        self.file = None;
        self.is_uploading = false;
        self.upload_progress = 0;
        self.upload_epoch += 1;
    }

    /// Stop the recording clock and forget the recorded audio
    pub fn clear_recording(&mut self) {
        self.ticker.stop();
        self.recording_phase = RecordingPhase::Idle;
        self.recording_elapsed_secs = 0;
        self.audio = None;
    }
}
