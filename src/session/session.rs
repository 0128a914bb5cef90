use super::config::SessionSettings;
use super::error::GenerateError;
use super::export::ExportArtifact;
use super::state::{AttachedFile, SessionState};
use super::stats::SessionSnapshot;
use crate::extract::{title_from_filename, ContentExtractor, ExtractError, UploadedFile};
use crate::recorder::{RecordingPhase, Recorder};
use crate::store::{
    keys, today_label, KeyValueStore, MeetingId, MeetingRecord, MeetingRepository, UpsertKind,
};
use crate::summarize::{parse_response, AudioPayload, SummaryRequest, Summarizer};
use anyhow::Result;
use chrono::Local;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

pub const SAVING_STATUS: &str = "Saving…";
pub const CHANGES_SAVED_STATUS: &str = "Changes saved";
pub const SAVED_TO_DASHBOARD_STATUS: &str = "Saved to dashboard";

const UNEXPECTED_GENERATION_ERROR: &str =
    "An unexpected error occurred while generating the summary.";

/// Capabilities the engine is built on
pub struct Collaborators {
    pub store: Arc<dyn KeyValueStore>,
    pub recorder: Box<dyn Recorder>,
    pub extractor: Arc<dyn ContentExtractor>,
    pub summarizer: Arc<dyn Summarizer>,
}

/// Single source of truth for the editing session
///
/// Owns the session fields, decides when edits become durable (note writer
/// and record writer), enforces the summary quota and tracks which saved
/// meeting the session represents. Cheap to clone; clones share the session.
#[derive(Clone)]
pub struct SessionEngine {
    inner: Arc<Inner>,
}

struct Inner {
    settings: SessionSettings,
    store: Arc<dyn KeyValueStore>,
    meetings: MeetingRepository,

    /// Locked before `state` whenever both are needed
    recorder: Mutex<Box<dyn Recorder>>,

    extractor: Arc<dyn ContentExtractor>,
    summarizer: Arc<dyn Summarizer>,
    state: Mutex<SessionState>,
}

impl SessionEngine {
    /// Create the engine, restoring any session left in the store
    pub async fn new(settings: SessionSettings, collaborators: Collaborators) -> Self {
        let Collaborators {
            store,
            recorder,
            extractor,
            summarizer,
        } = collaborators;

        let mut state = SessionState::new(&settings);
        state.title = read_slot(store.as_ref(), keys::SESSION_TITLE)
            .await
            .unwrap_or_default();
        state.notes = read_slot(store.as_ref(), keys::SESSION_NOTES)
            .await
            .unwrap_or_default();
        state.summary = read_slot(store.as_ref(), keys::SESSION_SUMMARY)
            .await
            .unwrap_or_default();
        state.link = read_slot(store.as_ref(), keys::SESSION_MEETING_ID)
            .await
            .filter(|id| !id.trim().is_empty())
            .map(MeetingId::new)
            .into();
        state.summaries_used = match read_slot(store.as_ref(), keys::SUMMARIES_USED).await {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!("Ignoring unreadable summary count {:?}", raw);
                0
            }),
            None => 0,
        };

        info!(
            "Session restored (title={:?}, linked={}, summaries used={}/{})",
            state.title,
            state.link.is_bound(),
            state.summaries_used,
            settings.free_summary_limit
        );

        Self {
            inner: Arc::new(Inner {
                meetings: MeetingRepository::new(Arc::clone(&store)),
                settings,
                store,
                recorder: Mutex::new(recorder),
                extractor,
                summarizer,
                state: Mutex::new(state),
            }),
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.inner.settings
    }

    /// Saved meetings (dashboard)
    pub fn meetings(&self) -> &MeetingRepository {
        &self.inner.meetings
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.state.lock().await;
        SessionSnapshot::capture(&state, self.inner.settings.free_summary_limit)
    }

    // ------------------------------------------------------------------
    // Text fields
    // ------------------------------------------------------------------

    pub async fn set_title(&self, title: impl Into<String>) {
        let mut state = self.inner.state.lock().await;
        state.title = title.into();
        self.inner.on_text_changed(&mut state);
    }

    /// Replace the notes. Clearing them while nothing is attached abandons
    /// the current meeting: the title is cleared and the link severed.
    pub async fn set_notes(&self, notes: impl Into<String>) {
        let notes = notes.into();
        let mut state = self.inner.state.lock().await;

        let cleared = !state.notes.trim().is_empty() && notes.trim().is_empty();
        if cleared && state.file.is_none() && state.audio.is_none() {
            state.title.clear();
            self.inner.sever(&mut state).await;
        }

        state.notes = notes;
        self.inner.on_text_changed(&mut state);
    }

    /// Summary editor changes
    pub async fn set_summary(&self, summary: impl Into<String>) {
        let mut state = self.inner.state.lock().await;
        state.summary = summary.into();
        self.inner.schedule_record_write(&mut state);
    }

    // ------------------------------------------------------------------
    // Summary generation and export
    // ------------------------------------------------------------------

    /// Ask the summarizer for minutes of the current session
    ///
    /// Only one call may be in flight; a second one is refused with
    /// `AlreadyGenerating`. Quota and summarizer failures are also mirrored
    /// into `generation_error`.
    pub async fn generate(&self) -> std::result::Result<(), GenerateError> {
        let request = {
            let mut state = self.inner.state.lock().await;

            if state.is_generating {
                debug!("Generate requested while a summary is in flight");
                return Err(GenerateError::AlreadyGenerating);
            }

            if !state.has_input() {
                debug!("Generate requested with nothing to summarize");
                return Err(GenerateError::NothingToSummarize);
            }

            if state.summaries_used >= self.inner.settings.free_summary_limit {
                warn!(
                    "Summary quota exhausted ({}/{})",
                    state.summaries_used, self.inner.settings.free_summary_limit
                );
                state.generation_error = Some(GenerateError::QuotaExceeded.to_string());
                return Err(GenerateError::QuotaExceeded);
            }

            state.is_generating = true;
            state.summary.clear();
            state.generation_error = None;
            self.inner.schedule_record_write(&mut state);

            build_request(&state)
        };

        info!(
            "Generating summary ({} chars of notes, audio={})",
            request.notes_text.len(),
            request.audio.is_some()
        );

        let response = self.inner.summarizer.summarize(&request).await;

        let mut state = self.inner.state.lock().await;
        state.is_generating = false;

        let message = match response.map(parse_response) {
            Ok(Ok(summary)) => {
                state.summary = summary;
                state.summaries_used += 1;
                let count = state.summaries_used.to_string();
                if let Err(e) = self.inner.store.set(keys::SUMMARIES_USED, &count).await {
                    warn!("Failed to persist summary count: {:#}", e);
                }
                info!(
                    "Summary generated ({} chars, {} used)",
                    state.summary.len(),
                    state.summaries_used
                );
                self.inner.schedule_record_write(&mut state);
                return Ok(());
            }
            Ok(Err(message)) => {
                warn!("Summarizer reported failure: {}", message);
                message
            }
            Err(e) => {
                error!("Error generating summary: {:#}", e);
                UNEXPECTED_GENERATION_ERROR.to_string()
            }
        };

        state.generation_error = Some(message.clone());
        Err(GenerateError::SummarizationFailure(message))
    }

    /// Markdown download of the summary, `None` when there is no summary
    pub async fn export_summary(&self) -> Option<ExportArtifact> {
        let state = self.inner.state.lock().await;
        if state.summary.is_empty() {
            return None;
        }
        Some(ExportArtifact::markdown(&state.title, &state.summary))
    }

    // ------------------------------------------------------------------
    // Recording
    // ------------------------------------------------------------------

    /// Begin a new recording in a fresh meeting context
    pub async fn start_recording(&self) -> Result<()> {
        let mut recorder = self.inner.recorder.lock().await;

        {
            let mut state = self.inner.state.lock().await;
            if state.recording_phase != RecordingPhase::Idle {
                warn!("Recording already in progress");
                return Ok(());
            }

            self.inner.sever(&mut state).await;
            state.clear_file();
            state.audio = None;
            if state.notes.trim().is_empty() && !state.title.is_empty() {
                state.title.clear();
                self.inner.on_text_changed(&mut state);
            }
        }

        if let Err(e) = recorder.start().await {
            error!("Error starting recording: {:#}", e);
            return Err(e);
        }

        let mut state = self.inner.state.lock().await;
        state.recording_phase = RecordingPhase::Recording;
        state.recording_elapsed_secs = 0;
        self.inner.start_ticker(&mut state);

        info!("Recording started ({})", recorder.name());
        Ok(())
    }

    pub async fn pause_recording(&self) -> Result<()> {
        let mut recorder = self.inner.recorder.lock().await;
        if self.recording_phase().await != RecordingPhase::Recording {
            return Ok(());
        }

        recorder.pause().await?;

        let mut state = self.inner.state.lock().await;
        state.recording_phase = RecordingPhase::Paused;
        state.ticker.stop();
        debug!("Recording paused at {}s", state.recording_elapsed_secs);
        Ok(())
    }

    pub async fn resume_recording(&self) -> Result<()> {
        let mut recorder = self.inner.recorder.lock().await;
        if self.recording_phase().await != RecordingPhase::Paused {
            return Ok(());
        }

        recorder.resume().await?;

        let mut state = self.inner.state.lock().await;
        state.recording_phase = RecordingPhase::Recording;
        self.inner.start_ticker(&mut state);
        debug!("Recording resumed at {}s", state.recording_elapsed_secs);
        Ok(())
    }

    /// Finish the recording and attach the audio to the session
    pub async fn stop_recording(&self) -> Result<()> {
        let mut recorder = self.inner.recorder.lock().await;
        if self.recording_phase().await == RecordingPhase::Idle {
            return Ok(());
        }

        let result = recorder.stop().await;

        let mut state = self.inner.state.lock().await;
        state.ticker.stop();
        state.recording_phase = RecordingPhase::Idle;
        state.recording_elapsed_secs = 0;

        match result {
            Ok(artifact) => {
                info!(
                    "Recording attached ({:.1}s, {} bytes)",
                    artifact.duration_secs,
                    artifact.data.len()
                );
                state.audio = Some(artifact);
                Ok(())
            }
            Err(e) => {
                error!("Error stopping recording: {:#}", e);
                Err(e)
            }
        }
    }

    /// Discard the recording (finished or in progress)
    pub async fn clear_recording(&self) {
        let mut recorder = self.inner.recorder.lock().await;
        recorder.reset().await;

        let mut state = self.inner.state.lock().await;
        self.inner.sever(&mut state).await;
        state.clear_recording();
        if state.notes.trim().is_empty() && state.file.is_none() && !state.title.is_empty() {
            state.title.clear();
            self.inner.on_text_changed(&mut state);
        }
    }

    async fn recording_phase(&self) -> RecordingPhase {
        self.inner.state.lock().await.recording_phase
    }

    // ------------------------------------------------------------------
    // File upload
    // ------------------------------------------------------------------

    /// Attach a file in a fresh meeting context
    ///
    /// Documents are run through the extractor. If extraction fails the upload
    /// is rolled back (file removed, title restored) and the error returned
    /// for the caller to show.
    pub async fn handle_file_selected(
        &self,
        file: UploadedFile,
    ) -> std::result::Result<(), ExtractError> {
        let file = Arc::new(file);

        {
            let mut recorder = self.inner.recorder.lock().await;
            recorder.reset().await;
        }

        let derived_title = title_from_filename(&file.name);
        let (epoch, previous_title) = {
            let mut state = self.inner.state.lock().await;
            self.inner.sever(&mut state).await;
            state.clear_recording();
            state.clear_file();

            let previous_title = std::mem::replace(&mut state.title, derived_title.clone());
            state.file = Some(AttachedFile::new(Arc::clone(&file)));
            state.is_uploading = true;
            state.upload_progress = 0;
            self.inner.on_text_changed(&mut state);

            info!(
                "Attached {} ({}, {} bytes)",
                file.name,
                file.mime_type,
                file.data.len()
            );

            if file.is_audio() {
                state.is_uploading = false;
                state.upload_progress = 100;
                return Ok(());
            }

            (state.upload_epoch, previous_title)
        };

        let result = self.inner.extractor.extract(&file).await;

        let mut state = self.inner.state.lock().await;
        if state.upload_epoch != epoch {
            debug!("Discarding extraction result for abandoned upload {}", file.name);
            return Ok(());
        }

        match result {
            Ok(text) => {
                if let Some(attached) = state.file.as_mut() {
                    attached.extracted_text = Some(text);
                    attached.text_merged = false;
                }
                state.is_uploading = false;
                state.upload_progress = 100;
                Ok(())
            }
            Err(e) => {
                warn!("Error processing file {}: {}", file.name, e);
                state.clear_file();
                if state.title == derived_title {
                    state.title = previous_title;
                    self.inner.on_text_changed(&mut state);
                }
                Err(e)
            }
        }
    }

    /// Drop the attached file (and any extraction still running for it)
    pub async fn cancel_upload(&self) {
        let mut state = self.inner.state.lock().await;
        self.inner.sever(&mut state).await;
        state.clear_file();
        if state.notes.trim().is_empty() && state.audio.is_none() && !state.title.is_empty() {
            state.title.clear();
            self.inner.on_text_changed(&mut state);
        }
    }

    /// Copy the extracted document text into the notes; false if there is
    /// nothing (left) to merge
    pub async fn merge_extracted_text_into_notes(&self) -> bool {
        let mut state = self.inner.state.lock().await;
        let Some(content) = state.file.as_ref().and_then(AttachedFile::unmerged_content) else {
            return false;
        };

        let mut notes = if state.notes.trim().is_empty() {
            String::new()
        } else {
            format!("{}\n\n", state.notes)
        };
        notes.push_str(&content);
        state.notes = notes;

        if let Some(attached) = state.file.as_mut() {
            attached.text_merged = true;
        }
        self.inner.on_text_changed(&mut state);
        true
    }

    // ------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------

    /// Start over: every field back to default, session slots erased.
    /// The lifetime summary count and saved meetings are untouched.
    pub async fn reset_session(&self) {
        let mut recorder = self.inner.recorder.lock().await;
        recorder.reset().await;

        let mut state = self.inner.state.lock().await;
        state.reset();

        for key in keys::SESSION_SLOTS {
            if let Err(e) = self.inner.store.remove(key).await {
                warn!("Failed to clear {}: {:#}", key, e);
            }
        }

        info!("Session reset");
    }

    /// Open a saved meeting in the session
    ///
    /// A record write still pending for the outgoing session is committed
    /// first. `start_in_edit_mode` is read once via `take_start_in_edit_mode`.
    pub async fn load_meeting(&self, record: MeetingRecord, start_in_edit_mode: bool) {
        let mut recorder = self.inner.recorder.lock().await;
        recorder.reset().await;

        let mut state = self.inner.state.lock().await;
        if state.record_writer.is_pending() {
            state.record_writer.cancel();
            self.inner.commit_record(&mut state, false).await;
        }

        state.note_writer.cancel();
        state.status_clear.cancel();
        state.is_generating = false;
        state.generation_error = None;
        state.clear_recording();
        state.clear_file();
        state.note_save_status.clear();
        state.record_save_status.clear();

        state.title = record.title;
        state.notes = record.notes;
        state.summary = record.summary;
        state.link.bind(record.id);
        state.start_in_edit_mode = start_in_edit_mode;

        let slots = [
            (keys::SESSION_TITLE, state.title.as_str()),
            (keys::SESSION_NOTES, state.notes.as_str()),
            (keys::SESSION_SUMMARY, state.summary.as_str()),
            (keys::SESSION_MEETING_ID, state.link.id().map_or("", MeetingId::as_str)),
        ];
        for (key, value) in slots {
            if let Err(e) = self.inner.store.set(key, value).await {
                warn!("Failed to persist {}: {:#}", key, e);
            }
        }

        info!("Loaded meeting {:?} (edit={})", state.title, start_in_edit_mode);
    }

    /// Read and clear the one-shot "open the summary editor" flag
    pub async fn take_start_in_edit_mode(&self) -> bool {
        std::mem::take(&mut self.inner.state.lock().await.start_in_edit_mode)
    }

    /// Delete a saved meeting from the dashboard
    ///
    /// A session still bound to it re-creates the record on its next save.
    pub async fn delete_meeting(&self, id: &MeetingId) -> Result<bool> {
        self.inner.meetings.delete(id).await
    }
}

impl Inner {
    fn on_text_changed(self: &Arc<Self>, state: &mut SessionState) {
        self.schedule_note_write(state);
        self.schedule_record_write(state);
    }

    /// Detach the session from its saved meeting so the next save creates a
    /// new record
    async fn sever(&self, state: &mut SessionState) {
        if let Some(id) = state.link.sever() {
            info!("Session detached from meeting {}", id);
        }

        state.summary.clear();
        state.record_writer.cancel();
        state.status_clear.cancel();
        state.record_save_status.clear();

        for key in [keys::SESSION_SUMMARY, keys::SESSION_MEETING_ID] {
            if let Err(e) = self.store.remove(key).await {
                warn!("Failed to clear {}: {:#}", key, e);
            }
        }
    }

    // ---- note writer -------------------------------------------------

    fn schedule_note_write(self: &Arc<Self>, state: &mut SessionState) {
        if state.title.is_empty() && state.notes.is_empty() {
            if state.note_writer.is_pending() {
                state.note_writer.cancel();
                state.note_save_status.clear();
            }
            return;
        }

        state.note_save_status = SAVING_STATUS.to_string();
        let weak = Arc::downgrade(self);
        state.note_writer.schedule(move |epoch| {
            async move {
                if let Some(inner) = weak.upgrade() {
                    inner.write_notes(epoch).await;
                }
            }
            .boxed()
        });
    }

    async fn write_notes(self: Arc<Self>, epoch: u64) {
        let mut state = self.state.lock().await;
        if !state.note_writer.fire(epoch) {
            return;
        }
        if state.title.is_empty() && state.notes.is_empty() {
            return;
        }

        match self.persist_notes(&state.title, &state.notes).await {
            Ok(()) => {
                state.note_save_status =
                    format!("Last saved: {}", Local::now().format("%H:%M"));
                debug!("Session notes saved");
            }
            Err(e) => {
                warn!("Failed to save session notes, will retry: {:#}", e);
                self.schedule_note_write(&mut state);
            }
        }
    }

    async fn persist_notes(&self, title: &str, notes: &str) -> Result<()> {
        self.store.set(keys::SESSION_TITLE, title).await?;
        self.store.set(keys::SESSION_NOTES, notes).await
    }

    // ---- record writer -----------------------------------------------

    fn schedule_record_write(self: &Arc<Self>, state: &mut SessionState) {
        if !state.is_record_ready() {
            if state.record_writer.is_pending() {
                state.record_writer.cancel();
                state.record_save_status.clear();
            }
            return;
        }

        state.record_save_status = SAVING_STATUS.to_string();
        state.status_clear.cancel();
        let weak = Arc::downgrade(self);
        state.record_writer.schedule(move |epoch| {
            async move {
                if let Some(inner) = weak.upgrade() {
                    inner.write_record(epoch).await;
                }
            }
            .boxed()
        });
    }

    async fn write_record(self: Arc<Self>, epoch: u64) {
        let mut state = self.state.lock().await;
        if !state.record_writer.fire(epoch) {
            return;
        }
        self.commit_record(&mut state, true).await;
    }

    /// Upsert the session's meeting record and bind the session to it
    async fn commit_record(self: &Arc<Self>, state: &mut SessionState, retry: bool) {
        if !state.is_record_ready() {
            return;
        }

        match self.upsert_record(state).await {
            Ok(kind) => {
                state.record_save_status = match kind {
                    UpsertKind::Updated | UpsertKind::Recreated => CHANGES_SAVED_STATUS,
                    UpsertKind::Created => SAVED_TO_DASHBOARD_STATUS,
                }
                .to_string();
                self.schedule_status_clear(state);
            }
            Err(e) if retry => {
                warn!("Failed to save meeting, will retry: {:#}", e);
                self.schedule_record_write(state);
            }
            Err(e) => {
                warn!("Failed to save meeting: {:#}", e);
                state.record_save_status.clear();
            }
        }
    }

    async fn upsert_record(&self, state: &mut SessionState) -> Result<UpsertKind> {
        self.store.set(keys::SESSION_SUMMARY, &state.summary).await?;

        let outcome = self
            .meetings
            .upsert(
                state.link.id(),
                &state.title,
                &state.notes,
                &state.summary,
                today_label(),
            )
            .await?;

        state.link.bind(outcome.id.clone());
        self.store
            .set(keys::SESSION_MEETING_ID, outcome.id.as_str())
            .await?;

        Ok(outcome.kind)
    }

    fn schedule_status_clear(self: &Arc<Self>, state: &mut SessionState) {
        let weak = Arc::downgrade(self);
        state.status_clear.schedule(move |epoch| {
            async move {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                let mut state = inner.state.lock().await;
                if state.status_clear.fire(epoch) {
                    state.record_save_status.clear();
                }
            }
            .boxed()
        });
    }

    // ---- recording clock ---------------------------------------------

    fn start_ticker(self: &Arc<Self>, state: &mut SessionState) {
        let weak = Arc::downgrade(self);
        state.ticker.start(Duration::from_secs(1), move |epoch| {
            let weak = weak.clone();
            async move {
                let Some(inner) = weak.upgrade() else {
                    return false;
                };
                let mut state = inner.state.lock().await;
                if !state.ticker.is_current(epoch) {
                    return false;
                }
                if state.recording_phase == RecordingPhase::Recording {
                    state.recording_elapsed_secs += 1;
                }
                true
            }
            .boxed()
        });
    }
}

/// Compose the summarizer input from the session
fn build_request(state: &SessionState) -> SummaryRequest {
    let audio = match (&state.audio, &state.file) {
        (Some(artifact), _) => Some(AudioPayload {
            data: artifact.to_base64(),
            mime_type: artifact.mime_type.clone(),
        }),
        (None, Some(attached)) if attached.file.is_audio() => Some(AudioPayload {
            data: attached.file.to_base64(),
            mime_type: attached.file.mime_type.clone(),
        }),
        _ => None,
    };

    let notes_text = match state.file.as_ref().and_then(AttachedFile::unmerged_content) {
        Some(content) if state.notes.trim().is_empty() => content,
        Some(content) => format!("{}\n\n{}", state.notes, content),
        None => state.notes.clone(),
    };

    SummaryRequest { notes_text, audio }
}

async fn read_slot(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    match store.get(key).await {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to read {}: {:#}", key, e);
            None
        }
    }
}
