// Test doubles for the session engine's collaborators
//
// Every double records what the engine asked of it so tests can assert on
// call counts and payloads after the fact.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use meeting_minutes::extract::{ContentExtractor, ExtractError, UploadedFile};
use meeting_minutes::recorder::{AudioArtifact, Recorder};
use meeting_minutes::session::{Collaborators, SessionEngine, SessionSettings};
use meeting_minutes::store::{keys, KeyValueStore, MemoryStore};
use meeting_minutes::summarize::{SummaryRequest, Summarizer};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Debounce delay plus a margin
pub const AFTER_AUTOSAVE: Duration = Duration::from_millis(1600);

// ============================================================================
// Store
// ============================================================================

/// `MemoryStore` that counts writes per key and can be switched to failing
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    writes: Mutex<HashMap<String, usize>>,
    failing: std::sync::atomic::AtomicBool,
}

impl CountingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn writes(&self, key: &str) -> usize {
        self.writes.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    pub fn meeting_writes(&self) -> usize {
        self.writes(keys::MEETINGS)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStore for CountingStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("store unavailable");
        }
        *self.writes.lock().unwrap().entry(key.to_string()).or_default() += 1;
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("store unavailable");
        }
        self.inner.remove(key).await
    }
}

// ============================================================================
// Recorder
// ============================================================================

#[derive(Debug, Default)]
pub struct RecorderLog {
    pub starts: usize,
    pub pauses: usize,
    pub resumes: usize,
    pub stops: usize,
    pub resets: usize,
}

/// Recorder that hands back a fixed artifact
pub struct FakeRecorder {
    log: Arc<Mutex<RecorderLog>>,
    fail_start: bool,
    active: bool,
}

impl FakeRecorder {
    pub fn new() -> (Self, Arc<Mutex<RecorderLog>>) {
        let log = Arc::new(Mutex::new(RecorderLog::default()));
        (
            Self {
                log: Arc::clone(&log),
                fail_start: false,
                active: false,
            },
            log,
        )
    }

    pub fn failing() -> Self {
        let (mut recorder, _) = Self::new();
        recorder.fail_start = true;
        recorder
    }
}

pub fn fake_artifact() -> AudioArtifact {
    AudioArtifact {
        data: vec![1, 2, 3, 4],
        mime_type: "audio/wav".to_string(),
        duration_secs: 4.0,
    }
}

#[async_trait]
impl Recorder for FakeRecorder {
    async fn start(&mut self) -> Result<()> {
        if self.fail_start {
            anyhow::bail!("Permission denied");
        }
        self.active = true;
        self.log.lock().unwrap().starts += 1;
        Ok(())
    }

    async fn pause(&mut self) -> Result<()> {
        self.log.lock().unwrap().pauses += 1;
        Ok(())
    }

    async fn resume(&mut self) -> Result<()> {
        self.log.lock().unwrap().resumes += 1;
        Ok(())
    }

    async fn stop(&mut self) -> Result<AudioArtifact> {
        if !self.active {
            anyhow::bail!("Recording not active");
        }
        self.active = false;
        self.log.lock().unwrap().stops += 1;
        Ok(fake_artifact())
    }

    async fn reset(&mut self) {
        self.active = false;
        self.log.lock().unwrap().resets += 1;
    }

    fn name(&self) -> &str {
        "fake"
    }
}

// ============================================================================
// Summarizer
// ============================================================================

/// Summarizer replaying scripted responses; falls back to a fixed summary
#[derive(Default)]
pub struct FakeSummarizer {
    script: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<SummaryRequest>>,
    calls: AtomicUsize,
    gate: Mutex<Option<Arc<Notify>>>,
}

pub const DEFAULT_SUMMARY: &str =
    "**Roadmap review.**\n\n### Key Points\n- Q3 scope agreed\n\n### Action Items\n- Draft plan - @Dana";

impl FakeSummarizer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a raw response (`Ok`) or a transport failure (`Err`)
    pub fn push(&self, response: Result<&str, &str>) {
        self.script
            .lock()
            .unwrap()
            .push_back(response.map(str::to_string).map_err(str::to_string));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<SummaryRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    /// Following calls block until the returned `Notify` is signaled
    pub fn gate(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }
}

#[async_trait]
impl Summarizer for FakeSummarizer {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        match self.script.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(failure)) => Err(anyhow::anyhow!(failure)),
            None => Ok(DEFAULT_SUMMARY.to_string()),
        }
    }
}

// ============================================================================
// Extractor
// ============================================================================

/// Extractor returning canned text, optionally failing or waiting for a gate
#[derive(Default)]
pub struct FakeExtractor {
    failure: Option<ExtractError>,
    gate: Option<Arc<Notify>>,
    calls: AtomicUsize,
}

impl FakeExtractor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(error: ExtractError) -> Arc<Self> {
        Arc::new(Self {
            failure: Some(error),
            ..Self::default()
        })
    }

    /// Extraction blocks until the returned `Notify` is signaled
    pub fn gated() -> (Arc<Self>, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        (
            Arc::new(Self {
                gate: Some(Arc::clone(&gate)),
                ..Self::default()
            }),
            gate,
        )
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentExtractor for FakeExtractor {
    async fn extract(&self, file: &UploadedFile) -> Result<String, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(format!("Text of {}", file.name)),
        }
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub engine: SessionEngine,
    pub store: Arc<CountingStore>,
    pub summarizer: Arc<FakeSummarizer>,
    pub extractor: Arc<FakeExtractor>,
    pub recorder: Arc<Mutex<RecorderLog>>,
}

pub async fn harness() -> Harness {
    harness_with(CountingStore::new(), FakeExtractor::new()).await
}

pub async fn harness_with(store: Arc<CountingStore>, extractor: Arc<FakeExtractor>) -> Harness {
    let summarizer = FakeSummarizer::new();
    let (recorder, recorder_log) = FakeRecorder::new();

    let engine = SessionEngine::new(
        SessionSettings::default(),
        Collaborators {
            store: store.clone(),
            recorder: Box::new(recorder),
            extractor: extractor.clone(),
            summarizer: summarizer.clone(),
        },
    )
    .await;

    Harness {
        engine,
        store,
        summarizer,
        extractor,
        recorder: recorder_log,
    }
}

pub async fn slot(store: &CountingStore, key: &str) -> Option<String> {
    store.get(key).await.unwrap()
}

pub fn text_file(name: &str, text: &str) -> UploadedFile {
    UploadedFile::new(name, "", text.as_bytes().to_vec())
}
