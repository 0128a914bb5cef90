pub mod audio;
pub mod config;
pub mod extract;
pub mod http;
pub mod recorder;
pub mod session;
pub mod store;
pub mod summarize;

pub use audio::{
    AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFile, AudioFrame, AudioSource,
    FileBackend, WavEncoder,
};
pub use config::Config;
pub use extract::{ContentExtractor, DocumentExtractor, ExtractError, UploadedFile};
pub use http::{create_router, AppState};
pub use recorder::{AudioArtifact, CaptureRecorder, Recorder, RecordingPhase};
pub use session::{
    Collaborators, ExportArtifact, GenerateError, MeetingLink, SessionEngine, SessionSettings,
    SessionSnapshot,
};
pub use store::{
    FileStore, KeyValueStore, MeetingId, MeetingRecord, MeetingRepository, MemoryStore,
};
pub use summarize::{OpenAiSummarizer, SummarizerConfig, Summarizer, SummaryRequest};
