//! Audio recorder contract
//!
//! The session engine drives a `Recorder` through start/pause/resume/stop and
//! receives a finalized `AudioArtifact` on stop. Elapsed-time ticking belongs
//! to the engine, not the recorder.

mod capture;

pub use capture::CaptureRecorder;

use anyhow::Result;
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Phase of the session's recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingPhase {
    #[default]
    Idle,
    Recording,
    Paused,
}

/// Finalized recording attached to the session
#[derive(Debug, Clone, PartialEq)]
pub struct AudioArtifact {
    pub data: Vec<u8>,
    pub mime_type: String,
    pub duration_secs: f64,
}

impl AudioArtifact {
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

/// Platform audio capture
#[async_trait]
pub trait Recorder: Send {
    /// Acquire the capture device and begin recording
    async fn start(&mut self) -> Result<()>;

    async fn pause(&mut self) -> Result<()>;

    async fn resume(&mut self) -> Result<()>;

    /// Finish recording, release the device and return the audio
    async fn stop(&mut self) -> Result<AudioArtifact>;

    /// Abandon any in-progress recording and release the device
    async fn reset(&mut self);

    /// Recorder name for logging
    fn name(&self) -> &str;
}
