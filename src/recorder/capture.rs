use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::{AudioArtifact, Recorder};
use crate::audio::{AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioSource, WavEncoder};

/// Recorder that pulls frames from an `AudioBackend` into an in-memory WAV
pub struct CaptureRecorder {
    source: AudioSource,
    config: AudioBackendConfig,

    /// Backend owning the device while a recording is active
    backend: Option<Box<dyn AudioBackend>>,

    /// Frames arriving while paused are discarded
    paused: Arc<AtomicBool>,

    /// Task collecting frames until the backend closes its channel
    collector: Option<JoinHandle<WavEncoder>>,
}

impl CaptureRecorder {
    pub fn new(source: AudioSource, config: AudioBackendConfig) -> Self {
        Self {
            source,
            config,
            backend: None,
            paused: Arc::new(AtomicBool::new(false)),
            collector: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.backend.is_some()
    }
}

#[async_trait]
impl Recorder for CaptureRecorder {
    async fn start(&mut self) -> Result<()> {
        if self.backend.is_some() {
            warn!("Recording already started");
            return Ok(());
        }

        let mut backend = AudioBackendFactory::create(self.source.clone(), self.config.clone())
            .context("Failed to create audio backend")?;

        let mut audio_rx = backend
            .start()
            .await
            .context("Failed to start audio capture")?;

        info!("Recording started ({} backend)", backend.name());

        self.paused.store(false, Ordering::SeqCst);
        let paused = Arc::clone(&self.paused);

        let collector = tokio::spawn(async move {
            let mut encoder = WavEncoder::new();
            while let Some(frame) = audio_rx.recv().await {
                if paused.load(Ordering::SeqCst) {
                    continue;
                }
                encoder.push(&frame);
            }
            encoder
        });

        self.backend = Some(backend);
        self.collector = Some(collector);
        Ok(())
    }

    async fn pause(&mut self) -> Result<()> {
        self.paused.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn resume(&mut self) -> Result<()> {
        self.paused.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&mut self) -> Result<AudioArtifact> {
        let mut backend = self.backend.take().context("Recording not active")?;

        // Stopping the backend closes the frame channel, which ends the collector
        if let Err(e) = backend.stop().await {
            error!("Failed to stop audio backend: {}", e);
        }

        let encoder = match self.collector.take() {
            Some(task) => task.await.context("Frame collector panicked")?,
            None => WavEncoder::new(),
        };

        let duration_secs = encoder.duration_secs();
        let data = encoder.finish()?;

        info!("Recording stopped: {:.1}s, {} bytes", duration_secs, data.len());

        Ok(AudioArtifact {
            data,
            mime_type: "audio/wav".to_string(),
            duration_secs,
        })
    }

    async fn reset(&mut self) {
        if let Some(mut backend) = self.backend.take() {
            if let Err(e) = backend.stop().await {
                error!("Failed to stop audio backend: {}", e);
            }
            info!("Recording discarded");
        }

        if let Some(task) = self.collector.take() {
            task.abort();
        }

        self.paused.store(false, Ordering::SeqCst);
    }

    fn name(&self) -> &str {
        "capture"
    }
}
