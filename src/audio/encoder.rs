use anyhow::{Context, Result};
use std::io::Cursor;
use tracing::{info, warn};

use super::backend::AudioFrame;

const DEFAULT_SAMPLE_RATE: u32 = 16000;

/// Accumulates captured frames and encodes them as one in-memory WAV file
///
/// The first frame fixes the sample rate and channel count; frames that
/// disagree with it are dropped.
#[derive(Debug, Default)]
pub struct WavEncoder {
    format: Option<(u32, u16)>,
    samples: Vec<i16>,
    dropped_frames: usize,
}

impl WavEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: &AudioFrame) {
        let format = *self
            .format
            .get_or_insert((frame.sample_rate, frame.channels));

        if format != (frame.sample_rate, frame.channels) {
            self.dropped_frames += 1;
            warn!(
                "Dropping frame with format {}Hz/{}ch (recording is {}Hz/{}ch)",
                frame.sample_rate, frame.channels, format.0, format.1
            );
            return;
        }

        self.samples.extend_from_slice(&frame.samples);
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn duration_secs(&self) -> f64 {
        match self.format {
            Some((rate, channels)) if rate > 0 && channels > 0 => {
                self.samples.len() as f64 / (rate as f64 * channels as f64)
            }
            _ => 0.0,
        }
    }

    /// Encode everything pushed so far as a 16-bit PCM WAV file
    pub fn finish(self) -> Result<Vec<u8>> {
        let (sample_rate, channels) = self.format.unwrap_or((DEFAULT_SAMPLE_RATE, 1));
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .context("Failed to create WAV writer")?;
            for &sample in &self.samples {
                writer
                    .write_sample(sample)
                    .context("Failed to write sample to WAV")?;
            }
            writer.finalize().context("Failed to finalize WAV data")?;
        }

        info!(
            "Encoded {} samples ({}Hz, {}ch, {} frames dropped)",
            self.samples.len(),
            sample_rate,
            channels,
            self.dropped_frames
        );

        Ok(cursor.into_inner())
    }
}
