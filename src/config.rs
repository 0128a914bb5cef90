use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

use crate::session::SessionSettings;
use crate::summarize::SummarizerConfig;

/// Prefix for environment overrides, e.g. `MINUTES__SERVICE__HTTP__PORT=9000`
const ENV_PREFIX: &str = "MINUTES";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub summarizer: SummarizerSection,
    #[serde(default)]
    pub recorder: RecorderConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    /// May start with `~`
    pub data_dir: String,
}

impl StorageConfig {
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.data_dir).as_ref())
    }

    /// Location of the file-backed key-value store
    pub fn store_path(&self) -> PathBuf {
        self.data_dir().join("store.json")
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SummarizerSection {
    pub api_base: String,
    pub chat_model: String,
    pub transcription_model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
}

impl Default for SummarizerSection {
    fn default() -> Self {
        let defaults = SummarizerConfig::default();
        Self {
            api_base: defaults.api_base,
            chat_model: defaults.chat_model,
            transcription_model: defaults.transcription_model,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

impl SummarizerSection {
    /// Client settings with the API key read from the environment
    pub fn client_config(&self) -> SummarizerConfig {
        SummarizerConfig {
            api_base: self.api_base.clone(),
            chat_model: self.chat_model.clone(),
            transcription_model: self.transcription_model.clone(),
            api_key: std::env::var(&self.api_key_env)
                .ok()
                .filter(|key| !key.trim().is_empty()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecorderConfig {
    /// WAV file replayed as the capture source; microphone when unset
    pub source: Option<String>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .with_context(|| format!("Failed to read config: {}", path))?;

        Ok(settings.try_deserialize()?)
    }
}
