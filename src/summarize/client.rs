use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use reqwest::StatusCode;
use tracing::{error, info, warn};

use super::messages::{
    AudioPayload, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, SummaryRequest,
    TranscriptionResponse,
};
use super::{Summarizer, FAILURE_PREFIX};

const SYSTEM_PROMPT: &str = r#"Act as a professional meeting assistant. Your task is to generate a concise, clear, and professional summary of the provided meeting content. The content may include text notes, document excerpts, and/or an audio recording. Analyze all sources to create a comprehensive and accurate summary.

Please structure the summary using the following Markdown format:

**Start with a brief, one-sentence overview that captures the main purpose or outcome of the meeting.**

### Key Points
- A bulleted list of the most significant topics, discussions, and highlights.

### Decisions Made
- A bulleted list of all firm decisions that were reached during the meeting.

### Action Items
- A bullet-point list of all tasks that need to be completed.
- For each action item, clearly state the task and, if a person is mentioned as responsible, format it as: "[Task description] - @[Person's Name]".
- If no one is explicitly assigned, list the task on its own.

Use business-appropriate language and maintain a neutral, objective tone throughout."#;

/// Connection settings for an OpenAI-compatible API
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    /// Base URL, e.g. "https://api.openai.com/v1"
    pub api_base: String,
    pub chat_model: String,
    pub transcription_model: String,
    /// `None` leaves the client unconfigured; every call returns an error message
    pub api_key: Option<String>,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            transcription_model: "whisper-1".to_string(),
            api_key: None,
        }
    }
}

/// Non-success HTTP response from the API
#[derive(Debug, thiserror::Error)]
#[error("summarization service returned {status}: {body}")]
struct ServiceError {
    status: StatusCode,
    body: String,
}

/// Summarizer backed by OpenAI transcription + chat completions
pub struct OpenAiSummarizer {
    http: reqwest::Client,
    config: SummarizerConfig,
}

impl OpenAiSummarizer {
    pub fn new(config: SummarizerConfig) -> Self {
        if config.api_key.is_none() {
            warn!("No summarizer API key configured. Summary generation will not work.");
        }

        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base.trim_end_matches('/'), path)
    }

    async fn run(&self, api_key: &str, request: &SummaryRequest) -> Result<String> {
        let content = match &request.audio {
            Some(audio) => {
                let transcript = self.transcribe(api_key, audio).await?;
                if request.has_notes() {
                    format!("{}\n\nAudio Transcription:\n{}", request.notes_text, transcript)
                } else {
                    transcript
                }
            }
            None => request.notes_text.clone(),
        };

        let body = ChatCompletionRequest {
            model: &self.config.chat_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &content,
                },
            ],
        };

        let response = self
            .http
            .post(self.endpoint("chat/completions"))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to reach summarization service")?;

        let completion: ChatCompletionResponse = check_status(response)
            .await?
            .json()
            .await
            .context("Invalid chat completion response")?;

        let summary = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty());

        Ok(summary.unwrap_or_else(|| format!("{} No response generated.", FAILURE_PREFIX)))
    }

    async fn transcribe(&self, api_key: &str, audio: &AudioPayload) -> Result<String> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&audio.data)
            .context("Audio payload is not valid base64")?;

        info!("Transcribing {} bytes of {}", bytes.len(), audio.mime_type);

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(audio_file_name(&audio.mime_type))
            .mime_str(&audio.mime_type)
            .context("Invalid audio mime type")?;
        let form = reqwest::multipart::Form::new()
            .text("model", self.config.transcription_model.clone())
            .part("file", part);

        let response = self
            .http
            .post(self.endpoint("audio/transcriptions"))
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await
            .context("Failed to reach transcription service")?;

        let transcription: TranscriptionResponse = check_status(response)
            .await?
            .json()
            .await
            .context("Invalid transcription response")?;

        Ok(transcription.text)
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String> {
        let Some(api_key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) else {
            return Ok(format!(
                "{} API Key is not configured. Please set the API key environment variable.",
                FAILURE_PREFIX
            ));
        };

        if !request.has_notes() && request.audio.is_none() {
            return Ok(String::new());
        }

        match self.run(api_key, request).await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                error!("Error generating summary: {:#}", e);
                Ok(failure_message(&e))
            }
        }
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ServiceError { status, body }.into())
}

/// User-facing message for a failed call
fn failure_message(err: &anyhow::Error) -> String {
    let rejected = err.downcast_ref::<ServiceError>().is_some_and(|e| {
        e.status == StatusCode::BAD_REQUEST || e.body.contains("invalid_request_error")
    });

    if rejected {
        format!(
            "{} The provided file format may not be supported or the file is too large. Please try a different file.",
            FAILURE_PREFIX
        )
    } else {
        format!(
            "{} Could not generate summary. Please check the logs for more details.",
            FAILURE_PREFIX
        )
    }
}

/// Upload name for the transcription endpoint, which sniffs format by extension
fn audio_file_name(mime_type: &str) -> String {
    let ext = match mime_type.split(';').next().unwrap_or_default() {
        "audio/webm" => "webm",
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" => "m4a",
        "audio/ogg" => "ogg",
        "audio/flac" => "flac",
        _ => "wav",
    };
    format!("audio.{}", ext)
}
