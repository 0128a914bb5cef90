//! AI summarization client
//!
//! The engine talks to a `Summarizer`: a notes text plus optional audio goes
//! in, markdown minutes (or an `Error: ...` string) come out.

pub mod client;
pub mod messages;

pub use client::{OpenAiSummarizer, SummarizerConfig};
pub use messages::{AudioPayload, SummaryRequest};

use anyhow::Result;
use async_trait::async_trait;

/// Prefix marking a summarizer response as a user-facing failure message
pub const FAILURE_PREFIX: &str = "Error:";

/// Remote summarization capability
///
/// `Ok` carries either the markdown summary or a string starting with
/// [`FAILURE_PREFIX`]; `Err` is reserved for unexpected failures.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String>;
}

/// Split a summarizer response into summary text or failure message
pub fn parse_response(response: String) -> std::result::Result<String, String> {
    match response.strip_prefix(FAILURE_PREFIX) {
        Some(message) => Err(message.trim().to_string()),
        None => Ok(response),
    }
}
