use anyhow::{Context, Result};
use base64::Engine;
use std::path::Path;
use std::sync::Arc;

/// A file chosen by the user, held in memory
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub mime_type: String,
    pub data: Arc<[u8]>,
}

impl UploadedFile {
    /// Build from raw bytes; an empty mime type is guessed from the extension
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        let name = name.into();
        let mut mime_type = mime_type.into();
        if mime_type.trim().is_empty() {
            mime_type = guess_mime_type(&name).to_string();
        }

        Self {
            name,
            mime_type,
            data: data.into(),
        }
    }

    /// Read a file from disk
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read upload: {:?}", path))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        Ok(Self::new(name, "", data))
    }

    pub fn is_audio(&self) -> bool {
        self.mime_type.starts_with("audio/")
    }

    /// Lowercased extension after the last dot, empty if none
    pub fn extension(&self) -> String {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default()
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

fn guess_mime_type(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "webm" => "audio/webm",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        _ => "application/octet-stream",
    }
}

/// Meeting title derived from a file name
///
/// "q3-roadmap_review.pdf" -> "Q3 Roadmap Review"; every word start is
/// capitalized, including one after a dot ("notes.v2.pdf" -> "Notes.V2").
pub fn title_from_filename(file_name: &str) -> String {
    let stem = match file_name.rfind('.') {
        Some(idx) if idx > 0 => &file_name[..idx],
        _ => file_name,
    };

    let spaced = stem.replace(['-', '_'], " ");
    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut title = String::with_capacity(collapsed.len());
    let mut in_word = false;
    for c in collapsed.chars() {
        let word_char = c.is_ascii_alphanumeric() || c == '_';
        if word_char && !in_word {
            title.push(c.to_ascii_uppercase());
        } else {
            title.push(c);
        }
        in_word = word_char;
    }
    title
}
