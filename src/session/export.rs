use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// File name used when the meeting has no title
pub const UNTITLED_FILE_STEM: &str = "Untitled_Meeting";

pub const MARKDOWN_MIME: &str = "text/markdown;charset=utf-8";

/// Downloadable markdown copy of the summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub mime_type: &'static str,
    pub content: String,
}

impl ExportArtifact {
    pub fn markdown(title: &str, summary: &str) -> Self {
        Self {
            filename: format!("{}.md", sanitize_file_stem(title)),
            mime_type: MARKDOWN_MIME,
            content: summary.to_string(),
        }
    }

    /// Write into `dir`, returning the full path
    pub async fn write_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create export directory: {:?}", dir))?;

        let path = dir.join(&self.filename);
        tokio::fs::write(&path, self.content.as_bytes())
            .await
            .with_context(|| format!("Failed to write export: {:?}", path))?;

        info!("Exported summary to {}", path.display());
        Ok(path)
    }
}

/// Filesystem-safe stem: whitespace and `/\?%*:|"<>` become `_`
pub fn sanitize_file_stem(title: &str) -> String {
    let title = title.trim();
    if title.is_empty() {
        return UNTITLED_FILE_STEM.to_string();
    }

    title
        .chars()
        .map(|c| match c {
            '/' | '\\' | '?' | '%' | '*' | ':' | '|' | '"' | '<' | '>' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect()
}
