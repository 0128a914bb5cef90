use async_trait::async_trait;
use std::io::{BufReader, Cursor};
use tracing::{debug, warn};

use super::{ContentExtractor, ExtractError, UploadedFile};

/// Document formats the extractor understands, detected by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    PlainText,
    Pdf,
    Docx,
    Unsupported,
}

pub fn detect_format(file: &UploadedFile) -> DocumentFormat {
    match file.extension().as_str() {
        "txt" => DocumentFormat::PlainText,
        "pdf" => DocumentFormat::Pdf,
        "docx" => DocumentFormat::Docx,
        _ => DocumentFormat::Unsupported,
    }
}

/// Default `ContentExtractor`
///
/// Parsing runs on the blocking pool; pdf-extract can panic on malformed
/// input, which is reported as an extraction failure.
#[derive(Debug, Default, Clone)]
pub struct DocumentExtractor;

impl DocumentExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ContentExtractor for DocumentExtractor {
    async fn extract(&self, file: &UploadedFile) -> Result<String, ExtractError> {
        let format = detect_format(file);
        let parse: fn(&[u8]) -> Result<String, ExtractError> = match format {
            DocumentFormat::PlainText => extract_plaintext,
            DocumentFormat::Pdf => extract_pdf,
            DocumentFormat::Docx => extract_docx,
            DocumentFormat::Unsupported => {
                return Err(ExtractError::UnsupportedType(file.extension()))
            }
        };

        let data = file.data.clone();
        debug!(
            "Extracting text from {} ({:?}, {} bytes)",
            file.name,
            format,
            data.len()
        );

        let text = tokio::task::spawn_blocking(move || parse(&data))
            .await
            .map_err(|e| ExtractError::Failed(format!("extraction task failed: {}", e)))??;

        if text.trim().is_empty() {
            warn!("No text found in {}", file.name);
        }

        Ok(text)
    }
}

fn extract_plaintext(data: &[u8]) -> Result<String, ExtractError> {
    Ok(String::from_utf8_lossy(data).into_owned())
}

fn extract_pdf(data: &[u8]) -> Result<String, ExtractError> {
    let bytes = data.to_vec();
    let result = std::panic::catch_unwind(move || pdf_extract::extract_text_from_mem(&bytes));

    match result {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ExtractError::Failed(format!("PDF: {}", e))),
        Err(_) => Err(ExtractError::Failed(
            "PDF could not be parsed (malformed file)".to_string(),
        )),
    }
}

fn extract_docx(data: &[u8]) -> Result<String, ExtractError> {
    // DOCX = ZIP archive, text runs are <w:t> elements in word/document.xml
    let mut archive = zip::ZipArchive::new(Cursor::new(data))
        .map_err(|e| ExtractError::Failed(format!("DOCX zip: {}", e)))?;

    let doc = archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::Failed(format!("DOCX missing document.xml: {}", e)))?;

    let mut reader = quick_xml::Reader::from_reader(BufReader::new(doc));
    let mut buf = Vec::new();
    let mut text = String::new();
    let mut in_text_run = false;
    let mut in_paragraph = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = true,
                b"p" => {
                    if in_paragraph && !text.ends_with('\n') {
                        text.push('\n');
                    }
                    in_paragraph = true;
                }
                _ => {}
            },
            Ok(quick_xml::events::Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => {
                    in_paragraph = false;
                    if !text.is_empty() && !text.ends_with('\n') {
                        text.push('\n');
                    }
                }
                _ => {}
            },
            Ok(quick_xml::events::Event::Text(ref e)) => {
                if in_text_run {
                    if let Ok(s) = e.unescape() {
                        text.push_str(&s);
                    }
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Failed(format!("DOCX XML: {}", e))),
            _ => {}
        }
        buf.clear();
    }

    Ok(text.trim_end().to_string())
}
