// Integration tests for uploaded files and document text extraction

use anyhow::Result;
use meeting_minutes::extract::{
    detect_format, title_from_filename, ContentExtractor, DocumentExtractor, DocumentFormat,
    ExtractError, UploadedFile,
};
use std::io::{Cursor, Write};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

fn docx_bytes(document_xml: &str) -> Result<Vec<u8>> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file("word/document.xml", SimpleFileOptions::default())?;
    writer.write_all(document_xml.as_bytes())?;
    Ok(writer.finish()?.into_inner())
}

#[tokio::test]
async fn test_plain_text_extraction() -> Result<()> {
    let file = UploadedFile::new("agenda.txt", "text/plain", b"1. Roadmap\n2. Hiring".to_vec());

    let text = DocumentExtractor::new().extract(&file).await?;
    assert_eq!(text, "1. Roadmap\n2. Hiring");

    Ok(())
}

#[tokio::test]
async fn test_plain_text_tolerates_invalid_utf8() -> Result<()> {
    let file = UploadedFile::new("notes.TXT", "", vec![b'o', b'k', 0xff]);

    let text = DocumentExtractor::new().extract(&file).await?;
    assert!(text.starts_with("ok"));

    Ok(())
}

#[tokio::test]
async fn test_docx_extraction_keeps_paragraphs() -> Result<()> {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Budget &amp; hiring</w:t></w:r></w:p>
    <w:p><w:r><w:t>Ship the </w:t></w:r><w:r><w:t>beta</w:t></w:r></w:p>
  </w:body>
</w:document>"#;
    let file = UploadedFile::new("minutes.docx", "", docx_bytes(xml)?);

    let text = DocumentExtractor::new().extract(&file).await?;
    assert_eq!(text, "Budget & hiring\nShip the beta");

    Ok(())
}

#[tokio::test]
async fn test_docx_without_document_xml_fails() -> Result<()> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file("readme.txt", SimpleFileOptions::default())?;
    writer.write_all(b"not a word document")?;
    let bytes = writer.finish()?.into_inner();

    let file = UploadedFile::new("broken.docx", "", bytes);
    let result = DocumentExtractor::new().extract(&file).await;
    assert!(matches!(result, Err(ExtractError::Failed(_))));

    Ok(())
}

#[tokio::test]
async fn test_malformed_pdf_fails() -> Result<()> {
    let file = UploadedFile::new("scan.pdf", "application/pdf", b"%PDF-1.7 garbage".to_vec());

    let result = DocumentExtractor::new().extract(&file).await;
    assert!(matches!(result, Err(ExtractError::Failed(_))));

    Ok(())
}

#[tokio::test]
async fn test_unsupported_type() -> Result<()> {
    let file = UploadedFile::new("slides.pptx", "", vec![0u8; 4]);

    let error = DocumentExtractor::new()
        .extract(&file)
        .await
        .expect_err("pptx is not supported");
    assert_eq!(error, ExtractError::UnsupportedType("pptx".to_string()));
    assert_eq!(
        error.to_string(),
        "Unsupported document type: .pptx. Please upload a .txt, .pdf, or .docx file."
    );

    Ok(())
}

#[tokio::test]
async fn test_uploaded_file_from_path() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("standup.wav");
    std::fs::write(&path, [0u8; 8])?;

    let file = UploadedFile::from_path(&path).await?;
    assert_eq!(file.name, "standup.wav");
    assert_eq!(file.mime_type, "audio/wav");
    assert!(file.is_audio());
    assert_eq!(file.data.len(), 8);

    Ok(())
}

#[test]
fn test_format_detection() {
    let format = |name: &str| detect_format(&UploadedFile::new(name, "", Vec::<u8>::new()));

    assert_eq!(format("a.txt"), DocumentFormat::PlainText);
    assert_eq!(format("a.PDF"), DocumentFormat::Pdf);
    assert_eq!(format("a.docx"), DocumentFormat::Docx);
    assert_eq!(format("a.doc"), DocumentFormat::Unsupported);
    assert_eq!(format("no_extension"), DocumentFormat::Unsupported);
}

#[test]
fn test_title_from_filename() {
    assert_eq!(title_from_filename("q3-roadmap_review.pdf"), "Q3 Roadmap Review");
    assert_eq!(title_from_filename("weekly  sync.final.docx"), "Weekly Sync.Final");
    assert_eq!(title_from_filename("notes.v2.pdf"), "Notes.V2");
    assert_eq!(title_from_filename("o'brien 1on1.txt"), "O'Brien 1on1");
    assert_eq!(title_from_filename(".hidden"), ".Hidden");
    assert_eq!(title_from_filename("all_hands"), "All Hands");
}
