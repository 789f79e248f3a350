//! File ingestion
//!
//! Accepts uploaded PDFs, MP3 audio and MP4 video. PDFs are reduced to their
//! text; media is handed back untouched for playback.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use lopdf::Document;
use serde::{Serialize, Serializer};
use thiserror::Error;

pub const PDF: &str = "application/pdf";
pub const MP3: &str = "audio/mpeg";
pub const MP4: &str = "video/mp4";

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    /// Declared media type; guessed from `name` when absent
    pub media_type: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Audio,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IngestOutcome {
    PdfText {
        pages: usize,
        text: String,
    },
    Media {
        kind: MediaKind,
        media_type: String,
        #[serde(serialize_with = "serialize_base64")]
        data: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("Could not read PDF: {0}")]
    Pdf(String),
    #[error("Could not decode upload: {0}")]
    Decode(String),
}

/// Route an upload by media type
pub fn ingest(file: UploadedFile) -> Result<IngestOutcome, IngestError> {
    let media_type = resolve_media_type(&file);
    tracing::debug!(name = %file.name, media_type = %media_type, bytes = file.data.len(), "Ingesting upload");

    match media_type.as_str() {
        PDF => {
            let (pages, text) = extract_pdf_text(&file.data)?;
            Ok(IngestOutcome::PdfText { pages, text })
        }
        MP3 => Ok(IngestOutcome::Media {
            kind: MediaKind::Audio,
            media_type,
            data: file.data,
        }),
        MP4 => Ok(IngestOutcome::Media {
            kind: MediaKind::Video,
            media_type,
            data: file.data,
        }),
        _ => Err(IngestError::UnsupportedType(media_type)),
    }
}

fn resolve_media_type(file: &UploadedFile) -> String {
    let declared = file
        .media_type
        .as_deref()
        .and_then(|t| t.split(';').next())
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty() && t != "application/octet-stream");

    declared.unwrap_or_else(|| {
        mime_guess::from_path(&file.name)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string()
    })
}

/// Concatenate the text of every page in page order
fn extract_pdf_text(data: &[u8]) -> Result<(usize, String), IngestError> {
    let document = Document::load_mem(data).map_err(|e| IngestError::Pdf(e.to_string()))?;
    let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();

    let mut text = String::new();
    for number in &page_numbers {
        let page_text = document
            .extract_text(&[*number])
            .map_err(|e| IngestError::Pdf(format!("page {number}: {e}")))?;
        text.push_str(&page_text);
    }

    Ok((page_numbers.len(), text))
}

fn serialize_base64<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&BASE64.encode(data))
}
