//! Ingestion classification: route an upload to the image or PDF path.
//!
//! The declared MIME type is consulted first because it is what the
//! browser (or API caller) asserted about the file; the file-name suffix
//! is the fallback for callers that send `application/octet-stream` or
//! nothing at all. Exactly one route is chosen, and `Unsupported` aborts
//! the run before any recognized text or field set exists.

use crate::document::UploadedDocument;

/// Where the pipeline sends this document next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentRoute {
    /// Recognize directly from the uploaded bytes.
    Image,
    /// Rasterize first, then recognize from the resulting image URL.
    Pdf,
    /// Reject: neither an image nor a PDF by type or suffix.
    Unsupported,
}

/// Image suffixes accepted by the fallback path. Matches what the OCR
/// engine can decode.
const IMAGE_SUFFIXES: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp", "tif", "tiff"];

/// Classify an uploaded document by declared MIME type, then file-name
/// suffix. Pure — looks at metadata only, never at the bytes.
pub fn classify(doc: &UploadedDocument) -> DocumentRoute {
    let mime = doc.mime_type().trim().to_ascii_lowercase();
    if mime.starts_with("image/") {
        return DocumentRoute::Image;
    }
    if mime == "application/pdf" {
        return DocumentRoute::Pdf;
    }

    match suffix_of(doc.file_name()) {
        Some(ext) if ext == "pdf" => DocumentRoute::Pdf,
        Some(ext) if IMAGE_SUFFIXES.contains(&ext.as_str()) => DocumentRoute::Image,
        _ => DocumentRoute::Unsupported,
    }
}

fn suffix_of(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(mime: &str, name: &str) -> UploadedDocument {
        UploadedDocument::new(vec![0u8; 4], mime, name)
    }

    #[test]
    fn declared_mime_wins() {
        assert_eq!(classify(&doc("image/png", "scan.dat")), DocumentRoute::Image);
        assert_eq!(classify(&doc("image/jpeg", "photo")), DocumentRoute::Image);
        assert_eq!(classify(&doc("application/pdf", "si.bin")), DocumentRoute::Pdf);
    }

    #[test]
    fn suffix_fallback_when_mime_is_unhelpful() {
        assert_eq!(
            classify(&doc("application/octet-stream", "invoice.PDF")),
            DocumentRoute::Pdf
        );
        assert_eq!(classify(&doc("", "scan.JPeG")), DocumentRoute::Image);
        assert_eq!(classify(&doc("", "page.tiff")), DocumentRoute::Image);
    }

    #[test]
    fn unsupported_when_neither_signal_matches() {
        assert_eq!(
            classify(&doc("text/plain", "notes")),
            DocumentRoute::Unsupported
        );
        assert_eq!(
            classify(&doc("application/zip", "bundle.zip")),
            DocumentRoute::Unsupported
        );
        // Trailing dot has no usable suffix
        assert_eq!(classify(&doc("", "strange.")), DocumentRoute::Unsupported);
    }
}
