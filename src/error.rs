//! Error types for the shipdoc-extract library.
//!
//! The taxonomy mirrors the pipeline stages, and the propagation policy
//! differs per variant:
//!
//! * [`ExtractError::UnsupportedType`], [`ExtractError::Conversion`] and
//!   [`ExtractError::Recognition`] — **Fatal for the run**: the current
//!   extraction run enters `Failed` and the error surfaces to the caller.
//!   None of them is retried automatically.
//!
//! * [`ExtractError::CompletionParse`] — **Swallowed**: an AI completion
//!   that cannot be parsed degrades to zero filled fields. The run stays
//!   reviewable; the operator can retry gap-fill at will. The variant
//!   exists so the condition can be named in logs and tests, but the
//!   gap-fill coordinator never lets it escape.
//!
//! * [`ExtractError::Network`] — the collaborator was unreachable. Carries
//!   the [`Stage`] it happened in, so every message reaching the caller
//!   identifies the stage that failed.
//!
//! Supersession (a new upload replacing an in-flight run) is deliberately
//! *not* an error — see [`crate::session::IngestOutcome`].

use thiserror::Error;

/// The external call a [`ExtractError::Network`] failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// PDF → raster image conversion service.
    Rasterize,
    /// OCR engine.
    Recognize,
    /// AI completion service.
    Complete,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Rasterize => write!(f, "rasterize"),
            Stage::Recognize => write!(f, "recognize"),
            Stage::Complete => write!(f, "complete"),
        }
    }
}

/// All errors returned by the shipdoc-extract library.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The classifier rejected the uploaded file outright. No recognized
    /// text and no field set exist for this document.
    #[error("Unsupported file type '{mime}' for '{file_name}': only images and PDFs can be processed")]
    UnsupportedType { mime: String, file_name: String },

    /// The rasterization service failed to turn the PDF into an image.
    #[error("PDF conversion failed: {detail}")]
    Conversion { detail: String },

    /// The OCR engine failed or produced no usable text.
    #[error("Text recognition failed: {detail}")]
    Recognition { detail: String },

    /// The AI completion response could not be parsed as a field mapping.
    ///
    /// Never escapes the gap-fill coordinator — it degrades to an empty
    /// completion set there. Public so tests can name the condition.
    #[error("AI completion response was not parseable: {detail}")]
    CompletionParse { detail: String },

    /// An external collaborator was unreachable.
    #[error("Network error during {stage}: {detail}")]
    Network { stage: Stage, detail: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ExtractError {
    /// True when this error aborts the current run.
    pub fn is_fatal_for_run(&self) -> bool {
        !matches!(self, ExtractError::CompletionParse { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_type_display_names_both_identifiers() {
        let e = ExtractError::UnsupportedType {
            mime: "text/plain".into(),
            file_name: "notes.txt".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("text/plain"), "got: {msg}");
        assert!(msg.contains("notes.txt"), "got: {msg}");
    }

    #[test]
    fn network_display_is_stage_tagged() {
        let e = ExtractError::Network {
            stage: Stage::Recognize,
            detail: "connection refused".into(),
        };
        assert!(e.to_string().contains("recognize"));
        assert!(e.to_string().contains("connection refused"));
    }

    #[test]
    fn completion_parse_is_not_fatal() {
        let e = ExtractError::CompletionParse {
            detail: "no JSON object".into(),
        };
        assert!(!e.is_fatal_for_run());
        assert!(ExtractError::Conversion {
            detail: "HTTP 500".into()
        }
        .is_fatal_for_run());
    }
}
