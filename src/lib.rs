//! # shipdoc-extract
//!
//! Turn a photographed or scanned shipment document (invoice, shipping
//! instruction) into structured fields: SI number, supplier, ETA, amount.
//!
//! ## Why this crate?
//!
//! Operators of a logistics dashboard key these fields in by hand from
//! scans that mix Japanese and Latin script. This crate is the
//! field-extraction core behind the "read this document" button: OCR the
//! upload, pattern-match the obvious fields, let the operator review, and
//! ask an AI completion service for *only* the fields still empty —
//! never overwriting anything a pattern or a person already filled in.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload
//!  │
//!  ├─ 1. Classify   image or PDF, by declared type then suffix
//!  ├─ 2. Rasterize  PDF only: external conversion service → image URL
//!  ├─ 3. Recognize  OCR (jpn+eng) → recognized text
//!  ├─ 4. Extract    per-field regex pass → draft field set
//!  ├─ 5. Review     operator edits fields / working text (unbounded)
//!  └─ 6. Gap-fill   AI proposes values for still-empty fields, merged
//!                   under a non-clobber policy; repeatable on demand
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shipdoc_extract::{ExtractionConfig, ReviewSession, UploadedDocument};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::builder()
//!         .rasterize_endpoint("https://convert.internal/v1/pdf")
//!         .ocr_endpoint("https://ocr.internal/v1/recognize")
//!         .complete_endpoint("https://app.internal/api/ai-parse")
//!         .build()?;
//!
//!     let session = ReviewSession::new(&config)?;
//!     let bytes = std::fs::read("invoice.jpg")?;
//!     session
//!         .ingest(UploadedDocument::new(bytes, "image/jpeg", "invoice.jpg"))
//!         .await?;
//!
//!     session.edit_field("supplier", "ACME TRADING CO., LTD.");
//!     let filled = session.fill_missing().await?;
//!     println!("AI filled {filled} fields");
//!
//!     if let Some(fields) = session.finalize() {
//!         println!("{}", serde_json::to_string_pretty(&fields)?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## What stays outside
//!
//! Record persistence, file hosting, the list/detail UI and
//! authentication are collaborators of this pipeline, not parts of it.
//! [`ReviewSession::finalize`] hands the reviewed [`FieldSet`] to whatever
//! persistence layer the embedding application uses; uploads arrive as
//! plain bytes from whatever storage fronted them.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod error;
pub mod fields;
pub mod pipeline;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use document::UploadedDocument;
pub use error::{ExtractError, Stage};
pub use fields::{FieldOrigin, FieldSet, FIELD_NAMES};
pub use pipeline::classify::{classify, DocumentRoute};
pub use pipeline::extract::extract;
pub use pipeline::gapfill::{parse_completion, Completer, FieldSnapshot, HttpCompleter};
pub use pipeline::rasterize::{HttpRasterizer, Rasterizer};
pub use pipeline::recognize::{HttpRecognizer, ImageSource, Recognizer};
pub use session::{IngestOutcome, ReviewSession, RunState};
