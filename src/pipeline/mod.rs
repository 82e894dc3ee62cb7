//! Pipeline stages for document field extraction.
//!
//! Each submodule implements exactly one transformation step. Keeping
//! stages separate makes each independently testable and lets us swap an
//! implementation (e.g. a different OCR backend) without touching other
//! stages.
//!
//! ## Data Flow
//!
//! ```text
//! upload ──▶ classify ──▶ [rasterize] ──▶ recognize ──▶ extract ──▶ gapfill
//! (bytes)    (route)      (PDF → URL)     (OCR text)    (patterns)  (AI, on demand)
//! ```
//!
//! 1. [`classify`]  — route the upload to the image or PDF path, or reject it
//! 2. [`rasterize`] — PDF path only: convert the document to a raster image
//!    URL via the external conversion service
//! 3. [`recognize`] — OCR the image (bytes or URL) into recognized text
//! 4. [`extract`]   — pure regex pass producing the draft field set
//! 5. [`gapfill`]   — ask the AI completion service for values of fields
//!    still empty; merged under the non-clobber policy by the session

pub mod classify;
pub mod extract;
pub mod gapfill;
pub mod rasterize;
pub mod recognize;
