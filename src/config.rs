//! Configuration for the extraction pipeline.
//!
//! Every knob lives in [`ExtractionConfig`], built via its
//! [`ExtractionConfigBuilder`]. Collaborators (rasterizer, recognizer,
//! completer) can be injected pre-built — that is how tests substitute
//! stubs and how embedders add middleware — or left to default HTTP
//! implementations constructed from the configured endpoints.

use crate::error::ExtractError;
use crate::pipeline::gapfill::{Completer, HttpCompleter};
use crate::pipeline::rasterize::{HttpRasterizer, Rasterizer};
use crate::pipeline::recognize::{HttpRecognizer, Recognizer};
use std::fmt;
use std::sync::Arc;

/// Configuration for a [`crate::session::ReviewSession`].
///
/// # Example
/// ```rust
/// use shipdoc_extract::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .rasterize_endpoint("https://convert.internal/v1/pdf")
///     .ocr_endpoint("https://ocr.internal/v1/recognize")
///     .complete_endpoint("https://app.internal/api/ai-parse")
///     .language("jpn+eng")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// PDF-conversion service URL. Unused when a rasterizer is injected.
    pub rasterize_endpoint: String,

    /// OCR engine URL. Unused when a recognizer is injected.
    pub ocr_endpoint: String,

    /// AI completion service URL. Unused when a completer is injected.
    pub complete_endpoint: String,

    /// OCR language hint. Default: `jpn+eng` — shipment documents mix
    /// Japanese and Latin script and the engine needs both models loaded.
    pub language: String,

    /// Per-call timeout for the conversion service. Default: 60.
    /// Expiry surfaces as a conversion failure for the run.
    pub rasterize_timeout_secs: u64,

    /// Per-call timeout for the OCR engine. Default: 120 — recognition of
    /// a dense A4 scan routinely takes tens of seconds.
    pub recognize_timeout_secs: u64,

    /// Per-call timeout for the AI completion service. Default: 60.
    pub complete_timeout_secs: u64,

    /// Pre-built rasterizer; takes precedence over `rasterize_endpoint`.
    pub rasterizer: Option<Arc<dyn Rasterizer>>,

    /// Pre-built recognizer; takes precedence over `ocr_endpoint`.
    pub recognizer: Option<Arc<dyn Recognizer>>,

    /// Pre-built completer; takes precedence over `complete_endpoint`.
    pub completer: Option<Arc<dyn Completer>>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            rasterize_endpoint: String::new(),
            ocr_endpoint: String::new(),
            complete_endpoint: String::new(),
            language: "jpn+eng".to_string(),
            rasterize_timeout_secs: 60,
            recognize_timeout_secs: 120,
            complete_timeout_secs: 60,
            rasterizer: None,
            recognizer: None,
            completer: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("rasterize_endpoint", &self.rasterize_endpoint)
            .field("ocr_endpoint", &self.ocr_endpoint)
            .field("complete_endpoint", &self.complete_endpoint)
            .field("language", &self.language)
            .field("rasterize_timeout_secs", &self.rasterize_timeout_secs)
            .field("recognize_timeout_secs", &self.recognize_timeout_secs)
            .field("complete_timeout_secs", &self.complete_timeout_secs)
            .field("rasterizer", &self.rasterizer.as_ref().map(|_| "<dyn Rasterizer>"))
            .field("recognizer", &self.recognizer.as_ref().map(|_| "<dyn Recognizer>"))
            .field("completer", &self.completer.as_ref().map(|_| "<dyn Completer>"))
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Resolve the rasterizer: injected instance or HTTP client.
    pub(crate) fn resolve_rasterizer(&self) -> Result<Arc<dyn Rasterizer>, ExtractError> {
        if let Some(ref r) = self.rasterizer {
            return Ok(Arc::clone(r));
        }
        Ok(Arc::new(HttpRasterizer::new(
            self.rasterize_endpoint.clone(),
            self.rasterize_timeout_secs,
        )?))
    }

    /// Resolve the recognizer: injected instance or HTTP client.
    pub(crate) fn resolve_recognizer(&self) -> Result<Arc<dyn Recognizer>, ExtractError> {
        if let Some(ref r) = self.recognizer {
            return Ok(Arc::clone(r));
        }
        Ok(Arc::new(HttpRecognizer::new(
            self.ocr_endpoint.clone(),
            self.recognize_timeout_secs,
        )?))
    }

    /// Resolve the completer: injected instance or HTTP client.
    pub(crate) fn resolve_completer(&self) -> Result<Arc<dyn Completer>, ExtractError> {
        if let Some(ref c) = self.completer {
            return Ok(Arc::clone(c));
        }
        Ok(Arc::new(HttpCompleter::new(
            self.complete_endpoint.clone(),
            self.complete_timeout_secs,
        )?))
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn rasterize_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.rasterize_endpoint = url.into();
        self
    }

    pub fn ocr_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.ocr_endpoint = url.into();
        self
    }

    pub fn complete_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.complete_endpoint = url.into();
        self
    }

    pub fn language(mut self, hint: impl Into<String>) -> Self {
        self.config.language = hint.into();
        self
    }

    pub fn rasterize_timeout_secs(mut self, secs: u64) -> Self {
        self.config.rasterize_timeout_secs = secs.max(1);
        self
    }

    pub fn recognize_timeout_secs(mut self, secs: u64) -> Self {
        self.config.recognize_timeout_secs = secs.max(1);
        self
    }

    pub fn complete_timeout_secs(mut self, secs: u64) -> Self {
        self.config.complete_timeout_secs = secs.max(1);
        self
    }

    pub fn rasterizer(mut self, r: Arc<dyn Rasterizer>) -> Self {
        self.config.rasterizer = Some(r);
        self
    }

    pub fn recognizer(mut self, r: Arc<dyn Recognizer>) -> Self {
        self.config.recognizer = Some(r);
        self
    }

    pub fn completer(mut self, c: Arc<dyn Completer>) -> Self {
        self.config.completer = Some(c);
        self
    }

    /// Build the configuration, validating that every collaborator is
    /// reachable one way or the other.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.rasterizer.is_none() && c.rasterize_endpoint.is_empty() {
            return Err(ExtractError::InvalidConfig(
                "rasterize_endpoint is required unless a rasterizer is injected".into(),
            ));
        }
        if c.recognizer.is_none() && c.ocr_endpoint.is_empty() {
            return Err(ExtractError::InvalidConfig(
                "ocr_endpoint is required unless a recognizer is injected".into(),
            ));
        }
        if c.completer.is_none() && c.complete_endpoint.is_empty() {
            return Err(ExtractError::InvalidConfig(
                "complete_endpoint is required unless a completer is injected".into(),
            ));
        }
        if c.language.trim().is_empty() {
            return Err(ExtractError::InvalidConfig(
                "language hint must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_each_endpoint_or_injection() {
        let err = ExtractionConfig::builder().build().unwrap_err();
        assert!(matches!(err, ExtractError::InvalidConfig(_)));

        let ok = ExtractionConfig::builder()
            .rasterize_endpoint("http://c/pdf")
            .ocr_endpoint("http://o/recognize")
            .complete_endpoint("http://a/ai-parse")
            .build();
        assert!(ok.is_ok());
    }

    #[test]
    fn builder_rejects_blank_language() {
        let err = ExtractionConfig::builder()
            .rasterize_endpoint("http://c/pdf")
            .ocr_endpoint("http://o/recognize")
            .complete_endpoint("http://a/ai-parse")
            .language("  ")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("language"));
    }

    #[test]
    fn timeouts_clamp_to_at_least_one_second() {
        let c = ExtractionConfig::builder()
            .rasterize_endpoint("http://c/pdf")
            .ocr_endpoint("http://o/recognize")
            .complete_endpoint("http://a/ai-parse")
            .recognize_timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(c.recognize_timeout_secs, 1);
    }
}
