//! Recognition: wrap the external OCR capability.
//!
//! The engine accepts either the uploaded image bytes (base64 in the JSON
//! body — hosted OCR APIs take images inline rather than streaming) or a
//! resolvable URL, which is what the rasterization stage hands back for
//! PDFs. Source documents mix Japanese and Latin script, so the language
//! hint defaults to `jpn+eng` and is always sent.
//!
//! Recognition may take several seconds. The call itself is not aborted
//! when a newer upload supersedes the run — the session discards the
//! result on arrival instead (generation check), so this module stays
//! free of cancellation plumbing.

use crate::error::{ExtractError, Stage};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// What the OCR engine should read: in-memory image bytes or a URL
/// produced by the rasterization service.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Bytes { data: Vec<u8>, mime: String },
    Url(String),
}

/// Converts an image into recognized text.
///
/// The HTTP implementation is [`HttpRecognizer`]; tests substitute stubs
/// (including deliberately slow ones, to exercise supersession).
#[async_trait::async_trait]
pub trait Recognizer: Send + Sync {
    /// Run OCR over `source` with the given language hint (e.g. `jpn+eng`).
    ///
    /// Never returns unreadable garbage labeled as success: engine errors
    /// and blank output both surface as [`ExtractError::Recognition`].
    async fn recognize(&self, source: &ImageSource, language: &str)
        -> Result<String, ExtractError>;
}

#[derive(Debug, Serialize)]
struct RecognizeRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mime_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    language: &'a str,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    text: Option<String>,
}

/// Recognizer backed by a hosted OCR endpoint.
pub struct HttpRecognizer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRecognizer {
    /// Build a client for `endpoint` with a per-call timeout.
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Result<Self, ExtractError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ExtractError::InvalidConfig(format!("recognize client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait::async_trait]
impl Recognizer for HttpRecognizer {
    async fn recognize(
        &self,
        source: &ImageSource,
        language: &str,
    ) -> Result<String, ExtractError> {
        let request = match source {
            ImageSource::Bytes { data, mime } => {
                info!("Recognizing {} image bytes (lang={language})", data.len());
                RecognizeRequest {
                    image: Some(STANDARD.encode(data)),
                    mime_type: Some(mime.as_str()),
                    url: None,
                    language,
                }
            }
            ImageSource::Url(url) => {
                info!("Recognizing image at {url} (lang={language})");
                RecognizeRequest {
                    image: None,
                    mime_type: None,
                    url: Some(url.as_str()),
                    language,
                }
            }
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractError::Recognition {
                        detail: "OCR engine timed out".to_string(),
                    }
                } else {
                    ExtractError::Network {
                        stage: Stage::Recognize,
                        detail: e.to_string(),
                    }
                }
            })?;

        if !response.status().is_success() {
            return Err(ExtractError::Recognition {
                detail: format!("OCR engine returned HTTP {}", response.status()),
            });
        }

        let body: RecognizeResponse =
            response.json().await.map_err(|e| ExtractError::Recognition {
                detail: format!("malformed OCR response: {e}"),
            })?;

        let text = body.text.unwrap_or_default();
        if text.trim().is_empty() {
            return Err(ExtractError::Recognition {
                detail: "OCR engine produced no usable text".to_string(),
            });
        }

        debug!("Recognized {} chars", text.len());
        Ok(text)
    }
}
