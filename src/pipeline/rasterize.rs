//! Rasterization: turn a PDF upload into a raster image the OCR engine
//! can read, via the external conversion service.
//!
//! The service contract is a file upload in, `{ "url": ... }` out — the
//! URL resolves to a rendered image of the document's **first page**.
//! Multi-page documents are out of scope; single-page extraction is the
//! contract, not a defect.
//!
//! No automatic retry: a conversion failure surfaces to the operator, who
//! re-uploads or fixes the document.

use crate::error::{ExtractError, Stage};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Converts PDF bytes into a resolvable image URL.
///
/// The HTTP implementation is [`HttpRasterizer`]; tests substitute stubs.
#[async_trait::async_trait]
pub trait Rasterizer: Send + Sync {
    /// Render the document's first page and return the image URL.
    async fn rasterize(&self, pdf: &[u8]) -> Result<String, ExtractError>;
}

#[derive(Debug, Deserialize)]
struct RasterizeResponse {
    url: Option<String>,
}

/// Rasterizer backed by a hosted PDF-conversion endpoint.
pub struct HttpRasterizer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRasterizer {
    /// Build a client for `endpoint` with a per-call timeout.
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Result<Self, ExtractError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ExtractError::InvalidConfig(format!("rasterize client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait::async_trait]
impl Rasterizer for HttpRasterizer {
    async fn rasterize(&self, pdf: &[u8]) -> Result<String, ExtractError> {
        info!("Rasterizing PDF ({} bytes)", pdf.len());

        let part = reqwest::multipart::Part::bytes(pdf.to_vec())
            .file_name("document.pdf")
            .mime_str("application/pdf")
            .map_err(|e| ExtractError::Conversion {
                detail: format!("building upload body: {e}"),
            })?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractError::Conversion {
                        detail: "conversion service timed out".to_string(),
                    }
                } else {
                    ExtractError::Network {
                        stage: Stage::Rasterize,
                        detail: e.to_string(),
                    }
                }
            })?;

        if !response.status().is_success() {
            return Err(ExtractError::Conversion {
                detail: format!("conversion service returned HTTP {}", response.status()),
            });
        }

        let body: RasterizeResponse =
            response.json().await.map_err(|e| ExtractError::Conversion {
                detail: format!("malformed conversion response: {e}"),
            })?;

        let url = body.url.filter(|u| !u.is_empty()).ok_or_else(|| {
            ExtractError::Conversion {
                detail: "conversion response carried no image url".to_string(),
            }
        })?;

        debug!("Rasterized to {url}");
        Ok(url)
    }
}
