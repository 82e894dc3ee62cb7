//! Gap-fill: ask the AI completion service for values of fields that are
//! still empty.
//!
//! The request carries the full working text plus the current name → value
//! map; empty values mark the fields the service should propose. The
//! service answers with a single `result` string expected to contain a
//! JSON object mapping field names to proposed values.
//!
//! ## Best-effort parsing
//!
//! Models wrap their JSON in markdown fences, preambles, or trailing
//! commentary. [`parse_completion`] tolerates all of that by slicing the
//! outermost `{…}` before parsing, and an unparsable response degrades to
//! *zero* completions rather than an error — gap-fill is an enhancement,
//! never a reason to lose a reviewable run. This is a deliberate
//! robustness trade-off and tests pin it down.

use crate::error::{ExtractError, Stage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Name → current value map sent alongside the text. Empty values mark
/// the missing set.
pub type FieldSnapshot = BTreeMap<String, String>;

/// Calls the external AI completion service.
///
/// `fields: None` is the plain "structure this text" mode; the pipeline
/// always sends the snapshot, but the simpler mode stays expressible.
#[async_trait::async_trait]
pub trait Completer: Send + Sync {
    /// Returns the raw `result` string from the service.
    async fn complete(
        &self,
        text: &str,
        fields: Option<&FieldSnapshot>,
    ) -> Result<String, ExtractError>;
}

#[derive(Debug, Serialize)]
struct CompleteRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a FieldSnapshot>,
}

#[derive(Debug, Deserialize)]
struct CompleteResponse {
    result: Option<String>,
}

/// Completer backed by the hosted AI endpoint.
pub struct HttpCompleter {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCompleter {
    /// Build a client for `endpoint` with a per-call timeout.
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Result<Self, ExtractError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ExtractError::InvalidConfig(format!("complete client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait::async_trait]
impl Completer for HttpCompleter {
    async fn complete(
        &self,
        text: &str,
        fields: Option<&FieldSnapshot>,
    ) -> Result<String, ExtractError> {
        info!(
            "Requesting AI completion ({} chars, {} known fields)",
            text.len(),
            fields.map(|f| f.values().filter(|v| !v.is_empty()).count()).unwrap_or(0)
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&CompleteRequest { text, fields })
            .send()
            .await
            .map_err(|e| ExtractError::Network {
                stage: Stage::Complete,
                detail: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ExtractError::Network {
                stage: Stage::Complete,
                detail: format!("completion service returned HTTP {}", response.status()),
            });
        }

        let body: CompleteResponse =
            response.json().await.map_err(|e| ExtractError::CompletionParse {
                detail: format!("malformed completion envelope: {e}"),
            })?;

        body.result.ok_or_else(|| ExtractError::CompletionParse {
            detail: "completion envelope carried no result".to_string(),
        })
    }
}

/// Parse the service's raw `result` into a field → value map.
///
/// Unparsable input yields an empty map, never an error. Non-string JSON
/// values (numbers, booleans) are stringified; null and nested values are
/// dropped.
pub fn parse_completion(raw: &str) -> FieldSnapshot {
    match try_parse_completion(raw) {
        Ok(map) => map,
        Err(e) => {
            warn!("Discarding AI completion: {e}");
            FieldSnapshot::new()
        }
    }
}

/// Strict form of [`parse_completion`], used by it and by tests that pin
/// the failure detail.
pub fn try_parse_completion(raw: &str) -> Result<FieldSnapshot, ExtractError> {
    let body = outer_json_object(raw).ok_or_else(|| ExtractError::CompletionParse {
        detail: "no JSON object in response".to_string(),
    })?;

    let parsed: serde_json::Map<String, serde_json::Value> = serde_json::from_str(body)
        .map_err(|e| ExtractError::CompletionParse {
            detail: e.to_string(),
        })?;

    let mut map = FieldSnapshot::new();
    for (name, value) in parsed {
        let value = match value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            _ => continue,
        };
        map.insert(name, value);
    }
    debug!("Parsed completion with {} proposals", map.len());
    Ok(map)
}

/// Slice the outermost `{…}` out of a response that may be wrapped in
/// markdown fences or prose framing.
fn outer_json_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let end = s.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&s[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_bare_object() {
        let map = parse_completion(r#"{"supplier": "ACME Co.", "eta": "2025-05-01"}"#);
        assert_eq!(map.get("supplier").unwrap(), "ACME Co.");
        assert_eq!(map.get("eta").unwrap(), "2025-05-01");
    }

    #[test]
    fn strips_markdown_fences_and_prose() {
        let raw = "Sure! Here is the data you asked for:\n```json\n{\"amount\": \"1,200\"}\n```\nLet me know if you need more.";
        let map = parse_completion(raw);
        assert_eq!(map.get("amount").unwrap(), "1,200");
    }

    #[test]
    fn stringifies_scalar_json_values() {
        let map = parse_completion(r#"{"amount": 1200, "delayed": false, "items": ["a"]}"#);
        assert_eq!(map.get("amount").unwrap(), "1200");
        assert_eq!(map.get("delayed").unwrap(), "false");
        assert!(!map.contains_key("items"));
    }

    #[test]
    fn garbage_degrades_to_zero_completions() {
        assert!(parse_completion("").is_empty());
        assert!(parse_completion("I could not find anything.").is_empty());
        assert!(parse_completion("}{").is_empty());
        assert!(parse_completion("{not json at all").is_empty());
    }

    #[test]
    fn strict_parse_names_the_failure() {
        let err = try_parse_completion("no braces here").unwrap_err();
        assert!(matches!(err, ExtractError::CompletionParse { .. }));
        assert!(!err.is_fatal_for_run());
    }

    #[test]
    fn empty_object_is_a_valid_empty_completion() {
        // The service answers `{}` when asked with nothing missing
        assert!(parse_completion("{}").is_empty());
    }
}
