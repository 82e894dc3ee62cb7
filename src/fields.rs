//! The field set: the structured key/value result the pipeline populates.
//!
//! A [`FieldSet`] maps a fixed, known vocabulary of field names to string
//! values where the empty string means "unknown". That emptiness is the
//! *only* signal the gap-fill merge consults — a field holding any
//! non-empty value, whatever wrote it, is never overwritten by an AI
//! completion. Origins are tracked purely for auditability.
//!
//! Extending the vocabulary is a compile-time change to [`FIELD_NAMES`];
//! every behavior (independent pattern, empty-check merge) applies to new
//! names identically.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field vocabulary for v1 shipment documents.
pub const FIELD_NAMES: &[&str] = &["si_number", "supplier", "eta", "amount"];

/// Who wrote the current value of a field. Audit only — the merge policy
/// keys on emptiness, never on origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOrigin {
    /// Matched by the pattern extractor.
    Pattern,
    /// Entered or corrected by the reviewing operator.
    Operator,
    /// Proposed by the AI completion service for a then-empty field.
    AiFilled,
}

/// Mapping from the fixed field vocabulary to string values.
///
/// Freshly constructed sets hold the empty string for every known name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSet {
    values: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    origins: BTreeMap<String, FieldOrigin>,
}

impl Default for FieldSet {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldSet {
    /// An all-empty set over [`FIELD_NAMES`].
    pub fn new() -> Self {
        Self {
            values: FIELD_NAMES
                .iter()
                .map(|name| (name.to_string(), String::new()))
                .collect(),
            origins: BTreeMap::new(),
        }
    }

    /// Current value of `name`; empty string for unknown names too, so
    /// callers never need to distinguish "absent" from "empty".
    pub fn get(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or("")
    }

    /// Origin of the current value, if any non-empty value was ever set.
    pub fn origin(&self, name: &str) -> Option<FieldOrigin> {
        self.origins.get(name).copied()
    }

    /// Write `value` with its origin. Returns false for names outside the
    /// vocabulary, which are not fields of the run and are ignored.
    pub fn set(&mut self, name: &str, value: impl Into<String>, origin: FieldOrigin) -> bool {
        let Some(slot) = self.values.get_mut(name) else {
            return false;
        };
        let value = value.into();
        if value.is_empty() {
            self.origins.remove(name);
        } else {
            self.origins.insert(name.to_string(), origin);
        }
        *slot = value;
        true
    }

    /// True when the field currently holds no value.
    pub fn is_missing(&self, name: &str) -> bool {
        self.get(name).is_empty()
    }

    /// Names whose value is currently empty, in vocabulary order.
    pub fn missing_fields(&self) -> Vec<String> {
        FIELD_NAMES
            .iter()
            .filter(|name| self.is_missing(name))
            .map(|name| name.to_string())
            .collect()
    }

    /// True when every field holds a value.
    pub fn is_complete(&self) -> bool {
        FIELD_NAMES.iter().all(|name| !self.is_missing(name))
    }

    /// Plain name → value map, e.g. for the AI request body or the
    /// persistence hand-off.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.values.clone()
    }

    /// Apply an AI completion under the non-clobber policy: a proposed
    /// value is written only if the field is empty *right now*, at merge
    /// time. Returns the number of fields actually filled.
    ///
    /// Names outside the vocabulary and empty proposals are skipped.
    pub fn merge_completion(&mut self, completion: &BTreeMap<String, String>) -> usize {
        let mut applied = 0;
        for (name, proposed) in completion {
            if proposed.is_empty() || !self.values.contains_key(name) {
                continue;
            }
            if self.is_missing(name) {
                self.set(name, proposed.clone(), FieldOrigin::AiFilled);
                applied += 1;
            }
        }
        applied
    }

    /// Iterate `(name, value)` pairs in vocabulary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completion(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn new_set_is_all_missing() {
        let f = FieldSet::new();
        assert_eq!(f.missing_fields(), FIELD_NAMES.to_vec());
        assert!(!f.is_complete());
    }

    #[test]
    fn missing_fields_tracks_exactly_the_empty_ones() {
        let mut f = FieldSet::new();
        f.set("si_number", "INV-1", FieldOrigin::Pattern);
        f.set("eta", "2025-05-20", FieldOrigin::Pattern);
        assert_eq!(f.missing_fields(), vec!["supplier", "amount"]);
        f.set("eta", "", FieldOrigin::Operator); // operator cleared it
        assert_eq!(f.missing_fields(), vec!["supplier", "eta", "amount"]);
    }

    #[test]
    fn merge_never_clobbers_non_empty_values() {
        let mut f = FieldSet::new();
        f.set("si_number", "INV-2024-001", FieldOrigin::Pattern);
        f.set("supplier", "Edited by hand", FieldOrigin::Operator);

        let applied = f.merge_completion(&completion(&[
            ("si_number", "SHOULD-NOT-APPEAR"),
            ("supplier", "SHOULD-NOT-APPEAR"),
            ("eta", "2025-05-20"),
        ]));

        assert_eq!(applied, 1);
        assert_eq!(f.get("si_number"), "INV-2024-001");
        assert_eq!(f.get("supplier"), "Edited by hand");
        assert_eq!(f.get("eta"), "2025-05-20");
        assert_eq!(f.origin("eta"), Some(FieldOrigin::AiFilled));
        assert_eq!(f.origin("si_number"), Some(FieldOrigin::Pattern));
    }

    #[test]
    fn merge_ignores_unknown_names_and_empty_proposals() {
        let mut f = FieldSet::new();
        let applied = f.merge_completion(&completion(&[
            ("container_no", "TCLU1234567"),
            ("amount", ""),
        ]));
        assert_eq!(applied, 0);
        assert_eq!(f.get("container_no"), "");
        assert!(f.is_missing("amount"));
    }

    #[test]
    fn set_rejects_unknown_names() {
        let mut f = FieldSet::new();
        assert!(!f.set("vessel", "EVER GIVEN", FieldOrigin::Operator));
        assert!(f.set("supplier", "ACME Co.", FieldOrigin::Operator));
    }

    #[test]
    fn clearing_a_value_drops_its_origin() {
        let mut f = FieldSet::new();
        f.set("amount", "1,234.00", FieldOrigin::AiFilled);
        assert_eq!(f.origin("amount"), Some(FieldOrigin::AiFilled));
        f.set("amount", "", FieldOrigin::Operator);
        assert_eq!(f.origin("amount"), None);
    }

    #[test]
    fn snapshot_round_trips_through_serde() {
        let mut f = FieldSet::new();
        f.set("si_number", "INV-7", FieldOrigin::Pattern);
        let json = serde_json::to_string(&f).unwrap();
        let back: FieldSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, f);
    }
}
