//! Pattern extraction: recognized text → draft field set.
//!
//! Pure and idempotent — same text in, same fields out, no I/O. Each
//! field has its own keyword-anchored pattern, matched independently: a
//! field with no match maps to the empty string and never disturbs the
//! others.
//!
//! Source documents mix notation conventions (scans of Japanese shipping
//! instructions alongside Latin-script invoices), so every pattern is
//! case-insensitive and accepts half-width and full-width colons, hyphens
//! and spaces around the label.

use crate::fields::{FieldOrigin, FieldSet};
use once_cell::sync::Lazy;
use regex::Regex;

// Every pattern allows the half/full-width separator run
// `[\s　]*[:：]?[\s　]*` between the label and its value.

static RE_SI_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:S[\s　]*/?[\s　]*I|INV(?:OICE)?)[\s　]*(?:NO|NUMBER|#)\.?[\s　]*[:：]?[\s　]*([A-Za-z0-9][A-Za-z0-9\-－/]*)",
    )
    .unwrap()
});

static RE_SUPPLIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:SUPPLIER|SHIPPER|仕入れ?先)[\s　]*[:：]?[\s　]*([^\r\n]+?)(?:[ \t]{2,}|　|\r|\n|$)")
        .unwrap()
});

static RE_ETA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\bETA\b[\s　]*[:：]?[\s　]*([0-9]{2,4}[-/．.－／][0-9]{1,2}[-/．.－／][0-9]{1,2}|[0-9]{1,2}[-/．.－／][0-9]{1,2}[-/．.－／][0-9]{2,4})",
    )
    .unwrap()
});

static RE_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:TOTAL[\s　]+AMOUNT|GRAND[\s　]+TOTAL|AMOUNT|TOTAL|金額|合計)[\s　]*[:：]?[\s　]*(?:US\$|USD|JPY|EUR|[¥＄$])?[\s　]*([0-9][0-9,，.．]*)",
    )
    .unwrap()
});

/// Extract the draft field set from recognized text.
///
/// Fields that matched carry [`FieldOrigin::Pattern`]; everything else
/// stays empty. Arbitrary input — empty, binary garbage decoded as text,
/// megabyte blobs — yields a field set of empties rather than a panic.
pub fn extract(text: &str) -> FieldSet {
    let mut fields = FieldSet::new();
    apply(&mut fields, "si_number", first_capture(&RE_SI_NUMBER, text));
    apply(&mut fields, "supplier", first_capture(&RE_SUPPLIER, text));
    apply(&mut fields, "eta", first_capture(&RE_ETA, text));
    apply(&mut fields, "amount", first_capture(&RE_AMOUNT, text));
    fields
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|v| !v.is_empty())
}

fn apply(fields: &mut FieldSet, name: &str, value: Option<String>) {
    if let Some(v) = value {
        fields.set(name, v, FieldOrigin::Pattern);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_number_and_eta_lines() {
        let text = "INVOICE NO: INV-2024-001\nETA: 2025-05-20\n";
        let f = extract(text);
        assert_eq!(f.get("si_number"), "INV-2024-001");
        assert_eq!(f.get("eta"), "2025-05-20");
        assert_eq!(f.get("supplier"), "");
        assert_eq!(f.get("amount"), "");
    }

    #[test]
    fn si_label_variants() {
        assert_eq!(extract("SI NO. SI-778/A").get("si_number"), "SI-778/A");
        assert_eq!(extract("s/i number: 44021").get("si_number"), "44021");
        assert_eq!(extract("Inv # 2024-113").get("si_number"), "2024-113");
    }

    #[test]
    fn full_width_punctuation_is_tolerated() {
        let text = "ＳＩ情報\nSI NO：INV－22\nETA：2025／05／20\n合計：1,234"; // mixed-width scan output
        let f = extract(text);
        // Full-width colon after the label, full-width hyphen in the value
        assert_eq!(f.get("si_number"), "INV－22");
        assert_eq!(f.get("eta"), "2025／05／20");
        assert_eq!(f.get("amount"), "1,234");
    }

    #[test]
    fn supplier_stops_at_column_gap() {
        let f = extract("SUPPLIER: ACME TRADING CO., LTD.    ETA: 2025-06-01");
        assert_eq!(f.get("supplier"), "ACME TRADING CO., LTD.");
        assert_eq!(f.get("eta"), "2025-06-01");
    }

    #[test]
    fn japanese_supplier_label() {
        let f = extract("仕入れ先：山田貿易株式会社\n");
        assert_eq!(f.get("supplier"), "山田貿易株式会社");
        let f = extract("仕入先: 鈴木物産\n");
        assert_eq!(f.get("supplier"), "鈴木物産");
    }

    #[test]
    fn amount_label_variants() {
        assert_eq!(extract("TOTAL AMOUNT: US$ 12,540.00").get("amount"), "12,540.00");
        assert_eq!(extract("TOTAL 980.50").get("amount"), "980.50");
        assert_eq!(extract("金額 ¥ 1,200,000").get("amount"), "1,200,000");
    }

    #[test]
    fn per_field_isolation() {
        // Matches supplier but nothing else — the other fields stay
        // empty, with no cross-match.
        let f = extract("SHIPPER: NIPPON KAIUN\nno numbers of note here\n");
        assert_eq!(f.get("supplier"), "NIPPON KAIUN");
        assert_eq!(f.get("si_number"), "");
        assert_eq!(f.get("eta"), "");
        assert_eq!(f.get("amount"), "");
    }

    #[test]
    fn idempotent_over_repeated_calls() {
        let text = "SI NO: A-1\nETA 2025-01-02\nSUPPLIER: X\nTOTAL: 5";
        assert_eq!(extract(text), extract(text));
    }

    #[test]
    fn garbage_input_yields_empties_not_panics() {
        let long = "x".repeat(100_000);
        for text in [
            "",
            "\u{0000}\u{FFFD}\u{FFFD}",
            "::::----::::",
            "ETA ETA ETA",
            long.as_str(),
        ] {
            let f = extract(text);
            assert!(f.missing_fields().len() >= 3, "input {:?}", &text[..text.len().min(20)]);
        }
    }

    #[test]
    fn eta_requires_a_date_token() {
        // "ETA" with no parseable date must not grab stray text
        assert_eq!(extract("ETA: unknown at this time").get("eta"), "");
        assert_eq!(extract("ETA 12/05/2025 port side").get("eta"), "12/05/2025");
    }
}
