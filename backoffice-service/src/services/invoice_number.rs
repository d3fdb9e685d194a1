//! Human-readable invoice ids: `INV` + `YYYYMM` + four-digit sequence.

use chrono::NaiveDate;

pub const INVOICE_PREFIX: &str = "INV";

/// Counter key for the month an invoice is issued in, e.g. `202501`.
pub fn period_key(issued_on: NaiveDate) -> String {
    issued_on.format("%Y%m").to_string()
}

/// `INV202501`.
pub fn invoice_prefix(issued_on: NaiveDate) -> String {
    format!("{}{}", INVOICE_PREFIX, period_key(issued_on))
}

/// `INV2025010003`.
pub fn format_invoice_id(prefix: &str, sequence: i32) -> String {
    format!("{}{:04}", prefix, sequence)
}

/// Sequence following the greatest existing id of a period; 1 when the
/// period has no ids yet or the suffix is not numeric.
pub fn next_sequence(last_id: Option<&str>, prefix: &str) -> i32 {
    last_id
        .and_then(|id| id.strip_prefix(prefix))
        .and_then(|suffix| suffix.parse::<i32>().ok())
        .map(|n| n + 1)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_uses_issue_month() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        assert_eq!(invoice_prefix(date), "INV202501");
        assert_eq!(period_key(date), "202501");
    }

    #[test]
    fn continues_after_greatest_existing_id() {
        let existing = ["INV2025010001", "INV2025010002"];
        let last = existing.iter().max().copied();
        let next = next_sequence(last, "INV202501");
        assert_eq!(format_invoice_id("INV202501", next), "INV2025010003");
    }

    #[test]
    fn new_period_starts_at_one() {
        let next = next_sequence(None, "INV202502");
        assert_eq!(format_invoice_id("INV202502", next), "INV2025020001");
        assert_eq!(next_sequence(Some("INV202502ABCD"), "INV202502"), 1);
    }
}
