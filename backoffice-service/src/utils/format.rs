//! Display helpers shared by services and templates.

use chrono::{Month, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};

/// Format an amount as Indonesian rupiah: `Rp 1.250.000`.
///
/// Amounts are rounded half-up to whole rupiah.
pub fn format_rupiah(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-Rp {}", grouped)
    } else {
        format!("Rp {}", grouped)
    }
}

/// English month name for 1-12; empty for anything else.
pub fn month_name(month: i16) -> &'static str {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
        .unwrap_or("")
}

/// `January 2025`.
pub fn period_label(month: i16, year: i16) -> String {
    format!("{} {}", month_name(month), year)
}

/// `17 Jan 2025`; `-` when absent.
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%d %b %Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}
