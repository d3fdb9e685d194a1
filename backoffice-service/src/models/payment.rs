//! Payment and ledger models for backoffice-service.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::InvoiceDetail;

/// Ledger category used for every invoice payment.
pub const CUSTOMER_PAYMENT_CATEGORY: &str = "Customer Payment";

/// Accepted payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "CASH")]
    Cash,
    #[serde(rename = "TRANSFER")]
    Transfer,
    #[serde(rename = "E-WALLET")]
    EWallet,
    #[serde(rename = "QRIS")]
    Qris,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Cash,
        PaymentMethod::Transfer,
        PaymentMethod::EWallet,
        PaymentMethod::Qris,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Transfer => "TRANSFER",
            PaymentMethod::EWallet => "E-WALLET",
            PaymentMethod::Qris => "QRIS",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CASH" => Some(PaymentMethod::Cash),
            "TRANSFER" => Some(PaymentMethod::Transfer),
            "E-WALLET" => Some(PaymentMethod::EWallet),
            "QRIS" => Some(PaymentMethod::Qris),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Transfer => "Bank Transfer",
            PaymentMethod::EWallet => "E-Wallet",
            PaymentMethod::Qris => "QRIS",
        }
    }
}

/// Ledger entry direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerDirection {
    Income,
    Expense,
}

impl LedgerDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerDirection::Income => "income",
            LedgerDirection::Expense => "expense",
        }
    }
}

/// Recorded invoice payment. One per paid invoice.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub payment_id: i64,
    pub invoice_id: String,
    pub customer_id: i64,
    pub paid_at: NaiveDate,
    pub amount: Decimal,
    pub method: String,
    pub note: String,
    pub recorded_by: Option<i64>,
    pub created_utc: DateTime<Utc>,
}

/// Append-only general ledger row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LedgerEntry {
    pub entry_id: i64,
    pub entry_date: NaiveDate,
    pub direction: String,
    pub category: String,
    pub note: String,
    pub amount: Decimal,
    pub created_by: Option<i64>,
    pub created_utc: DateTime<Utc>,
}

/// Everything written when an invoice is paid. Applied in one transaction.
#[derive(Debug, Clone)]
pub struct PaymentPosting {
    pub invoice_id: String,
    pub customer_id: i64,
    pub paid_at: NaiveDate,
    pub amount_paid: Decimal,
    pub method: PaymentMethod,
    pub payment_note: String,
    pub ledger_note: String,
    pub recorded_by: Option<i64>,
    /// Candidate expiry; the stored expiry only ever moves forward.
    pub extend_expiry_to: NaiveDate,
}

/// Snapshot of a completed payment, kept in the session for the print view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub payment_id: i64,
    pub invoice: InvoiceDetail,
    pub amount_paid: Decimal,
    pub discount: Decimal,
    pub method: PaymentMethod,
    pub paid_at: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_literals_are_exact() {
        for method in PaymentMethod::ALL {
            assert_eq!(PaymentMethod::parse(method.as_str()), Some(method));
        }
        assert_eq!(PaymentMethod::parse("cash"), None);
        assert_eq!(PaymentMethod::parse("EWALLET"), None);
        assert_eq!(
            serde_json::to_string(&PaymentMethod::EWallet).unwrap(),
            "\"E-WALLET\""
        );
    }
}
