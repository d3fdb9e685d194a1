//! Invoice model for backoffice-service.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::utils::format::period_label;

/// Invoice status.
///
/// `Overdue` may be written by the external billing run; it is treated
/// exactly like `Unpaid` for payment purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Unpaid,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Unpaid => "unpaid",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "paid" => InvoiceStatus::Paid,
            "overdue" => InvoiceStatus::Overdue,
            _ => InvoiceStatus::Unpaid,
        }
    }

    /// Strict parse for query-string filters.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unpaid" => Some(InvoiceStatus::Unpaid),
            "paid" => Some(InvoiceStatus::Paid),
            "overdue" => Some(InvoiceStatus::Overdue),
            _ => None,
        }
    }

    /// Status shown to operators: an unpaid invoice past its due date is
    /// overdue regardless of what is stored.
    pub fn display(stored: &str, due_at: NaiveDate, today: NaiveDate) -> Self {
        match Self::from_string(stored) {
            InvoiceStatus::Paid => InvoiceStatus::Paid,
            _ if due_at < today => InvoiceStatus::Overdue,
            _ => InvoiceStatus::Unpaid,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InvoiceStatus::Unpaid => "Unpaid",
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Overdue => "Overdue",
        }
    }
}

/// Invoice record as stored.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub invoice_id: String,
    pub customer_id: i64,
    pub period_month: i16,
    pub period_year: i16,
    pub amount: Decimal,
    pub due_at: NaiveDate,
    pub status: String,
    pub description: Option<String>,
    pub auto_generated: bool,
    pub created_utc: DateTime<Utc>,
}

/// Invoice joined with its customer and the customer's package.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InvoiceDetail {
    pub invoice_id: String,
    pub customer_id: i64,
    pub period_month: i16,
    pub period_year: i16,
    pub amount: Decimal,
    pub due_at: NaiveDate,
    pub status: String,
    pub description: Option<String>,
    pub customer_name: String,
    pub customer_address: String,
    pub customer_phone: String,
    pub pppoe_username: String,
    pub customer_expires_at: Option<NaiveDate>,
    pub package_name: Option<String>,
    pub package_price: Option<Decimal>,
}

impl InvoiceDetail {
    pub fn is_paid(&self) -> bool {
        InvoiceStatus::from_string(&self.status) == InvoiceStatus::Paid
    }

    /// Billing period, e.g. `January 2025`.
    pub fn period(&self) -> String {
        period_label(self.period_month, self.period_year)
    }

    pub fn display_status(&self, today: NaiveDate) -> InvoiceStatus {
        InvoiceStatus::display(&self.status, self.due_at, today)
    }
}

/// Filter parameters for listing invoices.
#[derive(Debug, Clone)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    /// Reference date for the derived overdue filter.
    pub today: NaiveDate,
}

/// One page of the invoice listing.
#[derive(Debug, Clone)]
pub struct InvoicePage {
    pub rows: Vec<InvoiceDetail>,
    pub page: i64,
    pub page_size: i64,
    pub total_count: i64,
    pub total_pages: i64,
}

/// First invoice written alongside a new customer.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub period_month: i16,
    pub period_year: i16,
    pub amount: Decimal,
    pub due_at: NaiveDate,
    pub description: String,
    pub auto_generated: bool,
}
