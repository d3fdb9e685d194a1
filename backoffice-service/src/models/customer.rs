//! Customer model for backoffice-service.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Invoice;

/// Subscription state of a customer. `Isolir` is the suspended,
/// walled-garden state applied to customers in arrears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerStatus {
    Active,
    Inactive,
    Isolir,
}

impl CustomerStatus {
    pub const ALL: [CustomerStatus; 3] = [
        CustomerStatus::Active,
        CustomerStatus::Inactive,
        CustomerStatus::Isolir,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerStatus::Active => "active",
            CustomerStatus::Inactive => "inactive",
            CustomerStatus::Isolir => "isolir",
        }
    }

    /// Strict parse of a stored or submitted literal.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(CustomerStatus::Active),
            "inactive" => Some(CustomerStatus::Inactive),
            "isolir" => Some(CustomerStatus::Isolir),
            _ => None,
        }
    }

    /// Map a list-page action button to the status it applies.
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            "activate" => Some(CustomerStatus::Active),
            "deactivate" => Some(CustomerStatus::Inactive),
            "isolir" => Some(CustomerStatus::Isolir),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CustomerStatus::Active => "Active",
            CustomerStatus::Inactive => "Inactive",
            CustomerStatus::Isolir => "Isolated",
        }
    }
}

/// Customer record as stored.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub customer_id: i64,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: Option<String>,
    pub registered_at: NaiveDate,
    pub expires_at: Option<NaiveDate>,
    pub status: String,
    pub pppoe_username: String,
    pub pppoe_password: String,
    pub router_profile: Option<String>,
    pub package_id: Option<i64>,
    pub distribution_point_id: Option<i64>,
    pub port_id: Option<i64>,
    pub onu_id: Option<String>,
    pub last_paid_at: Option<NaiveDate>,
    pub created_utc: DateTime<Utc>,
}

/// One row of the customer listing, enriched with reference data and
/// aggregate counts. Missing references leave the joined fields empty.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CustomerRow {
    pub customer_id: i64,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: Option<String>,
    pub registered_at: NaiveDate,
    pub expires_at: Option<NaiveDate>,
    pub status: String,
    pub pppoe_username: String,
    pub onu_id: Option<String>,
    pub last_paid_at: Option<NaiveDate>,
    pub created_utc: DateTime<Utc>,
    pub package_name: Option<String>,
    pub package_price: Option<Decimal>,
    pub rx_limit: Option<String>,
    pub tx_limit: Option<String>,
    pub distribution_point_name: Option<String>,
    pub distribution_point_location: Option<String>,
    pub distribution_point_status: Option<String>,
    pub port_name: Option<String>,
    pub port_status: Option<String>,
    pub unpaid_invoices: i64,
    pub payment_count: i64,
    pub active_sessions: i64,
}

/// Filter parameters for listing customers. All fields are AND-ed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerFilter {
    pub search: Option<String>,
    pub status: Option<CustomerStatus>,
    pub package_id: Option<i64>,
    pub distribution_point_id: Option<i64>,
}

/// One page of the customer listing.
#[derive(Debug, Clone)]
pub struct CustomerPage {
    pub rows: Vec<CustomerRow>,
    pub page: i64,
    pub page_size: i64,
    pub total_count: i64,
    pub total_pages: i64,
}

/// Input for creating a customer.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: Option<String>,
    pub registered_at: NaiveDate,
    pub expires_at: NaiveDate,
    pub package_id: i64,
    pub distribution_point_id: i64,
    pub port_id: Option<i64>,
    pub onu_id: Option<String>,
    pub pppoe_username: String,
    pub pppoe_password: String,
    pub router_profile: String,
}

/// Customer and first invoice written by a successful registration.
#[derive(Debug, Clone)]
pub struct RegisteredCustomer {
    pub customer: Customer,
    pub invoice: Invoice,
}
