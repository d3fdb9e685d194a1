//! View models: pre-formatted values handed to the askama templates.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{
    CustomerRow, CustomerStatus, DropdownOption, InvoiceDetail, InvoiceStatus, PaymentMethod,
    PaymentReceipt,
};
use crate::utils::format::{format_date, format_rupiah};

/// One `<option>` with its selected state resolved.
#[derive(Debug, Clone)]
pub struct OptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl OptionView {
    pub fn new(value: impl Into<String>, label: impl Into<String>, current: &str) -> Self {
        let value = value.into();
        let selected = value == current;
        Self {
            value,
            label: label.into(),
            selected,
        }
    }
}

pub fn dropdown_views(options: &[DropdownOption], current: &str) -> Vec<OptionView> {
    options
        .iter()
        .map(|o| {
            let label = match &o.detail {
                Some(detail) => format!("{} - {}", o.name, detail),
                None => o.name.clone(),
            };
            OptionView::new(o.id.to_string(), label, current)
        })
        .collect()
}

pub fn customer_status_views(current: &str) -> Vec<OptionView> {
    CustomerStatus::ALL
        .iter()
        .map(|s| OptionView::new(s.as_str(), s.label(), current))
        .collect()
}

pub fn invoice_status_views(current: &str) -> Vec<OptionView> {
    [
        InvoiceStatus::Unpaid,
        InvoiceStatus::Overdue,
        InvoiceStatus::Paid,
    ]
    .iter()
    .map(|s| OptionView::new(s.as_str(), s.label(), current))
    .collect()
}

pub fn payment_method_views(current: &str) -> Vec<OptionView> {
    PaymentMethod::ALL
        .iter()
        .map(|m| OptionView::new(m.as_str(), m.label(), current))
        .collect()
}

#[derive(Debug, Clone)]
pub struct PageLink {
    pub number: i64,
    pub url: String,
    pub current: bool,
}

/// Pagination bar. `params` are the active filters, re-encoded into every link.
#[derive(Debug, Clone, Default)]
pub struct Pager {
    pub links: Vec<PageLink>,
    pub prev_url: String,
    pub next_url: String,
    pub has_prev: bool,
    pub has_next: bool,
}

impl Pager {
    pub fn build<P: Serialize>(base: &str, params: &P, page: i64, total_pages: i64) -> Self {
        let encoded = serde_urlencoded::to_string(params).unwrap_or_default();
        let url = |n: i64| {
            if encoded.is_empty() {
                format!("{}?page={}", base, n)
            } else {
                format!("{}?{}&page={}", base, encoded, n)
            }
        };

        // Window of up to five pages around the current one.
        let first = page.saturating_sub(2).max(1);
        let last = first.saturating_add(4).min(total_pages);
        let links = (first..=last)
            .map(|n| PageLink {
                number: n,
                url: url(n),
                current: n == page,
            })
            .collect();

        Self {
            links,
            prev_url: url(page.saturating_sub(1).max(1)),
            next_url: url(page.saturating_add(1)),
            has_prev: page > 1,
            has_next: page < total_pages,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CustomerRowView {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub pppoe_username: String,
    pub package: String,
    pub package_price: String,
    pub speed: String,
    pub distribution_point: String,
    pub port: String,
    pub status: String,
    pub status_label: String,
    pub registered_at: String,
    pub expires_at: String,
    pub expired: bool,
    pub unpaid_invoices: i64,
    pub payment_count: i64,
    pub online: bool,
}

impl CustomerRowView {
    pub fn new(row: &CustomerRow, today: NaiveDate) -> Self {
        let speed = match (&row.rx_limit, &row.tx_limit) {
            (Some(rx), Some(tx)) => format!("{}/{}", rx, tx),
            _ => "-".to_string(),
        };
        let distribution_point = match (&row.distribution_point_name, &row.distribution_point_location) {
            (Some(name), Some(location)) if !location.is_empty() => format!("{} ({})", name, location),
            (Some(name), _) => name.clone(),
            (None, _) => "-".to_string(),
        };
        let status_label = CustomerStatus::parse(&row.status)
            .map(|s| s.label().to_string())
            .unwrap_or_else(|| row.status.clone());

        Self {
            id: row.customer_id,
            name: row.name.clone(),
            address: row.address.clone(),
            phone: row.phone.clone(),
            pppoe_username: row.pppoe_username.clone(),
            package: row.package_name.clone().unwrap_or_else(|| "-".to_string()),
            package_price: row.package_price.map(format_rupiah).unwrap_or_default(),
            speed,
            distribution_point,
            port: row.port_name.clone().unwrap_or_else(|| "-".to_string()),
            status: row.status.clone(),
            status_label,
            registered_at: format_date(Some(row.registered_at)),
            expires_at: format_date(row.expires_at),
            expired: row.expires_at.is_some_and(|d| d < today),
            unpaid_invoices: row.unpaid_invoices,
            payment_count: row.payment_count,
            online: row.active_sessions > 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InvoiceView {
    pub invoice_id: String,
    pub customer_name: String,
    pub customer_address: String,
    pub customer_phone: String,
    pub pppoe_username: String,
    pub package: String,
    pub period: String,
    pub amount: String,
    pub amount_value: String,
    pub due_at: String,
    pub status: String,
    pub status_label: String,
    pub payable: bool,
    pub description: String,
}

impl InvoiceView {
    pub fn new(invoice: &InvoiceDetail, today: NaiveDate) -> Self {
        let status = invoice.display_status(today);
        Self {
            invoice_id: invoice.invoice_id.clone(),
            customer_name: invoice.customer_name.clone(),
            customer_address: invoice.customer_address.clone(),
            customer_phone: invoice.customer_phone.clone(),
            pppoe_username: invoice.pppoe_username.clone(),
            package: invoice
                .package_name
                .clone()
                .unwrap_or_else(|| "-".to_string()),
            period: invoice.period(),
            amount: format_rupiah(invoice.amount),
            amount_value: invoice.amount.trunc().to_string(),
            due_at: format_date(Some(invoice.due_at)),
            status: status.as_str().to_string(),
            status_label: status.label().to_string(),
            payable: !invoice.is_paid(),
            description: invoice.description.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReceiptView {
    pub invoice: InvoiceView,
    pub receipt_number: String,
    pub subtotal: String,
    pub discount: String,
    pub has_discount: bool,
    pub amount_paid: String,
    pub method: String,
    pub paid_at: String,
}

impl ReceiptView {
    pub fn new(receipt: &PaymentReceipt, today: NaiveDate) -> Self {
        Self {
            invoice: InvoiceView::new(&receipt.invoice, today),
            receipt_number: format!("{}-{}", receipt.invoice.invoice_id, receipt.payment_id),
            subtotal: format_rupiah(receipt.invoice.amount),
            discount: format_rupiah(receipt.discount),
            has_discount: !receipt.discount.is_zero(),
            amount_paid: format_rupiah(receipt.amount_paid),
            method: receipt.method.label().to_string(),
            paid_at: format_date(Some(receipt.paid_at)),
        }
    }
}
