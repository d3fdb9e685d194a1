//! Invoice payment posting.

use std::sync::Arc;

use chrono::{Months, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use service_core::error::AppError;
use tracing::{info, instrument};

use crate::models::{
    InvoiceDetail, InvoiceFilter, InvoicePage, PaymentMethod, PaymentPosting, PaymentReceipt,
};
use crate::services::metrics::{PAYMENTS_TOTAL, PAYMENT_AMOUNT_TOTAL};
use crate::services::store::BackofficeStore;
use crate::utils::format::format_rupiah;
use crate::utils::pagination;

/// Raw payment form values.
#[derive(Debug, Clone, Default)]
pub struct PaymentInput {
    pub method: String,
    pub payment_date: String,
    /// Whole rupiah; empty means no discount.
    pub discount: String,
    pub recorded_by: Option<i64>,
}

pub struct InvoicePayments {
    store: Arc<dyn BackofficeStore>,
}

impl InvoicePayments {
    pub fn new(store: Arc<dyn BackofficeStore>) -> Self {
        Self { store }
    }

    pub async fn get_invoice_detail(
        &self,
        invoice_id: &str,
    ) -> Result<Option<InvoiceDetail>, AppError> {
        self.store.get_invoice_detail(invoice_id).await
    }

    pub async fn list_invoices(
        &self,
        filter: &InvoiceFilter,
        page: i64,
        page_size: i64,
    ) -> Result<InvoicePage, AppError> {
        let page = page.max(1);
        let total_count = self.store.count_invoices(filter).await?;
        let rows = self
            .store
            .list_invoices(filter, page_size, pagination::offset(page, page_size))
            .await?;

        Ok(InvoicePage {
            rows,
            page,
            page_size,
            total_count,
            total_pages: pagination::total_pages(total_count, page_size),
        })
    }

    /// Validate and post a payment against an unpaid invoice.
    ///
    /// Every precondition is checked before anything is written; the writes
    /// themselves are applied by the store in a single transaction.
    #[instrument(skip(self, input), fields(method = %input.method))]
    pub async fn process_payment(
        &self,
        invoice_id: &str,
        input: &PaymentInput,
        today: NaiveDate,
    ) -> Result<PaymentReceipt, AppError> {
        let invoice = self
            .store
            .get_invoice_detail(invoice_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

        if invoice.is_paid() {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Invoice has already been paid"
            )));
        }

        let method = parse_method(&input.method)?;
        let discount = parse_discount(&input.discount, invoice.amount)?;
        let paid_at = parse_payment_date(&input.payment_date, today)?;
        let extend_expiry_to = one_month_after(invoice.due_at)?;

        let amount_paid = invoice.amount - discount;
        let posting = PaymentPosting {
            invoice_id: invoice.invoice_id.clone(),
            customer_id: invoice.customer_id,
            paid_at,
            amount_paid,
            method,
            payment_note: payment_note(&invoice, discount),
            ledger_note: ledger_note(&invoice, discount, method),
            recorded_by: input.recorded_by,
            extend_expiry_to,
        };

        let payment = self.store.post_payment(&posting).await?;

        PAYMENTS_TOTAL
            .with_label_values(&[method.as_str()])
            .inc();
        PAYMENT_AMOUNT_TOTAL
            .with_label_values(&[method.as_str()])
            .inc_by(amount_paid.to_f64().unwrap_or_default());

        info!(
            payment_id = payment.payment_id,
            invoice_id = %invoice.invoice_id,
            customer_id = invoice.customer_id,
            amount_paid = %amount_paid,
            discount = %discount,
            "Invoice paid"
        );

        Ok(PaymentReceipt {
            payment_id: payment.payment_id,
            invoice,
            amount_paid,
            discount,
            method,
            paid_at,
        })
    }
}

fn parse_method(raw: &str) -> Result<PaymentMethod, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Payment method must be selected"
        )));
    }
    PaymentMethod::parse(raw)
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Invalid payment method: {}", raw)))
}

fn parse_discount(raw: &str, amount: Decimal) -> Result<Decimal, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Decimal::ZERO);
    }

    let discount = raw.parse::<i64>().map_err(|_| {
        AppError::BadRequest(anyhow::anyhow!("Discount must be a whole number"))
    })?;
    if discount < 0 {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Discount cannot be negative"
        )));
    }

    let discount = Decimal::from(discount);
    if discount > amount {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Discount cannot exceed the invoice amount"
        )));
    }
    Ok(discount)
}

fn parse_payment_date(raw: &str, today: NaiveDate) -> Result<NaiveDate, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Payment date is required"
        )));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(anyhow::anyhow!("Invalid payment date: {}", raw)))?;
    if date > today {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Payment date cannot be in the future"
        )));
    }
    Ok(date)
}

/// Same day next month, clamped to the last day (Jan 31 -> Feb 28/29).
pub fn one_month_after(date: NaiveDate) -> Result<NaiveDate, AppError> {
    date.checked_add_months(Months::new(1))
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Invalid due date: {}", date)))
}

/// `Invoice payment for <name> - period <Month> <Year>[ (Discount: Rp n)]`.
pub fn payment_note(invoice: &InvoiceDetail, discount: Decimal) -> String {
    let mut note = format!(
        "Invoice payment for {} - period {}",
        invoice.customer_name,
        invoice.period()
    );
    if discount > Decimal::ZERO {
        note.push_str(&format!(" (Discount: {})", format_rupiah(discount)));
    }
    note
}

/// `Invoice payment - <name> (<id>) - <Month> <Year>[ [Discount: Rp n]] - Method: <METHOD>`.
pub fn ledger_note(invoice: &InvoiceDetail, discount: Decimal, method: PaymentMethod) -> String {
    let mut note = format!(
        "Invoice payment - {} ({}) - {}",
        invoice.customer_name,
        invoice.invoice_id,
        invoice.period()
    );
    if discount > Decimal::ZERO {
        note.push_str(&format!(" [Discount: {}]", format_rupiah(discount)));
    }
    note.push_str(&format!(" - Method: {}", method.as_str()));
    note
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn invoice() -> InvoiceDetail {
        InvoiceDetail {
            invoice_id: "INV2025010003".to_string(),
            customer_id: 7,
            period_month: 1,
            period_year: 2025,
            amount: Decimal::from(150_000),
            due_at: date(2025, 1, 31),
            status: "unpaid".to_string(),
            description: None,
            customer_name: "Siti Aminah".to_string(),
            customer_address: "Jl. Melati 4".to_string(),
            customer_phone: "08123".to_string(),
            pppoe_username: "siti01".to_string(),
            customer_expires_at: None,
            package_name: Some("Home 10".to_string()),
            package_price: Some(Decimal::from(150_000)),
        }
    }

    #[test]
    fn notes_without_discount() {
        let invoice = invoice();
        assert_eq!(
            payment_note(&invoice, Decimal::ZERO),
            "Invoice payment for Siti Aminah - period January 2025"
        );
        assert_eq!(
            ledger_note(&invoice, Decimal::ZERO, PaymentMethod::Cash),
            "Invoice payment - Siti Aminah (INV2025010003) - January 2025 - Method: CASH"
        );
    }

    #[test]
    fn notes_with_discount() {
        let invoice = invoice();
        let discount = Decimal::from(10_000);
        assert_eq!(
            payment_note(&invoice, discount),
            "Invoice payment for Siti Aminah - period January 2025 (Discount: Rp 10.000)"
        );
        assert_eq!(
            ledger_note(&invoice, discount, PaymentMethod::EWallet),
            "Invoice payment - Siti Aminah (INV2025010003) - January 2025 [Discount: Rp 10.000] - Method: E-WALLET"
        );
    }

    #[test]
    fn discount_bounds() {
        let amount = Decimal::from(150_000);
        assert_eq!(parse_discount("", amount).unwrap(), Decimal::ZERO);
        assert_eq!(parse_discount("150000", amount).unwrap(), amount);
        assert!(parse_discount("150001", amount).is_err());
        assert!(parse_discount("-1", amount).is_err());
        assert!(parse_discount("12.5", amount).is_err());
    }

    #[test]
    fn payment_date_must_not_be_in_future() {
        let today = date(2025, 2, 10);
        assert_eq!(parse_payment_date("2025-02-10", today).unwrap(), today);
        assert!(parse_payment_date("2025-02-11", today).is_err());
        assert!(parse_payment_date("2025-02-30", today).is_err());
        assert!(parse_payment_date("10/02/2025", today).is_err());
    }

    #[test]
    fn next_month_clamps_to_month_end() {
        assert_eq!(one_month_after(date(2025, 1, 31)).unwrap(), date(2025, 2, 28));
        assert_eq!(one_month_after(date(2024, 1, 31)).unwrap(), date(2024, 2, 29));
        assert_eq!(one_month_after(date(2025, 12, 15)).unwrap(), date(2026, 1, 15));
    }

    #[test]
    fn method_is_required_and_exact() {
        assert!(parse_method("").is_err());
        assert!(parse_method("bitcoin").is_err());
        assert_eq!(parse_method(" QRIS ").unwrap(), PaymentMethod::Qris);
    }
}
