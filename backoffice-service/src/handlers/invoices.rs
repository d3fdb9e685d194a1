use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use tower_sessions::Session;

use super::today;
use super::views::{
    invoice_status_views, payment_method_views, InvoiceView, OptionView, Pager, ReceiptView,
};
use crate::models::{InvoiceFilter, InvoiceStatus};
use crate::services::{InvoicePayments, PaymentInput};
use crate::session::{
    current_user_id, load_receipt, push_flash, store_receipt, take_flash, Flash,
};
use crate::startup::AppState;
use crate::utils::pagination::coerce_page;

#[derive(Template)]
#[template(path = "invoices.html")]
pub struct InvoicesTemplate {
    pub flash: Option<Flash>,
    pub status_options: Vec<OptionView>,
    pub rows: Vec<InvoiceView>,
    pub total_count: i64,
    pub pager: Pager,
}

#[derive(Template)]
#[template(path = "payment.html")]
pub struct PaymentTemplate {
    pub flash: Option<Flash>,
    pub invoice: InvoiceView,
    pub method_options: Vec<OptionView>,
    pub payment_date: String,
    pub discount: String,
    pub print_invoice: bool,
}

#[derive(Template)]
#[template(path = "print_invoice.html")]
pub struct PrintInvoiceTemplate {
    pub receipt: ReceiptView,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct InvoiceListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing)]
    pub page: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentForm {
    pub method: String,
    pub payment_date: String,
    pub discount: String,
    pub print_invoice: String,
}

impl PaymentForm {
    fn wants_print(&self) -> bool {
        matches!(self.print_invoice.as_str(), "yes" | "on" | "true" | "1")
    }
}

/// `GET /invoices`.
pub async fn list_invoices(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<InvoiceListQuery>,
) -> Response {
    let mut flash = take_flash(&session).await;
    let today = today();
    let status = query.status.as_deref().and_then(InvoiceStatus::parse);
    let page = coerce_page(query.page.as_deref());
    let filter = InvoiceFilter { status, today };

    let (rows, total_count, total_pages) = match InvoicePayments::new(state.store.clone())
        .list_invoices(&filter, page, state.page_size)
        .await
    {
        Ok(result) => (
            result
                .rows
                .iter()
                .map(|invoice| InvoiceView::new(invoice, today))
                .collect(),
            result.total_count,
            result.total_pages,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list invoices");
            flash = Some(Flash::from_error(&e));
            (Vec::new(), 0, 0)
        }
    };

    let link_params = InvoiceListQuery {
        status: status.map(|s| s.as_str().to_string()),
        page: None,
    };

    InvoicesTemplate {
        flash,
        status_options: invoice_status_views(status.map(|s| s.as_str()).unwrap_or_default()),
        rows,
        total_count,
        pager: Pager::build("/invoices", &link_params, page, total_pages),
    }
    .into_response()
}

/// Load a payable invoice, or the flash message explaining why it is not.
async fn payable_invoice(
    payments: &InvoicePayments,
    invoice_id: &str,
) -> Result<InvoiceView, Flash> {
    match payments.get_invoice_detail(invoice_id).await {
        Ok(Some(invoice)) if invoice.is_paid() => {
            Err(Flash::error("Invoice has already been paid"))
        }
        Ok(Some(invoice)) => Ok(InvoiceView::new(&invoice, today())),
        Ok(None) => Err(Flash::error("Invoice not found")),
        Err(e) => Err(Flash::from_error(&e)),
    }
}

/// `GET /invoices/:invoice_id/pay`.
pub async fn payment_page(
    State(state): State<AppState>,
    session: Session,
    Path(invoice_id): Path<String>,
) -> Response {
    let payments = InvoicePayments::new(state.store.clone());

    match payable_invoice(&payments, &invoice_id).await {
        Ok(invoice) => PaymentTemplate {
            flash: take_flash(&session).await,
            invoice,
            method_options: payment_method_views(""),
            payment_date: today().format("%Y-%m-%d").to_string(),
            discount: "0".to_string(),
            print_invoice: false,
        }
        .into_response(),
        Err(flash) => {
            push_flash(&session, flash).await;
            Redirect::to("/invoices").into_response()
        }
    }
}

/// `POST /invoices/:invoice_id/pay`.
pub async fn submit_payment(
    State(state): State<AppState>,
    session: Session,
    Path(invoice_id): Path<String>,
    Form(form): Form<PaymentForm>,
) -> Response {
    let payments = InvoicePayments::new(state.store.clone());
    let input = PaymentInput {
        method: form.method.clone(),
        payment_date: form.payment_date.clone(),
        discount: form.discount.clone(),
        recorded_by: current_user_id(&session).await,
    };

    match payments.process_payment(&invoice_id, &input, today()).await {
        Ok(receipt) => {
            if let Err(e) = store_receipt(&session, &receipt).await {
                tracing::warn!(error = %e, "Receipt snapshot not stored");
            }
            push_flash(
                &session,
                Flash::success("Payment recorded and added to the financial ledger!"),
            )
            .await;

            if form.wants_print() {
                Redirect::to("/invoices/print").into_response()
            } else {
                Redirect::to("/invoices").into_response()
            }
        }
        Err(e @ (AppError::NotFound(_) | AppError::Conflict(_))) => {
            push_flash(&session, Flash::from_error(&e)).await;
            Redirect::to("/invoices").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, invoice_id = %invoice_id, "Payment rejected");
            let status = e.status_code();
            match payable_invoice(&payments, &invoice_id).await {
                Ok(invoice) => (
                    status,
                    PaymentTemplate {
                        flash: Some(Flash::from_error(&e)),
                        invoice,
                        method_options: payment_method_views(form.method.trim()),
                        payment_date: form.payment_date.clone(),
                        discount: form.discount.clone(),
                        print_invoice: form.wants_print(),
                    },
                )
                    .into_response(),
                Err(flash) => {
                    push_flash(&session, flash).await;
                    Redirect::to("/invoices").into_response()
                }
            }
        }
    }
}

/// `GET /invoices/print`: receipt for the last payment in this session.
pub async fn print_invoice(session: Session) -> Response {
    match load_receipt(&session).await {
        Some(receipt) => PrintInvoiceTemplate {
            receipt: ReceiptView::new(&receipt, today()),
        }
        .into_response(),
        None => {
            push_flash(&session, Flash::error("No payment to print")).await;
            Redirect::to("/invoices").into_response()
        }
    }
}
