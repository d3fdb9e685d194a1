//! HTTP handlers. Pages render askama templates; mutations redirect back
//! with a flash message.

pub mod customers;
pub mod health;
pub mod invoices;
pub mod registration;
pub mod views;

use axum::response::Redirect;
use chrono::NaiveDate;

/// Local calendar date used for due-date and payment-date checks.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub async fn index() -> Redirect {
    Redirect::to("/customers")
}
