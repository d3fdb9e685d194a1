//! Persistence seam for the back-office components.

use async_trait::async_trait;
use chrono::NaiveDate;
use service_core::error::AppError;

use crate::models::{
    Customer, CustomerFilter, CustomerRow, CustomerStatus, DistributionPoint, InvoiceDetail,
    InvoiceFilter, NewCustomer, NewInvoice, Package, Payment, PaymentPosting, RegisteredCustomer,
};

/// Everything the directory, payment and registration components need from
/// the relational store. Multi-statement operations are atomic.
#[async_trait]
pub trait BackofficeStore: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;

    async fn count_customers(&self, filter: &CustomerFilter) -> Result<i64, AppError>;

    /// One page of enriched rows, newest first.
    async fn list_customers(
        &self,
        filter: &CustomerFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CustomerRow>, AppError>;

    /// Active packages ordered by name.
    async fn list_active_packages(&self) -> Result<Vec<Package>, AppError>;

    /// Active distribution points ordered by name.
    async fn list_active_distribution_points(&self) -> Result<Vec<DistributionPoint>, AppError>;

    async fn get_customer(&self, customer_id: i64) -> Result<Option<Customer>, AppError>;

    /// Returns `false` when no customer has the given id.
    async fn update_customer_status(
        &self,
        customer_id: i64,
        status: CustomerStatus,
    ) -> Result<bool, AppError>;

    /// Remove a customer with its sessions, payments and invoices.
    /// Returns the removed record, `None` when it did not exist.
    async fn delete_customer(&self, customer_id: i64) -> Result<Option<Customer>, AppError>;

    async fn get_package(&self, package_id: i64) -> Result<Option<Package>, AppError>;

    async fn pppoe_username_exists(&self, username: &str) -> Result<bool, AppError>;

    /// Insert the customer, allocate the next invoice id for `issued_on`'s
    /// month and insert the first invoice, all in one transaction.
    /// A taken PPPoE username fails with `Conflict`.
    async fn register_customer(
        &self,
        customer: &NewCustomer,
        invoice: &NewInvoice,
        issued_on: NaiveDate,
    ) -> Result<RegisteredCustomer, AppError>;

    async fn get_invoice_detail(&self, invoice_id: &str) -> Result<Option<InvoiceDetail>, AppError>;

    async fn count_invoices(&self, filter: &InvoiceFilter) -> Result<i64, AppError>;

    async fn list_invoices(
        &self,
        filter: &InvoiceFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InvoiceDetail>, AppError>;

    /// Mark the invoice paid, record the payment and ledger entry and move
    /// the customer's payment and expiry dates, in one transaction.
    /// An invoice that is already paid fails with `Conflict`.
    async fn post_payment(&self, posting: &PaymentPosting) -> Result<Payment, AppError>;
}
