//! Customer registration: PPPoE provisioning plus customer and first invoice.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use service_core::error::AppError;
use tracing::{error, info, instrument, warn};

use crate::models::{NewCustomer, NewInvoice, RegisteredCustomer};
use crate::services::metrics::{PROVISIONING_FAILURES_TOTAL, REGISTRATIONS_TOTAL};
use crate::services::provisioning::{PppoeSecret, ProvisioningOutcome, SubscriberProvisioner};
use crate::services::store::BackofficeStore;

/// Validated registration form.
#[derive(Debug, Clone)]
pub struct RegistrationInput {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: Option<String>,
    pub package_id: i64,
    pub distribution_point_id: i64,
    pub port_id: Option<i64>,
    pub onu_id: Option<String>,
    pub registered_at: NaiveDate,
    pub expires_at: NaiveDate,
    pub pppoe_username: String,
    pub pppoe_password: String,
}

pub struct CustomerRegistration {
    store: Arc<dyn BackofficeStore>,
    provisioner: Arc<dyn SubscriberProvisioner>,
}

impl CustomerRegistration {
    pub fn new(store: Arc<dyn BackofficeStore>, provisioner: Arc<dyn SubscriberProvisioner>) -> Self {
        Self { store, provisioner }
    }

    /// Register a customer.
    ///
    /// The router secret is created before the local transaction. If that
    /// transaction fails, the secret created here is removed again
    /// (best effort) and the original error is returned.
    #[instrument(skip(self, input), fields(pppoe_username = %input.pppoe_username))]
    pub async fn register(
        &self,
        input: &RegistrationInput,
        today: NaiveDate,
    ) -> Result<RegisteredCustomer, AppError> {
        // Advisory: the unique constraint on insert is authoritative.
        if self
            .store
            .pppoe_username_exists(&input.pppoe_username)
            .await?
        {
            REGISTRATIONS_TOTAL.with_label_values(&["conflict"]).inc();
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Username {} is already in use",
                input.pppoe_username
            )));
        }

        let package = self
            .store
            .get_package(input.package_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Package not found")))?;
        let invoice = first_invoice(input, package.price)?;

        let secret = PppoeSecret::for_customer(
            &input.name,
            &input.pppoe_username,
            &input.pppoe_password,
            &package.profile_name,
        );
        let outcome = match self.provisioner.create_secret(&secret).await {
            Ok(outcome) => outcome,
            Err(e) => {
                PROVISIONING_FAILURES_TOTAL
                    .with_label_values(&["create"])
                    .inc();
                REGISTRATIONS_TOTAL
                    .with_label_values(&["provisioning_failed"])
                    .inc();
                error!(error = %e, "PPPoE provisioning failed, nothing saved");
                return Err(e.into());
            }
        };

        let customer = NewCustomer {
            name: input.name.clone(),
            address: input.address.clone(),
            phone: input.phone.clone(),
            email: input.email.clone(),
            registered_at: input.registered_at,
            expires_at: input.expires_at,
            package_id: package.package_id,
            distribution_point_id: input.distribution_point_id,
            port_id: input.port_id,
            onu_id: input.onu_id.clone(),
            pppoe_username: input.pppoe_username.clone(),
            pppoe_password: input.pppoe_password.clone(),
            router_profile: package.profile_name.clone(),
        };

        match self.store.register_customer(&customer, &invoice, today).await {
            Ok(registered) => {
                REGISTRATIONS_TOTAL.with_label_values(&["created"]).inc();
                info!(
                    customer_id = registered.customer.customer_id,
                    invoice_id = %registered.invoice.invoice_id,
                    provisioned = outcome == ProvisioningOutcome::Created,
                    "Customer registered"
                );
                Ok(registered)
            }
            Err(e) => {
                let label = if matches!(e, AppError::Conflict(_)) {
                    "conflict"
                } else {
                    "failed"
                };
                REGISTRATIONS_TOTAL.with_label_values(&[label]).inc();

                if outcome == ProvisioningOutcome::Created {
                    self.compensate(&input.pppoe_username).await;
                }
                Err(e)
            }
        }
    }

    async fn compensate(&self, username: &str) {
        match self.provisioner.remove_secret(username).await {
            Ok(()) => warn!(
                pppoe_username = %username,
                "Local save failed, PPPoE secret removed from router"
            ),
            Err(e) => {
                PROVISIONING_FAILURES_TOTAL
                    .with_label_values(&["remove"])
                    .inc();
                error!(
                    pppoe_username = %username,
                    error = %e,
                    "Local save failed and PPPoE secret could not be removed from router"
                );
            }
        }
    }
}

/// First invoice: billed for the registration month, due on the expiry date.
fn first_invoice(
    input: &RegistrationInput,
    price: rust_decimal::Decimal,
) -> Result<NewInvoice, AppError> {
    let registered_at = input.registered_at;
    let period_year = i16::try_from(registered_at.year()).map_err(|_| {
        AppError::BadRequest(anyhow::anyhow!(
            "Registration date {} is out of range",
            registered_at
        ))
    })?;

    Ok(NewInvoice {
        // 1..=12 always fits.
        period_month: registered_at.month() as i16,
        period_year,
        amount: price,
        due_at: input.expires_at,
        description: format!("First invoice for customer {}", input.name),
        auto_generated: false,
    })
}
