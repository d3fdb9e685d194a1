//! Customer directory: filtered listing, dropdown options and status changes.

use std::collections::HashMap;
use std::sync::Arc;

use service_core::error::AppError;
use tracing::{info, instrument, warn};

use crate::models::{
    Customer, CustomerFilter, CustomerPage, CustomerStatus, DropdownKind, DropdownOption,
};
use crate::services::metrics::PROVISIONING_FAILURES_TOTAL;
use crate::services::provisioning::SubscriberProvisioner;
use crate::services::store::BackofficeStore;
use crate::utils::pagination;

/// Default number of customers per page.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Request-scoped view of the customer directory.
///
/// Dropdown options are cached on the instance; build a new directory per
/// request so the cache never outlives it.
pub struct CustomerDirectory {
    store: Arc<dyn BackofficeStore>,
    dropdown_cache: HashMap<DropdownKind, Vec<DropdownOption>>,
}

impl CustomerDirectory {
    pub fn new(store: Arc<dyn BackofficeStore>) -> Self {
        Self {
            store,
            dropdown_cache: HashMap::new(),
        }
    }

    /// One page of enriched customers, newest first.
    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        filter: &CustomerFilter,
        page: i64,
        page_size: i64,
    ) -> Result<CustomerPage, AppError> {
        let page = page.max(1);
        let page_size = if page_size > 0 {
            page_size
        } else {
            DEFAULT_PAGE_SIZE
        };

        let total_count = self.store.count_customers(filter).await?;
        let rows = self
            .store
            .list_customers(filter, page_size, pagination::offset(page, page_size))
            .await?;

        Ok(CustomerPage {
            rows,
            page,
            page_size,
            total_count,
            total_pages: pagination::total_pages(total_count, page_size),
        })
    }

    /// Active packages or distribution points, ordered by name.
    pub async fn list_dropdown_options(
        &mut self,
        kind: DropdownKind,
    ) -> Result<Vec<DropdownOption>, AppError> {
        if let Some(options) = self.dropdown_cache.get(&kind) {
            return Ok(options.clone());
        }

        let options: Vec<DropdownOption> = match kind {
            DropdownKind::Packages => self
                .store
                .list_active_packages()
                .await?
                .iter()
                .map(DropdownOption::from)
                .collect(),
            DropdownKind::DistributionPoints => self
                .store
                .list_active_distribution_points()
                .await?
                .iter()
                .map(DropdownOption::from)
                .collect(),
        };

        self.dropdown_cache.insert(kind, options.clone());
        Ok(options)
    }

    /// Set a customer's status from its literal (`active`, `inactive`, `isolir`).
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        customer_id: i64,
        status: &str,
    ) -> Result<CustomerStatus, AppError> {
        let status = CustomerStatus::parse(status).ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!("Invalid customer status: {}", status))
        })?;
        self.apply_status(customer_id, status).await
    }

    /// Set a customer's status from a list-page action
    /// (`activate`, `deactivate`, `isolir`).
    #[instrument(skip(self))]
    pub async fn apply_action(
        &self,
        customer_id: i64,
        action: &str,
    ) -> Result<CustomerStatus, AppError> {
        let status = CustomerStatus::from_action(action)
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Invalid action: {}", action)))?;
        self.apply_status(customer_id, status).await
    }

    async fn apply_status(
        &self,
        customer_id: i64,
        status: CustomerStatus,
    ) -> Result<CustomerStatus, AppError> {
        if !self
            .store
            .update_customer_status(customer_id, status)
            .await?
        {
            return Err(AppError::NotFound(anyhow::anyhow!("Customer not found")));
        }

        info!(customer_id, status = status.as_str(), "Customer status updated");
        Ok(status)
    }

    /// Delete a customer and its dependent rows, then remove the PPPoE secret
    /// from the router. Router failures are logged, not returned.
    #[instrument(skip(self, provisioner))]
    pub async fn delete_customer(
        &self,
        customer_id: i64,
        provisioner: &dyn SubscriberProvisioner,
    ) -> Result<Customer, AppError> {
        let customer = self
            .store
            .delete_customer(customer_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer not found")))?;

        if let Err(e) = provisioner.remove_secret(&customer.pppoe_username).await {
            PROVISIONING_FAILURES_TOTAL
                .with_label_values(&["remove"])
                .inc();
            warn!(
                customer_id,
                pppoe_username = %customer.pppoe_username,
                error = %e,
                "Customer deleted but PPPoE secret could not be removed from router"
            );
        }

        Ok(customer)
    }
}
