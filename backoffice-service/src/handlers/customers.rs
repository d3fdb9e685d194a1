use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use super::today;
use super::views::{
    customer_status_views, dropdown_views, CustomerRowView, OptionView, Pager,
};
use crate::models::{CustomerFilter, CustomerStatus, DropdownKind};
use crate::services::CustomerDirectory;
use crate::session::{push_flash, take_flash, Flash};
use crate::startup::AppState;

#[derive(Template)]
#[template(path = "customers.html")]
pub struct CustomersTemplate {
    pub flash: Option<Flash>,
    pub search: String,
    pub status_options: Vec<OptionView>,
    pub package_options: Vec<OptionView>,
    pub distribution_point_options: Vec<OptionView>,
    pub rows: Vec<CustomerRowView>,
    pub total_count: i64,
    pub page: i64,
    pub total_pages: i64,
    pub pager: Pager,
}

/// `GET /customers` query string. Values stay raw so unknown input is
/// ignored instead of rejected.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution_point: Option<String>,
    #[serde(skip_serializing)]
    pub page: Option<String>,
}

fn positive_id(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
}

impl CustomerListQuery {
    pub fn filter(&self) -> CustomerFilter {
        CustomerFilter {
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            status: self.status.as_deref().and_then(CustomerStatus::parse),
            package_id: positive_id(self.package.as_deref()),
            distribution_point_id: positive_id(self.distribution_point.as_deref()),
        }
    }

    /// Filters with empty values dropped, for pagination links.
    fn link_params(&self) -> CustomerListQuery {
        let keep = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
        CustomerListQuery {
            search: keep(&self.search),
            status: keep(&self.status),
            package: keep(&self.package),
            distribution_point: keep(&self.distribution_point),
            page: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusForm {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub customer_id: String,
}

pub async fn list_customers(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CustomerListQuery>,
) -> Response {
    let mut flash = take_flash(&session).await;
    let filter = query.filter();
    let page = crate::utils::pagination::coerce_page(query.page.as_deref());
    let today = today();

    let mut directory = CustomerDirectory::new(state.store.clone());

    let (rows, total_count, total_pages) = match directory
        .list_customers(&filter, page, state.page_size)
        .await
    {
        Ok(result) => (
            result
                .rows
                .iter()
                .map(|row| CustomerRowView::new(row, today))
                .collect(),
            result.total_count,
            result.total_pages,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list customers");
            flash = Some(Flash::from_error(&e));
            (Vec::new(), 0, 0)
        }
    };

    let package_current = filter.package_id.map(|id| id.to_string()).unwrap_or_default();
    let point_current = filter
        .distribution_point_id
        .map(|id| id.to_string())
        .unwrap_or_default();

    let package_options = match directory.list_dropdown_options(DropdownKind::Packages).await {
        Ok(options) => dropdown_views(&options, &package_current),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load package options");
            Vec::new()
        }
    };
    let distribution_point_options = match directory
        .list_dropdown_options(DropdownKind::DistributionPoints)
        .await
    {
        Ok(options) => dropdown_views(&options, &point_current),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load distribution point options");
            Vec::new()
        }
    };

    CustomersTemplate {
        flash,
        search: filter.search.clone().unwrap_or_default(),
        status_options: customer_status_views(
            filter.status.map(|s| s.as_str()).unwrap_or_default(),
        ),
        package_options,
        distribution_point_options,
        rows,
        total_count,
        page,
        total_pages,
        pager: Pager::build("/customers", &query.link_params(), page, total_pages),
    }
    .into_response()
}

/// `POST /customers/status`: activate, deactivate or isolate a customer.
pub async fn change_status(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<StatusForm>,
) -> Redirect {
    let directory = CustomerDirectory::new(state.store.clone());

    let result = match positive_id(Some(&form.customer_id)) {
        Some(customer_id) => directory.apply_action(customer_id, form.action.trim()).await,
        None => Err(service_core::error::AppError::BadRequest(anyhow::anyhow!(
            "Invalid customer id"
        ))),
    };

    let flash = match result {
        Ok(status) => Flash::success(format!("Customer status changed to {}", status.label())),
        Err(e) => {
            tracing::warn!(error = %e, action = %form.action, "Status change rejected");
            Flash::from_error(&e)
        }
    };
    push_flash(&session, flash).await;

    Redirect::to("/customers")
}

/// `POST /customers/:id/delete`.
pub async fn delete_customer(
    State(state): State<AppState>,
    session: Session,
    Path(customer_id): Path<i64>,
) -> Redirect {
    let directory = CustomerDirectory::new(state.store.clone());

    let flash = match directory
        .delete_customer(customer_id, state.provisioner.as_ref())
        .await
    {
        Ok(customer) => Flash::success(format!("Customer {} deleted", customer.name)),
        Err(e) => {
            tracing::warn!(error = %e, customer_id, "Customer deletion failed");
            Flash::from_error(&e)
        }
    };
    push_flash(&session, flash).await;

    Redirect::to("/customers")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_ignores_unknown_values() {
        let query = CustomerListQuery {
            search: Some("  siti ".to_string()),
            status: Some("flying".to_string()),
            package: Some("abc".to_string()),
            distribution_point: Some("4".to_string()),
            page: Some("2".to_string()),
        };
        let filter = query.filter();
        assert_eq!(filter.search.as_deref(), Some("siti"));
        assert_eq!(filter.status, None);
        assert_eq!(filter.package_id, None);
        assert_eq!(filter.distribution_point_id, Some(4));
    }

    #[test]
    fn empty_search_is_no_filter() {
        let query = CustomerListQuery {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(query.filter(), CustomerFilter::default());
    }
}
