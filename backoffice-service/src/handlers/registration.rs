use askama::Template;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Form,
};
use chrono::NaiveDate;
use serde::Deserialize;
use service_core::error::AppError;
use tower_sessions::Session;
use validator::Validate;

use super::today;
use super::views::{dropdown_views, OptionView};
use crate::models::DropdownKind;
use crate::services::payments::one_month_after;
use crate::services::{CustomerDirectory, CustomerRegistration, RegistrationInput};
use crate::session::{take_flash, Flash};
use crate::startup::AppState;

#[derive(Template)]
#[template(path = "customer_form.html")]
pub struct CustomerFormTemplate {
    pub flash: Option<Flash>,
    pub form: RegistrationForm,
    pub package_options: Vec<OptionView>,
    pub distribution_point_options: Vec<OptionView>,
    /// Send the browser back to the listing after a short delay.
    pub redirect_to_list: bool,
}

/// Registration form as submitted. Values are kept as text so the form can
/// be redisplayed exactly as entered.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationForm {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub address: String,
    #[validate(length(min = 1))]
    pub phone: String,
    pub email: String,
    #[validate(length(min = 1))]
    pub package_id: String,
    #[validate(length(min = 1))]
    pub distribution_point_id: String,
    pub port_id: String,
    pub onu_id: String,
    #[validate(length(min = 1))]
    pub registered_at: String,
    #[validate(length(min = 1))]
    pub expires_at: String,
    #[validate(length(min = 1))]
    pub pppoe_username: String,
    #[validate(length(min = 1))]
    pub pppoe_password: String,
}

fn optional(value: &str) -> Option<String> {
    Some(value.to_string()).filter(|v| !v.is_empty())
}

fn parse_id(value: &str, field: &str) -> Result<i64, AppError> {
    value
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("{} is invalid", field)))
}

fn parse_date(value: &str, field: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(anyhow::anyhow!("{} is not a valid date", field)))
}

impl RegistrationForm {
    /// Defaults for an empty form: registered today, expiring a month later.
    pub fn blank(today: NaiveDate) -> Self {
        Self {
            registered_at: today.format("%Y-%m-%d").to_string(),
            expires_at: one_month_after(today)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            ..Default::default()
        }
    }

    fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: self.email.trim().to_string(),
            package_id: self.package_id.trim().to_string(),
            distribution_point_id: self.distribution_point_id.trim().to_string(),
            port_id: self.port_id.trim().to_string(),
            onu_id: self.onu_id.trim().to_string(),
            registered_at: self.registered_at.trim().to_string(),
            expires_at: self.expires_at.trim().to_string(),
            pppoe_username: self.pppoe_username.trim().to_string(),
            pppoe_password: self.pppoe_password.trim().to_string(),
        }
    }

    /// Trim, check required fields, then parse ids and dates.
    pub fn to_input(&self) -> Result<RegistrationInput, AppError> {
        let form = self.trimmed();
        form.validate()?;

        let port_id = match form.port_id.as_str() {
            "" => None,
            raw => Some(parse_id(raw, "Port")?),
        };

        Ok(RegistrationInput {
            name: form.name.clone(),
            address: form.address.clone(),
            phone: form.phone.clone(),
            email: optional(&form.email),
            package_id: parse_id(&form.package_id, "Package")?,
            distribution_point_id: parse_id(&form.distribution_point_id, "Distribution point")?,
            port_id,
            onu_id: optional(&form.onu_id),
            registered_at: parse_date(&form.registered_at, "Registration date")?,
            expires_at: parse_date(&form.expires_at, "Expiry date")?,
            pppoe_username: form.pppoe_username.clone(),
            pppoe_password: form.pppoe_password.clone(),
        })
    }
}

async fn render_form(
    state: &AppState,
    flash: Option<Flash>,
    form: RegistrationForm,
    redirect_to_list: bool,
) -> CustomerFormTemplate {
    let mut directory = CustomerDirectory::new(state.store.clone());

    let package_options = match directory.list_dropdown_options(DropdownKind::Packages).await {
        Ok(options) => dropdown_views(&options, &form.package_id),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load package options");
            Vec::new()
        }
    };
    let distribution_point_options = match directory
        .list_dropdown_options(DropdownKind::DistributionPoints)
        .await
    {
        Ok(options) => dropdown_views(&options, &form.distribution_point_id),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load distribution point options");
            Vec::new()
        }
    };

    CustomerFormTemplate {
        flash,
        form,
        package_options,
        distribution_point_options,
        redirect_to_list,
    }
}

/// `GET /customers/new`.
pub async fn new_customer_page(State(state): State<AppState>, session: Session) -> Response {
    let flash = take_flash(&session).await;
    render_form(&state, flash, RegistrationForm::blank(today()), false)
        .await
        .into_response()
}

/// `POST /customers/new`.
pub async fn create_customer(
    State(state): State<AppState>,
    Form(form): Form<RegistrationForm>,
) -> Response {
    let today = today();

    let result = match form.to_input() {
        Ok(input) => {
            CustomerRegistration::new(state.store.clone(), state.provisioner.clone())
                .register(&input, today)
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(registered) => {
            let flash = Flash::success(format!(
                "Customer {} added successfully!",
                registered.customer.name
            ));
            render_form(&state, Some(flash), RegistrationForm::blank(today), true)
                .await
                .into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Customer registration failed");
            let status = e.status_code();
            let flash = Flash::from_error(&e);
            (status, render_form(&state, Some(flash), form, false).await).into_response()
        }
    }
}
