//! PPPoE subscriber provisioning on the access router.

pub mod mikrotik;

use async_trait::async_trait;
use serde::Serialize;
use service_core::error::AppError;
use std::sync::Arc;
use thiserror::Error;

use crate::config::RouterConfig;
pub use mikrotik::MikrotikRestClient;

#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to connect to router: {0}")]
    Connection(String),

    #[error("Router authentication failed: {0}")]
    Authentication(String),

    #[error("Router rejected the request: {0}")]
    Rejected(String),
}

impl From<ProvisioningError> for AppError {
    fn from(err: ProvisioningError) -> Self {
        AppError::BadGateway(err.to_string())
    }
}

/// PPPoE secret as sent to the router.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PppoeSecret {
    pub name: String,
    pub password: String,
    pub profile: String,
    pub service: String,
    pub comment: String,
}

impl PppoeSecret {
    pub fn for_customer(customer_name: &str, username: &str, password: &str, profile: &str) -> Self {
        Self {
            name: username.to_string(),
            password: password.to_string(),
            profile: profile.to_string(),
            service: "pppoe".to_string(),
            comment: format!("Customer: {}", customer_name),
        }
    }
}

/// What a create call actually did on the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningOutcome {
    Created,
    /// No router is configured; nothing was sent.
    Skipped,
}

#[async_trait]
pub trait SubscriberProvisioner: Send + Sync {
    async fn create_secret(
        &self,
        secret: &PppoeSecret,
    ) -> Result<ProvisioningOutcome, ProvisioningError>;

    /// Remove the secret with this username. Absent secrets are not an error.
    async fn remove_secret(&self, username: &str) -> Result<(), ProvisioningError>;

    fn is_enabled(&self) -> bool;
}

/// Used when no router is configured: registration proceeds locally only.
#[derive(Debug, Default, Clone)]
pub struct DisabledProvisioner;

#[async_trait]
impl SubscriberProvisioner for DisabledProvisioner {
    async fn create_secret(
        &self,
        secret: &PppoeSecret,
    ) -> Result<ProvisioningOutcome, ProvisioningError> {
        tracing::warn!(
            pppoe_username = %secret.name,
            "Router not configured, skipping PPPoE provisioning"
        );
        Ok(ProvisioningOutcome::Skipped)
    }

    async fn remove_secret(&self, username: &str) -> Result<(), ProvisioningError> {
        tracing::warn!(
            pppoe_username = %username,
            "Router not configured, skipping PPPoE secret removal"
        );
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Pick the router client for the given configuration.
pub fn build_provisioner(
    config: &RouterConfig,
) -> Result<Arc<dyn SubscriberProvisioner>, ProvisioningError> {
    if config.is_configured() {
        Ok(Arc::new(MikrotikRestClient::new(config)?))
    } else {
        Ok(Arc::new(DisabledProvisioner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    #[test]
    fn secret_carries_customer_comment() {
        let secret = PppoeSecret::for_customer("Siti Aminah", "siti01", "s3cret", "home-20m");
        assert_eq!(secret.service, "pppoe");
        assert_eq!(secret.comment, "Customer: Siti Aminah");
        assert_eq!(secret.profile, "home-20m");
    }

    #[tokio::test]
    async fn unconfigured_router_skips_provisioning() {
        let config = RouterConfig {
            url: None,
            username: String::new(),
            password: Secret::new(String::new()),
            timeout_secs: 5,
        };
        let provisioner = build_provisioner(&config).unwrap();
        assert!(!provisioner.is_enabled());

        let secret = PppoeSecret::for_customer("Budi", "budi", "pw", "basic");
        let outcome = provisioner.create_secret(&secret).await.unwrap();
        assert_eq!(outcome, ProvisioningOutcome::Skipped);
    }

    #[test]
    fn failures_surface_as_bad_gateway() {
        let err: AppError = ProvisioningError::Connection("timed out".to_string()).into();
        assert_eq!(
            err.user_message(),
            "Error: Failed to connect to router: timed out"
        );
    }
}
