//! RouterOS REST client (`/rest/ppp/secret`).

use super::{PppoeSecret, ProvisioningError, ProvisioningOutcome, SubscriberProvisioner};
use crate::config::RouterConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

pub struct MikrotikRestClient {
    client: Client,
    base_url: String,
    username: String,
    password: Secret<String>,
}

/// Error body returned by RouterOS, e.g.
/// `{"error":400,"message":"Bad Request","detail":"failure: secret with the same name already exists"}`.
#[derive(Debug, Deserialize)]
struct RouterOsError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SecretEntry {
    #[serde(rename = ".id")]
    id: String,
}

impl MikrotikRestClient {
    pub fn new(config: &RouterConfig) -> Result<Self, ProvisioningError> {
        let base_url = config
            .url
            .as_deref()
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ProvisioningError::Configuration("ROUTER_URL is not set".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProvisioningError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn secrets_url(&self) -> String {
        format!("{}/rest/ppp/secret", self.base_url)
    }

    async fn error_from(response: reqwest::Response) -> ProvisioningError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<RouterOsError>(&body)
            .map(|e| e.detail.unwrap_or(e.message))
            .unwrap_or(body);

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            ProvisioningError::Authentication(format!("{} {}", status.as_u16(), detail))
        } else {
            ProvisioningError::Rejected(format!("{} {}", status.as_u16(), detail))
        }
    }
}

#[async_trait]
impl SubscriberProvisioner for MikrotikRestClient {
    async fn create_secret(
        &self,
        secret: &PppoeSecret,
    ) -> Result<ProvisioningOutcome, ProvisioningError> {
        let response = self
            .client
            .put(self.secrets_url())
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .json(secret)
            .send()
            .await
            .map_err(|e| ProvisioningError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            let err = Self::error_from(response).await;
            tracing::error!(pppoe_username = %secret.name, error = %err, "PPPoE secret creation failed");
            return Err(err);
        }

        tracing::info!(
            pppoe_username = %secret.name,
            profile = %secret.profile,
            "PPPoE secret created on router"
        );

        Ok(ProvisioningOutcome::Created)
    }

    async fn remove_secret(&self, username: &str) -> Result<(), ProvisioningError> {
        let response = self
            .client
            .get(self.secrets_url())
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .query(&[("name", username)])
            .send()
            .await
            .map_err(|e| ProvisioningError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let entries: Vec<SecretEntry> = response
            .json()
            .await
            .map_err(|e| ProvisioningError::Rejected(format!("Unexpected response: {}", e)))?;

        for entry in entries {
            let response = self
                .client
                .delete(format!("{}/{}", self.secrets_url(), entry.id))
                .basic_auth(&self.username, Some(self.password.expose_secret()))
                .send()
                .await
                .map_err(|e| ProvisioningError::Connection(e.to_string()))?;

            if !response.status().is_success() {
                return Err(Self::error_from(response).await);
            }

            tracing::info!(pppoe_username = %username, secret_id = %entry.id, "PPPoE secret removed from router");
        }

        Ok(())
    }

    fn is_enabled(&self) -> bool {
        true
    }
}
