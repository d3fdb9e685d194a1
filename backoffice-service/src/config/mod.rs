//! Configuration module for backoffice-service.

use secrecy::{ExposeSecret, Secret};
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct BackofficeConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub page_size: i64,
    pub session_secure_cookie: bool,
    pub database: DatabaseConfig,
    pub router: RouterConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// RouterOS REST endpoint used to provision PPPoE secrets.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub url: Option<String>,
    pub username: String,
    pub password: Secret<String>,
    pub timeout_secs: u64,
}

impl RouterConfig {
    /// Provisioning is only attempted when a URL and a username are set.
    pub fn is_configured(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.trim().is_empty()) && !self.username.is_empty()
    }

    pub fn has_password(&self) -> bool {
        !self.password.expose_secret().is_empty()
    }
}

impl BackofficeConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        Ok(Self {
            common,
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "backoffice-service".to_string()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            page_size: env::var("PAGE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &i64| *n > 0)
                .unwrap_or(10),
            session_secure_cookie: env::var("SESSION_SECURE_COOKIE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").map_err(|_| {
                    AppError::ConfigError(anyhow::anyhow!("DATABASE_URL is required"))
                })?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
            },
            router: RouterConfig {
                url: env::var("ROUTER_URL").ok().filter(|s| !s.is_empty()),
                username: env::var("ROUTER_USERNAME").unwrap_or_default(),
                password: Secret::new(env::var("ROUTER_PASSWORD").unwrap_or_default()),
                timeout_secs: env::var("ROUTER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            },
        })
    }
}
