//! Application startup and lifecycle management.

use crate::config::BackofficeConfig;
use crate::handlers::{
    customers::{change_status, delete_customer, list_customers},
    health::{health_check, metrics_handler, readiness_check},
    index,
    invoices::{list_invoices, payment_page, print_invoice, submit_payment},
    registration::{create_customer, new_customer_page},
};
use crate::services::{build_provisioner, init_metrics, BackofficeStore, Database, SubscriberProvisioner};
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::security_headers::security_headers_middleware;
use service_core::middleware::tracing::{request_id_middleware, REQUEST_ID_HEADER};
use std::net::SocketAddr;
use std::sync::Arc;
use time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BackofficeStore>,
    pub provisioner: Arc<dyn SubscriberProvisioner>,
    pub page_size: i64,
}

/// Build the full router: pages, probes, sessions and middleware.
pub fn build_router(state: AppState, secure_cookie: bool) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(secure_cookie)
        .with_expiry(Expiry::OnInactivity(Duration::hours(8)));

    Router::new()
        .route("/", get(index))
        .route("/customers", get(list_customers))
        .route("/customers/status", post(change_status))
        .route("/customers/new", get(new_customer_page).post(create_customer))
        .route("/customers/:id/delete", post(delete_customer))
        .route("/invoices", get(list_invoices))
        .route("/invoices/print", get(print_invoice))
        .route(
            "/invoices/:invoice_id/pay",
            get(payment_page).post(submit_payment),
        )
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: BackofficeConfig) -> Result<Self, AppError> {
        init_metrics();

        let db = Database::new(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;

        db.run_migrations().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            e
        })?;

        let provisioner = build_provisioner(&config.router).map_err(|e| {
            tracing::error!(error = %e, "Failed to build router client");
            AppError::ConfigError(anyhow::anyhow!("{}", e))
        })?;
        if !provisioner.is_enabled() {
            tracing::warn!("ROUTER_URL not set, PPPoE provisioning is disabled");
        }

        let state = AppState {
            store: Arc::new(db),
            provisioner,
            page_size: config.page_size,
        };

        let addr: SocketAddr = config.common.bind_address().parse().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "Invalid bind address {}: {}",
                config.common.bind_address(),
                e
            ))
        })?;
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port = port, "Backoffice listener bound");

        Ok(Self {
            port,
            listener,
            router: build_router(state, config.session_secure_cookie),
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        tracing::info!(
            service = "backoffice-service",
            version = env!("CARGO_PKG_VERSION"),
            port = self.port,
            "Service ready to accept connections"
        );

        axum::serve(self.listener, self.router)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "HTTP server error");
                std::io::Error::other(format!("HTTP server error: {}", e))
            })
    }
}
