//! Session-scoped page state: flash banners, the print snapshot and the
//! operator id set by the login flow.

use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use tower_sessions::Session;

use crate::models::PaymentReceipt;

const FLASH_KEY: &str = "flash";
const RECEIPT_KEY: &str = "invoice_print";
const USER_ID_KEY: &str = "user_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashKind {
    Success,
    Error,
}

/// One-shot banner carried across a redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    pub fn from_error(err: &AppError) -> Self {
        Self::error(err.user_message())
    }

    pub fn is_success(&self) -> bool {
        self.kind == FlashKind::Success
    }
}

pub async fn push_flash(session: &Session, flash: Flash) {
    if let Err(e) = session.insert(FLASH_KEY, flash).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// Read and clear the pending flash message.
pub async fn take_flash(session: &Session) -> Option<Flash> {
    session
        .remove::<Flash>(FLASH_KEY)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read flash message");
            None
        })
}

pub async fn store_receipt(session: &Session, receipt: &PaymentReceipt) -> Result<(), AppError> {
    session
        .insert(RECEIPT_KEY, receipt)
        .await
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to store receipt: {}", e)))
}

/// The last receipt; stays in the session so the print page can be reloaded.
pub async fn load_receipt(session: &Session) -> Option<PaymentReceipt> {
    session
        .get::<PaymentReceipt>(RECEIPT_KEY)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read receipt snapshot");
            None
        })
}

/// Operator recorded on payments. The login flow may store it as a number
/// or as a numeric string.
pub async fn current_user_id(session: &Session) -> Option<i64> {
    match session.get::<serde_json::Value>(USER_ID_KEY).await {
        Ok(Some(serde_json::Value::Number(n))) => n.as_i64(),
        Ok(Some(serde_json::Value::String(s))) => s.parse().ok(),
        _ => None,
    }
}
