//! Port for fire-and-forget push notification dispatch.

use crate::auth::UserId;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use async_trait::async_trait;

/// Outbound notification payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Recipient user identifier.
    pub user_id: UserId,
    /// Device push token, when the recipient registered one.
    pub device_token: Option<String>,
    /// Short headline.
    pub title: String,
    /// Human-readable body.
    pub message: String,
    /// Structured payload forwarded to the client application.
    pub data: Value,
}

/// Errors returned by notifier implementations.
#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    /// Delivery failed; callers log and move on.
    #[error("notification dispatch failed: {0}")]
    Dispatch(Arc<dyn std::error::Error + Send + Sync>),
}

impl NotifyError {
    /// Wraps a delivery error.
    pub fn dispatch(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Dispatch(Arc::new(err))
    }
}

/// Fire-and-forget notification delivery.
///
/// Dispatch runs strictly after the surrounding transaction commits.
/// Failures must never fail the enclosing operation: callers convert the
/// result to a boolean success flag and log the error.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one notification.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Dispatch`] when delivery fails.
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}
