//! Port for the external technician identity store.

use crate::auth::UserId;
use crate::dispatch::domain::TechnicianId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Technician record as reported by the identity store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechnicianRecord {
    /// Technician identifier.
    pub id: TechnicianId,
    /// User account backing the technician, used to address notifications.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Whether the technician is currently active.
    pub active: bool,
    /// Push notification token, if the technician registered a device.
    pub device_token: Option<String>,
}

/// Errors returned by technician directory implementations.
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    /// The identity store could not be reached or answered abnormally.
    #[error("identity store unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl DirectoryError {
    /// Wraps a transport or protocol error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}

/// External identity lookup for technicians.
///
/// Lookup is a precondition check, not a best-effort notification: callers
/// abort the surrounding operation on any failure, before any ledger write,
/// and never retry. Callers bound the call with a timeout so a lock is
/// never held across the network round trip.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TechnicianDirectory: Send + Sync {
    /// Looks up a technician by identifier.
    ///
    /// Returns `None` when the technician is unknown to the identity store.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Unavailable`] when the store cannot be
    /// queried.
    async fn find_technician(
        &self,
        id: TechnicianId,
    ) -> Result<Option<TechnicianRecord>, DirectoryError>;
}
