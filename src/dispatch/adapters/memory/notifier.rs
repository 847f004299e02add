//! Recording and failing notifiers for tests.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::dispatch::ports::{Notification, Notifier, NotifyError};

/// Notifier that records every delivered notification.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<RwLock<Vec<Notification>>>,
}

impl RecordingNotifier {
    /// Creates a notifier with an empty delivery log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every notification delivered so far.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Dispatch`] when the log lock is poisoned.
    pub fn sent(&self) -> Result<Vec<Notification>, NotifyError> {
        let sent = self
            .sent
            .read()
            .map_err(|err| NotifyError::dispatch(std::io::Error::other(err.to_string())))?;
        Ok(sent.clone())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let mut sent = self
            .sent
            .write()
            .map_err(|err| NotifyError::dispatch(std::io::Error::other(err.to_string())))?;
        sent.push(notification.clone());
        Ok(())
    }
}

/// Notifier whose every delivery fails, for exercising the swallow path.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingNotifier;

impl FailingNotifier {
    /// Creates a failing notifier.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _notification: &Notification) -> Result<(), NotifyError> {
        Err(NotifyError::dispatch(std::io::Error::other(
            "push gateway rejected the delivery",
        )))
    }
}
