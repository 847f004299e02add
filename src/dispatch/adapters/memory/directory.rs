//! In-memory technician directory for tests and tooling.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::auth::UserId;
use crate::dispatch::{
    domain::TechnicianId,
    ports::{DirectoryError, TechnicianDirectory, TechnicianRecord},
};

/// Thread-safe in-memory technician directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTechnicianDirectory {
    records: Arc<RwLock<HashMap<TechnicianId, TechnicianRecord>>>,
}

impl InMemoryTechnicianDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an active technician and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Unavailable`] when the directory lock is
    /// poisoned.
    pub fn register(&self, name: impl Into<String>) -> Result<TechnicianId, DirectoryError> {
        let id = TechnicianId::new();
        self.insert(TechnicianRecord {
            id,
            user_id: UserId::new(),
            name: name.into(),
            active: true,
            device_token: None,
        })?;
        Ok(id)
    }

    /// Inserts or replaces a technician record.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Unavailable`] when the directory lock is
    /// poisoned.
    pub fn insert(&self, record: TechnicianRecord) -> Result<(), DirectoryError> {
        let mut records = self
            .records
            .write()
            .map_err(|err| DirectoryError::unavailable(std::io::Error::other(err.to_string())))?;
        records.insert(record.id, record);
        Ok(())
    }

    /// Marks a technician inactive when present.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Unavailable`] when the directory lock is
    /// poisoned.
    pub fn deactivate(&self, id: TechnicianId) -> Result<(), DirectoryError> {
        let mut records = self
            .records
            .write()
            .map_err(|err| DirectoryError::unavailable(std::io::Error::other(err.to_string())))?;
        if let Some(record) = records.get_mut(&id) {
            record.active = false;
        }
        Ok(())
    }
}

#[async_trait]
impl TechnicianDirectory for InMemoryTechnicianDirectory {
    async fn find_technician(
        &self,
        id: TechnicianId,
    ) -> Result<Option<TechnicianRecord>, DirectoryError> {
        let records = self
            .records
            .read()
            .map_err(|err| DirectoryError::unavailable(std::io::Error::other(err.to_string())))?;
        Ok(records.get(&id).cloned())
    }
}
