//! Port contracts for the dispatch engine.
//!
//! Ports define infrastructure-agnostic interfaces used by dispatch
//! services: persistence, the external technician identity store, and
//! notification delivery, plus the engine's tunable configuration.

pub mod config;
pub mod directory;
pub mod notifier;
pub mod repository;

pub use config::DispatchConfig;
pub use directory::{DirectoryError, TechnicianDirectory, TechnicianRecord};
pub use notifier::{Notification, Notifier, NotifyError};
pub use repository::{
    DispatchRepository, DispatchRepositoryError, DispatchRepositoryResult, PageRequest, SortBy,
    SortOrder, StatusTally, TaskFilter, TaskPageData,
};

#[cfg(test)]
pub use directory::MockTechnicianDirectory;
