//! In-memory adapters for dispatch engine tests.

mod directory;
mod notifier;
mod repository;

pub use directory::InMemoryTechnicianDirectory;
pub use notifier::{FailingNotifier, RecordingNotifier};
pub use repository::InMemoryDispatchRepository;
