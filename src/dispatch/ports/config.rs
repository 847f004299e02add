//! Tunable limits for the dispatch engine.

use std::time::Duration;

/// Configuration for workload advisories, external lookups, and paging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Active-assignment count above which a workload warning is attached
    /// to assignment responses. Advisory only; never blocks.
    pub workload_warning_threshold: u64,
    /// Upper bound on the technician identity lookup. On expiry the whole
    /// operation fails with no partial writes.
    pub directory_timeout: Duration,
    /// Page size applied when a listing does not specify one.
    pub default_page_size: u32,
    /// Hard cap on requested page sizes.
    pub max_page_size: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workload_warning_threshold: 10,
            directory_timeout: Duration::from_secs(5),
            default_page_size: 50,
            max_page_size: 100,
        }
    }
}

impl DispatchConfig {
    /// Overrides the workload warning threshold.
    #[must_use]
    pub const fn with_workload_warning_threshold(mut self, threshold: u64) -> Self {
        self.workload_warning_threshold = threshold;
        self
    }

    /// Overrides the directory lookup timeout.
    #[must_use]
    pub const fn with_directory_timeout(mut self, timeout: Duration) -> Self {
        self.directory_timeout = timeout;
        self
    }
}
