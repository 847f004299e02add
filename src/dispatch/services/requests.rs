//! Request payloads for dispatch service operations.

use crate::dispatch::{
    domain::{TaskPriority, TaskStatus},
    ports::{SortBy, SortOrder},
};
use serde::Deserialize;

/// Request payload for creating a service task.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    title: String,
    description: Option<String>,
    client_address: String,
    priority: TaskPriority,
    estimated_duration: Option<u32>,
}

impl CreateTaskRequest {
    /// Creates a request with required fields.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        client_address: impl Into<String>,
        priority: TaskPriority,
    ) -> Self {
        Self {
            title: title.into(),
            description: None,
            client_address: client_address.into(),
            priority,
            estimated_duration: None,
        }
    }

    /// Sets the free-form description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the estimated duration in minutes.
    #[must_use]
    pub const fn with_estimated_duration(mut self, minutes: u32) -> Self {
        self.estimated_duration = Some(minutes);
        self
    }

    /// Returns the raw title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the raw description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the raw client address.
    #[must_use]
    pub fn client_address(&self) -> &str {
        &self.client_address
    }

    /// Returns the requested priority.
    #[must_use]
    pub const fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns the requested duration estimate in minutes, if any.
    #[must_use]
    pub const fn estimated_duration(&self) -> Option<u32> {
        self.estimated_duration
    }

    /// Consumes the request into its raw parts.
    #[must_use]
    pub fn into_parts(self) -> (String, Option<String>, String, TaskPriority, Option<u32>) {
        (
            self.title,
            self.description,
            self.client_address,
            self.priority,
            self.estimated_duration,
        )
    }
}

/// Listing criteria for `list_tasks`.
///
/// Omitted fields leave the corresponding dimension unconstrained; an
/// omitted page size falls back to the configured default and requested
/// sizes are capped at the configured maximum.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    /// Restrict to one lifecycle status.
    pub status: Option<TaskStatus>,
    /// Restrict to one priority.
    pub priority: Option<TaskPriority>,
    /// Case-insensitive substring search.
    pub search: Option<String>,
    /// Sort key.
    pub sort_by: SortBy,
    /// Sort direction.
    pub sort_order: SortOrder,
    /// 1-based page number; zero is treated as the first page.
    pub page: u32,
    /// Requested page size.
    pub page_size: Option<u32>,
}

impl TaskQuery {
    /// Creates an unconstrained query for the first page.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the listing to one status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restricts the listing to one priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the search needle.
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Sets the sort key and direction.
    #[must_use]
    pub const fn sorted(mut self, sort_by: SortBy, sort_order: SortOrder) -> Self {
        self.sort_by = sort_by;
        self.sort_order = sort_order;
        self
    }

    /// Selects a page.
    #[must_use]
    pub const fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Requests a page size, subject to the configured cap.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }
}
