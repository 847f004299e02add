//! Repository port for task, assignment, and audit persistence.

use crate::dispatch::domain::{
    Assignment, AssignmentHistory, LedgerTransition, ServiceTask, TaskId, TaskPriority, TaskStatus,
    TechnicianId,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for dispatch repository operations.
pub type DispatchRepositoryResult<T> = Result<T, DispatchRepositoryError>;

/// Filter criteria for task listings.
///
/// The per-status counts returned alongside a listing honour `priority` and
/// `search` but ignore `status`, so a status-tabbed view sees stable tab
/// counts while paging within one tab.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Restrict to one lifecycle status.
    pub status: Option<TaskStatus>,
    /// Restrict to one priority.
    pub priority: Option<TaskPriority>,
    /// Case-insensitive substring match over title, description, and client
    /// address.
    pub search: Option<String>,
}

/// Sort key for task listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    /// Creation timestamp.
    #[default]
    CreatedAt,
    /// Urgency rank (`HIGH` sorts above `MEDIUM` above `LOW` descending).
    Priority,
    /// Title, case-insensitive.
    Title,
    /// Lifecycle order (`UNASSIGNED` first ascending).
    Status,
}

/// Sort direction for task listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    #[default]
    Desc,
}

/// Page selection for task listings. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u32,
    /// Number of tasks per page.
    pub page_size: u32,
    /// Sort key.
    pub sort_by: SortBy,
    /// Sort direction.
    pub sort_order: SortOrder,
}

/// Number of tasks per lifecycle status within a filtered listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusTally {
    /// Tasks awaiting assignment.
    pub unassigned: u64,
    /// Tasks assigned but not started.
    pub assigned: u64,
    /// Tasks currently in progress.
    pub in_progress: u64,
    /// Completed tasks.
    pub completed: u64,
}

impl StatusTally {
    /// Increments the bucket for `status`.
    pub const fn bump(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::Unassigned => self.unassigned += 1,
            TaskStatus::Assigned => self.assigned += 1,
            TaskStatus::InProgress => self.in_progress += 1,
            TaskStatus::Completed => self.completed += 1,
        }
    }
}

/// One page of tasks together with listing metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPageData {
    /// Tasks on the requested page, in sort order.
    pub tasks: Vec<ServiceTask>,
    /// Total tasks matching the filter across all pages.
    pub total_matching: u64,
    /// Per-status counts (see [`TaskFilter`] for the counting rule).
    pub status_counts: StatusTally,
}

/// Persistence contract for the dispatch engine.
///
/// [`DispatchRepository::apply`] is the transactional boundary: all writes
/// described by a [`LedgerTransition`] commit together or not at all, and
/// implementations serialize transitions per task so the at-most-one-ACTIVE
/// invariant holds under concurrent callers.
#[async_trait]
pub trait DispatchRepository: Send + Sync {
    /// Stores a newly created task.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchRepositoryError::DuplicateTask`] when the task ID
    /// already exists.
    async fn store_task(&self, task: &ServiceTask) -> DispatchRepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_task(&self, id: TaskId) -> DispatchRepositoryResult<Option<ServiceTask>>;

    /// Returns one page of tasks matching `filter`.
    async fn list_tasks(
        &self,
        filter: &TaskFilter,
        page: PageRequest,
    ) -> DispatchRepositoryResult<TaskPageData>;

    /// Atomically commits a ledger transition.
    ///
    /// Implementations must take a per-task lock (or equivalent) before
    /// re-reading the task's status and active assignment, and verify both
    /// against the transition's expectations.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchRepositoryError::TaskNotFound`] when the task has
    /// vanished, or [`DispatchRepositoryError::ConcurrentModification`]
    /// when another writer changed the task since the transition was
    /// computed. Nothing is written in either case.
    async fn apply(&self, transition: &LedgerTransition) -> DispatchRepositoryResult<()>;

    /// Returns the task's `ACTIVE` assignment, if any.
    async fn active_assignment(
        &self,
        task_id: TaskId,
    ) -> DispatchRepositoryResult<Option<Assignment>>;

    /// Returns the task's full audit trail in chronological order.
    async fn history_for_task(
        &self,
        task_id: TaskId,
    ) -> DispatchRepositoryResult<Vec<AssignmentHistory>>;

    /// Counts a technician's `ACTIVE` assignments across all tasks.
    async fn active_count_for_technician(
        &self,
        technician_id: TechnicianId,
    ) -> DispatchRepositoryResult<u64>;
}

/// Errors returned by dispatch repository implementations.
#[derive(Debug, Clone, Error)]
pub enum DispatchRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// Another writer modified the task after the transition was computed.
    #[error("task {0} was modified concurrently")]
    ConcurrentModification(TaskId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl DispatchRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
