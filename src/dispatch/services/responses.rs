//! Response payloads assembled by dispatch service operations.
//!
//! Field names serialize in camelCase to match the REST surface consumed
//! by the dispatcher and technician UIs.

use crate::auth::UserId;
use crate::dispatch::{
    domain::{
        Assignment, AssignmentHistory, AssignmentId, HistoryAction, HistoryId, ServiceTask,
        TaskId, TaskPriority, TaskStatus, TechnicianId,
    },
    ports::StatusTally,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Task representation returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    /// Task identifier.
    pub id: TaskId,
    /// Task title.
    pub title: String,
    /// Free-form description, if any.
    pub description: Option<String>,
    /// Client street address.
    pub client_address: String,
    /// Task priority.
    pub priority: TaskPriority,
    /// Estimated duration in minutes, if given.
    pub estimated_duration: Option<u32>,
    /// Lifecycle status.
    pub status: TaskStatus,
    /// Currently assigned technician, if any.
    pub assigned_technician_id: Option<TechnicianId>,
    /// Work start timestamp, if started.
    pub started_at: Option<DateTime<Utc>>,
    /// Dispatcher who created the task.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl TaskView {
    /// Builds a view from the task aggregate.
    #[must_use]
    pub fn from_task(task: &ServiceTask) -> Self {
        Self {
            id: task.id(),
            title: task.title().as_str().to_owned(),
            description: task.description().map(str::to_owned),
            client_address: task.client_address().as_str().to_owned(),
            priority: task.priority(),
            estimated_duration: task.estimated_duration().map(|d| d.minutes()),
            status: task.status(),
            assigned_technician_id: task.assigned_technician_id(),
            started_at: task.started_at(),
            created_by: task.created_by(),
            created_at: task.created_at(),
        }
    }
}

/// Result of assigning a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentOutcome {
    /// Newly activated assignment.
    pub assignment_id: AssignmentId,
    /// Task identifier.
    pub task_id: TaskId,
    /// Assigned technician.
    pub technician_id: TechnicianId,
    /// Assignment timestamp.
    pub assigned_at: DateTime<Utc>,
    /// Actor who recorded the assignment.
    pub assigned_by: UserId,
    /// Task status after the assignment.
    pub task_status: TaskStatus,
    /// Technician's active-assignment count after the operation.
    pub technician_workload: u64,
    /// Advisory overload warning; attached when the workload exceeds the
    /// configured threshold and never blocks the operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workload_warning: Option<String>,
}

impl AssignmentOutcome {
    /// Builds an outcome from the activated assignment and workload data.
    #[must_use]
    pub fn from_parts(
        assignment: &Assignment,
        task_status: TaskStatus,
        technician_workload: u64,
        workload_warning: Option<String>,
    ) -> Self {
        Self {
            assignment_id: assignment.id(),
            task_id: assignment.task_id(),
            technician_id: assignment.technician_id(),
            assigned_at: assignment.assigned_at(),
            assigned_by: assignment.assigned_by(),
            task_status,
            technician_workload,
            workload_warning,
        }
    }
}

/// One audit trail entry returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentHistoryView {
    /// History row identifier.
    pub id: HistoryId,
    /// Ledger row the entry refers to.
    pub assignment_id: AssignmentId,
    /// Task identifier.
    pub task_id: TaskId,
    /// Technician the action concerned.
    pub technician_id: TechnicianId,
    /// Previously assigned technician, if any.
    pub previous_technician_id: Option<TechnicianId>,
    /// Audit action.
    pub action: HistoryAction,
    /// Acting user.
    pub action_by: UserId,
    /// Action timestamp.
    pub action_at: DateTime<Utc>,
    /// Recorded reason, if any.
    pub reason: Option<String>,
}

impl AssignmentHistoryView {
    /// Builds a view from an audit record.
    #[must_use]
    pub fn from_history(entry: &AssignmentHistory) -> Self {
        Self {
            id: entry.id(),
            assignment_id: entry.assignment_id(),
            task_id: entry.task_id(),
            technician_id: entry.technician_id(),
            previous_technician_id: entry.previous_technician_id(),
            action: entry.action(),
            action_by: entry.action_by(),
            action_at: entry.action_at(),
            reason: entry.reason().map(str::to_owned),
        }
    }
}

/// Result of reassigning a task: the assignment outcome plus the task's
/// full audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReassignmentOutcome {
    /// The newly recorded assignment.
    #[serde(flatten)]
    pub assignment: AssignmentOutcome,
    /// Technician who held the task before this reassignment.
    pub previous_technician_id: Option<TechnicianId>,
    /// Full chronological assignment history for the task.
    pub history: Vec<AssignmentHistoryView>,
}

/// Pagination metadata for a task listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// 1-based page number served.
    pub page: u32,
    /// Page size applied after defaulting and capping.
    pub page_size: u32,
    /// Total tasks matching the filter.
    pub total_items: u64,
    /// Total pages at the applied page size.
    pub total_pages: u64,
}

/// Per-status task counts for a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    /// Tasks awaiting assignment.
    pub unassigned: u64,
    /// Tasks assigned but not started.
    pub assigned: u64,
    /// Tasks currently in progress.
    pub in_progress: u64,
    /// Completed tasks.
    pub completed: u64,
}

impl StatusCounts {
    /// Builds client-facing counts from the repository tally.
    #[must_use]
    pub const fn from_tally(tally: StatusTally) -> Self {
        Self {
            unassigned: tally.unassigned,
            assigned: tally.assigned,
            in_progress: tally.in_progress,
            completed: tally.completed,
        }
    }
}

/// One page of tasks with pagination and per-status counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPage {
    /// Tasks on this page, in sort order.
    pub tasks: Vec<TaskView>,
    /// Pagination metadata.
    pub pagination: PageInfo,
    /// Per-status counts over the filtered set (status filter excluded).
    pub status_counts: StatusCounts,
}
