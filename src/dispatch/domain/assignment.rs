//! Assignment ledger rows and the append-only audit trail.

use super::{
    AssignmentId, HistoryId, ParseAssignmentStatusError, ParseHistoryActionError, TaskId,
    TechnicianId,
};
use crate::auth::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of an assignment ledger row.
///
/// Rows are never deleted; a superseded or finished assignment is retired by
/// flipping its status, preserving the full history of who held a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    /// The technician currently responsible for the task.
    Active,
    /// Superseded by a newer assignment.
    Reassigned,
    /// The task was completed under this assignment.
    Completed,
    /// The assignment was cancelled.
    Cancelled,
}

impl AssignmentStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Reassigned => "reassigned",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl TryFrom<&str> for AssignmentStatus {
    type Error = ParseAssignmentStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "active" => Ok(Self::Active),
            "reassigned" => Ok(Self::Reassigned),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseAssignmentStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of the assignment ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    id: AssignmentId,
    task_id: TaskId,
    technician_id: TechnicianId,
    assigned_at: DateTime<Utc>,
    assigned_by: UserId,
    status: AssignmentStatus,
}

/// Parameter object for reconstructing a persisted assignment row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedAssignmentData {
    /// Persisted assignment identifier.
    pub id: AssignmentId,
    /// Persisted task identifier.
    pub task_id: TaskId,
    /// Persisted technician identifier.
    pub technician_id: TechnicianId,
    /// Persisted assignment timestamp.
    pub assigned_at: DateTime<Utc>,
    /// Persisted assigning actor.
    pub assigned_by: UserId,
    /// Persisted ledger status.
    pub status: AssignmentStatus,
}

impl Assignment {
    /// Creates a new `ACTIVE` assignment.
    #[must_use]
    pub fn activate(
        task_id: TaskId,
        technician_id: TechnicianId,
        assigned_by: UserId,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: AssignmentId::new(),
            task_id,
            technician_id,
            assigned_at: clock.utc(),
            assigned_by,
            status: AssignmentStatus::Active,
        }
    }

    /// Reconstructs an assignment from persisted storage.
    #[must_use]
    pub const fn from_persisted(data: PersistedAssignmentData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            technician_id: data.technician_id,
            assigned_at: data.assigned_at,
            assigned_by: data.assigned_by,
            status: data.status,
        }
    }

    /// Returns the assignment identifier.
    #[must_use]
    pub const fn id(&self) -> AssignmentId {
        self.id
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the technician identifier.
    #[must_use]
    pub const fn technician_id(&self) -> TechnicianId {
        self.technician_id
    }

    /// Returns the assignment timestamp.
    #[must_use]
    pub const fn assigned_at(&self) -> DateTime<Utc> {
        self.assigned_at
    }

    /// Returns the actor who recorded the assignment.
    #[must_use]
    pub const fn assigned_by(&self) -> UserId {
        self.assigned_by
    }

    /// Returns the ledger status.
    #[must_use]
    pub const fn status(&self) -> AssignmentStatus {
        self.status
    }

    /// Retires the row as superseded by a newer assignment.
    #[must_use]
    pub const fn into_reassigned(mut self) -> Self {
        self.status = AssignmentStatus::Reassigned;
        self
    }

    /// Retires the row because the task was completed under it.
    #[must_use]
    pub const fn into_completed(mut self) -> Self {
        self.status = AssignmentStatus::Completed;
        self
    }
}

/// Audit action recorded with each assignment history row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryAction {
    /// First assignment of the task.
    Created,
    /// The task changed hands.
    Reassigned,
    /// The task was completed.
    Completed,
    /// The assignment was cancelled.
    Cancelled,
}

impl HistoryAction {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Reassigned => "reassigned",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl TryFrom<&str> for HistoryAction {
    type Error = ParseHistoryActionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "created" => Ok(Self::Created),
            "reassigned" => Ok(Self::Reassigned),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseHistoryActionError(value.to_owned())),
        }
    }
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable audit record appended once per ledger transition.
///
/// History rows are never mutated or deleted; they are retained indefinitely
/// as the audit trail of assignment decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentHistory {
    id: HistoryId,
    assignment_id: AssignmentId,
    task_id: TaskId,
    technician_id: TechnicianId,
    previous_technician_id: Option<TechnicianId>,
    action: HistoryAction,
    action_by: UserId,
    action_at: DateTime<Utc>,
    reason: Option<String>,
}

/// Parameter object describing one audit entry before it is stamped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Ledger row the entry refers to.
    pub assignment_id: AssignmentId,
    /// Task the entry refers to.
    pub task_id: TaskId,
    /// Technician taking (or finishing) the assignment.
    pub technician_id: TechnicianId,
    /// Technician who previously held the task, if any.
    pub previous_technician_id: Option<TechnicianId>,
    /// Audit action.
    pub action: HistoryAction,
    /// Actor who triggered the transition.
    pub action_by: UserId,
    /// Dispatcher-supplied reason, carried verbatim.
    pub reason: Option<String>,
}

/// Parameter object for reconstructing a persisted history row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedHistoryData {
    /// Persisted history identifier.
    pub id: HistoryId,
    /// Persisted assignment identifier.
    pub assignment_id: AssignmentId,
    /// Persisted task identifier.
    pub task_id: TaskId,
    /// Persisted technician identifier.
    pub technician_id: TechnicianId,
    /// Persisted previous technician, if any.
    pub previous_technician_id: Option<TechnicianId>,
    /// Persisted audit action.
    pub action: HistoryAction,
    /// Persisted acting user.
    pub action_by: UserId,
    /// Persisted action timestamp.
    pub action_at: DateTime<Utc>,
    /// Persisted reason, if any.
    pub reason: Option<String>,
}

impl AssignmentHistory {
    /// Records a new audit entry stamped with the current clock time.
    #[must_use]
    pub fn record(entry: HistoryEntry, clock: &impl Clock) -> Self {
        Self {
            id: HistoryId::new(),
            assignment_id: entry.assignment_id,
            task_id: entry.task_id,
            technician_id: entry.technician_id,
            previous_technician_id: entry.previous_technician_id,
            action: entry.action,
            action_by: entry.action_by,
            action_at: clock.utc(),
            reason: entry.reason,
        }
    }

    /// Reconstructs a history row from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedHistoryData) -> Self {
        Self {
            id: data.id,
            assignment_id: data.assignment_id,
            task_id: data.task_id,
            technician_id: data.technician_id,
            previous_technician_id: data.previous_technician_id,
            action: data.action,
            action_by: data.action_by,
            action_at: data.action_at,
            reason: data.reason,
        }
    }

    /// Returns the history identifier.
    #[must_use]
    pub const fn id(&self) -> HistoryId {
        self.id
    }

    /// Returns the ledger row the entry refers to.
    #[must_use]
    pub const fn assignment_id(&self) -> AssignmentId {
        self.assignment_id
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the technician the action concerned.
    #[must_use]
    pub const fn technician_id(&self) -> TechnicianId {
        self.technician_id
    }

    /// Returns the previously assigned technician, if any.
    #[must_use]
    pub const fn previous_technician_id(&self) -> Option<TechnicianId> {
        self.previous_technician_id
    }

    /// Returns the audit action.
    #[must_use]
    pub const fn action(&self) -> HistoryAction {
        self.action
    }

    /// Returns the acting user.
    #[must_use]
    pub const fn action_by(&self) -> UserId {
        self.action_by
    }

    /// Returns the action timestamp.
    #[must_use]
    pub const fn action_at(&self) -> DateTime<Utc> {
        self.action_at
    }

    /// Returns the recorded reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}
