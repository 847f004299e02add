//! Service task aggregate root and its lifecycle state machine.

use super::{
    ClientAddress, DispatchDomainError, EstimatedDuration, ParseTaskPriorityError,
    ParseTaskStatusError, TaskId, TaskTitle, TechnicianId,
};
use crate::auth::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status.
///
/// The legal transition matrix is defined in one place by
/// [`TaskStatus::can_transition_to`]: tasks move strictly forward through
/// `UNASSIGNED → ASSIGNED → IN_PROGRESS → COMPLETED`, never skipping a
/// state. Reassignment is not a status transition; it keeps the status at
/// `ASSIGNED` or `IN_PROGRESS` while replacing the technician.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Created by a dispatcher; no technician holds it.
    Unassigned,
    /// A technician has been assigned but work has not started.
    Assigned,
    /// The assigned technician is on site.
    InProgress,
    /// Work is finished; the task is immutable from here.
    Completed,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unassigned => "unassigned",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    /// Returns `true` when `target` is a legal next status.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Unassigned, Self::Assigned)
                | (Self::Assigned, Self::InProgress)
                | (Self::InProgress, Self::Completed)
        )
    }

    /// Returns `true` when no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns the lifecycle ordering rank, used for status sorting.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Unassigned => 0,
            Self::Assigned => 1,
            Self::InProgress => 2,
            Self::Completed => 3,
        }
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "unassigned" => Ok(Self::Unassigned),
            "assigned" => Ok(Self::Assigned),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Task urgency as selected by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    /// Urgent; surfaces first under priority sorting.
    High,
    /// Default urgency.
    Medium,
    /// Deferred work.
    Low,
}

impl TaskPriority {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Returns the urgency rank; higher means more urgent.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }
}

impl TryFrom<&str> for TaskPriority {
    type Error = ParseTaskPriorityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(ParseTaskPriorityError(value.to_owned())),
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Service task aggregate root.
///
/// The aggregate is the single source of truth for the *current* technician;
/// the assignment ledger records who held the task over time. Invariant: the
/// assigned technician is present iff the status is not `UNASSIGNED`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTask {
    id: TaskId,
    title: TaskTitle,
    description: Option<String>,
    client_address: ClientAddress,
    priority: TaskPriority,
    estimated_duration: Option<EstimatedDuration>,
    status: TaskStatus,
    assigned_technician_id: Option<TechnicianId>,
    started_at: Option<DateTime<Utc>>,
    created_by: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for constructing a new, unassigned task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskData {
    /// Validated task title.
    pub title: TaskTitle,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Validated client address.
    pub client_address: ClientAddress,
    /// Dispatcher-selected priority.
    pub priority: TaskPriority,
    /// Optional validated duration estimate.
    pub estimated_duration: Option<EstimatedDuration>,
    /// Dispatcher who created the task.
    pub created_by: UserId,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted title.
    pub title: TaskTitle,
    /// Persisted description, if any.
    pub description: Option<String>,
    /// Persisted client address.
    pub client_address: ClientAddress,
    /// Persisted priority.
    pub priority: TaskPriority,
    /// Persisted duration estimate, if any.
    pub estimated_duration: Option<EstimatedDuration>,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
    /// Persisted current technician, if any.
    pub assigned_technician_id: Option<TechnicianId>,
    /// Persisted work start timestamp, if any.
    pub started_at: Option<DateTime<Utc>>,
    /// Persisted creator identifier.
    pub created_by: UserId,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

impl ServiceTask {
    /// Creates a new unassigned task from validated dispatcher input.
    #[must_use]
    pub fn new(data: NewTaskData, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            title: data.title,
            description: data.description,
            client_address: data.client_address,
            priority: data.priority,
            estimated_duration: data.estimated_duration,
            status: TaskStatus::Unassigned,
            assigned_technician_id: None,
            started_at: None,
            created_by: data.created_by,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        debug_assert!(
            data.assigned_technician_id.is_some() != matches!(data.status, TaskStatus::Unassigned),
            "assigned technician must be present iff the task has left UNASSIGNED"
        );
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            client_address: data.client_address,
            priority: data.priority,
            estimated_duration: data.estimated_duration,
            status: data.status,
            assigned_technician_id: data.assigned_technician_id,
            started_at: data.started_at,
            created_by: data.created_by,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the free-form description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the client address.
    #[must_use]
    pub const fn client_address(&self) -> &ClientAddress {
        &self.client_address
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns the duration estimate, if any.
    #[must_use]
    pub const fn estimated_duration(&self) -> Option<EstimatedDuration> {
        self.estimated_duration
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the currently assigned technician, if any.
    #[must_use]
    pub const fn assigned_technician_id(&self) -> Option<TechnicianId> {
        self.assigned_technician_id
    }

    /// Returns the work start timestamp, if any.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Returns the creator identifier.
    #[must_use]
    pub const fn created_by(&self) -> UserId {
        self.created_by
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest lifecycle timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Assigns the task to a technician.
    ///
    /// Legal from `UNASSIGNED` (first assignment) and `ASSIGNED` (handing to
    /// a different technician before work starts); the status becomes
    /// `ASSIGNED` either way.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchDomainError::InvalidAssignment`] when the task is
    /// `IN_PROGRESS` or `COMPLETED`.
    pub fn assign(
        &mut self,
        technician_id: TechnicianId,
        clock: &impl Clock,
    ) -> Result<(), DispatchDomainError> {
        match self.status {
            TaskStatus::Unassigned | TaskStatus::Assigned => {
                self.status = TaskStatus::Assigned;
                self.assigned_technician_id = Some(technician_id);
                self.touch(clock);
                Ok(())
            }
            status => Err(DispatchDomainError::InvalidAssignment(status)),
        }
    }

    /// Replaces the assigned technician without changing the status.
    ///
    /// Legal from `ASSIGNED` and `IN_PROGRESS`; the status never falls back
    /// to `UNASSIGNED`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchDomainError::InvalidAssignment`] when the task is
    /// `UNASSIGNED` (nothing to replace) or `COMPLETED`.
    pub fn reassign(
        &mut self,
        technician_id: TechnicianId,
        clock: &impl Clock,
    ) -> Result<(), DispatchDomainError> {
        match self.status {
            TaskStatus::Assigned | TaskStatus::InProgress => {
                self.assigned_technician_id = Some(technician_id);
                self.touch(clock);
                Ok(())
            }
            status => Err(DispatchDomainError::InvalidAssignment(status)),
        }
    }

    /// Marks work as started, recording the start timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchDomainError::InvalidStatusTransition`] unless the
    /// task is `ASSIGNED`.
    pub fn start(&mut self, clock: &impl Clock) -> Result<(), DispatchDomainError> {
        self.require_transition(TaskStatus::InProgress)?;
        self.status = TaskStatus::InProgress;
        self.started_at = Some(clock.utc());
        self.touch(clock);
        Ok(())
    }

    /// Marks work as completed.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchDomainError::InvalidStatusTransition`] unless the
    /// task is `IN_PROGRESS`.
    pub fn complete(&mut self, clock: &impl Clock) -> Result<(), DispatchDomainError> {
        self.require_transition(TaskStatus::Completed)?;
        self.status = TaskStatus::Completed;
        self.touch(clock);
        Ok(())
    }

    /// Validates a status transition against the transition table.
    const fn require_transition(&self, target: TaskStatus) -> Result<(), DispatchDomainError> {
        if self.status.can_transition_to(target) {
            Ok(())
        } else {
            Err(DispatchDomainError::InvalidStatusTransition {
                from: self.status,
                to: target,
            })
        }
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
