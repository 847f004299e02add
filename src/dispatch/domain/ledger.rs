//! Atomic unit-of-work values for assignment ledger transitions.
//!
//! A [`LedgerTransition`] is computed purely from a task snapshot and its
//! current active assignment, then handed to the repository to commit in a
//! single transaction. The transition carries the prior state it was
//! computed from so adapters can re-check it under a per-task lock and
//! reject writers that lost a race.

use super::{
    Assignment, AssignmentHistory, AssignmentId, DispatchDomainError, HistoryAction, HistoryEntry,
    ServiceTask, TaskStatus, TechnicianId,
};
use crate::auth::UserId;
use mockable::Clock;

/// One atomic ledger transition: all contained writes commit together or
/// not at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerTransition {
    expected_status: TaskStatus,
    expected_active: Option<AssignmentId>,
    task: ServiceTask,
    retired: Option<Assignment>,
    activated: Option<Assignment>,
    history: Option<AssignmentHistory>,
}

/// A transition produced by [`LedgerTransition::record`].
///
/// Recording an assignment always activates exactly one ledger row, so the
/// activation is carried alongside the transition instead of leaving
/// callers to re-extract it from an option that is always populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAssignment {
    transition: LedgerTransition,
    activated: Assignment,
}

impl RecordedAssignment {
    /// Returns the transition to commit through the repository.
    #[must_use]
    pub const fn transition(&self) -> &LedgerTransition {
        &self.transition
    }

    /// Returns the newly activated assignment.
    #[must_use]
    pub const fn activated(&self) -> &Assignment {
        &self.activated
    }

    /// Returns the retired prior assignment, if any.
    #[must_use]
    pub const fn retired(&self) -> Option<&Assignment> {
        self.transition.retired()
    }

    /// Returns the appended audit row.
    #[must_use]
    pub const fn history(&self) -> Option<&AssignmentHistory> {
        self.transition.history()
    }

    /// Returns the updated task snapshot to persist.
    #[must_use]
    pub const fn task(&self) -> &ServiceTask {
        self.transition.task()
    }
}

impl LedgerTransition {
    /// Records a new assignment for the task.
    ///
    /// When a prior `ACTIVE` assignment exists it is retired as
    /// `REASSIGNED` (never deleted) and the task is reassigned, keeping its
    /// status; otherwise the task is assigned for the first time. Exactly
    /// one history row is appended: `CREATED` for a first assignment,
    /// `REASSIGNED` otherwise, carrying the previous technician and the
    /// supplied reason verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchDomainError::InvalidAssignment`] when the task
    /// status forbids the operation, or when the task is `IN_PROGRESS` and
    /// no non-blank reason is supplied. Validation happens before any
    /// write is described, so a failed call leaves nothing to roll back.
    pub fn record(
        task: &ServiceTask,
        prior_active: Option<&Assignment>,
        technician_id: TechnicianId,
        actor: UserId,
        reason: Option<String>,
        clock: &impl Clock,
    ) -> Result<RecordedAssignment, DispatchDomainError> {
        let reason_is_blank = reason
            .as_deref()
            .is_none_or(|value| value.trim().is_empty());
        if task.status() == TaskStatus::InProgress && reason_is_blank {
            return Err(DispatchDomainError::InvalidAssignment(task.status()));
        }

        let mut next = task.clone();
        let (action, previous_technician_id) = match prior_active {
            Some(prior) => {
                next.reassign(technician_id, clock)?;
                (HistoryAction::Reassigned, Some(prior.technician_id()))
            }
            None => {
                next.assign(technician_id, clock)?;
                (HistoryAction::Created, None)
            }
        };

        let activated = Assignment::activate(task.id(), technician_id, actor, clock);
        let history = AssignmentHistory::record(
            HistoryEntry {
                assignment_id: activated.id(),
                task_id: task.id(),
                technician_id,
                previous_technician_id,
                action,
                action_by: actor,
                reason,
            },
            clock,
        );

        let transition = Self {
            expected_status: task.status(),
            expected_active: prior_active.map(Assignment::id),
            task: next,
            retired: prior_active.cloned().map(Assignment::into_reassigned),
            activated: Some(activated.clone()),
            history: Some(history),
        };
        Ok(RecordedAssignment {
            transition,
            activated,
        })
    }

    /// Marks work on the task as started.
    ///
    /// The active assignment is untouched and no history row is appended;
    /// the audit action set records assignment decisions, not progress.
    /// The transition still pins `active`: reassignment keeps the task at
    /// `ASSIGNED`, so the status alone cannot tell a stale snapshot from a
    /// current one.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchDomainError::InvalidStatusTransition`] unless the
    /// task is `ASSIGNED`.
    pub fn start(
        task: &ServiceTask,
        active: &Assignment,
        clock: &impl Clock,
    ) -> Result<Self, DispatchDomainError> {
        let mut next = task.clone();
        next.start(clock)?;
        Ok(Self {
            expected_status: task.status(),
            expected_active: Some(active.id()),
            task: next,
            retired: None,
            activated: None,
            history: None,
        })
    }

    /// Marks the task as completed under its active assignment.
    ///
    /// The active assignment is retired as `COMPLETED` and a `COMPLETED`
    /// history row is appended.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchDomainError::InvalidStatusTransition`] unless the
    /// task is `IN_PROGRESS`.
    pub fn complete(
        task: &ServiceTask,
        active: &Assignment,
        actor: UserId,
        clock: &impl Clock,
    ) -> Result<Self, DispatchDomainError> {
        let mut next = task.clone();
        next.complete(clock)?;

        let history = AssignmentHistory::record(
            HistoryEntry {
                assignment_id: active.id(),
                task_id: task.id(),
                technician_id: active.technician_id(),
                previous_technician_id: None,
                action: HistoryAction::Completed,
                action_by: actor,
                reason: None,
            },
            clock,
        );

        Ok(Self {
            expected_status: task.status(),
            expected_active: Some(active.id()),
            task: next,
            retired: Some(active.clone().into_completed()),
            activated: None,
            history: Some(history),
        })
    }

    /// Returns the task status the transition was computed from.
    #[must_use]
    pub const fn expected_status(&self) -> TaskStatus {
        self.expected_status
    }

    /// Returns the active assignment the transition was computed from.
    ///
    /// `None` means the transition expects no active assignment to exist.
    /// Adapters verify this against the stored active row for every
    /// transition, not only those that write ledger rows.
    #[must_use]
    pub const fn expected_active(&self) -> Option<AssignmentId> {
        self.expected_active
    }

    /// Returns the updated task snapshot to persist.
    #[must_use]
    pub const fn task(&self) -> &ServiceTask {
        &self.task
    }

    /// Returns the retired prior assignment, if any.
    #[must_use]
    pub const fn retired(&self) -> Option<&Assignment> {
        self.retired.as_ref()
    }

    /// Returns the newly activated assignment, if any.
    #[must_use]
    pub const fn activated(&self) -> Option<&Assignment> {
        self.activated.as_ref()
    }

    /// Returns the appended audit row, if any.
    #[must_use]
    pub const fn history(&self) -> Option<&AssignmentHistory> {
        self.history.as_ref()
    }
}
