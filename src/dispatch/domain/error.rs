//! Error types for dispatch domain validation and state transitions.

use super::task::TaskStatus;
use thiserror::Error;

/// Errors returned by dispatch domain rules.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchDomainError {
    /// Assignment or reassignment rejected: the task status forbids it, or
    /// a reassignment of in-progress work was submitted without a reason.
    #[error("invalid assignment for task in status '{0}'")]
    InvalidAssignment(TaskStatus),

    /// The requested status change is not a legal transition.
    #[error("illegal status transition from '{from}' to '{to}'")]
    InvalidStatusTransition {
        /// Status the task currently holds.
        from: TaskStatus,
        /// Status the caller requested.
        to: TaskStatus,
    },

    /// The task title is too short after trimming.
    #[error("task title must be at least {min} characters")]
    TitleTooShort {
        /// Minimum accepted length in characters.
        min: usize,
    },

    /// The client address is empty or whitespace-only.
    #[error("client address must not be blank")]
    BlankClientAddress,

    /// The estimated duration is zero or exceeds the persistable maximum.
    #[error("invalid estimated duration of {0} minutes, expected a positive value")]
    InvalidEstimatedDuration(u32),
}

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing task priorities from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task priority: {0}")]
pub struct ParseTaskPriorityError(pub String);

/// Error returned while parsing assignment statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown assignment status: {0}")]
pub struct ParseAssignmentStatusError(pub String);

/// Error returned while parsing history actions from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown history action: {0}")]
pub struct ParseHistoryActionError(pub String);
