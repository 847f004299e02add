//! Domain model for the task assignment and lifecycle engine.
//!
//! The dispatch domain models service task creation, the task status state
//! machine, the append-plus-status-flip assignment ledger, and the audit
//! trail, while keeping all infrastructure concerns outside of the domain
//! boundary.

mod assignment;
mod error;
mod ids;
mod ledger;
mod task;

pub use assignment::{
    Assignment, AssignmentHistory, AssignmentStatus, HistoryAction, HistoryEntry,
    PersistedAssignmentData, PersistedHistoryData,
};
pub use error::{
    DispatchDomainError, ParseAssignmentStatusError, ParseHistoryActionError,
    ParseTaskPriorityError, ParseTaskStatusError,
};
pub use ids::{AssignmentId, ClientAddress, EstimatedDuration, HistoryId, TaskId, TaskTitle, TechnicianId};
pub use ledger::{LedgerTransition, RecordedAssignment};
pub use task::{NewTaskData, PersistedTaskData, ServiceTask, TaskPriority, TaskStatus};
