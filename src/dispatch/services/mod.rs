//! Application services orchestrating the dispatch domain.

mod dispatch;
mod requests;
mod responses;

pub use dispatch::{
    DispatchService, DispatchServiceError, DispatchServiceResult, TechnicianValidationError,
};
pub use requests::{CreateTaskRequest, TaskQuery};
pub use responses::{
    AssignmentHistoryView, AssignmentOutcome, PageInfo, ReassignmentOutcome, StatusCounts,
    TaskPage, TaskView,
};
