//! Orchestration service for the task assignment and lifecycle engine.

use crate::auth::{AccessError, AuthorizationGuard, Operation, Principal};
use crate::dispatch::{
    domain::{
        Assignment, ClientAddress, DispatchDomainError, EstimatedDuration, LedgerTransition,
        NewTaskData, RecordedAssignment, ServiceTask, TaskId, TaskStatus, TaskTitle, TechnicianId,
    },
    ports::{
        DirectoryError, DispatchConfig, DispatchRepository, DispatchRepositoryError, Notification,
        Notifier, PageRequest, TaskFilter, TechnicianDirectory, TechnicianRecord,
    },
};
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::requests::{CreateTaskRequest, TaskQuery};
use super::responses::{
    AssignmentHistoryView, AssignmentOutcome, PageInfo, ReassignmentOutcome, StatusCounts,
    TaskPage, TaskView,
};

/// Errors raised while validating a technician against the identity store.
#[derive(Debug, Clone, Error)]
pub enum TechnicianValidationError {
    /// The identity store does not know the technician.
    #[error("technician not found: {0}")]
    NotFound(TechnicianId),

    /// The technician exists but is not active.
    #[error("technician {0} is not active")]
    Inactive(TechnicianId),

    /// The identity store could not be queried.
    #[error(transparent)]
    Lookup(#[from] DirectoryError),

    /// The lookup exceeded the configured timeout.
    #[error("identity lookup timed out after {0:?}")]
    TimedOut(Duration),
}

/// Service-level errors for dispatch operations.
#[derive(Debug, Clone, Error)]
pub enum DispatchServiceError {
    /// The requested task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// A domain rule rejected the operation.
    #[error(transparent)]
    Domain(#[from] DispatchDomainError),

    /// The authorization guard rejected the caller.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// A technician acted on a task not assigned to them.
    #[error("caller is not the technician assigned to task {task_id}")]
    UnauthorizedTaskAccess {
        /// Task the caller tried to update.
        task_id: TaskId,
    },

    /// The technician precondition check failed.
    #[error(transparent)]
    TechnicianValidation(#[from] TechnicianValidationError),

    /// Persistence failed.
    #[error(transparent)]
    Repository(#[from] DispatchRepositoryError),
}

impl DispatchServiceError {
    /// Returns the HTTP status code conventionally mapped to this error.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::TaskNotFound(_) | Self::Repository(DispatchRepositoryError::TaskNotFound(_)) => {
                404
            }
            Self::Domain(_)
            | Self::TechnicianValidation(
                TechnicianValidationError::NotFound(_) | TechnicianValidationError::Inactive(_),
            ) => 400,
            Self::Access(err) => err.status(),
            Self::UnauthorizedTaskAccess { .. } => 403,
            Self::TechnicianValidation(
                TechnicianValidationError::Lookup(_) | TechnicianValidationError::TimedOut(_),
            ) => 502,
            Self::Repository(DispatchRepositoryError::ConcurrentModification(_)) => 409,
            Self::Repository(_) => 500,
        }
    }
}

/// Result type for dispatch service operations.
pub type DispatchServiceResult<T> = Result<T, DispatchServiceError>;

/// Orchestrates the authorization guard, technician validation, the
/// assignment ledger, the workload advisory, and response assembly.
///
/// Every mutating entry point takes the caller explicitly and runs the
/// guard before touching any state. Ledger transitions are computed in the
/// domain and committed atomically through the repository; notification
/// dispatch happens strictly after the commit and never fails the
/// operation.
#[derive(Clone)]
pub struct DispatchService<R, D, N, C>
where
    R: DispatchRepository,
    D: TechnicianDirectory,
    N: Notifier,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    directory: Arc<D>,
    notifier: Arc<N>,
    clock: Arc<C>,
    guard: AuthorizationGuard,
    config: DispatchConfig,
}

impl<R, D, N, C> DispatchService<R, D, N, C>
where
    R: DispatchRepository,
    D: TechnicianDirectory,
    N: Notifier,
    C: Clock + Send + Sync,
{
    /// Creates a service with default configuration.
    #[must_use]
    pub fn new(repository: Arc<R>, directory: Arc<D>, notifier: Arc<N>, clock: Arc<C>) -> Self {
        Self::with_config(repository, directory, notifier, clock, DispatchConfig::default())
    }

    /// Creates a service with explicit configuration.
    #[must_use]
    pub const fn with_config(
        repository: Arc<R>,
        directory: Arc<D>,
        notifier: Arc<N>,
        clock: Arc<C>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            repository,
            directory,
            notifier,
            clock,
            guard: AuthorizationGuard::new(),
            config,
        }
    }

    /// Creates a new service task in `UNASSIGNED` status.
    ///
    /// # Errors
    ///
    /// Returns an access error when the caller may not create tasks, or a
    /// domain error when title, address, or duration validation fails.
    pub async fn create_task(
        &self,
        caller: Option<&Principal>,
        request: CreateTaskRequest,
    ) -> DispatchServiceResult<TaskView> {
        let principal = self.guard.authorize(caller, Operation::CreateTask)?;
        let (title, description, client_address, priority, estimated_duration) =
            request.into_parts();

        let data = NewTaskData {
            title: TaskTitle::new(title)?,
            description,
            client_address: ClientAddress::new(client_address)?,
            priority,
            estimated_duration: estimated_duration.map(EstimatedDuration::new).transpose()?,
            created_by: principal.user_id(),
        };
        let task = ServiceTask::new(data, &*self.clock);
        self.repository.store_task(&task).await?;
        tracing::info!(task_id = %task.id(), priority = %task.priority(), "Service task created");
        Ok(TaskView::from_task(&task))
    }

    /// Assigns a task to a technician.
    ///
    /// Legal while the task is `UNASSIGNED` or `ASSIGNED`. The technician
    /// is validated against the identity store before any write; the
    /// workload advisory runs after the commit.
    ///
    /// # Errors
    ///
    /// Returns an access error for unauthorized callers,
    /// [`DispatchServiceError::TaskNotFound`] for unknown tasks, a
    /// technician validation error when the precondition check fails, or
    /// [`DispatchDomainError::InvalidAssignment`] when the task status
    /// forbids assignment.
    pub async fn assign_task(
        &self,
        caller: Option<&Principal>,
        task_id: TaskId,
        technician_id: TechnicianId,
    ) -> DispatchServiceResult<AssignmentOutcome> {
        let principal = self.guard.authorize(caller, Operation::AssignTask)?;
        let technician = self.validate_technician(technician_id).await?;

        let task = self.find_task(task_id).await?;
        if !matches!(task.status(), TaskStatus::Unassigned | TaskStatus::Assigned) {
            return Err(DispatchDomainError::InvalidAssignment(task.status()).into());
        }

        let prior = self.repository.active_assignment(task_id).await?;
        let recorded = LedgerTransition::record(
            &task,
            prior.as_ref(),
            technician_id,
            principal.user_id(),
            None,
            &*self.clock,
        )?;
        self.outcome_for(&recorded, &technician, "You have been assigned a new service task")
            .await
    }

    /// Reassigns a task to a different technician.
    ///
    /// Legal while the task is `ASSIGNED` or `IN_PROGRESS`; reassigning an
    /// in-progress task requires a non-blank reason, recorded verbatim in
    /// the audit trail. Returns the new assignment together with the
    /// task's full assignment history.
    ///
    /// # Errors
    ///
    /// Returns an access error for unauthorized callers,
    /// [`DispatchServiceError::TaskNotFound`] for unknown tasks, a
    /// technician validation error when the precondition check fails, or
    /// [`DispatchDomainError::InvalidAssignment`] when the task has no
    /// prior assignment, is already completed, or lacks a required reason.
    pub async fn reassign_task(
        &self,
        caller: Option<&Principal>,
        task_id: TaskId,
        new_technician_id: TechnicianId,
        reason: Option<String>,
    ) -> DispatchServiceResult<ReassignmentOutcome> {
        let principal = self.guard.authorize(caller, Operation::ReassignTask)?;
        let technician = self.validate_technician(new_technician_id).await?;

        let task = self.find_task(task_id).await?;
        let prior = self.repository.active_assignment(task_id).await?;
        // A task never assigned before has nothing to reassign.
        if prior.is_none() {
            return Err(DispatchDomainError::InvalidAssignment(task.status()).into());
        }

        let recorded = LedgerTransition::record(
            &task,
            prior.as_ref(),
            new_technician_id,
            principal.user_id(),
            reason,
            &*self.clock,
        )?;
        let previous_technician_id = recorded.retired().map(Assignment::technician_id);
        let assignment = self
            .outcome_for(&recorded, &technician, "A service task has been reassigned to you")
            .await?;

        let history = self
            .repository
            .history_for_task(task_id)
            .await?
            .iter()
            .map(AssignmentHistoryView::from_history)
            .collect();

        Ok(ReassignmentOutcome {
            assignment,
            previous_technician_id,
            history,
        })
    }

    /// Updates a task's status on behalf of its assigned technician.
    ///
    /// `IN_PROGRESS` starts the work; `COMPLETED` finishes it and retires
    /// the active assignment. Only the technician currently assigned to
    /// the task may report progress; the `ADMIN` role does not override
    /// this ownership rule.
    ///
    /// # Errors
    ///
    /// Returns an access error for unauthorized callers,
    /// [`DispatchServiceError::TaskNotFound`] for unknown tasks,
    /// [`DispatchServiceError::UnauthorizedTaskAccess`] when the caller is
    /// not the assigned technician, or
    /// [`DispatchDomainError::InvalidStatusTransition`] for illegal
    /// targets.
    pub async fn update_task_status(
        &self,
        caller: Option<&Principal>,
        task_id: TaskId,
        target: TaskStatus,
    ) -> DispatchServiceResult<TaskView> {
        let principal = self.guard.authorize(caller, Operation::UpdateTaskStatus)?;
        let task = self.find_task(task_id).await?;

        let claimed = principal
            .technician_id()
            .ok_or(DispatchServiceError::UnauthorizedTaskAccess { task_id })?;
        if task.assigned_technician_id() != Some(claimed) {
            return Err(DispatchServiceError::UnauthorizedTaskAccess { task_id });
        }

        let transition = match target {
            TaskStatus::InProgress => {
                let active = self.required_active_assignment(task_id).await?;
                LedgerTransition::start(&task, &active, &*self.clock)?
            }
            TaskStatus::Completed => {
                let active = self.required_active_assignment(task_id).await?;
                LedgerTransition::complete(&task, &active, principal.user_id(), &*self.clock)?
            }
            other => {
                return Err(DispatchDomainError::InvalidStatusTransition {
                    from: task.status(),
                    to: other,
                }
                .into());
            }
        };

        self.repository.apply(&transition).await?;
        tracing::info!(
            task_id = %task_id,
            status = %transition.task().status(),
            "Task status updated"
        );
        Ok(TaskView::from_task(transition.task()))
    }

    /// Lists tasks with filtering, sorting, pagination, and per-status
    /// counts.
    ///
    /// Any authenticated principal may list tasks. The page size defaults
    /// to the configured value and is capped at the configured maximum.
    ///
    /// # Errors
    ///
    /// Returns an access error for unauthenticated callers or a repository
    /// error when the listing query fails.
    pub async fn list_tasks(
        &self,
        caller: Option<&Principal>,
        query: TaskQuery,
    ) -> DispatchServiceResult<TaskPage> {
        self.guard.authorize(caller, Operation::ListTasks)?;

        let page_size = query
            .page_size
            .unwrap_or(self.config.default_page_size)
            .min(self.config.max_page_size)
            .max(1);
        let page = query.page.max(1);

        let filter = TaskFilter {
            status: query.status,
            priority: query.priority,
            search: query.search,
        };
        let request = PageRequest {
            page,
            page_size,
            sort_by: query.sort_by,
            sort_order: query.sort_order,
        };
        let data = self.repository.list_tasks(&filter, request).await?;

        let total_pages = data.total_matching.div_ceil(u64::from(page_size));
        Ok(TaskPage {
            tasks: data.tasks.iter().map(TaskView::from_task).collect(),
            pagination: PageInfo {
                page,
                page_size,
                total_items: data.total_matching,
                total_pages,
            },
            status_counts: StatusCounts::from_tally(data.status_counts),
        })
    }

    /// Commits a recorded transition, computes the workload advisory, and
    /// dispatches the post-commit notification.
    async fn outcome_for(
        &self,
        recorded: &RecordedAssignment,
        technician: &TechnicianRecord,
        headline: &str,
    ) -> DispatchServiceResult<AssignmentOutcome> {
        self.repository.apply(recorded.transition()).await?;

        let activated = recorded.activated();
        let workload = self
            .repository
            .active_count_for_technician(activated.technician_id())
            .await?;
        let warning = self.workload_warning(activated.technician_id(), workload);

        tracing::info!(
            task_id = %activated.task_id(),
            technician_id = %activated.technician_id(),
            workload,
            "Assignment recorded"
        );

        let notified = self
            .notify_assignment(technician, activated.task_id(), headline)
            .await;
        tracing::debug!(task_id = %activated.task_id(), notified, "Assignment notification");

        Ok(AssignmentOutcome::from_parts(
            activated,
            recorded.task().status(),
            workload,
            warning,
        ))
    }

    /// Loads the active assignment a status change is pinned to.
    ///
    /// An `ASSIGNED` or `IN_PROGRESS` task always has one; its absence
    /// means a concurrent transition retired it after the task snapshot
    /// was taken.
    async fn required_active_assignment(
        &self,
        task_id: TaskId,
    ) -> DispatchServiceResult<Assignment> {
        let active = self.repository.active_assignment(task_id).await?;
        Ok(active.ok_or(DispatchRepositoryError::ConcurrentModification(task_id))?)
    }

    /// Builds the advisory warning when the workload exceeds the threshold.
    fn workload_warning(&self, technician_id: TechnicianId, workload: u64) -> Option<String> {
        let threshold = self.config.workload_warning_threshold;
        (workload > threshold).then(|| {
            format!(
                "Technician {technician_id} now has {workload} active assignments, \
                 exceeding the threshold of {threshold}"
            )
        })
    }

    /// Validates the technician against the identity store with a bounded
    /// timeout, before any transaction begins.
    async fn validate_technician(
        &self,
        technician_id: TechnicianId,
    ) -> Result<TechnicianRecord, TechnicianValidationError> {
        let timeout = self.config.directory_timeout;
        let lookup = tokio::time::timeout(timeout, self.directory.find_technician(technician_id));
        let record = match lookup.await {
            Err(_elapsed) => return Err(TechnicianValidationError::TimedOut(timeout)),
            Ok(result) => result?,
        };
        match record {
            None => Err(TechnicianValidationError::NotFound(technician_id)),
            Some(found) if !found.active => Err(TechnicianValidationError::Inactive(technician_id)),
            Some(found) => Ok(found),
        }
    }

    /// Fire-and-forget delivery of an assignment notification.
    ///
    /// Runs strictly after the transaction commits; failures are logged
    /// and folded into the returned success flag, never failing the
    /// enclosing operation.
    async fn notify_assignment(
        &self,
        technician: &TechnicianRecord,
        task_id: TaskId,
        headline: &str,
    ) -> bool {
        let notification = Notification {
            user_id: technician.user_id,
            device_token: technician.device_token.clone(),
            title: headline.to_owned(),
            message: format!("Task {task_id} is now assigned to {}", technician.name),
            data: serde_json::json!({ "taskId": task_id }),
        };
        match self.notifier.notify(&notification).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(
                    task_id = %task_id,
                    technician_id = %technician.id,
                    error = %err,
                    "Assignment notification failed"
                );
                false
            }
        }
    }

    async fn find_task(&self, task_id: TaskId) -> DispatchServiceResult<ServiceTask> {
        self.repository
            .find_task(task_id)
            .await?
            .ok_or(DispatchServiceError::TaskNotFound(task_id))
    }
}
