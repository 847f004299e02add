//! In-memory repository for dispatch engine tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::dispatch::{
    domain::{
        Assignment, AssignmentHistory, AssignmentId, AssignmentStatus, LedgerTransition,
        ServiceTask, TaskId, TechnicianId,
    },
    ports::{
        DispatchRepository, DispatchRepositoryError, DispatchRepositoryResult, PageRequest,
        SortBy, SortOrder, StatusTally, TaskFilter, TaskPageData,
    },
};

/// Thread-safe in-memory dispatch repository.
///
/// A single lock is held across the precondition check and the mutation in
/// [`DispatchRepository::apply`], giving the same per-task serialization the
/// `PostgreSQL` adapter gets from its row lock.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDispatchRepository {
    state: Arc<RwLock<InMemoryDispatchState>>,
}

#[derive(Debug, Default)]
struct InMemoryDispatchState {
    tasks: HashMap<TaskId, ServiceTask>,
    assignments: HashMap<AssignmentId, Assignment>,
    active_index: HashMap<TaskId, AssignmentId>,
    history: Vec<AssignmentHistory>,
}

impl InMemoryDispatchRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read_state(
        &self,
    ) -> DispatchRepositoryResult<RwLockReadGuard<'_, InMemoryDispatchState>> {
        self.state.read().map_err(|err| {
            DispatchRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write_state(
        &self,
    ) -> DispatchRepositoryResult<RwLockWriteGuard<'_, InMemoryDispatchState>> {
        self.state.write().map_err(|err| {
            DispatchRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

/// Returns `true` when the task matches the priority and search criteria.
fn matches_search(task: &ServiceTask, filter: &TaskFilter) -> bool {
    if let Some(priority) = filter.priority {
        if task.priority() != priority {
            return false;
        }
    }
    let Some(needle) = filter.search.as_deref() else {
        return true;
    };
    let lowered = needle.to_lowercase();
    task.title().as_str().to_lowercase().contains(&lowered)
        || task
            .description()
            .is_some_and(|d| d.to_lowercase().contains(&lowered))
        || task
            .client_address()
            .as_str()
            .to_lowercase()
            .contains(&lowered)
}

fn compare_tasks(a: &ServiceTask, b: &ServiceTask, page: PageRequest) -> std::cmp::Ordering {
    let ordering = match page.sort_by {
        SortBy::CreatedAt => a.created_at().cmp(&b.created_at()),
        SortBy::Priority => a.priority().rank().cmp(&b.priority().rank()),
        SortBy::Title => a
            .title()
            .as_str()
            .to_lowercase()
            .cmp(&b.title().as_str().to_lowercase()),
        SortBy::Status => a.status().rank().cmp(&b.status().rank()),
    };
    match page.sort_order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

#[async_trait]
impl DispatchRepository for InMemoryDispatchRepository {
    async fn store_task(&self, task: &ServiceTask) -> DispatchRepositoryResult<()> {
        let mut state = self.write_state()?;
        if state.tasks.contains_key(&task.id()) {
            return Err(DispatchRepositoryError::DuplicateTask(task.id()));
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn find_task(&self, id: TaskId) -> DispatchRepositoryResult<Option<ServiceTask>> {
        let state = self.read_state()?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn list_tasks(
        &self,
        filter: &TaskFilter,
        page: PageRequest,
    ) -> DispatchRepositoryResult<TaskPageData> {
        let state = self.read_state()?;

        let mut status_counts = StatusTally::default();
        let mut matching: Vec<ServiceTask> = Vec::new();
        for task in state.tasks.values() {
            if !matches_search(task, filter) {
                continue;
            }
            // Tab counts ignore the status filter by design of the listing
            // contract; see `TaskFilter`.
            status_counts.bump(task.status());
            if filter.status.is_none_or(|status| task.status() == status) {
                matching.push(task.clone());
            }
        }

        matching.sort_by(|a, b| compare_tasks(a, b, page));
        let total_matching = u64::try_from(matching.len()).unwrap_or(u64::MAX);

        let offset = usize::try_from(
            u64::from(page.page.saturating_sub(1)) * u64::from(page.page_size),
        )
        .unwrap_or(usize::MAX);
        let tasks = matching
            .into_iter()
            .skip(offset)
            .take(usize::try_from(page.page_size).unwrap_or(usize::MAX))
            .collect();

        Ok(TaskPageData {
            tasks,
            total_matching,
            status_counts,
        })
    }

    async fn apply(&self, transition: &LedgerTransition) -> DispatchRepositoryResult<()> {
        let mut state = self.write_state()?;
        let task_id = transition.task().id();

        let current = state
            .tasks
            .get(&task_id)
            .ok_or(DispatchRepositoryError::TaskNotFound(task_id))?;
        if current.status() != transition.expected_status() {
            return Err(DispatchRepositoryError::ConcurrentModification(task_id));
        }
        // Checked for every transition: a reassignment keeps the task at
        // ASSIGNED, so a stale status-only snapshot can only be caught by
        // the active row it was computed from.
        if state.active_index.get(&task_id).copied() != transition.expected_active() {
            return Err(DispatchRepositoryError::ConcurrentModification(task_id));
        }

        // Preconditions hold; mutate everything under the same lock.
        if let Some(retired) = transition.retired() {
            state.assignments.insert(retired.id(), retired.clone());
            state.active_index.remove(&task_id);
        }
        if let Some(activated) = transition.activated() {
            state.assignments.insert(activated.id(), activated.clone());
            state.active_index.insert(task_id, activated.id());
        }
        if let Some(entry) = transition.history() {
            state.history.push(entry.clone());
        }
        state.tasks.insert(task_id, transition.task().clone());
        Ok(())
    }

    async fn active_assignment(
        &self,
        task_id: TaskId,
    ) -> DispatchRepositoryResult<Option<Assignment>> {
        let state = self.read_state()?;
        let assignment = state
            .active_index
            .get(&task_id)
            .and_then(|id| state.assignments.get(id))
            .cloned();
        Ok(assignment)
    }

    async fn history_for_task(
        &self,
        task_id: TaskId,
    ) -> DispatchRepositoryResult<Vec<AssignmentHistory>> {
        let state = self.read_state()?;
        Ok(state
            .history
            .iter()
            .filter(|entry| entry.task_id() == task_id)
            .cloned()
            .collect())
    }

    async fn active_count_for_technician(
        &self,
        technician_id: TechnicianId,
    ) -> DispatchRepositoryResult<u64> {
        let state = self.read_state()?;
        let count = state
            .assignments
            .values()
            .filter(|assignment| {
                assignment.technician_id() == technician_id
                    && assignment.status() == AssignmentStatus::Active
            })
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }
}
