//! `PostgreSQL` repository implementation for dispatch persistence.

use super::{
    models::{
        AssignmentRow, HistoryRow, TaskRow, assignment_to_new_row, history_to_new_row,
        row_to_assignment, row_to_history, row_to_task, task_to_changes, task_to_new_row,
    },
    schema::{assignment_history, assignments, service_tasks},
};
use crate::dispatch::{
    domain::{
        Assignment, AssignmentHistory, AssignmentId, AssignmentStatus, LedgerTransition,
        ServiceTask, TaskId, TaskStatus, TechnicianId,
    },
    ports::{
        DispatchRepository, DispatchRepositoryError, DispatchRepositoryResult, PageRequest,
        SortBy, SortOrder, StatusTally, TaskFilter, TaskPageData,
    },
};
use async_trait::async_trait;
use diesel::dsl::sql;
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::Integer;

/// `PostgreSQL` connection pool type used by dispatch adapters.
pub type DispatchPgPool = Pool<ConnectionManager<PgConnection>>;

impl From<DieselError> for DispatchRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

/// `PostgreSQL`-backed dispatch repository.
///
/// [`DispatchRepository::apply`] runs in one transaction that locks the
/// task row with `SELECT ... FOR UPDATE` before re-checking the
/// transition's expected state, so concurrent assignments of the same task
/// are serialized and losers fail without writing.
#[derive(Debug, Clone)]
pub struct PgDispatchRepository {
    pool: DispatchPgPool,
}

impl PgDispatchRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: DispatchPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> DispatchRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> DispatchRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(DispatchRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(DispatchRepositoryError::persistence)?
    }
}

type BoxedTaskQuery<'a> = service_tasks::BoxedQuery<'a, Pg>;

/// Escapes `%`, `_`, and the escape character itself for a LIKE pattern.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Builds the filtered base query; the status filter is optional so the
/// per-status tallies can ignore it.
fn filtered_query(filter: &TaskFilter, include_status: bool) -> BoxedTaskQuery<'_> {
    let mut query = service_tasks::table.into_boxed();
    if include_status {
        if let Some(status) = filter.status {
            query = query.filter(service_tasks::status.eq(status.as_str()));
        }
    }
    if let Some(priority) = filter.priority {
        query = query.filter(service_tasks::priority.eq(priority.as_str()));
    }
    if let Some(search) = filter.search.as_deref() {
        let pattern = format!("%{}%", escape_like(search));
        query = query.filter(
            service_tasks::title
                .ilike(pattern.clone())
                .nullable()
                .or(service_tasks::description.ilike(pattern.clone()))
                .or(service_tasks::client_address.ilike(pattern).nullable()),
        );
    }
    query
}

fn sorted_query(query: BoxedTaskQuery<'_>, page: PageRequest) -> BoxedTaskQuery<'_> {
    match (page.sort_by, page.sort_order) {
        (SortBy::CreatedAt, SortOrder::Asc) => query.order(service_tasks::created_at.asc()),
        (SortBy::CreatedAt, SortOrder::Desc) => query.order(service_tasks::created_at.desc()),
        (SortBy::Priority, SortOrder::Asc) => query.order(priority_rank().asc()),
        (SortBy::Priority, SortOrder::Desc) => query.order(priority_rank().desc()),
        (SortBy::Title, SortOrder::Asc) => query.order(lower_title().asc()),
        (SortBy::Title, SortOrder::Desc) => query.order(lower_title().desc()),
        (SortBy::Status, SortOrder::Asc) => query.order(status_rank().asc()),
        (SortBy::Status, SortOrder::Desc) => query.order(status_rank().desc()),
    }
}

fn priority_rank() -> diesel::expression::SqlLiteral<Integer> {
    sql::<Integer>("CASE priority WHEN 'high' THEN 3 WHEN 'medium' THEN 2 ELSE 1 END")
}

fn status_rank() -> diesel::expression::SqlLiteral<Integer> {
    sql::<Integer>(
        "CASE status WHEN 'unassigned' THEN 0 WHEN 'assigned' THEN 1 \
         WHEN 'in_progress' THEN 2 ELSE 3 END",
    )
}

fn lower_title() -> diesel::expression::SqlLiteral<diesel::sql_types::Text> {
    sql::<diesel::sql_types::Text>("lower(title)")
}

fn load_status_tally(
    connection: &mut PgConnection,
    filter: &TaskFilter,
) -> DispatchRepositoryResult<StatusTally> {
    let statuses: Vec<String> = filtered_query(filter, false)
        .select(service_tasks::status)
        .load(connection)?;

    let mut tally = StatusTally::default();
    for stored in &statuses {
        let status = TaskStatus::try_from(stored.as_str())
            .map_err(DispatchRepositoryError::persistence)?;
        tally.bump(status);
    }
    Ok(tally)
}

fn find_active_assignment_id(
    connection: &mut PgConnection,
    task_id: TaskId,
) -> DispatchRepositoryResult<Option<AssignmentId>> {
    let id: Option<uuid::Uuid> = assignments::table
        .filter(assignments::task_id.eq(task_id.into_inner()))
        .filter(assignments::status.eq(AssignmentStatus::Active.as_str()))
        .select(assignments::id)
        .first(connection)
        .optional()?;
    Ok(id.map(AssignmentId::from_uuid))
}

fn apply_transition(
    connection: &mut PgConnection,
    transition: &LedgerTransition,
) -> DispatchRepositoryResult<()> {
    let task_id = transition.task().id();
    connection.transaction::<_, DispatchRepositoryError, _>(|tx| {
        // Lock the task row for the duration of the transaction; this
        // serializes ledger transitions per task.
        let locked: Option<TaskRow> = service_tasks::table
            .find(task_id.into_inner())
            .select(TaskRow::as_select())
            .for_update()
            .first(tx)
            .optional()?;
        let row = locked.ok_or(DispatchRepositoryError::TaskNotFound(task_id))?;

        let stored_status = TaskStatus::try_from(row.status.as_str())
            .map_err(DispatchRepositoryError::persistence)?;
        if stored_status != transition.expected_status() {
            return Err(DispatchRepositoryError::ConcurrentModification(task_id));
        }
        // Checked for every transition: a reassignment keeps the task at
        // ASSIGNED, so a stale status-only snapshot can only be caught by
        // the active row it was computed from.
        if find_active_assignment_id(tx, task_id)? != transition.expected_active() {
            return Err(DispatchRepositoryError::ConcurrentModification(task_id));
        }

        if let Some(retired) = transition.retired() {
            diesel::update(assignments::table.find(retired.id().into_inner()))
                .set(assignments::status.eq(retired.status().as_str()))
                .execute(tx)?;
        }
        if let Some(activated) = transition.activated() {
            diesel::insert_into(assignments::table)
                .values(assignment_to_new_row(activated))
                .execute(tx)?;
        }
        if let Some(entry) = transition.history() {
            diesel::insert_into(assignment_history::table)
                .values(history_to_new_row(entry))
                .execute(tx)?;
        }
        diesel::update(service_tasks::table.find(task_id.into_inner()))
            .set(task_to_changes(transition.task()))
            .execute(tx)?;

        Ok(())
    })
}

#[async_trait]
impl DispatchRepository for PgDispatchRepository {
    async fn store_task(&self, task: &ServiceTask) -> DispatchRepositoryResult<()> {
        let task_id = task.id();
        let new_row = task_to_new_row(task);

        self.run_blocking(move |connection| {
            diesel::insert_into(service_tasks::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        DispatchRepositoryError::DuplicateTask(task_id)
                    }
                    other => DispatchRepositoryError::persistence(other),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_task(&self, id: TaskId) -> DispatchRepositoryResult<Option<ServiceTask>> {
        self.run_blocking(move |connection| {
            let row = service_tasks::table
                .find(id.into_inner())
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn list_tasks(
        &self,
        filter: &TaskFilter,
        page: PageRequest,
    ) -> DispatchRepositoryResult<TaskPageData> {
        let filter = filter.clone();
        self.run_blocking(move |connection| {
            let status_counts = load_status_tally(connection, &filter)?;

            let total: i64 = filtered_query(&filter, true).count().get_result(connection)?;
            let total_matching =
                u64::try_from(total).map_err(DispatchRepositoryError::persistence)?;

            let offset = i64::from(page.page.saturating_sub(1)) * i64::from(page.page_size);
            let rows: Vec<TaskRow> = sorted_query(filtered_query(&filter, true), page)
                .select(TaskRow::as_select())
                .limit(i64::from(page.page_size))
                .offset(offset)
                .load(connection)?;
            let tasks = rows
                .into_iter()
                .map(row_to_task)
                .collect::<DispatchRepositoryResult<Vec<_>>>()?;

            Ok(TaskPageData {
                tasks,
                total_matching,
                status_counts,
            })
        })
        .await
    }

    async fn apply(&self, transition: &LedgerTransition) -> DispatchRepositoryResult<()> {
        let transition = transition.clone();
        self.run_blocking(move |connection| apply_transition(connection, &transition))
            .await
    }

    async fn active_assignment(
        &self,
        task_id: TaskId,
    ) -> DispatchRepositoryResult<Option<Assignment>> {
        self.run_blocking(move |connection| {
            let row: Option<AssignmentRow> = assignments::table
                .filter(assignments::task_id.eq(task_id.into_inner()))
                .filter(assignments::status.eq(AssignmentStatus::Active.as_str()))
                .select(AssignmentRow::as_select())
                .first(connection)
                .optional()?;
            row.map(row_to_assignment).transpose()
        })
        .await
    }

    async fn history_for_task(
        &self,
        task_id: TaskId,
    ) -> DispatchRepositoryResult<Vec<AssignmentHistory>> {
        self.run_blocking(move |connection| {
            let rows: Vec<HistoryRow> = assignment_history::table
                .filter(assignment_history::task_id.eq(task_id.into_inner()))
                .order(assignment_history::action_at.asc())
                .select(HistoryRow::as_select())
                .load(connection)?;
            rows.into_iter().map(row_to_history).collect()
        })
        .await
    }

    async fn active_count_for_technician(
        &self,
        technician_id: TechnicianId,
    ) -> DispatchRepositoryResult<u64> {
        self.run_blocking(move |connection| {
            let count: i64 = assignments::table
                .filter(assignments::technician_id.eq(technician_id.into_inner()))
                .filter(assignments::status.eq(AssignmentStatus::Active.as_str()))
                .count()
                .get_result(connection)?;
            u64::try_from(count).map_err(DispatchRepositoryError::persistence)
        })
        .await
    }
}
