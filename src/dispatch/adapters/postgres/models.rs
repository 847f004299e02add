//! Diesel row models and domain conversions for dispatch persistence.

use super::schema::{assignment_history, assignments, service_tasks};
use crate::auth::UserId;
use crate::dispatch::{
    domain::{
        Assignment, AssignmentHistory, AssignmentId, AssignmentStatus, ClientAddress,
        EstimatedDuration, HistoryAction, HistoryId, PersistedAssignmentData, PersistedHistoryData,
        PersistedTaskData, ServiceTask, TaskId, TaskPriority, TaskStatus, TaskTitle, TechnicianId,
    },
    ports::DispatchRepositoryError,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for service tasks.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = service_tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Task title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Client street address.
    pub client_address: String,
    /// Stored priority.
    pub priority: String,
    /// Stored lifecycle status.
    pub status: String,
    /// Currently assigned technician, if any.
    pub assigned_technician_id: Option<uuid::Uuid>,
    /// Estimated duration in minutes, if given.
    pub estimated_duration_minutes: Option<i32>,
    /// Work start timestamp, if started.
    pub started_at: Option<DateTime<Utc>>,
    /// Creator identifier.
    pub created_by: uuid::Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for service tasks.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = service_tasks)]
pub struct NewTaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Task title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Client street address.
    pub client_address: String,
    /// Stored priority.
    pub priority: String,
    /// Stored lifecycle status.
    pub status: String,
    /// Currently assigned technician, if any.
    pub assigned_technician_id: Option<uuid::Uuid>,
    /// Estimated duration in minutes, if given.
    pub estimated_duration_minutes: Option<i32>,
    /// Work start timestamp, if started.
    pub started_at: Option<DateTime<Utc>>,
    /// Creator identifier.
    pub created_by: uuid::Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Update model carrying the columns every lifecycle write touches.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = service_tasks)]
pub struct TaskChanges {
    /// Stored lifecycle status.
    pub status: String,
    /// Currently assigned technician, if any.
    pub assigned_technician_id: Option<Option<uuid::Uuid>>,
    /// Work start timestamp, if started.
    pub started_at: Option<Option<DateTime<Utc>>>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for assignment ledger entries.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = assignments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AssignmentRow {
    /// Assignment identifier.
    pub id: uuid::Uuid,
    /// Task identifier.
    pub task_id: uuid::Uuid,
    /// Technician identifier.
    pub technician_id: uuid::Uuid,
    /// Assignment timestamp.
    pub assigned_at: DateTime<Utc>,
    /// Assigning actor.
    pub assigned_by: uuid::Uuid,
    /// Stored ledger status.
    pub status: String,
}

/// Insert model for assignment ledger entries.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = assignments)]
pub struct NewAssignmentRow {
    /// Assignment identifier.
    pub id: uuid::Uuid,
    /// Task identifier.
    pub task_id: uuid::Uuid,
    /// Technician identifier.
    pub technician_id: uuid::Uuid,
    /// Assignment timestamp.
    pub assigned_at: DateTime<Utc>,
    /// Assigning actor.
    pub assigned_by: uuid::Uuid,
    /// Stored ledger status.
    pub status: String,
}

/// Query result row for audit trail entries.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = assignment_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct HistoryRow {
    /// History identifier.
    pub id: uuid::Uuid,
    /// Assignment identifier.
    pub assignment_id: uuid::Uuid,
    /// Task identifier.
    pub task_id: uuid::Uuid,
    /// Technician identifier.
    pub technician_id: uuid::Uuid,
    /// Previous technician, if any.
    pub previous_technician_id: Option<uuid::Uuid>,
    /// Stored audit action.
    pub action: String,
    /// Acting user.
    pub action_by: uuid::Uuid,
    /// Action timestamp.
    pub action_at: DateTime<Utc>,
    /// Recorded reason, if any.
    pub reason: Option<String>,
}

/// Insert model for audit trail entries.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = assignment_history)]
pub struct NewHistoryRow {
    /// History identifier.
    pub id: uuid::Uuid,
    /// Assignment identifier.
    pub assignment_id: uuid::Uuid,
    /// Task identifier.
    pub task_id: uuid::Uuid,
    /// Technician identifier.
    pub technician_id: uuid::Uuid,
    /// Previous technician, if any.
    pub previous_technician_id: Option<uuid::Uuid>,
    /// Stored audit action.
    pub action: String,
    /// Acting user.
    pub action_by: uuid::Uuid,
    /// Action timestamp.
    pub action_at: DateTime<Utc>,
    /// Recorded reason, if any.
    pub reason: Option<String>,
}

/// Builds an insert row from a task aggregate.
pub fn task_to_new_row(task: &ServiceTask) -> NewTaskRow {
    NewTaskRow {
        id: task.id().into_inner(),
        title: task.title().as_str().to_owned(),
        description: task.description().map(str::to_owned),
        client_address: task.client_address().as_str().to_owned(),
        priority: task.priority().as_str().to_owned(),
        status: task.status().as_str().to_owned(),
        assigned_technician_id: task.assigned_technician_id().map(TechnicianId::into_inner),
        estimated_duration_minutes: task
            .estimated_duration()
            .map(|d| i32::try_from(d.minutes()).unwrap_or(i32::MAX)),
        started_at: task.started_at(),
        created_by: task.created_by().into_inner(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    }
}

/// Builds the changeset a lifecycle write applies to the task row.
pub fn task_to_changes(task: &ServiceTask) -> TaskChanges {
    TaskChanges {
        status: task.status().as_str().to_owned(),
        assigned_technician_id: Some(
            task.assigned_technician_id().map(TechnicianId::into_inner),
        ),
        started_at: Some(task.started_at()),
        updated_at: task.updated_at(),
    }
}

/// Reconstructs a task aggregate from a stored row.
///
/// # Errors
///
/// Returns a persistence error when a stored enum or scalar no longer
/// passes domain validation.
pub fn row_to_task(row: TaskRow) -> Result<ServiceTask, DispatchRepositoryError> {
    let status =
        TaskStatus::try_from(row.status.as_str()).map_err(DispatchRepositoryError::persistence)?;
    let priority = TaskPriority::try_from(row.priority.as_str())
        .map_err(DispatchRepositoryError::persistence)?;
    let title =
        TaskTitle::new(row.title).map_err(DispatchRepositoryError::persistence)?;
    let client_address =
        ClientAddress::new(row.client_address).map_err(DispatchRepositoryError::persistence)?;
    let estimated_duration = row
        .estimated_duration_minutes
        .map(|minutes| {
            u32::try_from(minutes)
                .map_err(DispatchRepositoryError::persistence)
                .and_then(|m| {
                    EstimatedDuration::new(m).map_err(DispatchRepositoryError::persistence)
                })
        })
        .transpose()?;

    Ok(ServiceTask::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(row.id),
        title,
        description: row.description,
        client_address,
        priority,
        estimated_duration,
        status,
        assigned_technician_id: row.assigned_technician_id.map(TechnicianId::from_uuid),
        started_at: row.started_at,
        created_by: UserId::from_uuid(row.created_by),
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

/// Builds an insert row from an assignment.
pub fn assignment_to_new_row(assignment: &Assignment) -> NewAssignmentRow {
    NewAssignmentRow {
        id: assignment.id().into_inner(),
        task_id: assignment.task_id().into_inner(),
        technician_id: assignment.technician_id().into_inner(),
        assigned_at: assignment.assigned_at(),
        assigned_by: assignment.assigned_by().into_inner(),
        status: assignment.status().as_str().to_owned(),
    }
}

/// Reconstructs an assignment from a stored row.
///
/// # Errors
///
/// Returns a persistence error when the stored status is unknown.
pub fn row_to_assignment(row: AssignmentRow) -> Result<Assignment, DispatchRepositoryError> {
    let status = AssignmentStatus::try_from(row.status.as_str())
        .map_err(DispatchRepositoryError::persistence)?;
    Ok(Assignment::from_persisted(PersistedAssignmentData {
        id: AssignmentId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        technician_id: TechnicianId::from_uuid(row.technician_id),
        assigned_at: row.assigned_at,
        assigned_by: UserId::from_uuid(row.assigned_by),
        status,
    }))
}

/// Builds an insert row from an audit entry.
pub fn history_to_new_row(entry: &AssignmentHistory) -> NewHistoryRow {
    NewHistoryRow {
        id: entry.id().into_inner(),
        assignment_id: entry.assignment_id().into_inner(),
        task_id: entry.task_id().into_inner(),
        technician_id: entry.technician_id().into_inner(),
        previous_technician_id: entry.previous_technician_id().map(TechnicianId::into_inner),
        action: entry.action().as_str().to_owned(),
        action_by: entry.action_by().into_inner(),
        action_at: entry.action_at(),
        reason: entry.reason().map(str::to_owned),
    }
}

/// Reconstructs an audit entry from a stored row.
///
/// # Errors
///
/// Returns a persistence error when the stored action is unknown.
pub fn row_to_history(row: HistoryRow) -> Result<AssignmentHistory, DispatchRepositoryError> {
    let action = HistoryAction::try_from(row.action.as_str())
        .map_err(DispatchRepositoryError::persistence)?;
    Ok(AssignmentHistory::from_persisted(PersistedHistoryData {
        id: HistoryId::from_uuid(row.id),
        assignment_id: AssignmentId::from_uuid(row.assignment_id),
        task_id: TaskId::from_uuid(row.task_id),
        technician_id: TechnicianId::from_uuid(row.technician_id),
        previous_technician_id: row.previous_technician_id.map(TechnicianId::from_uuid),
        action,
        action_by: UserId::from_uuid(row.action_by),
        action_at: row.action_at,
        reason: row.reason,
    }))
}
