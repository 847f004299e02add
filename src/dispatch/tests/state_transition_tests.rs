//! Unit tests for task status transition validation.

use crate::auth::UserId;
use crate::dispatch::domain::{
    ClientAddress, DispatchDomainError, NewTaskData, ServiceTask, TaskPriority, TaskStatus,
    TaskTitle, TechnicianId,
};
use eyre::{bail, ensure};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

const ALL_STATUSES: [TaskStatus; 4] = [
    TaskStatus::Unassigned,
    TaskStatus::Assigned,
    TaskStatus::InProgress,
    TaskStatus::Completed,
];

#[fixture]
fn clock() -> DefaultClock {
    DefaultClock
}

#[fixture]
fn unassigned_task(clock: DefaultClock) -> Result<ServiceTask, DispatchDomainError> {
    Ok(ServiceTask::new(
        NewTaskData {
            title: TaskTitle::new("Boiler inspection")?,
            description: None,
            client_address: ClientAddress::new("12 Harbour Road")?,
            priority: TaskPriority::Medium,
            estimated_duration: None,
            created_by: UserId::new(),
        },
        &clock,
    ))
}

#[rstest]
#[case(TaskStatus::Unassigned, TaskStatus::Unassigned, false)]
#[case(TaskStatus::Unassigned, TaskStatus::Assigned, true)]
#[case(TaskStatus::Unassigned, TaskStatus::InProgress, false)]
#[case(TaskStatus::Unassigned, TaskStatus::Completed, false)]
#[case(TaskStatus::Assigned, TaskStatus::Unassigned, false)]
#[case(TaskStatus::Assigned, TaskStatus::Assigned, false)]
#[case(TaskStatus::Assigned, TaskStatus::InProgress, true)]
#[case(TaskStatus::Assigned, TaskStatus::Completed, false)]
#[case(TaskStatus::InProgress, TaskStatus::Unassigned, false)]
#[case(TaskStatus::InProgress, TaskStatus::Assigned, false)]
#[case(TaskStatus::InProgress, TaskStatus::InProgress, false)]
#[case(TaskStatus::InProgress, TaskStatus::Completed, true)]
#[case(TaskStatus::Completed, TaskStatus::Unassigned, false)]
#[case(TaskStatus::Completed, TaskStatus::Assigned, false)]
#[case(TaskStatus::Completed, TaskStatus::InProgress, false)]
#[case(TaskStatus::Completed, TaskStatus::Completed, false)]
fn can_transition_to_returns_expected(
    #[case] from: TaskStatus,
    #[case] to: TaskStatus,
    #[case] expected: bool,
) {
    assert_eq!(from.can_transition_to(to), expected);
}

#[rstest]
#[case(TaskStatus::Unassigned, false)]
#[case(TaskStatus::Assigned, false)]
#[case(TaskStatus::InProgress, false)]
#[case(TaskStatus::Completed, true)]
fn is_terminal_returns_expected(#[case] status: TaskStatus, #[case] expected: bool) {
    assert_eq!(status.is_terminal(), expected);
}

#[rstest]
fn new_task_starts_unassigned_without_technician(
    unassigned_task: Result<ServiceTask, DispatchDomainError>,
) -> eyre::Result<()> {
    let task = unassigned_task?;
    ensure!(task.status() == TaskStatus::Unassigned);
    ensure!(task.assigned_technician_id().is_none());
    ensure!(task.started_at().is_none());
    ensure!(task.updated_at() >= task.created_at());
    Ok(())
}

#[rstest]
fn start_records_timestamp_and_moves_to_in_progress(
    clock: DefaultClock,
    unassigned_task: Result<ServiceTask, DispatchDomainError>,
) -> eyre::Result<()> {
    let mut task = unassigned_task?;
    task.assign(TechnicianId::new(), &clock)?;
    let original_updated_at = task.updated_at();

    task.start(&clock)?;

    ensure!(task.status() == TaskStatus::InProgress);
    ensure!(task.started_at().is_some());
    ensure!(task.updated_at() >= original_updated_at);
    Ok(())
}

#[rstest]
fn start_from_unassigned_is_rejected(
    clock: DefaultClock,
    unassigned_task: Result<ServiceTask, DispatchDomainError>,
) -> eyre::Result<()> {
    let mut task = unassigned_task?;

    let result = task.start(&clock);
    let expected = Err(DispatchDomainError::InvalidStatusTransition {
        from: TaskStatus::Unassigned,
        to: TaskStatus::InProgress,
    });

    if result != expected {
        bail!("expected {expected:?}, got {result:?}");
    }
    ensure!(task.status() == TaskStatus::Unassigned);
    ensure!(task.started_at().is_none());
    Ok(())
}

#[rstest]
fn complete_before_start_is_rejected(
    clock: DefaultClock,
    unassigned_task: Result<ServiceTask, DispatchDomainError>,
) -> eyre::Result<()> {
    let mut task = unassigned_task?;
    task.assign(TechnicianId::new(), &clock)?;

    let result = task.complete(&clock);
    let expected = Err(DispatchDomainError::InvalidStatusTransition {
        from: TaskStatus::Assigned,
        to: TaskStatus::Completed,
    });

    if result != expected {
        bail!("expected {expected:?}, got {result:?}");
    }
    ensure!(task.status() == TaskStatus::Assigned);
    Ok(())
}

#[rstest]
fn completed_task_rejects_all_transitions(
    clock: DefaultClock,
    unassigned_task: Result<ServiceTask, DispatchDomainError>,
) -> eyre::Result<()> {
    let mut task = unassigned_task?;
    task.assign(TechnicianId::new(), &clock)?;
    task.start(&clock)?;
    task.complete(&clock)?;

    for target in ALL_STATUSES {
        ensure!(!TaskStatus::Completed.can_transition_to(target));
    }
    let start = task.start(&clock);
    ensure!(start.is_err());
    let complete = task.complete(&clock);
    ensure!(complete.is_err());
    ensure!(task.status() == TaskStatus::Completed);
    Ok(())
}

#[rstest]
fn assign_after_completion_is_rejected(
    clock: DefaultClock,
    unassigned_task: Result<ServiceTask, DispatchDomainError>,
) -> eyre::Result<()> {
    let mut task = unassigned_task?;
    task.assign(TechnicianId::new(), &clock)?;
    task.start(&clock)?;
    task.complete(&clock)?;
    let kept = task.assigned_technician_id();

    let result = task.assign(TechnicianId::new(), &clock);
    let expected = Err(DispatchDomainError::InvalidAssignment(
        TaskStatus::Completed,
    ));

    if result != expected {
        bail!("expected {expected:?}, got {result:?}");
    }
    ensure!(task.assigned_technician_id() == kept);
    Ok(())
}

#[rstest]
fn reassign_keeps_in_progress_status(
    clock: DefaultClock,
    unassigned_task: Result<ServiceTask, DispatchDomainError>,
) -> eyre::Result<()> {
    let mut task = unassigned_task?;
    task.assign(TechnicianId::new(), &clock)?;
    task.start(&clock)?;
    let replacement = TechnicianId::new();

    task.reassign(replacement, &clock)?;

    ensure!(task.status() == TaskStatus::InProgress);
    ensure!(task.assigned_technician_id() == Some(replacement));
    Ok(())
}

#[rstest]
fn reassign_unassigned_task_is_rejected(
    clock: DefaultClock,
    unassigned_task: Result<ServiceTask, DispatchDomainError>,
) -> eyre::Result<()> {
    let mut task = unassigned_task?;

    let result = task.reassign(TechnicianId::new(), &clock);
    let expected = Err(DispatchDomainError::InvalidAssignment(
        TaskStatus::Unassigned,
    ));

    if result != expected {
        bail!("expected {expected:?}, got {result:?}");
    }
    ensure!(task.assigned_technician_id().is_none());
    Ok(())
}
