//! Orchestration tests for the dispatch service.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{AccessError, Principal, Role, UserId};
use crate::dispatch::{
    adapters::memory::{
        FailingNotifier, InMemoryDispatchRepository, InMemoryTechnicianDirectory,
        RecordingNotifier,
    },
    domain::{DispatchDomainError, TaskId, TaskPriority, TaskStatus, TechnicianId},
    ports::{DirectoryError, TechnicianDirectory, TechnicianRecord},
    services::{
        CreateTaskRequest, DispatchService, DispatchServiceError, TaskView,
        TechnicianValidationError,
    },
};
use eyre::{OptionExt, bail, ensure};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

type TestService = DispatchService<
    InMemoryDispatchRepository,
    InMemoryTechnicianDirectory,
    RecordingNotifier,
    DefaultClock,
>;

struct Harness {
    service: TestService,
    directory: Arc<InMemoryTechnicianDirectory>,
    notifier: Arc<RecordingNotifier>,
}

#[fixture]
fn harness() -> Harness {
    let directory = Arc::new(InMemoryTechnicianDirectory::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let service = DispatchService::new(
        Arc::new(InMemoryDispatchRepository::new()),
        Arc::clone(&directory),
        Arc::clone(&notifier),
        Arc::new(DefaultClock),
    );
    Harness {
        service,
        directory,
        notifier,
    }
}

fn dispatcher() -> Principal {
    Principal::new(UserId::new(), [Role::Dispatcher])
}

fn admin() -> Principal {
    Principal::new(UserId::new(), [Role::Admin])
}

fn technician(technician_id: TechnicianId) -> Principal {
    Principal::new(UserId::new(), [Role::Technician]).with_technician_id(technician_id)
}

fn create_request() -> CreateTaskRequest {
    CreateTaskRequest::new("Service boiler", "7 Quayside", TaskPriority::Medium)
}

async fn created_task(harness: &Harness) -> eyre::Result<TaskView> {
    let view = harness
        .service
        .create_task(Some(&dispatcher()), create_request())
        .await?;
    Ok(view)
}

async fn assigned_task(harness: &Harness) -> eyre::Result<(TaskView, TechnicianId)> {
    let technician_id = harness
        .directory
        .register("Sam Park")
        .map_err(|err| eyre::eyre!("{err}"))?;
    let task = created_task(harness).await?;
    harness
        .service
        .assign_task(Some(&dispatcher()), task.id, technician_id)
        .await?;
    Ok((task, technician_id))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_task_requires_authentication(harness: Harness) {
    let result = harness.service.create_task(None, create_request()).await;
    assert!(matches!(
        result,
        Err(DispatchServiceError::Access(AccessError::Unauthenticated))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_task_rejects_technician_role(harness: Harness) -> eyre::Result<()> {
    let caller = technician(TechnicianId::new());
    let result = harness
        .service
        .create_task(Some(&caller), create_request())
        .await;

    let Err(err) = result else {
        bail!("technician should not create tasks");
    };
    ensure!(matches!(
        err,
        DispatchServiceError::Access(AccessError::Forbidden { .. })
    ));
    ensure!(err.status() == 403);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_task_allows_admin_override(harness: Harness) -> eyre::Result<()> {
    let view = harness
        .service
        .create_task(Some(&admin()), create_request())
        .await?;
    ensure!(view.status == TaskStatus::Unassigned);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_task_rejects_short_title(harness: Harness) -> eyre::Result<()> {
    let request = CreateTaskRequest::new("ab", "7 Quayside", TaskPriority::Low);
    let result = harness
        .service
        .create_task(Some(&dispatcher()), request)
        .await;

    let Err(err) = result else {
        bail!("short title should be rejected");
    };
    ensure!(matches!(
        err,
        DispatchServiceError::Domain(DispatchDomainError::TitleTooShort { .. })
    ));
    ensure!(err.status() == 400);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn assign_task_rejects_unknown_task(harness: Harness) -> eyre::Result<()> {
    let technician_id = harness
        .directory
        .register("Sam Park")
        .map_err(|err| eyre::eyre!("{err}"))?;
    let missing = TaskId::new();

    let result = harness
        .service
        .assign_task(Some(&dispatcher()), missing, technician_id)
        .await;

    let Err(err) = result else {
        bail!("unknown task should be rejected");
    };
    ensure!(matches!(err, DispatchServiceError::TaskNotFound(id) if id == missing));
    ensure!(err.status() == 404);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn assign_task_rejects_unknown_technician(harness: Harness) -> eyre::Result<()> {
    let task = created_task(&harness).await?;

    let result = harness
        .service
        .assign_task(Some(&dispatcher()), task.id, TechnicianId::new())
        .await;

    let Err(err) = result else {
        bail!("unknown technician should be rejected");
    };
    ensure!(matches!(
        err,
        DispatchServiceError::TechnicianValidation(TechnicianValidationError::NotFound(_))
    ));
    ensure!(err.status() == 400);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn assign_task_rejects_inactive_technician(harness: Harness) -> eyre::Result<()> {
    let technician_id = harness
        .directory
        .register("Sam Park")
        .map_err(|err| eyre::eyre!("{err}"))?;
    harness
        .directory
        .deactivate(technician_id)
        .map_err(|err| eyre::eyre!("{err}"))?;
    let task = created_task(&harness).await?;

    let result = harness
        .service
        .assign_task(Some(&dispatcher()), task.id, technician_id)
        .await;

    ensure!(matches!(
        result,
        Err(DispatchServiceError::TechnicianValidation(
            TechnicianValidationError::Inactive(_)
        ))
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn assign_task_records_assignment_and_notifies(harness: Harness) -> eyre::Result<()> {
    let technician_id = harness
        .directory
        .register("Sam Park")
        .map_err(|err| eyre::eyre!("{err}"))?;
    let task = created_task(&harness).await?;

    let outcome = harness
        .service
        .assign_task(Some(&dispatcher()), task.id, technician_id)
        .await?;

    ensure!(outcome.task_id == task.id);
    ensure!(outcome.technician_id == technician_id);
    ensure!(outcome.task_status == TaskStatus::Assigned);
    ensure!(outcome.technician_workload == 1);
    ensure!(outcome.workload_warning.is_none());

    let sent = harness
        .notifier
        .sent()
        .map_err(|err| eyre::eyre!("{err}"))?;
    ensure!(sent.len() == 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn assign_task_rejects_completed_task(harness: Harness) -> eyre::Result<()> {
    let (task, technician_id) = assigned_task(&harness).await?;
    let caller = technician(technician_id);
    harness
        .service
        .update_task_status(Some(&caller), task.id, TaskStatus::InProgress)
        .await?;
    harness
        .service
        .update_task_status(Some(&caller), task.id, TaskStatus::Completed)
        .await?;

    let replacement = harness
        .directory
        .register("Robin Vale")
        .map_err(|err| eyre::eyre!("{err}"))?;
    let result = harness
        .service
        .assign_task(Some(&dispatcher()), task.id, replacement)
        .await;

    ensure!(matches!(
        result,
        Err(DispatchServiceError::Domain(
            DispatchDomainError::InvalidAssignment(TaskStatus::Completed)
        ))
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn notification_failure_does_not_fail_assignment() -> eyre::Result<()> {
    let directory = Arc::new(InMemoryTechnicianDirectory::new());
    let service = DispatchService::new(
        Arc::new(InMemoryDispatchRepository::new()),
        Arc::clone(&directory),
        Arc::new(FailingNotifier::new()),
        Arc::new(DefaultClock),
    );
    let technician_id = directory
        .register("Sam Park")
        .map_err(|err| eyre::eyre!("{err}"))?;
    let task = service
        .create_task(Some(&dispatcher()), create_request())
        .await?;

    let outcome = service
        .assign_task(Some(&dispatcher()), task.id, technician_id)
        .await?;

    ensure!(outcome.task_status == TaskStatus::Assigned);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn workload_warning_appears_above_threshold(harness: Harness) -> eyre::Result<()> {
    let technician_id = harness
        .directory
        .register("Sam Park")
        .map_err(|err| eyre::eyre!("{err}"))?;
    let caller = dispatcher();

    for expected_count in 1..=10 {
        let task = created_task(&harness).await?;
        let outcome = harness
            .service
            .assign_task(Some(&caller), task.id, technician_id)
            .await?;
        ensure!(outcome.technician_workload == expected_count);
        ensure!(outcome.workload_warning.is_none());
    }

    let eleventh = created_task(&harness).await?;
    let outcome = harness
        .service
        .assign_task(Some(&caller), eleventh.id, technician_id)
        .await?;

    ensure!(outcome.technician_workload == 11);
    let warning = outcome.workload_warning.ok_or_eyre("expected a warning")?;
    ensure!(warning.contains("11"));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reassign_task_requires_prior_assignment(harness: Harness) -> eyre::Result<()> {
    let technician_id = harness
        .directory
        .register("Sam Park")
        .map_err(|err| eyre::eyre!("{err}"))?;
    let task = created_task(&harness).await?;

    let result = harness
        .service
        .reassign_task(Some(&dispatcher()), task.id, technician_id, None)
        .await;

    ensure!(matches!(
        result,
        Err(DispatchServiceError::Domain(
            DispatchDomainError::InvalidAssignment(TaskStatus::Unassigned)
        ))
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reassign_in_progress_requires_reason(harness: Harness) -> eyre::Result<()> {
    let (task, technician_id) = assigned_task(&harness).await?;
    harness
        .service
        .update_task_status(Some(&technician(technician_id)), task.id, TaskStatus::InProgress)
        .await?;
    let replacement = harness
        .directory
        .register("Robin Vale")
        .map_err(|err| eyre::eyre!("{err}"))?;

    let result = harness
        .service
        .reassign_task(
            Some(&dispatcher()),
            task.id,
            replacement,
            Some("   ".to_owned()),
        )
        .await;

    ensure!(matches!(
        result,
        Err(DispatchServiceError::Domain(
            DispatchDomainError::InvalidAssignment(TaskStatus::InProgress)
        ))
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reassign_returns_previous_technician_and_history(harness: Harness) -> eyre::Result<()> {
    let (task, first) = assigned_task(&harness).await?;
    let second = harness
        .directory
        .register("Robin Vale")
        .map_err(|err| eyre::eyre!("{err}"))?;

    let outcome = harness
        .service
        .reassign_task(Some(&dispatcher()), task.id, second, None)
        .await?;

    ensure!(outcome.assignment.technician_id == second);
    ensure!(outcome.previous_technician_id == Some(first));
    ensure!(outcome.history.len() == 2);
    ensure!(outcome.assignment.task_status == TaskStatus::Assigned);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_status_rejects_other_technician(harness: Harness) -> eyre::Result<()> {
    let (task, _assigned) = assigned_task(&harness).await?;
    let intruder = technician(TechnicianId::new());

    let result = harness
        .service
        .update_task_status(Some(&intruder), task.id, TaskStatus::InProgress)
        .await;

    let Err(err) = result else {
        bail!("other technician should be rejected");
    };
    ensure!(matches!(
        err,
        DispatchServiceError::UnauthorizedTaskAccess { task_id } if task_id == task.id
    ));
    ensure!(err.status() == 403);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_status_ownership_applies_to_admin(harness: Harness) -> eyre::Result<()> {
    let (task, _assigned) = assigned_task(&harness).await?;

    let result = harness
        .service
        .update_task_status(Some(&admin()), task.id, TaskStatus::InProgress)
        .await;

    ensure!(matches!(
        result,
        Err(DispatchServiceError::UnauthorizedTaskAccess { .. })
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_status_walks_through_completion(harness: Harness) -> eyre::Result<()> {
    let (task, technician_id) = assigned_task(&harness).await?;
    let caller = technician(technician_id);

    let started = harness
        .service
        .update_task_status(Some(&caller), task.id, TaskStatus::InProgress)
        .await?;
    ensure!(started.status == TaskStatus::InProgress);
    ensure!(started.started_at.is_some());

    let completed = harness
        .service
        .update_task_status(Some(&caller), task.id, TaskStatus::Completed)
        .await?;
    ensure!(completed.status == TaskStatus::Completed);
    Ok(())
}

#[rstest]
#[case(TaskStatus::Unassigned)]
#[case(TaskStatus::Assigned)]
#[tokio::test(flavor = "multi_thread")]
async fn update_status_rejects_non_progress_targets(
    #[case] target: TaskStatus,
    harness: Harness,
) -> eyre::Result<()> {
    let (task, technician_id) = assigned_task(&harness).await?;

    let result = harness
        .service
        .update_task_status(Some(&technician(technician_id)), task.id, target)
        .await;

    ensure!(matches!(
        result,
        Err(DispatchServiceError::Domain(
            DispatchDomainError::InvalidStatusTransition { .. }
        ))
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn assign_task_surfaces_directory_failure() -> eyre::Result<()> {
    use crate::dispatch::ports::MockTechnicianDirectory;

    let mut directory = MockTechnicianDirectory::new();
    directory.expect_find_technician().returning(|_| {
        Err(DirectoryError::unavailable(std::io::Error::other(
            "connection refused",
        )))
    });
    let service = DispatchService::new(
        Arc::new(InMemoryDispatchRepository::new()),
        Arc::new(directory),
        Arc::new(RecordingNotifier::new()),
        Arc::new(DefaultClock),
    );

    let result = service
        .assign_task(Some(&dispatcher()), TaskId::new(), TechnicianId::new())
        .await;

    let Err(err) = result else {
        bail!("directory failure should abort the assignment");
    };
    ensure!(matches!(
        err,
        DispatchServiceError::TechnicianValidation(TechnicianValidationError::Lookup(_))
    ));
    ensure!(err.status() == 502);
    Ok(())
}

struct StalledDirectory;

#[async_trait::async_trait]
impl TechnicianDirectory for StalledDirectory {
    async fn find_technician(
        &self,
        _id: TechnicianId,
    ) -> Result<Option<TechnicianRecord>, DirectoryError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(None)
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn assign_task_times_out_on_stalled_directory() -> eyre::Result<()> {
    use crate::dispatch::ports::DispatchConfig;

    let config = DispatchConfig::default().with_directory_timeout(Duration::from_millis(20));
    let service = DispatchService::with_config(
        Arc::new(InMemoryDispatchRepository::new()),
        Arc::new(StalledDirectory),
        Arc::new(RecordingNotifier::new()),
        Arc::new(DefaultClock),
        config,
    );

    let result = service
        .assign_task(Some(&dispatcher()), TaskId::new(), TechnicianId::new())
        .await;

    let Err(err) = result else {
        bail!("stalled lookup should time out");
    };
    ensure!(matches!(
        err,
        DispatchServiceError::TechnicianValidation(TechnicianValidationError::TimedOut(_))
    ));
    ensure!(err.status() == 502);
    Ok(())
}
