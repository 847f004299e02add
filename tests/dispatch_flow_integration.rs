//! End-to-end dispatch flows over the in-memory adapters.
//!
//! Exercises the full task lifecycle through the orchestration service:
//! creation, assignment, reassignment, progress reporting, completion, and
//! the audit trail left behind.

#![expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]

use std::sync::Arc;

use foreman::auth::{Principal, Role, UserId};
use foreman::dispatch::{
    adapters::memory::{
        InMemoryDispatchRepository, InMemoryTechnicianDirectory, RecordingNotifier,
    },
    domain::{HistoryAction, TaskPriority, TaskStatus, TechnicianId},
    ports::DispatchRepository,
    services::{CreateTaskRequest, DispatchService},
};
use mockable::DefaultClock;

type FlowService = DispatchService<
    InMemoryDispatchRepository,
    InMemoryTechnicianDirectory,
    RecordingNotifier,
    DefaultClock,
>;

struct Flow {
    service: FlowService,
    repository: Arc<InMemoryDispatchRepository>,
    directory: Arc<InMemoryTechnicianDirectory>,
    notifier: Arc<RecordingNotifier>,
    dispatcher: Principal,
}

fn flow() -> Flow {
    let repository = Arc::new(InMemoryDispatchRepository::new());
    let directory = Arc::new(InMemoryTechnicianDirectory::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let service = DispatchService::new(
        Arc::clone(&repository),
        Arc::clone(&directory),
        Arc::clone(&notifier),
        Arc::new(DefaultClock),
    );
    Flow {
        service,
        repository,
        directory,
        notifier,
        dispatcher: Principal::new(UserId::new(), [Role::Dispatcher]),
    }
}

fn technician_caller(technician_id: TechnicianId) -> Principal {
    Principal::new(UserId::new(), [Role::Technician]).with_technician_id(technician_id)
}

#[tokio::test(flavor = "multi_thread")]
async fn full_lifecycle_leaves_complete_audit_trail() {
    let flow = flow();
    let first = flow
        .directory
        .register("Sam Park")
        .expect("registration should succeed");
    let second = flow
        .directory
        .register("Robin Vale")
        .expect("registration should succeed");

    let request = CreateTaskRequest::new(
        "Replace water heater",
        "14 Foundry Lane",
        TaskPriority::High,
    )
    .with_description("Customer reports no hot water since Monday")
    .with_estimated_duration(90);
    let task = flow
        .service
        .create_task(Some(&flow.dispatcher), request)
        .await
        .expect("creation should succeed");
    assert_eq!(task.status, TaskStatus::Unassigned);

    let assigned = flow
        .service
        .assign_task(Some(&flow.dispatcher), task.id, first)
        .await
        .expect("assignment should succeed");
    assert_eq!(assigned.task_status, TaskStatus::Assigned);
    assert_eq!(assigned.technician_id, first);

    let reassigned = flow
        .service
        .reassign_task(Some(&flow.dispatcher), task.id, second, None)
        .await
        .expect("reassignment should succeed");
    assert_eq!(reassigned.assignment.technician_id, second);
    assert_eq!(reassigned.previous_technician_id, Some(first));

    let caller = technician_caller(second);
    let started = flow
        .service
        .update_task_status(Some(&caller), task.id, TaskStatus::InProgress)
        .await
        .expect("start should succeed");
    assert_eq!(started.status, TaskStatus::InProgress);
    assert!(started.started_at.is_some());

    let completed = flow
        .service
        .update_task_status(Some(&caller), task.id, TaskStatus::Completed)
        .await
        .expect("completion should succeed");
    assert_eq!(completed.status, TaskStatus::Completed);

    // The ledger holds no active assignment once the task is completed.
    let active = flow
        .repository
        .active_assignment(task.id)
        .await
        .expect("ledger lookup should succeed");
    assert!(active.is_none());

    // Audit trail: created, reassigned, completed, in that order.
    let history = flow
        .repository
        .history_for_task(task.id)
        .await
        .expect("history lookup should succeed");
    let actions: Vec<HistoryAction> = history.iter().map(|entry| entry.action()).collect();
    assert_eq!(
        actions,
        [
            HistoryAction::Created,
            HistoryAction::Reassigned,
            HistoryAction::Completed,
        ]
    );
    assert!(
        history
            .iter()
            .zip(history.iter().skip(1))
            .all(|(a, b)| a.action_at() <= b.action_at())
    );

    // Both assignments produced a push notification.
    let sent = flow.notifier.sent().expect("notifier log should be readable");
    assert_eq!(sent.len(), 2);

    let workload = flow
        .repository
        .active_count_for_technician(second)
        .await
        .expect("count should succeed");
    assert_eq!(workload, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn reassignment_of_started_work_records_reason() {
    let flow = flow();
    let first = flow
        .directory
        .register("Sam Park")
        .expect("registration should succeed");
    let second = flow
        .directory
        .register("Robin Vale")
        .expect("registration should succeed");

    let task = flow
        .service
        .create_task(
            Some(&flow.dispatcher),
            CreateTaskRequest::new("Inspect wiring", "2 Glass Street", TaskPriority::Medium),
        )
        .await
        .expect("creation should succeed");
    flow.service
        .assign_task(Some(&flow.dispatcher), task.id, first)
        .await
        .expect("assignment should succeed");
    flow.service
        .update_task_status(Some(&technician_caller(first)), task.id, TaskStatus::InProgress)
        .await
        .expect("start should succeed");

    let outcome = flow
        .service
        .reassign_task(
            Some(&flow.dispatcher),
            task.id,
            second,
            Some("Original technician reassigned to an emergency".to_owned()),
        )
        .await
        .expect("reassignment should succeed");

    // The task stays in progress under the replacement technician.
    assert_eq!(outcome.assignment.task_status, TaskStatus::InProgress);

    let reasons: Vec<Option<&str>> = outcome
        .history
        .iter()
        .map(|entry| entry.reason.as_deref())
        .collect();
    assert_eq!(
        reasons,
        [
            None,
            Some("Original technician reassigned to an emergency"),
        ]
    );
}
