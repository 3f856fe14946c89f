//! Dispatch -> push -> delivery -> engine inbox, across crates.
//!
//! The in-memory task service stands in for the push queue: every accepted
//! task is drained and POSTed to the delivery router the way the external
//! service would, and the job is then claimed from a SQLite inbox.

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::Router;
use http_body_util::BodyExt;
use pushbridge_api_http::router;
use pushbridge_core::domain::{QueueKind, QueueMessage, QueueName};
use pushbridge_core::port::task_queue::mocks::{InMemoryTaskQueue, RecordedTask};
use pushbridge_core::port::time_provider::mocks::ManualClock;
use pushbridge_core::port::{JsonMessageCodec, TimeProvider, UlidProvider};
use pushbridge_core::application::DispatchRequest;
use pushbridge_core::{AppError, BridgeConfig, QueueBridge};
use pushbridge_infra_sqlite::{create_pool, run_migrations, InboxState, SqliteExecutionEngine};
use serde_json::{json, Value};
use tower::ServiceExt;

const CALLBACK: &str = "https://bridge.example.com/delivery";
const STEPS_PATH: &str = "projects/acme/locations/us-central1/queues/workflow-steps";
const FLOWS_PATH: &str = "projects/acme/locations/us-central1/queues/workflow-flows";

struct Stack {
    bridge: Arc<QueueBridge>,
    task_queue: Arc<InMemoryTaskQueue>,
    engine: Arc<SqliteExecutionEngine>,
    app: Router,
}

async fn stack_with(task_queue: InMemoryTaskQueue) -> Stack {
    let pool = create_pool(":memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();

    let clock: Arc<dyn TimeProvider> = Arc::new(ManualClock::new(1_700_000_000_000));
    let engine = Arc::new(SqliteExecutionEngine::new(
        pool,
        Arc::new(UlidProvider::new(clock.clone())),
        clock,
    ));
    let task_queue = Arc::new(task_queue);

    let bridge = Arc::new(
        QueueBridge::new(
            BridgeConfig::new("acme", "us-central1", CALLBACK),
            task_queue.clone(),
            engine.clone(),
            Arc::new(JsonMessageCodec),
            Arc::new(UlidProvider::system()),
        )
        .unwrap(),
    );

    Stack {
        app: router(bridge.clone(), "/delivery"),
        bridge,
        task_queue,
        engine,
    }
}

async fn stack() -> Stack {
    stack_with(InMemoryTaskQueue::new()).await
}

/// POST a task body to the delivery endpoint, as the push service would
async fn push(app: &Router, task: &RecordedTask) -> (u16, Value) {
    let target = &task.request.http_request;
    assert_eq!(target.url, CALLBACK);

    let mut builder = Request::builder().method("POST").uri("/delivery");
    for (name, value) in &target.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    let res = app
        .clone()
        .oneshot(builder.body(Body::from(target.body.clone())).unwrap())
        .await
        .unwrap();

    let status = res.status().as_u16();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_step_message_reaches_inbox() {
    let stack = stack().await;

    let outcome = stack
        .bridge
        .dispatch(DispatchRequest::new(
            "__wkf_step_abc123",
            QueueMessage::new(QueueKind::Step, json!({"run": "r1", "step": 3})),
        ))
        .await
        .unwrap();
    assert_eq!(outcome.physical_queue, "workflow-steps");

    let tasks = stack.task_queue.drain_tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].queue_path, STEPS_PATH);
    assert_eq!(
        tasks[0].request.http_request.headers.get("Content-Type").map(String::as_str),
        Some("application/json")
    );

    let (status, body) = push(&stack.app, &tasks[0]).await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["queueName"], "__wkf_step_abc123");
    assert_eq!(body["messageId"], outcome.message_id.to_string());

    let job = stack.engine.claim_next(None).await.unwrap().unwrap();
    assert_eq!(job.id, body["jobId"].as_str().unwrap());
    assert_eq!(job.queue_name.to_string(), "__wkf_step_abc123");
    assert_eq!(job.message.payload, json!({"run": "r1", "step": 3}));
    assert_eq!(job.message_id.as_deref(), Some(outcome.message_id.as_str()));
    assert_eq!(job.state, InboxState::Claimed);

    let stats = stack.bridge.stats();
    assert_eq!(stats.dispatched, 1);
    assert_eq!(stats.delivered, 1);
}

#[tokio::test]
async fn test_kinds_route_to_separate_physical_queues() {
    let stack = stack().await;

    let mut message = QueueMessage::new(QueueKind::Workflow, json!({"name": "checkout"}));
    message.trace_id = Some("trace-1".to_string());
    stack
        .bridge
        .dispatch(DispatchRequest::new("__wkf_workflow_run-9", message))
        .await
        .unwrap();
    stack
        .bridge
        .dispatch(DispatchRequest::new(
            "__wkf_step_run-9-1",
            QueueMessage::new(QueueKind::Step, json!({})),
        ))
        .await
        .unwrap();

    assert!(stack.task_queue.has_queue(FLOWS_PATH));
    assert!(stack.task_queue.has_queue(STEPS_PATH));
    assert_eq!(
        stack.bridge.provisioned_queues(),
        vec![FLOWS_PATH.to_string(), STEPS_PATH.to_string()]
    );

    for task in stack.task_queue.drain_tasks() {
        let (status, _) = push(&stack.app, &task).await;
        assert_eq!(status, 200);
    }

    let flow = QueueName::parse("__wkf_workflow_run-9").unwrap();
    let job = stack.engine.claim_next(Some(&flow)).await.unwrap().unwrap();
    assert_eq!(job.message.kind, QueueKind::Workflow);
    assert_eq!(job.message.trace_id.as_deref(), Some("trace-1"));

    let step = QueueName::parse("__wkf_step_run-9-1").unwrap();
    assert!(stack.engine.claim_next(Some(&step)).await.unwrap().is_some());
    assert!(stack.engine.claim_next(None).await.unwrap().is_none());
}

#[tokio::test]
async fn test_idempotent_dispatch_and_redelivery_yield_one_job() {
    let stack = stack().await;
    let request = DispatchRequest::new(
        "__wkf_step_abc123",
        QueueMessage::new(QueueKind::Step, json!({"x": 1})),
    )
    .with_idempotency_key("run-1:step-1");

    let first = stack.bridge.dispatch(request.clone()).await.unwrap();
    let second = stack.bridge.dispatch(request).await.unwrap();
    assert!(!first.deduplicated);
    assert!(second.deduplicated);
    assert_eq!(first.task_name, second.task_name);

    let tasks = stack.task_queue.drain_tasks();
    assert_eq!(tasks.len(), 1);

    // At-least-once: the service may deliver the same task twice
    let (_, first_delivery) = push(&stack.app, &tasks[0]).await;
    let (status, second_delivery) = push(&stack.app, &tasks[0]).await;
    assert_eq!(status, 200);
    assert_eq!(second_delivery["deduplicated"], json!(true));
    assert_eq!(first_delivery["jobId"], second_delivery["jobId"]);

    assert_eq!(stack.engine.count_by_state(InboxState::Queued).await.unwrap(), 1);
}

#[tokio::test]
async fn test_unkeyed_dispatches_are_independent_jobs() {
    let stack = stack().await;

    for _ in 0..2 {
        stack
            .bridge
            .dispatch(DispatchRequest::new(
                "__wkf_step_abc123",
                QueueMessage::new(QueueKind::Step, json!({"x": 1})),
            ))
            .await
            .unwrap();
    }

    let tasks = stack.task_queue.drain_tasks();
    assert_eq!(tasks.len(), 2);
    assert_ne!(tasks[0].name, tasks[1].name);
    for task in &tasks {
        push(&stack.app, task).await;
    }

    assert_eq!(stack.engine.count_by_state(InboxState::Queued).await.unwrap(), 2);
}

#[tokio::test]
async fn test_tampered_prefix_is_rejected_without_inbox_write() {
    let stack = stack().await;
    stack
        .bridge
        .dispatch(DispatchRequest::new(
            "__wkf_step_abc123",
            QueueMessage::new(QueueKind::Step, json!({"x": 1})),
        ))
        .await
        .unwrap();

    let mut task = stack.task_queue.drain_tasks().remove(0);
    let mut envelope: Value = serde_json::from_slice(&task.request.http_request.body).unwrap();
    envelope["prefix"] = json!("__other_");
    task.request.http_request.body = serde_json::to_vec(&envelope).unwrap();

    let (status, body) = push(&stack.app, &task).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "MalformedPayload");
    assert_eq!(stack.engine.count_by_state(InboxState::Queued).await.unwrap(), 0);
    assert_eq!(stack.bridge.stats().delivery_failures, 1);
}

#[tokio::test]
async fn test_existing_queue_is_reused() {
    let stack = stack_with(InMemoryTaskQueue::new().with_queue(STEPS_PATH)).await;

    stack
        .bridge
        .dispatch(DispatchRequest::new(
            "__wkf_step_abc123",
            QueueMessage::new(QueueKind::Step, json!({})),
        ))
        .await
        .unwrap();

    assert_eq!(stack.task_queue.create_queue_calls(), 0);
    assert_eq!(stack.task_queue.create_task_calls(), 1);
}

#[tokio::test]
async fn test_invalid_queue_name_never_reaches_the_service() {
    let stack = stack().await;

    let err = stack
        .bridge
        .dispatch(DispatchRequest::new(
            "orders",
            QueueMessage::new(QueueKind::Step, json!({})),
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidQueueName(_)));
    assert_eq!(stack.task_queue.get_calls(), 0);
    assert_eq!(stack.task_queue.create_task_calls(), 0);
}
