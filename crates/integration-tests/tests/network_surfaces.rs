//! The daemon's two listeners over real sockets: producers call JSON-RPC,
//! the push service POSTs to the delivery endpoint.

use std::sync::Arc;

use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::http_client::HttpClientBuilder;
use pushbridge_api_http::{HttpServer, HttpServerConfig};
use pushbridge_api_rpc::{RpcServer, RpcServerConfig};
use pushbridge_core::port::task_queue::mocks::InMemoryTaskQueue;
use pushbridge_core::port::{JsonMessageCodec, SystemTimeProvider, TimeProvider, UlidProvider};
use pushbridge_core::{BridgeConfig, QueueBridge};
use pushbridge_infra_sqlite::{create_pool, run_migrations, InboxState, SqliteExecutionEngine};
use serde_json::{json, Value};
use tokio::sync::oneshot;

#[tokio::test]
async fn test_rpc_dispatch_then_http_delivery() {
    let pool = create_pool(":memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();
    let clock: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let engine = Arc::new(SqliteExecutionEngine::new(
        pool,
        Arc::new(UlidProvider::new(clock.clone())),
        clock,
    ));
    let task_queue = Arc::new(InMemoryTaskQueue::new());

    // Reserve a port up front: the callback URL has to name it
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let http_port = listener.local_addr().unwrap().port();
    drop(listener);
    let callback = format!("http://127.0.0.1:{}/delivery", http_port);

    let bridge = Arc::new(
        QueueBridge::new(
            BridgeConfig::new("acme", "us-central1", callback.clone()),
            task_queue.clone(),
            engine.clone(),
            Arc::new(JsonMessageCodec),
            Arc::new(UlidProvider::system()),
        )
        .unwrap(),
    );

    let http_server = HttpServer::bind(
        &HttpServerConfig {
            host: "127.0.0.1".to_string(),
            port: http_port,
            ..Default::default()
        },
        bridge.clone(),
    )
    .await
    .unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let http_task = tokio::spawn(http_server.serve(async move {
        let _ = stop_rx.await;
    }));

    let (rpc_handle, rpc_addr) = RpcServer::new(
        RpcServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        bridge.clone(),
    )
    .start()
    .await
    .unwrap();

    // Producer side
    let client = HttpClientBuilder::default()
        .build(format!("http://{}", rpc_addr))
        .unwrap();
    let mut params = ObjectParams::new();
    params.insert("queue", "__wkf_step_abc123").unwrap();
    params
        .insert("message", json!({"kind": "step", "payload": {"x": 1}}))
        .unwrap();
    params.insert("idempotency_key", "run-1:step-1").unwrap();
    let dispatched: Value = client.request("bridge.dispatch.v1", params).await.unwrap();
    assert_eq!(dispatched["queue"], "__wkf_step_abc123");
    assert_eq!(dispatched["deduplicated"], json!(false));

    // Push side
    let task = task_queue.drain_tasks().remove(0);
    assert_eq!(task.request.http_request.url, callback);
    let response = reqwest::Client::new()
        .post(&task.request.http_request.url)
        .header("Content-Type", "application/json")
        .body(task.request.http_request.body.clone())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let delivered: Value = response.json().await.unwrap();
    assert_eq!(delivered["messageId"], dispatched["message_id"]);

    let job = engine.claim_next(None).await.unwrap().unwrap();
    assert_eq!(job.queue_name.to_string(), "__wkf_step_abc123");
    assert_eq!(job.idempotency_key.as_deref(), Some("run-1:step-1"));
    assert_eq!(engine.count_by_state(InboxState::Queued).await.unwrap(), 0);

    let status: Value = client
        .request("admin.status.v1", ObjectParams::new())
        .await
        .unwrap();
    assert_eq!(status["dispatched"], json!(1));
    assert_eq!(status["delivered"], json!(1));
    assert_eq!(
        status["queues"],
        json!(["projects/acme/locations/us-central1/queues/workflow-steps"])
    );

    let health = reqwest::get(format!("http://127.0.0.1:{}/healthz", http_port))
        .await
        .unwrap();
    assert_eq!(health.text().await.unwrap(), "ok");

    rpc_handle.stop().unwrap();
    rpc_handle.stopped().await;
    let _ = stop_tx.send(());
    http_task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_rpc_errors_carry_codes() {
    let pool = create_pool(":memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();
    let clock: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let engine = Arc::new(SqliteExecutionEngine::new(
        pool,
        Arc::new(UlidProvider::new(clock.clone())),
        clock,
    ));
    let bridge = Arc::new(
        QueueBridge::new(
            BridgeConfig::new("acme", "us-central1", "https://bridge.example.com/delivery"),
            Arc::new(InMemoryTaskQueue::new()),
            engine,
            Arc::new(JsonMessageCodec),
            Arc::new(UlidProvider::system()),
        )
        .unwrap(),
    );

    let (rpc_handle, rpc_addr) = RpcServer::new(
        RpcServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        bridge,
    )
    .start()
    .await
    .unwrap();
    let client = HttpClientBuilder::default()
        .build(format!("http://{}", rpc_addr))
        .unwrap();

    let mut params = ObjectParams::new();
    params.insert("queue", "orders").unwrap();
    params
        .insert("message", json!({"kind": "step", "payload": {}}))
        .unwrap();
    let err = client
        .request::<Value, _>("bridge.dispatch.v1", params)
        .await
        .unwrap_err();
    match err {
        jsonrpsee::core::ClientError::Call(obj) => assert_eq!(obj.code(), 4004),
        other => panic!("unexpected error: {:?}", other),
    }

    let mut params = ObjectParams::new();
    params.insert("queue", "__wkf_workflow_r1").unwrap();
    let resolved: Value = client.request("bridge.resolve.v1", params).await.unwrap();
    assert_eq!(resolved["kind"], "workflow");
    assert_eq!(resolved["physical_queue"], "workflow-flows");

    rpc_handle.stop().unwrap();
    rpc_handle.stopped().await;
}
