//! pushbridge daemon - composition root
//! Wires the SQLite inbox and the Cloud Tasks client into a QueueBridge and
//! serves it over JSON-RPC (producers) and HTTP (push deliveries).

mod settings;
mod telemetry;

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pushbridge_api_http::HttpServer;
use pushbridge_api_rpc::RpcServer;
use pushbridge_core::port::{JsonMessageCodec, SystemTimeProvider, TimeProvider, UlidProvider};
use pushbridge_core::QueueBridge;
use pushbridge_infra_cloudtasks::CloudTasksClient;
use pushbridge_infra_sqlite::{create_pool, run_migrations, SqliteExecutionEngine};
use settings::DaemonSettings;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_LOG_FILTER: &str = "pushbridge=info,tower_http=info";

fn init_logging() -> Result<()> {
    let log_format =
        std::env::var("PUSHBRIDGE_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .context("invalid log filter")?;

    let (otel_layer, otel_notice) = telemetry::telemetry_layer()?;

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(otel_layer)
                .with(env_filter)
                .with(fmt::layer().json())
                .try_init()
                .context("failed to install subscriber")?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(otel_layer)
                .with(env_filter)
                .with(fmt::layer().pretty())
                .try_init()
                .context("failed to install subscriber")?;
        }
    }

    if let Some(notice) = otel_notice {
        info!("{}", notice);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Logging (+ optional OTLP export)
    init_logging()?;
    info!("pushbridge v{} starting...", VERSION);

    // 2. Settings
    let settings = DaemonSettings::load()?;
    let db_path = settings.database_path()?;
    if let Some(dir) = std::path::Path::new(&db_path).parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create {}", dir.display()))?;
        }
    }

    info!(
        project = %settings.bridge.project,
        location = %settings.bridge.location,
        db_path = %db_path,
        "Settings loaded"
    );

    // 3. Engine inbox
    let pool = create_pool(&db_path)
        .await
        .context("DB pool creation failed")?;
    run_migrations(&pool).await.context("Migration failed")?;

    // 4. DI wiring
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let engine = Arc::new(SqliteExecutionEngine::new(
        pool.clone(),
        Arc::new(UlidProvider::new(time_provider.clone())),
        time_provider.clone(),
    ));
    let task_queue = Arc::new(
        CloudTasksClient::new(&settings.cloud_tasks).context("Cloud Tasks client setup failed")?,
    );
    if settings.cloud_tasks.access_token.is_none() {
        warn!("No Cloud Tasks access token configured; requests go out unauthenticated");
    }

    let bridge = Arc::new(
        QueueBridge::new(
            settings.bridge.clone(),
            task_queue,
            engine,
            Arc::new(JsonMessageCodec),
            Arc::new(UlidProvider::new(time_provider)),
        )
        .context("bridge setup failed")?,
    );

    // 5. JSON-RPC (producers)
    let (rpc_handle, rpc_addr) = RpcServer::new(settings.rpc.clone(), bridge.clone())
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    // 6. Delivery endpoint (push target)
    let http_server = HttpServer::bind(&settings.http, bridge.clone())
        .await
        .with_context(|| {
            format!(
                "cannot bind delivery endpoint on {}:{}",
                settings.http.host, settings.http.port
            )
        })?;
    let http_addr = http_server.local_addr()?;

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let http_handle = tokio::spawn(async move {
        let shutdown = async move {
            let _ = shutdown_rx.changed().await;
        };
        if let Err(e) = http_server.serve(shutdown).await {
            error!(error = %e, "Delivery endpoint failed");
        }
    });

    info!(
        rpc = %rpc_addr,
        http = %http_addr,
        delivery_path = %settings.http.delivery_path,
        "System ready. Press Ctrl+C to shutdown"
    );

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting gracefully...");

    // 8. Graceful shutdown
    let _ = shutdown_tx.send(true);
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), http_handle).await;
    rpc_handle.stopped().await;

    let stats = bridge.stats();
    info!(
        dispatched = stats.dispatched,
        delivered = stats.delivered,
        delivery_failures = stats.delivery_failures,
        "Shutdown complete."
    );
    telemetry::shutdown();

    Ok(())
}
