//! pushbridge CLI - producer and status client for the pushbridge daemon

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use pushbridge_core::domain::{QueueKind, QueueName};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9630";

#[derive(Parser)]
#[command(name = "pushbridge")]
#[command(about = "pushbridge queue bridge CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "PUSHBRIDGE_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Dispatch a message through the push queue
    Dispatch {
        /// Logical queue name (e.g. __wkf_step_abc123)
        #[arg(short, long)]
        queue: String,

        /// Payload as JSON string
        #[arg(short, long)]
        payload: String,

        /// Message kind (workflow | step); inferred from the queue prefix
        #[arg(short, long)]
        kind: Option<String>,

        /// Deduplicate on this key
        #[arg(short, long)]
        idempotency_key: Option<String>,

        /// Correlation id carried with the message
        #[arg(long)]
        trace_id: Option<String>,
    },

    /// Show where a queue name lands
    Resolve {
        /// Logical queue name
        queue: String,
    },

    /// Show bridge status
    Status,
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize)]
struct DispatchResult {
    message_id: String,
    queue: String,
    physical_queue: String,
    task_name: Option<String>,
    deduplicated: bool,
}

#[derive(Tabled)]
struct DispatchRow {
    message_id: String,
    queue: String,
    physical_queue: String,
    task_name: String,
}

impl From<DispatchResult> for DispatchRow {
    fn from(r: DispatchResult) -> Self {
        Self {
            message_id: r.message_id,
            queue: r.queue,
            physical_queue: r.physical_queue,
            task_name: r.task_name.unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[derive(Deserialize, Tabled)]
struct ResolveResult {
    kind: String,
    prefix: String,
    suffix_id: String,
    physical_queue: String,
    queue_path: String,
}

/// `--kind` wins; otherwise the queue prefix decides
fn message_kind(queue: &str, kind: Option<&str>) -> Result<QueueKind> {
    match kind {
        Some(kind) => kind.parse().map_err(|e| anyhow::anyhow!("{}", e)),
        None => QueueName::parse(queue)
            .map(|name| name.kind())
            .map_err(|e| anyhow::anyhow!("{}", e)),
    }
}

fn dispatch_params(
    queue: &str,
    payload: &str,
    kind: QueueKind,
    idempotency_key: Option<String>,
    trace_id: Option<String>,
) -> Result<serde_json::Value> {
    let payload_json: serde_json::Value =
        serde_json::from_str(payload).context("Invalid JSON payload")?;

    let mut message = json!({
        "kind": kind,
        "payload": payload_json,
    });
    if let Some(trace_id) = trace_id {
        message["traceId"] = json!(trace_id);
    }

    let mut params = json!({
        "queue": queue,
        "message": message,
    });
    if let Some(key) = idempotency_key {
        params["idempotency_key"] = json!(key);
    }
    Ok(params)
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Dispatch {
            queue,
            payload,
            kind,
            idempotency_key,
            trace_id,
        } => {
            let kind = message_kind(&queue, kind.as_deref())?;
            let params = dispatch_params(&queue, &payload, kind, idempotency_key, trace_id)?;

            let result = call_rpc(&cli.rpc_url, "bridge.dispatch.v1", params).await?;
            let dispatched: DispatchResult = serde_json::from_value(result)?;

            if dispatched.deduplicated {
                println!("{}", "✓ Already dispatched (idempotency key hit)".yellow().bold());
            } else {
                println!("{}", "✓ Message dispatched".green().bold());
            }
            println!();

            let table = Table::new(vec![DispatchRow::from(dispatched)]).to_string();
            println!("{}", table);
        }

        Commands::Resolve { queue } => {
            let result = call_rpc(&cli.rpc_url, "bridge.resolve.v1", json!({ "queue": queue })).await?;
            let resolved: ResolveResult = serde_json::from_value(result)?;

            let table = Table::new(vec![resolved]).to_string();
            println!("{}", table);
        }

        Commands::Status => {
            println!("{}", "Bridge Status".cyan().bold());
            println!();

            match call_rpc(&cli.rpc_url, "admin.status.v1", json!({})).await {
                Ok(status) => {
                    println!("  {} {}", "RPC URL:".bold(), cli.rpc_url);
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!("  {} {}", "Version:".bold(), status["version"]);
                    println!(
                        "  {} {}/{}",
                        "Target:".bold(),
                        status["project"].as_str().unwrap_or("?"),
                        status["location"].as_str().unwrap_or("?")
                    );
                    println!();
                    println!("  {} {}", "Dispatched:".bold(), status["dispatched"]);
                    println!("  {} {}", "Deduplicated:".bold(), status["deduplicated"]);
                    println!("  {} {}", "Delivered:".bold(), status["delivered"]);
                    println!(
                        "  {} {}",
                        "Delivery failures:".bold(),
                        status["delivery_failures"]
                    );
                    println!("  {} {} seconds", "Uptime:".bold(), status["uptime_seconds"]);

                    if let Some(queues) = status["queues"].as_array() {
                        println!();
                        println!("  {}", "Provisioned queues:".bold());
                        if queues.is_empty() {
                            println!("    (none yet)");
                        }
                        for queue in queues {
                            println!("    • {}", queue.as_str().unwrap_or_default());
                        }
                    }
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }
    }

    Ok(())
}
