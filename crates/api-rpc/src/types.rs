//! RPC Request/Response Types
//!
//! Defines the JSON-RPC method parameters and results.

use pushbridge_core::domain::QueueMessage;
use serde::{Deserialize, Serialize};

/// bridge.dispatch.v1 - Dispatch a message through the push queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub queue: String,
    pub message: QueueMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResponse {
    pub message_id: String,
    pub queue: String,
    pub physical_queue: String,
    pub task_name: Option<String>,
    pub deduplicated: bool,
}

/// bridge.resolve.v1 - Show where a queue name lands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveRequest {
    pub queue: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub kind: String,
    pub prefix: String,
    pub suffix_id: String,
    pub physical_queue: String,
    pub queue_path: String,
}

/// admin.status.v1 - Bridge status (no parameters)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub project: String,
    pub location: String,
    /// Physical queue paths ensured by this process
    pub queues: Vec<String>,
    pub dispatched: u64,
    pub deduplicated: u64,
    pub delivered: u64,
    pub delivery_failures: u64,
    pub uptime_seconds: u64,
}
