//! RPC Method Handlers

use crate::error::to_rpc_error;
use crate::types::{
    DispatchRequest, DispatchResponse, ResolveRequest, ResolveResponse, StatusResponse,
};
use jsonrpsee::types::ErrorObjectOwned;
use pushbridge_core::application::bridge;
use pushbridge_core::QueueBridge;
use std::sync::Arc;

/// RPC Handler with injected bridge
pub struct RpcHandler {
    bridge: Arc<QueueBridge>,
}

impl RpcHandler {
    pub fn new(bridge: Arc<QueueBridge>) -> Self {
        Self { bridge }
    }

    /// bridge.dispatch.v1
    pub async fn dispatch(
        &self,
        params: DispatchRequest,
    ) -> Result<DispatchResponse, ErrorObjectOwned> {
        let req = bridge::DispatchRequest {
            queue: params.queue,
            message: params.message,
            idempotency_key: params.idempotency_key,
        };

        let outcome = self.bridge.dispatch(req).await.map_err(to_rpc_error)?;

        Ok(DispatchResponse {
            message_id: outcome.message_id.to_string(),
            queue: outcome.queue_name.to_string(),
            physical_queue: outcome.physical_queue,
            task_name: outcome.task_name,
            deduplicated: outcome.deduplicated,
        })
    }

    /// bridge.resolve.v1
    pub fn resolve(&self, params: ResolveRequest) -> Result<ResolveResponse, ErrorObjectOwned> {
        let resolved = self.bridge.resolve(&params.queue).map_err(to_rpc_error)?;

        Ok(ResolveResponse {
            kind: resolved.kind().to_string(),
            prefix: resolved.queue_name.prefix().to_string(),
            suffix_id: resolved.queue_name.suffix_id().to_string(),
            physical_queue: resolved.physical_queue.to_string(),
            queue_path: resolved.queue_path,
        })
    }

    /// admin.status.v1
    pub fn status(&self) -> StatusResponse {
        let config = self.bridge.config();
        let stats = self.bridge.stats();

        StatusResponse {
            version: pushbridge_core::VERSION.to_string(),
            project: config.project.clone(),
            location: config.location.clone(),
            queues: self.bridge.provisioned_queues(),
            dispatched: stats.dispatched,
            deduplicated: stats.deduplicated,
            delivered: stats.delivered,
            delivery_failures: stats.delivery_failures,
            uptime_seconds: stats.uptime_seconds,
        }
    }
}
