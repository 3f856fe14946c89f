//! JSON-RPC Server
//!
//! JSON-RPC 2.0 over HTTP on localhost TCP.

use crate::handler::RpcHandler;
use crate::types::{DispatchRequest, ResolveRequest};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObjectOwned;
use jsonrpsee::RpcModule;
use pushbridge_core::QueueBridge;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_RPC_HOST: &str = "127.0.0.1";
pub const DEFAULT_RPC_PORT: u16 = 9630;

/// RPC Server Configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    DEFAULT_RPC_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_RPC_PORT
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, bridge: Arc<QueueBridge>) -> Self {
        Self {
            config,
            handler: Arc::new(RpcHandler::new(bridge)),
        }
    }

    /// Method table: `bridge.dispatch.v1`, `bridge.resolve.v1`, `admin.status.v1`
    pub fn module(&self) -> Result<RpcModule<()>, String> {
        let mut module = RpcModule::new(());

        let handler = self.handler.clone();
        module
            .register_async_method("bridge.dispatch.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: DispatchRequest = params.parse()?;
                    handler.dispatch(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_method("bridge.resolve.v1", move |params, _, _| {
                let req: ResolveRequest = params.parse()?;
                handler.resolve(req)
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_method("admin.status.v1", move |_, _, _| {
                Ok::<_, ErrorObjectOwned>(handler.status())
            })
            .map_err(|e| e.to_string())?;

        Ok(module)
    }

    /// Start the JSON-RPC server; returns the handle and the bound address
    pub async fn start(self) -> Result<(ServerHandle, SocketAddr), String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;
        let local_addr = server
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        let module = self.module()?;
        let handle = server.start(module);

        info!(addr = %local_addr, "JSON-RPC server started");
        Ok((handle, local_addr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DispatchResponse, ResolveResponse, StatusResponse};
    use jsonrpsee::core::params::ObjectParams;
    use pushbridge_core::port::execution_engine::mocks::RecordingEngine;
    use pushbridge_core::port::id_provider::mocks::SequentialIdProvider;
    use pushbridge_core::port::task_queue::mocks::InMemoryTaskQueue;
    use pushbridge_core::port::JsonMessageCodec;
    use pushbridge_core::BridgeConfig;
    use serde_json::json;

    fn server() -> RpcServer {
        let bridge = QueueBridge::new(
            BridgeConfig::new("acme", "us-central1", "https://bridge.example.com/delivery"),
            Arc::new(InMemoryTaskQueue::new()),
            Arc::new(RecordingEngine::new()),
            Arc::new(JsonMessageCodec),
            Arc::new(SequentialIdProvider::new()),
        )
        .unwrap();
        RpcServer::new(RpcServerConfig::default(), Arc::new(bridge))
    }

    #[test]
    fn test_default_config() {
        let config = RpcServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9630);
    }

    #[tokio::test]
    async fn test_dispatch_method() {
        let module = server().module().unwrap();

        let mut params = ObjectParams::new();
        params.insert("queue", "__wkf_step_abc123").unwrap();
        params
            .insert("message", json!({"kind": "step", "payload": {"x": 1}}))
            .unwrap();

        let resp: DispatchResponse = module.call("bridge.dispatch.v1", params).await.unwrap();
        assert_eq!(resp.queue, "__wkf_step_abc123");
        assert_eq!(resp.message_id, "msg-1");
    }

    #[tokio::test]
    async fn test_dispatch_method_rejects_bad_queue() {
        let module = server().module().unwrap();

        let mut params = ObjectParams::new();
        params.insert("queue", "nope").unwrap();
        params
            .insert("message", json!({"kind": "step", "payload": {}}))
            .unwrap();

        let err = module
            .call::<_, DispatchResponse>("bridge.dispatch.v1", params)
            .await
            .unwrap_err();
        assert!(format!("{:?}", err).contains("4004"), "{:?}", err);
    }

    #[tokio::test]
    async fn test_resolve_and_status_methods() {
        let module = server().module().unwrap();

        let mut params = ObjectParams::new();
        params.insert("queue", "__wkf_step_x").unwrap();
        let resolved: ResolveResponse = module.call("bridge.resolve.v1", params).await.unwrap();
        assert_eq!(resolved.physical_queue, "workflow-steps");

        let status: StatusResponse = module
            .call("admin.status.v1", ObjectParams::new())
            .await
            .unwrap();
        assert_eq!(status.dispatched, 0);
        assert_eq!(status.project, "acme");
    }

    #[tokio::test]
    async fn test_start_on_ephemeral_port() {
        let mut server = server();
        server.config.port = 0;

        let (handle, addr) = server.start().await.unwrap();
        assert_ne!(addr.port(), 0);

        handle.stop().unwrap();
        handle.stopped().await;
    }
}
