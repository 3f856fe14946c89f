//! JSON-RPC API Layer
//!
//! Producer-facing JSON-RPC 2.0 server for pushbridge: dispatch messages,
//! resolve queue names, report bridge status.

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use server::{RpcServer, RpcServerConfig};
