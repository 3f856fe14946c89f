// pushbridge Infrastructure - Cloud Tasks Adapter
// Implements: TaskQueueService over the Cloud Tasks v2 REST API

mod client;
mod error;
mod wire;

pub use client::{CloudTasksClient, CloudTasksConfig, DEFAULT_ENDPOINT};
pub use error::classify;
