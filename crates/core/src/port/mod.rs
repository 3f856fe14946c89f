// Port Layer - Interfaces for external dependencies

pub mod codec;
pub mod execution_engine;
pub mod id_provider; // For deterministic testing
pub mod task_queue;
pub mod time_provider;

// Re-exports
pub use codec::{JsonMessageCodec, MessageCodec};
pub use execution_engine::{EngineReceipt, EnqueueOptions, ExecutionEngine};
pub use id_provider::{IdProvider, UlidProvider};
pub use task_queue::{
    CreatedTask, HttpTarget, QueueInfo, QueueSpec, TaskQueueError, TaskQueueService, TaskRequest,
};
pub use time_provider::{SystemTimeProvider, TimeProvider};
