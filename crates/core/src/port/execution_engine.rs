// Execution Engine Port
// Enqueue contract of the embedded pull-based engine the bridge hands deliveries to

use crate::domain::{MessageId, QueueMessage, QueueName};
use crate::error::Result;
use async_trait::async_trait;

/// Per-enqueue options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnqueueOptions {
    /// Engine-side dedup key; same key + same queue = same job
    pub idempotency_key: Option<String>,
    /// Correlation id assigned at dispatch time
    pub message_id: Option<MessageId>,
}

/// What the engine did with an enqueue call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineReceipt {
    pub job_id: String,
    /// `true` if the key matched an existing job and nothing new was scheduled
    pub deduplicated: bool,
}

/// Embedded execution engine
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Schedule `message` on `queue`
    ///
    /// # Errors
    /// - `AppError::Engine` / `AppError::Database` if the engine cannot accept work
    async fn enqueue(
        &self,
        queue: &QueueName,
        message: &QueueMessage,
        options: &EnqueueOptions,
    ) -> Result<EngineReceipt>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// One recorded `enqueue` call
    #[derive(Debug, Clone)]
    pub struct EnqueueCall {
        pub queue: QueueName,
        pub message: QueueMessage,
        pub options: EnqueueOptions,
    }

    /// Records every enqueue; dedups on (queue, idempotency key) like a real engine
    #[derive(Default)]
    pub struct RecordingEngine {
        calls: Mutex<Vec<EnqueueCall>>,
        keyed: Mutex<HashMap<(String, String), String>>,
        failure: Mutex<Option<String>>,
    }

    impl RecordingEngine {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every following enqueue fails with `AppError::Engine(msg)`
        pub fn fail_with(&self, msg: impl Into<String>) {
            *self.failure.lock().unwrap() = Some(msg.into());
        }

        pub fn calls(&self) -> Vec<EnqueueCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ExecutionEngine for RecordingEngine {
        async fn enqueue(
            &self,
            queue: &QueueName,
            message: &QueueMessage,
            options: &EnqueueOptions,
        ) -> Result<EngineReceipt> {
            if let Some(msg) = self.failure.lock().unwrap().clone() {
                return Err(AppError::Engine(msg));
            }

            let mut calls = self.calls.lock().unwrap();
            calls.push(EnqueueCall {
                queue: queue.clone(),
                message: message.clone(),
                options: options.clone(),
            });
            let fresh_id = format!("job-{}", calls.len());

            match &options.idempotency_key {
                Some(key) => {
                    let mut keyed = self.keyed.lock().unwrap();
                    let entry = (queue.to_string(), key.clone());
                    if let Some(existing) = keyed.get(&entry) {
                        return Ok(EngineReceipt {
                            job_id: existing.clone(),
                            deduplicated: true,
                        });
                    }
                    keyed.insert(entry, fresh_id.clone());
                    Ok(EngineReceipt {
                        job_id: fresh_id,
                        deduplicated: false,
                    })
                }
                None => Ok(EngineReceipt {
                    job_id: fresh_id,
                    deduplicated: false,
                }),
            }
        }
    }
}
