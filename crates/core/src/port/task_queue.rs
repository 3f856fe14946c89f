// Task Queue Service Port
// Narrow contract over the external push-queue service (queues + HTTP tasks)

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

/// Outcome classes the bridge distinguishes when talking to the service.
///
/// Adapters own the mapping from wire-level failures to these variants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskQueueError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Queue metadata returned by lookups/creates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueInfo {
    /// Full resource path
    pub name: String,
    pub state: Option<String>,
}

/// Queue creation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct QueueSpec {
    /// Full resource path of the queue to create
    pub name: String,
    pub max_dispatches_per_second: f64,
}

/// HTTP POST the service performs when the task is dispatched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTarget {
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

/// Task submission. `name: None` lets the service assign an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRequest {
    pub name: Option<String>,
    pub http_request: HttpTarget,
}

/// Accepted task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedTask {
    pub name: String,
}

/// External task-queue service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskQueueService: Send + Sync {
    /// Fetch queue metadata
    ///
    /// # Errors
    /// - `TaskQueueError::NotFound` if the queue does not exist
    async fn get_queue(&self, queue_path: &str) -> Result<QueueInfo, TaskQueueError>;

    /// Create a queue under `location_path`
    ///
    /// # Errors
    /// - `TaskQueueError::AlreadyExists` if a queue with that name exists
    async fn create_queue(
        &self,
        location_path: &str,
        spec: &QueueSpec,
    ) -> Result<QueueInfo, TaskQueueError>;

    /// Submit a task to `queue_path`
    ///
    /// # Errors
    /// - `TaskQueueError::AlreadyExists` if a named task with that name is
    ///   live (or was recently deleted)
    async fn create_task(
        &self,
        queue_path: &str,
        task: &TaskRequest,
    ) -> Result<CreatedTask, TaskQueueError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// A task accepted by the in-memory service
    #[derive(Debug, Clone)]
    pub struct RecordedTask {
        pub queue_path: String,
        pub name: String,
        pub named: bool,
        pub request: TaskRequest,
    }

    #[derive(Default)]
    struct State {
        queues: HashMap<String, QueueInfo>,
        created_queues: Vec<QueueSpec>,
        tasks: Vec<RecordedTask>,
        task_names: HashSet<String>,
        get_calls: usize,
        create_queue_calls: usize,
        create_task_calls: usize,
        lookup_failure: Option<TaskQueueError>,
        submit_failure: Option<TaskQueueError>,
        lose_create_race: bool,
    }

    /// In-memory task-queue service with the service's dedup semantics:
    /// a named task is accepted once, repeats get `AlreadyExists`.
    #[derive(Default)]
    pub struct InMemoryTaskQueue {
        state: Mutex<State>,
    }

    impl InMemoryTaskQueue {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-create a queue
        pub fn with_queue(self, queue_path: impl Into<String>) -> Self {
            let queue_path = queue_path.into();
            self.state.lock().unwrap().queues.insert(
                queue_path.clone(),
                QueueInfo {
                    name: queue_path,
                    state: Some("RUNNING".to_string()),
                },
            );
            self
        }

        /// Every `get_queue` fails with `err`
        pub fn fail_lookups_with(&self, err: TaskQueueError) {
            self.state.lock().unwrap().lookup_failure = Some(err);
        }

        /// Every `create_task` fails with `err`
        pub fn fail_submissions_with(&self, err: TaskQueueError) {
            self.state.lock().unwrap().submit_failure = Some(err);
        }

        /// Simulate a concurrent creator: `create_queue` creates the queue
        /// but answers `AlreadyExists`
        pub fn lose_create_race(&self) {
            self.state.lock().unwrap().lose_create_race = true;
        }

        pub fn get_calls(&self) -> usize {
            self.state.lock().unwrap().get_calls
        }

        pub fn create_queue_calls(&self) -> usize {
            self.state.lock().unwrap().create_queue_calls
        }

        pub fn create_task_calls(&self) -> usize {
            self.state.lock().unwrap().create_task_calls
        }

        pub fn created_queues(&self) -> Vec<QueueSpec> {
            self.state.lock().unwrap().created_queues.clone()
        }

        pub fn has_queue(&self, queue_path: &str) -> bool {
            self.state.lock().unwrap().queues.contains_key(queue_path)
        }

        pub fn tasks(&self) -> Vec<RecordedTask> {
            self.state.lock().unwrap().tasks.clone()
        }

        /// Remove and return accepted tasks (simulates dispatch to the push target)
        pub fn drain_tasks(&self) -> Vec<RecordedTask> {
            std::mem::take(&mut self.state.lock().unwrap().tasks)
        }
    }

    #[async_trait]
    impl TaskQueueService for InMemoryTaskQueue {
        async fn get_queue(&self, queue_path: &str) -> Result<QueueInfo, TaskQueueError> {
            let mut state = self.state.lock().unwrap();
            state.get_calls += 1;
            if let Some(err) = state.lookup_failure.clone() {
                return Err(err);
            }
            state
                .queues
                .get(queue_path)
                .cloned()
                .ok_or_else(|| TaskQueueError::NotFound(queue_path.to_string()))
        }

        async fn create_queue(
            &self,
            _location_path: &str,
            spec: &QueueSpec,
        ) -> Result<QueueInfo, TaskQueueError> {
            let mut state = self.state.lock().unwrap();
            state.create_queue_calls += 1;

            let info = QueueInfo {
                name: spec.name.clone(),
                state: Some("RUNNING".to_string()),
            };
            if state.queues.contains_key(&spec.name) {
                return Err(TaskQueueError::AlreadyExists(spec.name.clone()));
            }
            state.queues.insert(spec.name.clone(), info.clone());
            state.created_queues.push(spec.clone());

            if state.lose_create_race {
                return Err(TaskQueueError::AlreadyExists(spec.name.clone()));
            }
            Ok(info)
        }

        async fn create_task(
            &self,
            queue_path: &str,
            task: &TaskRequest,
        ) -> Result<CreatedTask, TaskQueueError> {
            let mut state = self.state.lock().unwrap();
            state.create_task_calls += 1;
            if let Some(err) = state.submit_failure.clone() {
                return Err(err);
            }
            if !state.queues.contains_key(queue_path) {
                return Err(TaskQueueError::NotFound(queue_path.to_string()));
            }

            let (name, named) = match &task.name {
                Some(name) => {
                    if !state.task_names.insert(name.clone()) {
                        return Err(TaskQueueError::AlreadyExists(name.clone()));
                    }
                    (name.clone(), true)
                }
                None => (
                    format!("{}/tasks/{}", queue_path, uuid::Uuid::new_v4().simple()),
                    false,
                ),
            };

            state.tasks.push(RecordedTask {
                queue_path: queue_path.to_string(),
                name: name.clone(),
                named,
                request: task.clone(),
            });
            Ok(CreatedTask { name })
        }
    }
}
