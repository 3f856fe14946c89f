// Cloud Tasks REST client (TaskQueueService adapter)

use crate::error::{classify, transport};
use crate::wire::{CreateTaskRequest, HttpRequest, Queue, RateLimits, Task};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use pushbridge_core::port::{
    CreatedTask, QueueInfo, QueueSpec, TaskQueueError, TaskQueueService, TaskRequest,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_ENDPOINT: &str = "https://cloudtasks.googleapis.com";

/// Connection settings for the Cloud Tasks API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudTasksConfig {
    /// API root; override for emulators and tests
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// OAuth2 bearer token
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for CloudTasksConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            access_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

pub struct CloudTasksClient {
    http: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
}

impl CloudTasksClient {
    pub fn new(config: &CloudTasksConfig) -> Result<Self, TaskQueueError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(transport)?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        })
    }

    fn url(&self, resource_path: &str) -> String {
        format!("{}/v2/{}", self.endpoint, resource_path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, TaskQueueError> {
        let response = self.authorize(request).send().await.map_err(transport)?;
        let status = response.status();

        if status.is_success() {
            return response.json::<T>().await.map_err(|e| TaskQueueError::Rejected {
                status: status.as_u16(),
                message: format!("unreadable response: {}", e),
            });
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify(status.as_u16(), &body))
    }
}

#[async_trait]
impl TaskQueueService for CloudTasksClient {
    async fn get_queue(&self, queue_path: &str) -> Result<QueueInfo, TaskQueueError> {
        debug!(queue = %queue_path, "GetQueue");
        let queue: Queue = self.send(self.http.get(self.url(queue_path))).await?;

        Ok(QueueInfo {
            name: queue.name,
            state: queue.state,
        })
    }

    async fn create_queue(
        &self,
        location_path: &str,
        spec: &QueueSpec,
    ) -> Result<QueueInfo, TaskQueueError> {
        debug!(queue = %spec.name, "CreateQueue");
        let body = Queue {
            name: spec.name.clone(),
            state: None,
            rate_limits: Some(RateLimits {
                max_dispatches_per_second: spec.max_dispatches_per_second,
            }),
        };

        let url = self.url(&format!("{}/queues", location_path));
        let queue: Queue = self.send(self.http.post(url).json(&body)).await?;

        Ok(QueueInfo {
            name: queue.name,
            state: queue.state,
        })
    }

    async fn create_task(
        &self,
        queue_path: &str,
        task: &TaskRequest,
    ) -> Result<CreatedTask, TaskQueueError> {
        let target = &task.http_request;
        let body = CreateTaskRequest {
            task: Task {
                name: task.name.clone(),
                http_request: Some(HttpRequest {
                    url: target.url.clone(),
                    http_method: "POST".to_string(),
                    headers: target.headers.clone(),
                    body: STANDARD.encode(&target.body),
                }),
            },
        };

        let url = self.url(&format!("{}/tasks", queue_path));
        let created: Task = self.send(self.http.post(url).json(&body)).await?;

        let name = created.name.ok_or_else(|| TaskQueueError::Rejected {
            status: 200,
            message: "created task has no name".to_string(),
        })?;
        debug!(task_name = %name, "CreateTask");
        Ok(CreatedTask { name })
    }
}
