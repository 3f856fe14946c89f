// Dispatch Use Case

use crate::application::provisioner::QueueProvisioner;
use crate::config::BridgeConfig;
use crate::domain::{DeliveryEnvelope, IdempotencyKey, MessageId, QueueMessage, QueueName};
use crate::error::{AppError, Result};
use crate::port::{
    HttpTarget, IdProvider, MessageCodec, TaskQueueError, TaskQueueService, TaskRequest,
};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Dispatch request
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    /// Logical queue name (`__wkf_workflow_...` / `__wkf_step_...`)
    pub queue: String,
    pub message: QueueMessage,

    pub idempotency_key: Option<String>,
}

impl DispatchRequest {
    pub fn new(queue: impl Into<String>, message: QueueMessage) -> Self {
        Self {
            queue: queue.into(),
            message,
            idempotency_key: None,
        }
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// Result of a dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub message_id: MessageId,
    pub queue_name: QueueName,
    pub physical_queue: String,
    /// Named identity (keyed dispatch) or the name the service assigned
    pub task_name: Option<String>,
    /// A task with the same name was already live; nothing new was created
    pub deduplicated: bool,
}

/// Everything a dispatch needs besides the request itself
pub struct DispatchDeps<'a> {
    pub config: &'a BridgeConfig,
    pub provisioner: &'a QueueProvisioner,
    pub task_queue: &'a dyn TaskQueueService,
    pub codec: &'a dyn MessageCodec,
    pub id_provider: &'a dyn IdProvider,
}

/// Execute dispatch use case
///
/// Input is fully validated (queue name, key, message) before any call to the
/// external service.
pub async fn execute(deps: DispatchDeps<'_>, req: DispatchRequest) -> Result<DispatchOutcome> {
    let queue_name = QueueName::parse(&req.queue)?;
    let idempotency_key = req
        .idempotency_key
        .map(IdempotencyKey::new)
        .transpose()?;
    req.message.ensure_kind(queue_name.kind())?;
    req.message.validate()?;

    let physical = deps.config.physical_queue(queue_name.kind());
    let queue_path = deps.provisioner.ensure(&physical).await?;

    let body = deps.codec.encode(&req.message)?;
    let message_id = deps.id_provider.generate_id();

    let envelope = DeliveryEnvelope::new(
        &queue_name,
        &body,
        message_id.clone(),
        idempotency_key.as_ref(),
    );

    let mut headers = BTreeMap::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());

    let task_name = idempotency_key
        .as_ref()
        .map(|key| deps.config.paths().task_name(&physical, &key.task_id()));

    let task = TaskRequest {
        name: task_name.clone(),
        http_request: HttpTarget {
            url: deps.config.callback_url.clone(),
            headers,
            body: envelope.to_json()?,
        },
    };

    let (task_name, deduplicated) = match deps.task_queue.create_task(&queue_path, &task).await {
        Ok(created) => (Some(created.name), false),
        // Named task already live: same logical task, dedup hit
        Err(TaskQueueError::AlreadyExists(_)) if task_name.is_some() => (task_name, true),
        Err(source) => {
            return Err(AppError::Dispatch {
                queue: queue_path,
                source,
            })
        }
    };

    if deduplicated {
        debug!(
            queue = %queue_name,
            message_id = %message_id,
            task_name = ?task_name,
            "Task already exists, dispatch deduplicated"
        );
    } else {
        info!(
            queue = %queue_name,
            message_id = %message_id,
            physical_queue = %physical,
            task_name = ?task_name,
            "Message dispatched"
        );
    }

    Ok(DispatchOutcome {
        message_id,
        queue_name,
        physical_queue: physical.to_string(),
        task_name,
        deduplicated,
    })
}
