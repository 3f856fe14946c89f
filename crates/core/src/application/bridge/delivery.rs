// Delivery Use Case

use crate::domain::{DeliveryEnvelope, MessageId, QueueName};
use crate::error::Result;
use crate::port::{EnqueueOptions, ExecutionEngine, MessageCodec};
use tracing::info;

/// Result of a handled delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub queue_name: QueueName,
    pub message_id: MessageId,
    pub engine_job_id: String,
    /// The engine already had a job for this idempotency key
    pub deduplicated: bool,
}

/// Execute delivery use case
///
/// Every failure is returned to the caller unchanged; the push service
/// redelivers on any non-success response.
pub async fn execute(
    codec: &dyn MessageCodec,
    engine: &dyn ExecutionEngine,
    raw: &[u8],
) -> Result<DeliveryOutcome> {
    let envelope = DeliveryEnvelope::parse(raw)?;
    let queue_name = envelope.queue_name()?;

    let message = codec.decode(&envelope.body()?)?;
    message.ensure_kind(queue_name.kind())?;

    let options = EnqueueOptions {
        idempotency_key: envelope.idempotency_key.clone(),
        message_id: Some(envelope.message_id.clone()),
    };
    let receipt = engine.enqueue(&queue_name, &message, &options).await?;

    info!(
        queue = %queue_name,
        message_id = %envelope.message_id,
        job_id = %receipt.job_id,
        deduplicated = receipt.deduplicated,
        "Delivery handed to engine"
    );

    Ok(DeliveryOutcome {
        queue_name,
        message_id: envelope.message_id,
        engine_job_id: receipt.job_id,
        deduplicated: receipt.deduplicated,
    })
}
