// Delivery Envelope
//
// The body of every task submitted to the external service, delivered back
// verbatim to the delivery endpoint:
// `{ "id", "data", "messageId", "idempotencyKey"?, "prefix" }`

use super::error::{DomainError, Result};
use super::idempotency::IdempotencyKey;
use super::message_id::MessageId;
use super::queue::{QueueKind, QueueName};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryEnvelope {
    /// Suffix id of the logical queue name
    pub id: String,
    /// Codec output, base64 (standard alphabet)
    pub data: String,
    pub message_id: MessageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    /// Logical namespace prefix of the queue name
    pub prefix: String,
}

impl DeliveryEnvelope {
    pub fn new(
        queue: &QueueName,
        body: &[u8],
        message_id: MessageId,
        idempotency_key: Option<&IdempotencyKey>,
    ) -> Self {
        Self {
            id: queue.suffix_id().to_string(),
            data: STANDARD.encode(body),
            message_id,
            idempotency_key: idempotency_key.map(|k| k.as_str().to_string()),
            prefix: queue.prefix().to_string(),
        }
    }

    /// Parse a raw delivery body.
    ///
    /// Missing fields, non-JSON input and unrecognized prefixes all fail with
    /// `MalformedPayload`.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let envelope: Self = serde_json::from_slice(raw)
            .map_err(|e| DomainError::MalformedPayload(e.to_string()))?;
        envelope.queue_name()?;
        Ok(envelope)
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| DomainError::ValidationError(e.to_string()))
    }

    /// Original queue name: `prefix + id`
    pub fn queue_name(&self) -> Result<QueueName> {
        QueueKind::from_prefix(&self.prefix)
            .map(|kind| QueueName::new(kind, self.id.as_str()))
            .ok_or_else(|| {
                DomainError::MalformedPayload(format!(
                    "unrecognized queue prefix '{}'",
                    self.prefix
                ))
            })
    }

    /// Decoded codec body
    pub fn body(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(self.data.as_bytes())
            .map_err(|e| DomainError::MalformedPayload(format!("data is not base64: {}", e)))
    }
}
