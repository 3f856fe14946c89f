// Message Codec Port
// Opaque body <-> QueueMessage, schema-checked on the way in

use crate::domain::QueueMessage;
use crate::error::{AppError, Result};

pub trait MessageCodec: Send + Sync {
    /// MIME type of encoded bodies
    fn content_type(&self) -> &'static str;

    fn encode(&self, message: &QueueMessage) -> Result<Vec<u8>>;

    /// # Errors
    /// - `AppError::InvalidMessage` if the body does not match the message schema
    fn decode(&self, body: &[u8]) -> Result<QueueMessage>;
}

/// JSON codec (`{kind, payload, traceId?}`)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMessageCodec;

impl MessageCodec for JsonMessageCodec {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn encode(&self, message: &QueueMessage) -> Result<Vec<u8>> {
        message.validate()?;
        Ok(serde_json::to_vec(message)?)
    }

    fn decode(&self, body: &[u8]) -> Result<QueueMessage> {
        let message: QueueMessage = serde_json::from_slice(body)
            .map_err(|e| AppError::InvalidMessage(e.to_string()))?;
        message.validate()?;
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QueueKind;
    use serde_json::json;

    #[test]
    fn test_encode_decode() {
        let codec = JsonMessageCodec;
        let msg = QueueMessage::new(QueueKind::Workflow, json!({"run": "r-1"}));

        let body = codec.encode(&msg).unwrap();
        assert_eq!(codec.decode(&body).unwrap(), msg);
        assert_eq!(codec.content_type(), "application/json");
    }

    #[test]
    fn test_decode_schema_mismatch_is_invalid_message() {
        let codec = JsonMessageCodec;

        let bodies: [&[u8]; 5] = [
            br#"{"kind":"job","payload":{}}"#,
            br#"{"payload":{}}"#,
            br#"{"kind":"step","payload":{},"extra":1}"#,
            br#"{"kind":"step","payload":null}"#,
            b"\xff\xfe",
        ];
        for body in bodies {
            let err = codec.decode(body).unwrap_err();
            assert!(matches!(err, AppError::InvalidMessage(_)), "{:?}", err);
        }
    }

    #[test]
    fn test_encode_rejects_invalid_message() {
        let codec = JsonMessageCodec;
        let msg = QueueMessage::new(QueueKind::Step, json!(null));
        assert!(matches!(
            codec.encode(&msg).unwrap_err(),
            AppError::InvalidMessage(_)
        ));
    }
}
