// Queue Message (the payload carried for the execution engine)

use super::error::{DomainError, Result};
use super::queue::QueueKind;
use serde::{Deserialize, Serialize};

/// Work item handed to the execution engine.
///
/// Wire shape: `{ "kind": "workflow" | "step", "payload": <json>, "traceId"?: string }`.
/// Unknown fields are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QueueMessage {
    pub kind: QueueKind,
    pub payload: serde_json::Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

impl QueueMessage {
    pub fn new(kind: QueueKind, payload: serde_json::Value) -> Self {
        Self {
            kind,
            payload,
            trace_id: None,
        }
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Schema checks that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.payload.is_null() {
            return Err(DomainError::InvalidMessage(
                "payload must not be null".to_string(),
            ));
        }
        if matches!(&self.trace_id, Some(t) if t.is_empty()) {
            return Err(DomainError::InvalidMessage(
                "traceId must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// A message may only travel through a queue of its own kind
    pub fn ensure_kind(&self, expected: QueueKind) -> Result<()> {
        if self.kind != expected {
            return Err(DomainError::InvalidMessage(format!(
                "{} message cannot be routed through a {} queue",
                self.kind, expected
            )));
        }
        Ok(())
    }
}
