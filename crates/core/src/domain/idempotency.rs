// Idempotency Key -> external task identity

use super::error::{DomainError, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

/// Task ids in the external service are limited to 500 characters
pub const MAX_TASK_ID_LEN: usize = 500;

/// Largest raw key whose encoded task id still fits `MAX_TASK_ID_LEN`
pub const MAX_KEY_BYTES: usize = MAX_TASK_ID_LEN / 4 * 3;

/// Producer-supplied token collapsing repeated dispatches into one task
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(DomainError::InvalidIdempotencyKey(
                "key must not be empty".to_string(),
            ));
        }
        if key.len() > MAX_KEY_BYTES {
            return Err(DomainError::InvalidIdempotencyKey(format!(
                "key is {} bytes (max {})",
                key.len(),
                MAX_KEY_BYTES
            )));
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Deterministic task id for this key.
    ///
    /// URL-safe base64 without padding only uses `[A-Za-z0-9_-]`, which is the
    /// task-id alphabet, and distinct keys always encode to distinct ids.
    pub fn task_id(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.0.as_bytes())
    }
}
