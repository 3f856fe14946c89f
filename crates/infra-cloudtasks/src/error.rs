// Failure classification: HTTP status + API status string -> TaskQueueError

use crate::wire::ErrorEnvelope;
use pushbridge_core::port::TaskQueueError;

/// Map a non-success response to the port's error classes.
///
/// The API status string wins over the HTTP code when both are present.
pub fn classify(http_status: u16, body: &str) -> TaskQueueError {
    let (api_status, message) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => (envelope.error.status, envelope.error.message),
        Err(_) => (String::new(), body.trim().to_string()),
    };

    match (api_status.as_str(), http_status) {
        ("NOT_FOUND", _) | ("", 404) => TaskQueueError::NotFound(message),
        ("ALREADY_EXISTS", _) | ("", 409) => TaskQueueError::AlreadyExists(message),
        ("PERMISSION_DENIED" | "UNAUTHENTICATED", _) | ("", 401 | 403) => {
            TaskQueueError::PermissionDenied(message)
        }
        ("UNAVAILABLE" | "RESOURCE_EXHAUSTED", _) | ("", 429 | 503) => {
            TaskQueueError::Unavailable(message)
        }
        _ => TaskQueueError::Rejected {
            status: http_status,
            message,
        },
    }
}

pub fn transport(err: reqwest::Error) -> TaskQueueError {
    if err.is_timeout() {
        TaskQueueError::Unavailable(format!("request timed out: {}", err))
    } else {
        TaskQueueError::Transport(err.to_string())
    }
}
