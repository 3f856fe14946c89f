// ID Provider Port (for deterministic testing)

use crate::domain::message_id::{MessageId, RANDOM_MAX, TIMESTAMP_MAX};
use crate::port::time_provider::{SystemTimeProvider, TimeProvider};
use std::sync::{Arc, Mutex, PoisonError};

/// ID provider interface (allows deterministic IDs in tests)
pub trait IdProvider: Send + Sync {
    /// Generate a new message id
    fn generate_id(&self) -> MessageId;
}

/// Monotonic ULID generator (production)
///
/// Ids from one instance are strictly increasing, including for calls landing
/// in the same millisecond and across clock regressions: the random part of
/// the previous id is incremented, and once it is exhausted the timestamp
/// component moves forward by one millisecond.
pub struct UlidProvider {
    time_provider: Arc<dyn TimeProvider>,
    last: Mutex<UlidState>,
}

#[derive(Default)]
struct UlidState {
    timestamp_ms: u64,
    random: u128,
}

impl UlidProvider {
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            time_provider,
            last: Mutex::new(UlidState::default()),
        }
    }

    /// Generator driven by the system clock
    pub fn system() -> Self {
        Self::new(Arc::new(SystemTimeProvider))
    }
}

impl IdProvider for UlidProvider {
    fn generate_id(&self) -> MessageId {
        let now = (self.time_provider.now_millis().max(0) as u64).min(TIMESTAMP_MAX);

        // State is plain integers; a poisoned lock still holds a usable value
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);

        if now > last.timestamp_ms {
            last.timestamp_ms = now;
            last.random = rand::random::<u128>() & RANDOM_MAX;
        } else if last.random < RANDOM_MAX {
            last.random += 1;
        } else {
            last.timestamp_ms += 1;
            last.random = 0;
        }

        MessageId::from_parts(last.timestamp_ms, last.random)
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Sequential ids (`msg-1`, `msg-2`, ...)
    pub struct SequentialIdProvider {
        next: AtomicU64,
    }

    impl SequentialIdProvider {
        pub fn new() -> Self {
            Self {
                next: AtomicU64::new(1),
            }
        }
    }

    impl Default for SequentialIdProvider {
        fn default() -> Self {
            Self::new()
        }
    }

    impl IdProvider for SequentialIdProvider {
        fn generate_id(&self) -> MessageId {
            let n = self.next.fetch_add(1, Ordering::SeqCst);
            MessageId::from_string(format!("msg-{}", n))
        }
    }
}
