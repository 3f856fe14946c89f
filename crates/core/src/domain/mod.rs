// Domain Layer - Pure bridge model (names, identities, envelope)

pub mod envelope;
pub mod error;
pub mod idempotency;
pub mod message;
pub mod message_id;
pub mod queue;
pub mod resource;

// Re-exports
pub use envelope::DeliveryEnvelope;
pub use error::DomainError;
pub use idempotency::IdempotencyKey;
pub use message::QueueMessage;
pub use message_id::MessageId;
pub use queue::{PhysicalQueue, QueueKind, QueueName};
pub use resource::ResourcePaths;
