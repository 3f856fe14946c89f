// Application Layer - Use Cases

pub mod bridge;
pub mod provisioner;

// Re-exports
pub use bridge::{
    BridgeStats, DeliveryOutcome, DispatchOutcome, DispatchRequest, QueueBridge, ResolvedQueue,
};
pub use provisioner::QueueProvisioner;
