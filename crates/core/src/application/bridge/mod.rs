// Queue Bridge - dispatch into the push service, hand deliveries to the engine

pub mod delivery;
pub mod dispatch;


pub use delivery::DeliveryOutcome;
pub use dispatch::{DispatchOutcome, DispatchRequest};

use crate::application::provisioner::QueueProvisioner;
use crate::config::BridgeConfig;
use crate::domain::{PhysicalQueue, QueueKind, QueueName};
use crate::error::Result;
use crate::port::{ExecutionEngine, IdProvider, MessageCodec, TaskQueueService};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Where a logical queue name lands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQueue {
    pub queue_name: QueueName,
    pub physical_queue: PhysicalQueue,
    pub queue_path: String,
}

impl ResolvedQueue {
    pub fn kind(&self) -> QueueKind {
        self.queue_name.kind()
    }
}

/// Counters since construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    pub dispatched: u64,
    pub deduplicated: u64,
    pub delivered: u64,
    pub delivery_failures: u64,
    pub uptime_seconds: u64,
}

#[derive(Default)]
struct Counters {
    dispatched: AtomicU64,
    deduplicated: AtomicU64,
    delivered: AtomicU64,
    delivery_failures: AtomicU64,
}

/// The bridge. Collaborators are injected; no ambient clients.
pub struct QueueBridge {
    config: BridgeConfig,
    task_queue: Arc<dyn TaskQueueService>,
    engine: Arc<dyn ExecutionEngine>,
    codec: Arc<dyn MessageCodec>,
    id_provider: Arc<dyn IdProvider>,
    provisioner: QueueProvisioner,
    counters: Counters,
    started_at: Instant,
}

impl QueueBridge {
    /// # Errors
    /// - `AppError::Config` if `config` does not validate
    pub fn new(
        config: BridgeConfig,
        task_queue: Arc<dyn TaskQueueService>,
        engine: Arc<dyn ExecutionEngine>,
        codec: Arc<dyn MessageCodec>,
        id_provider: Arc<dyn IdProvider>,
    ) -> Result<Self> {
        config.validate()?;
        let provisioner = QueueProvisioner::new(Arc::clone(&task_queue), &config);

        Ok(Self {
            config,
            task_queue,
            engine,
            codec,
            id_provider,
            provisioner,
            counters: Counters::default(),
            started_at: Instant::now(),
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Resolve a logical queue name (pure, no external call)
    pub fn resolve(&self, queue: &str) -> Result<ResolvedQueue> {
        let queue_name = QueueName::parse(queue)?;
        let physical_queue = self.config.physical_queue(queue_name.kind());
        let queue_path = self.config.paths().queue_path(&physical_queue);

        Ok(ResolvedQueue {
            queue_name,
            physical_queue,
            queue_path,
        })
    }

    /// Send a message through the push service
    pub async fn dispatch(&self, req: DispatchRequest) -> Result<DispatchOutcome> {
        let deps = dispatch::DispatchDeps {
            config: &self.config,
            provisioner: &self.provisioner,
            task_queue: self.task_queue.as_ref(),
            codec: self.codec.as_ref(),
            id_provider: self.id_provider.as_ref(),
        };
        let outcome = dispatch::execute(deps, req).await?;

        self.counters.dispatched.fetch_add(1, Ordering::Relaxed);
        if outcome.deduplicated {
            self.counters.deduplicated.fetch_add(1, Ordering::Relaxed);
        }
        Ok(outcome)
    }

    /// Handle one push delivery (raw request body)
    pub async fn handle_delivery(&self, raw: &[u8]) -> Result<DeliveryOutcome> {
        let result = delivery::execute(self.codec.as_ref(), self.engine.as_ref(), raw).await;

        let counter = match &result {
            Ok(_) => &self.counters.delivered,
            Err(_) => &self.counters.delivery_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        result
    }

    /// Physical queue paths ensured by this process
    pub fn provisioned_queues(&self) -> Vec<String> {
        self.provisioner.provisioned()
    }

    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            dispatched: self.counters.dispatched.load(Ordering::Relaxed),
            deduplicated: self.counters.deduplicated.load(Ordering::Relaxed),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            delivery_failures: self.counters.delivery_failures.load(Ordering::Relaxed),
            uptime_seconds: self.started_at.elapsed().as_secs(),
        }
    }
}
