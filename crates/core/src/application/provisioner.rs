// Resource Provisioner
// Ensures a physical queue exists in the external service before first use

use crate::config::BridgeConfig;
use crate::domain::{PhysicalQueue, ResourcePaths};
use crate::error::{AppError, Result};
use crate::port::{QueueSpec, TaskQueueError, TaskQueueService};
use dashmap::DashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lazily creates physical queues (get, then create on not-found).
///
/// `ensure` is idempotent. With the cache enabled, a queue ensured once is not
/// looked up again for the lifetime of this instance.
pub struct QueueProvisioner {
    task_queue: Arc<dyn TaskQueueService>,
    paths: ResourcePaths,
    max_dispatches_per_second: f64,
    treat_already_exists_as_success: bool,
    cache: Option<DashSet<String>>,
}

impl QueueProvisioner {
    pub fn new(task_queue: Arc<dyn TaskQueueService>, config: &BridgeConfig) -> Self {
        Self {
            task_queue,
            paths: config.paths(),
            max_dispatches_per_second: config.max_dispatches_per_second,
            treat_already_exists_as_success: config.treat_already_exists_as_success,
            cache: config.cache_provisioned_queues.then(DashSet::new),
        }
    }

    /// Make sure `queue` exists; returns its full resource path
    ///
    /// # Errors
    /// - `AppError::ResourceProvision` if the lookup fails with anything but
    ///   not-found, or the create fails (see `treat_already_exists_as_success`)
    pub async fn ensure(&self, queue: &PhysicalQueue) -> Result<String> {
        let queue_path = self.paths.queue_path(queue);

        if let Some(cache) = &self.cache {
            if cache.contains(&queue_path) {
                return Ok(queue_path);
            }
        }

        match self.task_queue.get_queue(&queue_path).await {
            Ok(_) => {
                debug!(queue = %queue_path, "Queue exists");
            }
            Err(TaskQueueError::NotFound(_)) => {
                self.create(queue, &queue_path).await?;
            }
            Err(source) => {
                return Err(AppError::ResourceProvision {
                    queue: queue_path,
                    source,
                });
            }
        }

        if let Some(cache) = &self.cache {
            cache.insert(queue_path.clone());
        }
        Ok(queue_path)
    }

    async fn create(&self, queue: &PhysicalQueue, queue_path: &str) -> Result<()> {
        let spec = QueueSpec {
            name: queue_path.to_string(),
            max_dispatches_per_second: self.max_dispatches_per_second,
        };

        match self
            .task_queue
            .create_queue(&self.paths.location_path(), &spec)
            .await
        {
            Ok(_) => {
                info!(
                    queue = %queue,
                    max_dispatches_per_second = %self.max_dispatches_per_second,
                    "Created queue"
                );
                Ok(())
            }
            Err(TaskQueueError::AlreadyExists(_)) if self.treat_already_exists_as_success => {
                warn!(queue = %queue, "Queue created concurrently, using existing");
                Ok(())
            }
            Err(source) => Err(AppError::ResourceProvision {
                queue: queue_path.to_string(),
                source,
            }),
        }
    }

    /// Queue paths ensured so far (empty when caching is off)
    pub fn provisioned(&self) -> Vec<String> {
        let mut queues: Vec<String> = self
            .cache
            .iter()
            .flat_map(|cache| cache.iter().map(|q| q.key().clone()))
            .collect();
        queues.sort();
        queues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QueueKind;
    use crate::port::task_queue::MockTaskQueueService;
    use crate::port::QueueInfo;

    const QUEUE_PATH: &str = "projects/acme/locations/us-central1/queues/workflow-steps";

    fn config() -> BridgeConfig {
        BridgeConfig::new("acme", "us-central1", "https://bridge.example.com/delivery")
    }

    fn steps() -> PhysicalQueue {
        QueueKind::Step.physical_queue("workflow-")
    }

    fn queue_info() -> QueueInfo {
        QueueInfo {
            name: QUEUE_PATH.to_string(),
            state: Some("RUNNING".to_string()),
        }
    }

    #[tokio::test]
    async fn test_existing_queue_is_not_created() {
        let mut mock = MockTaskQueueService::new();
        mock.expect_get_queue()
            .withf(|path| path == QUEUE_PATH)
            .times(1)
            .returning(|_| Ok(queue_info()));
        mock.expect_create_queue().never();

        let provisioner = QueueProvisioner::new(Arc::new(mock), &config());
        assert_eq!(provisioner.ensure(&steps()).await.unwrap(), QUEUE_PATH);
    }

    #[tokio::test]
    async fn test_not_found_creates_with_rate_limit() {
        let mut mock = MockTaskQueueService::new();
        mock.expect_get_queue()
            .times(1)
            .returning(|path| Err(TaskQueueError::NotFound(path.to_string())));
        mock.expect_create_queue()
            .withf(|location, spec| {
                location == "projects/acme/locations/us-central1"
                    && spec.name == QUEUE_PATH
                    && spec.max_dispatches_per_second == 10.0
            })
            .times(1)
            .returning(|_, _| Ok(queue_info()));

        let provisioner = QueueProvisioner::new(Arc::new(mock), &config());
        tokio_test::assert_ok!(provisioner.ensure(&steps()).await);
    }

    #[tokio::test]
    async fn test_ensure_twice_creates_at_most_once() {
        let mut mock = MockTaskQueueService::new();
        mock.expect_get_queue()
            .times(1)
            .returning(|path| Err(TaskQueueError::NotFound(path.to_string())));
        mock.expect_create_queue()
            .times(1)
            .returning(|_, _| Ok(queue_info()));

        let provisioner = QueueProvisioner::new(Arc::new(mock), &config());
        provisioner.ensure(&steps()).await.unwrap();
        provisioner.ensure(&steps()).await.unwrap();
        assert_eq!(provisioner.provisioned(), vec![QUEUE_PATH.to_string()]);
    }

    #[tokio::test]
    async fn test_ensure_twice_without_cache_looks_up_again() {
        let mut mock = MockTaskQueueService::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_get_queue()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|path| Err(TaskQueueError::NotFound(path.to_string())));
        mock.expect_create_queue()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(queue_info()));
        mock.expect_get_queue()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(queue_info()));

        let mut config = config();
        config.cache_provisioned_queues = false;
        let provisioner = QueueProvisioner::new(Arc::new(mock), &config);
        provisioner.ensure(&steps()).await.unwrap();
        provisioner.ensure(&steps()).await.unwrap();
        assert!(provisioner.provisioned().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_failure_propagates_without_create() {
        let mut mock = MockTaskQueueService::new();
        mock.expect_get_queue()
            .times(1)
            .returning(|_| Err(TaskQueueError::PermissionDenied("no access".to_string())));
        mock.expect_create_queue().never();

        let provisioner = QueueProvisioner::new(Arc::new(mock), &config());
        let err = provisioner.ensure(&steps()).await.unwrap_err();
        match err {
            AppError::ResourceProvision { queue, source } => {
                assert_eq!(queue, QUEUE_PATH);
                assert_eq!(source, TaskQueueError::PermissionDenied("no access".to_string()));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(provisioner.provisioned().is_empty());
    }

    #[tokio::test]
    async fn test_create_race_already_exists_is_success_by_default() {
        let mut mock = MockTaskQueueService::new();
        mock.expect_get_queue()
            .times(1)
            .returning(|path| Err(TaskQueueError::NotFound(path.to_string())));
        mock.expect_create_queue()
            .times(1)
            .returning(|_, spec| Err(TaskQueueError::AlreadyExists(spec.name.clone())));

        let provisioner = QueueProvisioner::new(Arc::new(mock), &config());
        assert_eq!(provisioner.ensure(&steps()).await.unwrap(), QUEUE_PATH);
    }

    #[tokio::test]
    async fn test_create_race_already_exists_fails_when_policy_off() {
        let mut mock = MockTaskQueueService::new();
        mock.expect_get_queue()
            .times(1)
            .returning(|path| Err(TaskQueueError::NotFound(path.to_string())));
        mock.expect_create_queue()
            .times(1)
            .returning(|_, spec| Err(TaskQueueError::AlreadyExists(spec.name.clone())));

        let mut config = config();
        config.treat_already_exists_as_success = false;
        let provisioner = QueueProvisioner::new(Arc::new(mock), &config);

        let err = provisioner.ensure(&steps()).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::ResourceProvision {
                source: TaskQueueError::AlreadyExists(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_create_failure_propagates() {
        let mut mock = MockTaskQueueService::new();
        mock.expect_get_queue()
            .returning(|path| Err(TaskQueueError::NotFound(path.to_string())));
        mock.expect_create_queue()
            .times(1)
            .returning(|_, _| Err(TaskQueueError::Unavailable("try later".to_string())));

        let provisioner = QueueProvisioner::new(Arc::new(mock), &config());
        let err = tokio_test::assert_err!(provisioner.ensure(&steps()).await);
        assert!(err.to_string().contains("try later"));
    }
}
