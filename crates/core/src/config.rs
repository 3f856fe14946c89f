// Bridge Configuration
//
// Plain data + defaults; loading (file/env layering) is the daemon's job.

use crate::domain::{PhysicalQueue, QueueKind, ResourcePaths};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_QUEUE_NAME_PREFIX: &str = "workflow-";
pub const DEFAULT_MAX_DISPATCHES_PER_SECOND: f64 = 10.0;

/// Connection/target settings for the external task service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub project: String,
    pub location: String,

    /// Prepended to the per-kind physical queue suffix ("flows" / "steps")
    #[serde(default = "default_queue_name_prefix")]
    pub queue_name_prefix: String,

    /// Rate limit applied when a physical queue is created
    #[serde(default = "default_max_dispatches_per_second")]
    pub max_dispatches_per_second: f64,

    /// Delivery target the external service pushes tasks to
    pub callback_url: String,

    /// Remember queues already ensured in this process
    #[serde(default = "default_true")]
    pub cache_provisioned_queues: bool,

    /// How to read an "already exists" answer to a queue create (concurrent
    /// provisioning). `true`: the queue exists, carry on. `false`: fail.
    #[serde(default = "default_true")]
    pub treat_already_exists_as_success: bool,
}

fn default_queue_name_prefix() -> String {
    DEFAULT_QUEUE_NAME_PREFIX.to_string()
}

fn default_max_dispatches_per_second() -> f64 {
    DEFAULT_MAX_DISPATCHES_PER_SECOND
}

fn default_true() -> bool {
    true
}

impl BridgeConfig {
    pub fn new(
        project: impl Into<String>,
        location: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            location: location.into(),
            queue_name_prefix: default_queue_name_prefix(),
            max_dispatches_per_second: DEFAULT_MAX_DISPATCHES_PER_SECOND,
            callback_url: callback_url.into(),
            cache_provisioned_queues: true,
            treat_already_exists_as_success: true,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.project.trim().is_empty() {
            return Err(AppError::Config("project must be set".to_string()));
        }
        if self.location.trim().is_empty() {
            return Err(AppError::Config("location must be set".to_string()));
        }
        if self.callback_url.trim().is_empty() {
            return Err(AppError::Config("callback_url must be set".to_string()));
        }
        if !self.callback_url.starts_with("http://") && !self.callback_url.starts_with("https://")
        {
            return Err(AppError::Config(format!(
                "callback_url must be an http(s) URL, got '{}'",
                self.callback_url
            )));
        }
        if self.queue_name_prefix.is_empty()
            || !self
                .queue_name_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(AppError::Config(format!(
                "queue_name_prefix '{}' may only contain letters, digits and hyphens",
                self.queue_name_prefix
            )));
        }
        if !(self.max_dispatches_per_second > 0.0 && self.max_dispatches_per_second.is_finite()) {
            return Err(AppError::Config(format!(
                "max_dispatches_per_second must be positive, got {}",
                self.max_dispatches_per_second
            )));
        }
        Ok(())
    }

    pub fn paths(&self) -> ResourcePaths {
        ResourcePaths::new(&self.project, &self.location)
    }

    pub fn physical_queue(&self, kind: QueueKind) -> PhysicalQueue {
        kind.physical_queue(&self.queue_name_prefix)
    }
}
