// Queue Namespace Domain Model
//
// A logical queue name is `{kind prefix}{suffix id}`. Each kind maps to exactly
// one physical queue in the external task service: `{name prefix}{kind suffix}`.

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logical queue kind (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueKind {
    Workflow,
    Step,
}

impl QueueKind {
    pub const ALL: [QueueKind; 2] = [QueueKind::Workflow, QueueKind::Step];

    /// Prefix every logical queue name of this kind starts with
    pub const fn prefix(self) -> &'static str {
        match self {
            QueueKind::Workflow => "__wkf_workflow_",
            QueueKind::Step => "__wkf_step_",
        }
    }

    /// Fixed suffix of the physical queue backing this kind
    pub const fn physical_suffix(self) -> &'static str {
        match self {
            QueueKind::Workflow => "flows",
            QueueKind::Step => "steps",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            QueueKind::Workflow => "workflow",
            QueueKind::Step => "step",
        }
    }

    /// Kind owning exactly this logical prefix
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.prefix() == prefix)
    }

    /// Physical queue for this kind under the configured name prefix
    pub fn physical_queue(self, name_prefix: &str) -> PhysicalQueue {
        PhysicalQueue(format!("{}{}", name_prefix, self.physical_suffix()))
    }
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "workflow" => Ok(QueueKind::Workflow),
            "step" => Ok(QueueKind::Step),
            other => Err(DomainError::ValidationError(format!(
                "unknown queue kind '{}' (expected 'workflow' or 'step')",
                other
            ))),
        }
    }
}

/// Queue identifier inside the external task service (e.g. `workflow-steps`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhysicalQueue(String);

impl PhysicalQueue {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhysicalQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Logical queue name as chosen by producers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QueueName {
    kind: QueueKind,
    suffix_id: String,
}

impl QueueName {
    pub fn new(kind: QueueKind, suffix_id: impl Into<String>) -> Self {
        Self {
            kind,
            suffix_id: suffix_id.into(),
        }
    }

    /// Split a raw queue name into its kind and suffix id.
    ///
    /// Fails with `InvalidQueueName` when no recognized prefix matches.
    pub fn parse(raw: &str) -> Result<Self> {
        QueueKind::ALL
            .into_iter()
            .find_map(|kind| {
                raw.strip_prefix(kind.prefix())
                    .map(|suffix| Self::new(kind, suffix))
            })
            .ok_or_else(|| DomainError::InvalidQueueName(raw.to_string()))
    }

    pub fn kind(&self) -> QueueKind {
        self.kind
    }

    pub fn prefix(&self) -> &'static str {
        self.kind.prefix()
    }

    pub fn suffix_id(&self) -> &str {
        &self.suffix_id
    }
}

impl fmt::Display for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.suffix_id)
    }
}

impl FromStr for QueueName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for QueueName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<QueueName> for String {
    fn from(value: QueueName) -> Self {
        value.to_string()
    }
}
