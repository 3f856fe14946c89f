// External resource naming (project / location / queue / task paths)

use super::queue::PhysicalQueue;

/// Derives fully-qualified resource names in the external task service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePaths {
    project: String,
    location: String,
}

impl ResourcePaths {
    pub fn new(project: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            location: location.into(),
        }
    }

    /// `projects/{project}/locations/{location}`
    pub fn location_path(&self) -> String {
        format!("projects/{}/locations/{}", self.project, self.location)
    }

    /// `projects/{project}/locations/{location}/queues/{queue}`
    pub fn queue_path(&self, queue: &PhysicalQueue) -> String {
        format!("{}/queues/{}", self.location_path(), queue)
    }

    /// `projects/{project}/locations/{location}/queues/{queue}/tasks/{task_id}`
    pub fn task_name(&self, queue: &PhysicalQueue, task_id: &str) -> String {
        format!("{}/tasks/{}", self.queue_path(queue), task_id)
    }
}
