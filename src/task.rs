use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::TaskPoolError;

/// An opaque unit of requested work.
///
/// Immutable once created; the description is validated at construction so
/// every `TaskItem` in flight is known to be well-formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    id: Uuid,
    description: String,
    created_at: DateTime<Utc>,
}

impl TaskItem {
    /// Create a new task item.
    ///
    /// Rejects empty or whitespace-only descriptions without mutating any
    /// state anywhere.
    pub fn new(description: impl Into<String>) -> Result<Self, TaskPoolError> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(TaskPoolError::EmptyDescription);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            description,
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl std::fmt::Display for TaskItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description)
    }
}
