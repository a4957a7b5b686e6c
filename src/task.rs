use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Collection, Error, Result};

/// A single activity interval. A task without an end is still open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub content: String,
    pub start: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

impl Task {
    /// A new open task. The start defaults to now.
    pub fn new<S: Into<String>>(content: S, start: Option<DateTime<Utc>>) -> Task {
        Task {
            id: None,
            content: content.into(),
            start: start.unwrap_or_else(Utc::now),
            end: None,
        }
    }

    /// A new finished task.
    pub fn finished<S: Into<String>>(content: S, start: DateTime<Utc>, end: DateTime<Utc>) -> Task {
        Task {
            id: None,
            content: content.into(),
            start,
            end: Some(end),
        }
    }

    pub fn with_id(mut self, id: u32) -> Task {
        self.id = Some(id);
        self
    }

    pub fn is_ended(&self) -> bool {
        self.end.is_some()
    }

    /// The collection the task belongs to, given its current end.
    pub fn collection(&self) -> Collection {
        if self.is_ended() {
            Collection::Finished
        } else {
            Collection::Open
        }
    }

    pub fn clear_id(&mut self) {
        self.id = None;
    }

    /// Time spent on a finished task.
    pub fn duration(&self) -> Option<Duration> {
        self.end.map(|end| end - self.start)
    }

    /// Return the persisted id, or a validation error for unsaved tasks.
    pub fn persisted_id(&self) -> Result<u32> {
        match self.id {
            Some(id) if id > 0 => Ok(id),
            _ => Err(Error::Validation(format!(
                "task '{}' has no id",
                self.content
            ))),
        }
    }

    /// Check that the interval is not reversed.
    pub fn validate(&self) -> Result<()> {
        if let Some(end) = self.end {
            if end < self.start {
                return Err(Error::Validation(format!(
                    "task '{}' ends ({}) before it starts ({})",
                    self.content, end, self.start
                )));
            }
        }
        Ok(())
    }
}
