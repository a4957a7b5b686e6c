//! Error types for the task store.

use std::fmt;
use thiserror::Error;

/// The two task collections. Each one has its own id sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Open,
    Finished,
}

impl Collection {
    /// Name of the table backing the collection.
    pub fn table(self) -> &'static str {
        match self {
            Collection::Open => "open_tasks",
            Collection::Finished => "finished_tasks",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::Open => write!(f, "open tasks"),
            Collection::Finished => write!(f, "finished tasks"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Task {id} not found in {collection}")]
    NotFound { collection: Collection, id: u32 },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Invalid task: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid week key: {0}")]
    InvalidWeekKey(String),

    #[error("Unsupported database schema version {0}")]
    UnsupportedSchema(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The task itself was written, but the week lookup could not be brought
    /// up to date. Running a reindex repairs it.
    #[error("Week lookup out of sync for finished task {id}: {source}")]
    IndexWrite {
        id: u32,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
