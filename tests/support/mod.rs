#![allow(dead_code)]

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tempfile::TempDir;
use tracker::{Database, Task, TaskService};

pub fn at(s: &str) -> DateTime<Utc> {
    s.parse().expect("invalid timestamp literal")
}

pub fn open(id: u32, content: &str, start: &str) -> Task {
    Task::new(content, Some(at(start))).with_id(id)
}

pub fn finished(id: u32, content: &str, start: &str, end: &str) -> Task {
    Task::finished(content, at(start), at(end)).with_id(id)
}

pub fn memory_service() -> TaskService {
    TaskService::new(Database::open_in_memory().expect("failed to open in-memory database"))
}

/// The week lookup as `(week key, ids)` pairs, ordered by week.
pub fn lookups(service: &TaskService) -> Vec<(String, Vec<u32>)> {
    service
        .get_all_lookups()
        .expect("failed to read lookups")
        .into_iter()
        .map(|(week, ids)| (week.to_string(), ids))
        .collect()
}

pub fn entry(week: &str, ids: &[u32]) -> (String, Vec<u32>) {
    (week.to_string(), ids.to_vec())
}

/// A database file in a temporary directory.
pub struct TestDb {
    dir: TempDir,
}

impl TestDb {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().join("tasks.sqlite")
    }

    pub fn service(&self) -> TaskService {
        TaskService::new(Database::open(self.path()).expect("failed to open database"))
    }
}
