//! Durable storage for open and finished tasks.
//!
//! The two collections live in separate tables with their own
//! `AUTOINCREMENT` sequences, so an open task and a finished task can carry
//! the same id. Updates are upserts: writing a task whose id is missing
//! creates it under that id.

use std::convert::TryFrom;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::error::{Collection, Error, Result};
use crate::task::Task;

const OPEN_COLUMNS: &str = "id, content, started_at";
const FINISHED_COLUMNS: &str = "id, content, started_at, ended_at";

pub struct TaskStore<'conn> {
    db: &'conn Connection,
}

impl<'conn> TaskStore<'conn> {
    pub fn new(db: &'conn Connection) -> TaskStore<'conn> {
        TaskStore { db }
    }

    /// Insert into the open collection and return the assigned id. Any id or
    /// end carried by the task is ignored.
    pub fn insert_open(&self, task: &Task) -> Result<u32> {
        debug!(content = %task.content, "adding open task");
        self.db.execute(
            "INSERT INTO open_tasks (content, started_at) VALUES (?1, ?2)",
            params![task.content, task.start.timestamp_millis()],
        )?;
        last_id(self.db)
    }

    /// Insert into the finished collection and return the assigned id.
    pub fn insert_finished(&self, task: &Task) -> Result<u32> {
        debug!(content = %task.content, "adding finished task");
        let end = required_end(task)?;
        self.db.execute(
            "INSERT INTO finished_tasks (content, started_at, ended_at) VALUES (?1, ?2, ?3)",
            params![
                task.content,
                task.start.timestamp_millis(),
                end.timestamp_millis()
            ],
        )?;
        last_id(self.db)
    }

    pub fn update_open(&self, task: &Task) -> Result<()> {
        let id = task.persisted_id()?;
        debug!(id, "updating open task");
        self.db.execute(
            "INSERT OR REPLACE INTO open_tasks (id, content, started_at) VALUES (?1, ?2, ?3)",
            params![id, task.content, task.start.timestamp_millis()],
        )?;
        Ok(())
    }

    pub fn update_finished(&self, task: &Task) -> Result<()> {
        let id = task.persisted_id()?;
        let end = required_end(task)?;
        debug!(id, "updating finished task");
        self.db.execute(
            "INSERT OR REPLACE INTO finished_tasks (id, content, started_at, ended_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                id,
                task.content,
                task.start.timestamp_millis(),
                end.timestamp_millis()
            ],
        )?;
        Ok(())
    }

    /// Delete from the open collection. Deleting a missing id does nothing.
    pub fn remove_open(&self, task: &Task) -> Result<()> {
        self.remove(Collection::Open, task.persisted_id()?)
    }

    /// Delete from the finished collection. Deleting a missing id does nothing.
    pub fn remove_finished(&self, task: &Task) -> Result<()> {
        self.remove(Collection::Finished, task.persisted_id()?)
    }

    fn remove(&self, collection: Collection, id: u32) -> Result<()> {
        debug!(id, %collection, "removing task");
        self.db.execute(
            &format!("DELETE FROM {} WHERE id = ?1", collection.table()),
            params![id],
        )?;
        Ok(())
    }

    /// Fetch finished tasks by id, in the requested order. Fails if any of
    /// them is missing.
    pub fn get_by_id(&self, ids: &[u32]) -> Result<Vec<Task>> {
        let mut stmt = self.db.prepare_cached(&format!(
            "SELECT {} FROM finished_tasks WHERE id = ?1",
            FINISHED_COLUMNS
        ))?;

        let mut tasks = Vec::with_capacity(ids.len());
        for &id in ids {
            let task = stmt
                .query_row(params![id], finished_task_from_row)
                .optional()?
                .ok_or(Error::NotFound {
                    collection: Collection::Finished,
                    id,
                })?;
            tasks.push(task);
        }
        Ok(tasks)
    }

    pub fn get_finished(&self, id: u32) -> Result<Task> {
        let mut tasks = self.get_by_id(&[id])?;
        Ok(tasks.remove(0))
    }

    pub fn get_open(&self, id: u32) -> Result<Task> {
        self.db
            .query_row(
                &format!("SELECT {} FROM open_tasks WHERE id = ?1", OPEN_COLUMNS),
                params![id],
                open_task_from_row,
            )
            .optional()?
            .ok_or(Error::NotFound {
                collection: Collection::Open,
                id,
            })
    }

    /// Open tasks started at or before the cutoff, oldest first.
    pub fn get_open_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Task>> {
        let mut stmt = self.db.prepare(&format!(
            "SELECT {} FROM open_tasks WHERE started_at <= ?1 ORDER BY started_at, id",
            OPEN_COLUMNS
        ))?;
        let rows = stmt.query_map(params![cutoff.timestamp_millis()], open_task_from_row)?;
        collect(rows)
    }

    pub fn get_all_open(&self) -> Result<Vec<Task>> {
        let mut stmt = self
            .db
            .prepare(&format!("SELECT {} FROM open_tasks ORDER BY id", OPEN_COLUMNS))?;
        let rows = stmt.query_map([], open_task_from_row)?;
        collect(rows)
    }

    pub fn get_all_finished(&self) -> Result<Vec<Task>> {
        let mut stmt = self.db.prepare(&format!(
            "SELECT {} FROM finished_tasks ORDER BY id",
            FINISHED_COLUMNS
        ))?;
        let rows = stmt.query_map([], finished_task_from_row)?;
        collect(rows)
    }

    /// Number of tasks in a collection.
    pub fn count(&self, collection: Collection) -> Result<u32> {
        let count = self.db.query_row(
            &format!("SELECT count(*) FROM {}", collection.table()),
            [],
            |row| row.get::<_, u32>(0),
        )?;
        Ok(count)
    }
}

fn required_end(task: &Task) -> Result<DateTime<Utc>> {
    task.end.ok_or_else(|| {
        Error::Validation(format!("finished task '{}' has no end", task.content))
    })
}

fn last_id(db: &Connection) -> Result<u32> {
    let rowid = db.last_insert_rowid();
    let id = u32::try_from(rowid).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(0, rowid))?;
    Ok(id)
}

fn collect<I>(rows: I) -> Result<Vec<Task>>
where
    I: Iterator<Item = rusqlite::Result<Task>>,
{
    let mut tasks = Vec::new();
    for task in rows {
        tasks.push(task?);
    }
    Ok(tasks)
}

fn timestamp(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let millis = row.get::<_, i64>(idx)?;
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, millis))
}

/// Return an open task from a row in this order: [id, content, started_at]
fn open_task_from_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: Some(row.get(0)?),
        content: row.get(1)?,
        start: timestamp(row, 2)?,
        end: None,
    })
}

/// Return a finished task from a row in this order: [id, content,
/// started_at, ended_at]
fn finished_task_from_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: Some(row.get(0)?),
        content: row.get(1)?,
        start: timestamp(row, 2)?,
        end: Some(timestamp(row, 3)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn collections_number_independently() {
        let db = Database::open_in_memory().unwrap();
        let store = TaskStore::new(db.connection());

        let first = store.insert_open(&Task::new("a", Some(at("2021-05-24T10:00:00Z")))).unwrap();
        let second = store.insert_open(&Task::new("b", Some(at("2021-05-24T08:00:00Z")))).unwrap();
        let finished = store
            .insert_finished(&Task::finished(
                "c",
                at("2021-05-22T10:00:00Z"),
                at("2021-05-25T12:00:00Z"),
            ))
            .unwrap();

        assert_eq!((first, second, finished), (1, 2, 1));
    }

    #[test]
    fn open_insert_drops_end() {
        let db = Database::open_in_memory().unwrap();
        let store = TaskStore::new(db.connection());
        let task = Task::finished("a", at("2021-05-24T10:00:00Z"), at("2021-05-24T11:00:00Z"));

        let id = store.insert_open(&task).unwrap();
        assert_eq!(store.get_open(id).unwrap().end, None);
    }

    #[test]
    fn finished_insert_requires_end() {
        let db = Database::open_in_memory().unwrap();
        let store = TaskStore::new(db.connection());
        assert!(matches!(
            store.insert_finished(&Task::new("a", None)),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn update_upserts_missing_ids() {
        let db = Database::open_in_memory().unwrap();
        let store = TaskStore::new(db.connection());

        let task = Task::new("a", Some(at("2021-05-24T10:00:00Z"))).with_id(9);
        store.update_open(&task).unwrap();
        assert_eq!(store.get_all_open().unwrap(), vec![task]);

        // the sequence continues after the upserted id
        assert_eq!(store.insert_open(&Task::new("b", None)).unwrap(), 10);
    }

    #[test]
    fn update_without_id_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let store = TaskStore::new(db.connection());
        assert!(matches!(
            store.update_open(&Task::new("a", None)),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            store.remove_finished(&Task::new("a", None)),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn remove_missing_is_a_no_op() {
        let db = Database::open_in_memory().unwrap();
        let store = TaskStore::new(db.connection());
        let task = Task::new("a", None).with_id(3);
        store.remove_open(&task).unwrap();
        store.remove_open(&task).unwrap();
    }

    #[test]
    fn get_by_id_keeps_order_and_reports_missing() {
        let db = Database::open_in_memory().unwrap();
        let store = TaskStore::new(db.connection());
        for content in &["a", "b", "c"] {
            store
                .insert_finished(&Task::finished(
                    *content,
                    at("2021-05-24T10:00:00Z"),
                    at("2021-05-24T12:00:00Z"),
                ))
                .unwrap();
        }

        let contents: Vec<String> = store
            .get_by_id(&[3, 1])
            .unwrap()
            .into_iter()
            .map(|t| t.content)
            .collect();
        assert_eq!(contents, vec!["c", "a"]);

        match store.get_by_id(&[1, 7]) {
            Err(Error::NotFound { collection, id }) => {
                assert_eq!(collection, Collection::Finished);
                assert_eq!(id, 7);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn open_before_cutoff_sorted_by_start() {
        let db = Database::open_in_memory().unwrap();
        let store = TaskStore::new(db.connection());
        store.insert_open(&Task::new("late", Some(at("2021-05-25T10:00:00Z")))).unwrap();
        store.insert_open(&Task::new("early", Some(at("2021-05-17T10:00:00Z")))).unwrap();
        store.insert_open(&Task::new("edge", Some(at("2021-05-23T23:59:59Z")))).unwrap();

        let contents: Vec<String> = store
            .get_open_before(at("2021-05-23T23:59:59Z"))
            .unwrap()
            .into_iter()
            .map(|t| t.content)
            .collect();
        assert_eq!(contents, vec!["early", "edge"]);
    }

    #[test]
    fn timestamps_keep_millisecond_precision() {
        let db = Database::open_in_memory().unwrap();
        let store = TaskStore::new(db.connection());
        let task = Task::finished(
            "a",
            at("2021-05-24T10:00:00.250Z"),
            at("2021-05-24T12:30:00.750Z"),
        );
        let id = store.insert_finished(&task).unwrap();
        assert_eq!(store.get_finished(id).unwrap(), task.with_id(id));
    }
}
