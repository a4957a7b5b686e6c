//! Orchestration of the task store and the week lookup.
//!
//! A task is open until it gets an end, then it moves to the finished
//! collection under a fresh id and is indexed under every week its interval
//! touches. The service is the only writer of the lookup.
//!
//! Moving a task between collections runs in one transaction together with
//! its lookup change, so a task is never in both collections. Elsewhere,
//! storing a task and indexing it are separate steps. They are ordered so the
//! lookup never points at a task that does not exist: a failure can leave a
//! finished task missing from the index (see `reindex`), never the reverse.
//! Mutating methods take `&mut self`, so there is a single writer at a time.

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::db::Database;
use crate::error::{Collection, Error, Result};
use crate::export::Snapshot;
use crate::lookup::{Lookups, WeekLookup};
use crate::store::TaskStore;
use crate::task::Task;
use crate::week::{week_keys, Week, WeekKey};

pub struct TaskService {
    db: Database,
}

impl TaskService {
    pub fn new(db: Database) -> TaskService {
        TaskService { db }
    }

    fn store(&self) -> TaskStore<'_> {
        TaskStore::new(self.db.connection())
    }

    fn lookup(&self) -> WeekLookup<'_> {
        WeekLookup::new(self.db.connection())
    }

    /// Store a new task and return the id assigned in its collection.
    pub fn add_task(&mut self, task: &Task) -> Result<u32> {
        task.validate()?;
        match task.end {
            Some(end) => {
                let id = self.store().insert_finished(task)?;
                self.lookup()
                    .add_entry(id, &week_keys(task.start, end))
                    .map_err(|err| out_of_sync(id, err))?;
                Ok(id)
            }
            None => self.store().insert_open(task),
        }
    }

    /// Update a task, deciding from its end which collection it lives in.
    ///
    /// A task without an end is first tried as a finished task being
    /// reopened. If no finished task has its id, it is updated as an open
    /// task. Both collections number their tasks independently, so prefer
    /// `update_open_task` / `reopen_task` when the caller knows which one it
    /// means.
    pub fn update_task(&mut self, task: &Task) -> Result<()> {
        match task.collection() {
            Collection::Finished => self.update_finished_task(task),
            Collection::Open => match self.reopen_task(task) {
                Ok(_) => Ok(()),
                Err(err) if err.is_not_found() => self.update_open_task(task),
                Err(err) => Err(err),
            },
        }
    }

    pub fn update_open_task(&mut self, task: &Task) -> Result<()> {
        self.store().update_open(task)
    }

    /// Rewrite a finished task and move its lookup entries to its new weeks.
    ///
    /// Failing to drop the old entries does not stop the update: the stale
    /// entries still point at an existing task.
    pub fn update_finished_task(&mut self, task: &Task) -> Result<()> {
        let id = task.persisted_id()?;
        task.validate()?;
        let end = task.end.ok_or_else(|| {
            Error::Validation(format!("finished task '{}' has no end", task.content))
        })?;

        let removed = self
            .store()
            .get_finished(id)
            .and_then(|original| self.lookup().remove_entry(id, &weeks_of(&original)));
        if let Err(err) = removed {
            warn!(id, error = %err, "failed to remove previous lookup entries");
        }

        self.store().update_finished(task)?;
        self.lookup()
            .add_entry(id, &week_keys(task.start, end))
            .map_err(|err| out_of_sync(id, err))
    }

    /// Move a finished task back to the open collection, dropping its end.
    /// Returns the id assigned in the open collection. Fails with `NotFound`
    /// if no finished task has the task's id. Nothing changes on failure.
    pub fn reopen_task(&mut self, task: &Task) -> Result<u32> {
        let id = task.persisted_id()?;
        let original = self.store().get_finished(id)?;

        let mut reopened = task.clone();
        reopened.clear_id();
        reopened.end = None;

        let tx = self.db.connection().unchecked_transaction()?;
        let store = TaskStore::new(&tx);
        WeekLookup::new(&tx).remove_ids(id, &weeks_of(&original))?;
        let open_id = store.insert_open(&reopened)?;
        store.remove_finished(&original)?;
        tx.commit()?;

        info!(id, open_id, "reopened task");
        Ok(open_id)
    }

    /// Finish an open task at `end`. The task gets a new id in the finished
    /// collection, which is returned. Nothing changes on failure.
    pub fn complete_task(&mut self, task: &Task, end: DateTime<Utc>) -> Result<u32> {
        task.persisted_id()?;

        let mut finished = task.clone();
        finished.clear_id();
        finished.end = Some(end);
        finished.validate()?;

        let tx = self.db.connection().unchecked_transaction()?;
        let store = TaskStore::new(&tx);
        let id = store.insert_finished(&finished)?;
        store.remove_open(task)?;
        WeekLookup::new(&tx).add_ids(id, &week_keys(finished.start, end))?;
        tx.commit()?;
        Ok(id)
    }

    pub fn remove_task(&mut self, task: &Task) -> Result<()> {
        if task.collection() == Collection::Open {
            return self.store().remove_open(task);
        }

        let id = task.persisted_id()?;
        // the stored interval is authoritative when the record still exists
        let weeks = match self.store().get_finished(id) {
            Ok(stored) => weeks_of(&stored),
            Err(err) if err.is_not_found() => weeks_of(task),
            Err(err) => return Err(err),
        };
        self.lookup().remove_entry(id, &weeks)?;
        self.store().remove_finished(task)
    }

    /// Tasks visible in the given week.
    pub fn get_tasks(&self, week: &Week) -> Result<Vec<Task>> {
        self.get_tasks_at(week, Utc::now())
    }

    /// Tasks visible in the given week, as seen at `now`: the finished tasks
    /// indexed under the week, followed by the open tasks started before the
    /// week ends. Open tasks are only listed for weeks that have begun.
    pub fn get_tasks_at(&self, week: &Week, now: DateTime<Utc>) -> Result<Vec<Task>> {
        let start = week.start();
        let end = week.end() - Duration::milliseconds(1);

        let lookup = self.lookup();
        let mut ids: Vec<u32> = Vec::new();
        for key in week_keys(start, end) {
            for id in lookup.get_entry(&key)? {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }

        let store = self.store();
        let mut tasks = store.get_by_id(&ids)?;
        if start < now {
            tasks.extend(store.get_open_before(end)?);
        }
        Ok(tasks)
    }

    pub fn get_open_task(&self, id: u32) -> Result<Task> {
        self.store().get_open(id)
    }

    pub fn get_finished_task(&self, id: u32) -> Result<Task> {
        self.store().get_finished(id)
    }

    pub fn get_all_open_tasks(&self) -> Result<Vec<Task>> {
        self.store().get_all_open()
    }

    pub fn get_all_finished_tasks(&self) -> Result<Vec<Task>> {
        self.store().get_all_finished()
    }

    pub fn get_all_lookups(&self) -> Result<Lookups> {
        self.lookup().get_all_entries()
    }

    /// Rebuild the week lookup from the finished tasks. Returns the number of
    /// week entries written.
    pub fn reindex(&mut self) -> Result<usize> {
        let lookups = build_lookups(&self.store().get_all_finished()?);
        self.lookup().replace_all(&lookups)?;
        info!(weeks = lookups.len(), "rebuilt week lookup");
        Ok(lookups.len())
    }

    pub fn export(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            finished_tasks: self.get_all_finished_tasks()?,
            open_tasks: self.get_all_open_tasks()?,
            lookup: self.get_all_lookups()?,
        })
    }

    /// Restore a snapshot into an empty database, keeping task ids. The
    /// lookup is rebuilt from the finished tasks rather than copied.
    pub fn import(&mut self, snapshot: &Snapshot) -> Result<()> {
        let store = self.store();
        if store.count(Collection::Open)? > 0
            || store.count(Collection::Finished)? > 0
            || !self.lookup().get_all_entries()?.is_empty()
        {
            return Err(Error::Validation(
                "can only import into an empty database".to_string(),
            ));
        }

        for task in snapshot.open_tasks.iter().chain(&snapshot.finished_tasks) {
            task.validate()?;
            task.persisted_id()?;
        }

        let tx = self.db.connection().unchecked_transaction()?;
        for task in &snapshot.open_tasks {
            store.update_open(task)?;
        }
        for task in &snapshot.finished_tasks {
            store.update_finished(task)?;
        }
        tx.commit()?;

        let lookups = build_lookups(&snapshot.finished_tasks);
        if lookups != snapshot.lookup {
            warn!("imported lookup does not match the finished tasks, rebuilt it");
        }
        self.lookup().replace_all(&lookups)?;
        info!(
            open = snapshot.open_tasks.len(),
            finished = snapshot.finished_tasks.len(),
            "imported tasks"
        );
        Ok(())
    }
}

/// Weeks a finished task is indexed under. Open tasks are not indexed.
fn weeks_of(task: &Task) -> Vec<WeekKey> {
    match task.end {
        Some(end) => week_keys(task.start, end),
        None => Vec::new(),
    }
}

fn build_lookups(finished: &[Task]) -> Lookups {
    let mut lookups = Lookups::new();
    for task in finished {
        if let Some(id) = task.id {
            for week in weeks_of(task) {
                lookups.entry(week).or_insert_with(Vec::new).push(id);
            }
        }
    }
    lookups
}

fn out_of_sync(id: u32, err: Error) -> Error {
    warn!(id, error = %err, "week lookup out of sync");
    Error::IndexWrite {
        id,
        source: Box::new(err),
    }
}
