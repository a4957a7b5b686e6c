//! Secondary index from week keys to the ids of the finished tasks that
//! overlap each week.
//!
//! Each entry is stored as a JSON array of ids. Entries never hold an empty
//! array: removing the last id deletes the row.

use std::collections::BTreeMap;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::error::{Error, Result};
use crate::week::WeekKey;

pub type Lookups = BTreeMap<WeekKey, Vec<u32>>;

pub struct WeekLookup<'conn> {
    db: &'conn Connection,
}

impl<'conn> WeekLookup<'conn> {
    pub fn new(db: &'conn Connection) -> WeekLookup<'conn> {
        WeekLookup { db }
    }

    /// Add `id` to the entry of every given week. Adding an id that is
    /// already present leaves the entry unchanged.
    pub fn add_entry(&self, id: u32, weeks: &[WeekKey]) -> Result<()> {
        let tx = self.db.unchecked_transaction()?;
        WeekLookup::new(&tx).add_ids(id, weeks)?;
        tx.commit()?;
        Ok(())
    }

    /// Remove `id` from the entry of every given week, deleting entries that
    /// become empty.
    pub fn remove_entry(&self, id: u32, weeks: &[WeekKey]) -> Result<()> {
        let tx = self.db.unchecked_transaction()?;
        WeekLookup::new(&tx).remove_ids(id, weeks)?;
        tx.commit()?;
        Ok(())
    }

    /// Same as `add_entry`, for a caller that already holds a transaction.
    pub(crate) fn add_ids(&self, id: u32, weeks: &[WeekKey]) -> Result<()> {
        debug!(id, weeks = %join(weeks), "adding lookup");
        for week in weeks {
            let mut ids = read(self.db, week)?;
            if ids.contains(&id) {
                continue;
            }
            ids.push(id);
            write(self.db, week, &ids)?;
        }
        Ok(())
    }

    /// Same as `remove_entry`, for a caller that already holds a transaction.
    pub(crate) fn remove_ids(&self, id: u32, weeks: &[WeekKey]) -> Result<()> {
        debug!(id, weeks = %join(weeks), "removing lookup");
        for week in weeks {
            let mut ids = read(self.db, week)?;
            let before = ids.len();
            ids.retain(|&other| other != id);
            if ids.len() == before {
                continue;
            }

            if ids.is_empty() {
                self.db.execute(
                    "DELETE FROM week_lookup WHERE week = ?1",
                    params![week.to_string()],
                )?;
            } else {
                write(self.db, week, &ids)?;
            }
        }
        Ok(())
    }

    /// The ids recorded for a week. Weeks without an entry yield an empty list.
    pub fn get_entry(&self, week: &WeekKey) -> Result<Vec<u32>> {
        read(self.db, week)
    }

    pub fn get_all_entries(&self) -> Result<Lookups> {
        let mut stmt = self.db.prepare("SELECT week, ids FROM week_lookup")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut lookups = Lookups::new();
        for row in rows {
            let (week, ids) = row?;
            lookups.insert(week.parse()?, serde_json::from_str(&ids)?);
        }
        Ok(lookups)
    }

    /// Replace the whole index in one transaction.
    pub fn replace_all(&self, lookups: &Lookups) -> Result<()> {
        let tx = self.db.unchecked_transaction()?;
        tx.execute("DELETE FROM week_lookup", [])?;
        for (week, ids) in lookups {
            if ids.is_empty() {
                continue;
            }
            write(&tx, week, ids)?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn read(db: &Connection, week: &WeekKey) -> Result<Vec<u32>> {
    let raw = db
        .query_row(
            "SELECT ids FROM week_lookup WHERE week = ?1",
            params![week.to_string()],
            |row| row.get::<_, String>(0),
        )
        .optional()?;

    match raw {
        Some(raw) => serde_json::from_str(&raw).map_err(Error::from),
        None => Ok(Vec::new()),
    }
}

fn write(db: &Connection, week: &WeekKey, ids: &[u32]) -> Result<()> {
    db.execute(
        "INSERT OR REPLACE INTO week_lookup (week, ids) VALUES (?1, ?2)",
        params![week.to_string(), serde_json::to_string(ids)?],
    )?;
    Ok(())
}

fn join(weeks: &[WeekKey]) -> String {
    weeks
        .iter()
        .map(|w| w.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
