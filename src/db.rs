use std::fs;
use std::io;
use std::path::Path;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Schema version written by `init_schema`.
pub const SCHEMA_VERSION: i64 = 1;

/// The tracker database: one SQLite file holding the open tasks, the finished
/// tasks and the week lookup.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at the given path, creating and initializing it if
    /// it does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Database> {
        let conn = Connection::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "opened database");
        Database::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Database> {
        Database::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Database> {
        upgrade(&conn)?;
        Ok(Database { conn })
    }

    /// Delete the database file. A missing file is not an error.
    pub fn reset<P: AsRef<Path>>(path: P) -> Result<()> {
        match fs::remove_file(path.as_ref()) {
            Ok(()) => {
                info!(path = %path.as_ref().display(), "deleted database");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::Io(err)),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Bring the schema up to `SCHEMA_VERSION`.
fn upgrade(conn: &Connection) -> Result<()> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    match version {
        0 => {
            info!("initialising database...");
            init_schema(conn)
        }
        SCHEMA_VERSION => Ok(()),
        other => Err(Error::UnsupportedSchema(other)),
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "BEGIN;
         CREATE TABLE IF NOT EXISTS open_tasks (
                  id              INTEGER PRIMARY KEY AUTOINCREMENT,
                  content         TEXT NOT NULL,
                  started_at      INTEGER NOT NULL
                  );
         CREATE INDEX IF NOT EXISTS open_tasks_started_at ON open_tasks (started_at);
         CREATE TABLE IF NOT EXISTS finished_tasks (
                  id              INTEGER PRIMARY KEY AUTOINCREMENT,
                  content         TEXT NOT NULL,
                  started_at      INTEGER NOT NULL,
                  ended_at        INTEGER NOT NULL
                  );
         CREATE TABLE IF NOT EXISTS week_lookup (
                  week            TEXT PRIMARY KEY,
                  ids             TEXT NOT NULL
                  );
         PRAGMA user_version = 1;
         COMMIT;",
    )?;
    Ok(())
}
