use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;

/// Environment variable overriding the default database location.
pub const DATABASE_ENV: &str = "TRACKER_DATABASE";

const DATABASE_FILE: &str = "tasks.sqlite";

/// Work out which database file to use: the command line flag, then the
/// environment, then the platform data directory.
pub fn database_path(flag: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path);
    }

    if let Some(path) = env::var_os(DATABASE_ENV).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(path));
    }

    default_database_path()
}

fn default_database_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("com", "gozque", "tracker")
        .ok_or_else(|| anyhow!("Failed to find a home directory for the database."))?;

    let root_dir = dirs.data_dir();
    if !root_dir.exists() {
        std::fs::create_dir_all(root_dir)
            .with_context(|| format!("Failed to create directory {}.", root_dir.display()))?;
    }
    Ok(root_dir.join(DATABASE_FILE))
}
