use chrono::{DateTime, Utc};
use std::path::PathBuf;
use structopt::StructOpt;

/// Parse an RFC 3339 timestamp; the `T`, the seconds and the offset may be
/// omitted (UTC is assumed).
fn parse_timestamp(src: &str) -> Result<DateTime<Utc>, humantime::TimestampError> {
    humantime::parse_rfc3339_weak(src).map(DateTime::<Utc>::from)
}

#[derive(Debug, StructOpt)]
pub enum Command {
    /// Create the database file.
    Init,
    /// Log a new task. Without an end it stays open.
    Add {
        /// The task description text.
        #[structopt()]
        content: String,

        /// When the task started (defaults to now).
        #[structopt(short, long, parse(try_from_str = parse_timestamp))]
        start: Option<DateTime<Utc>>,

        /// When the task ended.
        #[structopt(short, long, parse(try_from_str = parse_timestamp))]
        end: Option<DateTime<Utc>>,
    },
    /// Edit an open task, or a finished one with --finished.
    Update {
        #[structopt()]
        id: u32,

        /// Edit a finished task instead of an open one.
        #[structopt(short, long)]
        finished: bool,

        /// New description text.
        #[structopt(short, long)]
        content: Option<String>,

        /// New start time.
        #[structopt(short, long, parse(try_from_str = parse_timestamp))]
        start: Option<DateTime<Utc>>,

        /// New end time (finished tasks only).
        #[structopt(short, long, parse(try_from_str = parse_timestamp))]
        end: Option<DateTime<Utc>>,
    },
    /// Move a finished task back to the open tasks.
    Reopen {
        #[structopt()]
        id: u32,
    },
    /// Finish an open task.
    Done {
        #[structopt()]
        id: u32,

        /// When the task ended (defaults to now).
        #[structopt(short, long, parse(try_from_str = parse_timestamp))]
        at: Option<DateTime<Utc>>,
    },
    /// Remove a task.
    Rm {
        #[structopt()]
        id: u32,

        /// Remove a finished task instead of an open one.
        #[structopt(short, long)]
        finished: bool,
    },
    /// List the tasks of a week.
    Week {
        /// Weeks from the current one (-1 is last week).
        #[structopt(default_value = "0", allow_hyphen_values = true)]
        offset: i64,
    },
    /// Show the tasks completed during a week.
    Report {
        /// Weeks from the current one (-1 is last week).
        #[structopt(default_value = "0", allow_hyphen_values = true)]
        offset: i64,
    },
    /// Save every task and the week lookup as JSON.
    Export {
        /// Write to a file instead of stdout.
        #[structopt(parse(from_os_str), short, long)]
        output: Option<PathBuf>,
    },
    /// Load tasks saved with export into an empty database.
    Import {
        #[structopt(parse(from_os_str))]
        file: PathBuf,
    },
    /// Rebuild the week lookup from the finished tasks.
    Reindex,
    /// Delete the database file.
    Reset,
}

#[derive(Debug, StructOpt)]
#[structopt(name = "tracker", about = "A minimalistic weekly task and time tracker.")]
pub struct CommandLineArgs {
    #[structopt(subcommand)]
    pub action: Command,

    /// Use a different database file.
    #[structopt(parse(from_os_str), short, long)]
    pub database: Option<PathBuf>,
}
