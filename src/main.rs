#[macro_use]
extern crate prettytable;

use anyhow::Context;
use structopt::StructOpt;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod config;
mod interface;

use cli::{Command::*, CommandLineArgs};
use tracker::{Database, TaskService};

fn init_logging() {
    // RUST_LOG overrides the default level; an invalid filter falls back to it.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| EnvFilter::try_new(raw.trim()).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();

    // Get the command-line arguments.
    let CommandLineArgs { action, database } = CommandLineArgs::from_args();

    let database_path = config::database_path(database)?;

    if let Reset = action {
        Database::reset(&database_path)
            .with_context(|| format!("Failed to delete {}.", database_path.display()))?;
        println!("Deleted {}.", database_path.display());
        return Ok(());
    }

    let db = Database::open(&database_path)
        .with_context(|| format!("Failed to open database {}.", database_path.display()))?;
    let mut service = TaskService::new(db);

    // Perform the action.
    match action {
        Init => {
            println!("Database ready at {}.", database_path.display());
            Ok(())
        }
        Add {
            content,
            start,
            end,
        } => interface::add_task(&mut service, content, start, end),
        Update {
            id,
            finished,
            content,
            start,
            end,
        } => interface::update_task(&mut service, id, finished, content, start, end),
        Reopen { id } => interface::reopen_task(&mut service, id),
        Done { id, at } => interface::complete_task(&mut service, id, at),
        Rm { id, finished } => interface::remove_task(&mut service, id, finished),
        Week { offset } => interface::list_week(&service, offset),
        Report { offset } => interface::show_report(&service, offset),
        Export { output } => interface::export(&service, output),
        Import { file } => interface::import(&mut service, file),
        Reindex => interface::reindex(&mut service),
        Reset => Ok(()),
    }?;
    Ok(())
}
