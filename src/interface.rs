use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use prettytable::Table;
use tracker::report;
use tracker::{Snapshot, Task, TaskService, Week};

const CONTENT_WIDTH: usize = 40;

pub fn add_task(
    service: &mut TaskService,
    content: String,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<()> {
    let mut task = Task::new(content, start);
    task.end = end;
    let id = service.add_task(&task).context("Failed to add task.")?;

    if task.is_ended() {
        println!("{}. {} (finished, {})", id, task.content, fmt_elapsed(&task));
    } else {
        println!("{}. {} (started {})", id, task.content, fmt_time(task.start));
    }
    Ok(())
}

pub fn update_task(
    service: &mut TaskService,
    id: u32,
    finished: bool,
    content: Option<String>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<()> {
    if finished {
        let mut task = service
            .get_finished_task(id)
            .with_context(|| format!("Failed to find finished task {}.", id))?;
        apply(&mut task, content, start);
        if end.is_some() {
            task.end = end;
        }
        service
            .update_finished_task(&task)
            .context("Failed to update finished task.")?;
    } else {
        if end.is_some() {
            println!("Open tasks have no end. Use 'tracker done' to finish a task.");
            return Ok(());
        }
        let mut task = service
            .get_open_task(id)
            .with_context(|| format!("Failed to find open task {}.", id))?;
        apply(&mut task, content, start);
        service
            .update_open_task(&task)
            .context("Failed to update open task.")?;
    }
    println!("Updated.");
    Ok(())
}

fn apply(task: &mut Task, content: Option<String>, start: Option<DateTime<Utc>>) {
    if let Some(content) = content {
        task.content = content;
    }
    if let Some(start) = start {
        task.start = start;
    }
}

pub fn reopen_task(service: &mut TaskService, id: u32) -> Result<()> {
    let task = service
        .get_finished_task(id)
        .with_context(|| format!("Failed to find finished task {}.", id))?;
    let open_id = service
        .reopen_task(&task)
        .context("Failed to reopen task.")?;
    println!("{}. {} (open again)", open_id, task.content);
    Ok(())
}

pub fn complete_task(service: &mut TaskService, id: u32, at: Option<DateTime<Utc>>) -> Result<()> {
    let task = service
        .get_open_task(id)
        .with_context(|| format!("Failed to find open task {}.", id))?;
    let end = at.unwrap_or_else(Utc::now);
    let finished_id = service
        .complete_task(&task, end)
        .context("Failed to complete task.")?;
    println!("{}. {} (finished at {})", finished_id, task.content, fmt_time(end));
    Ok(())
}

pub fn remove_task(service: &mut TaskService, id: u32, finished: bool) -> Result<()> {
    let found = if finished {
        service.get_finished_task(id)
    } else {
        service.get_open_task(id)
    };
    let task = found.with_context(|| format!("Failed to find task {}.", id))?;

    service.remove_task(&task).context("Failed to remove task.")?;
    println!("Removed '{}'.", task.content);
    Ok(())
}

pub fn list_week(service: &TaskService, offset: i64) -> Result<()> {
    let week = Week::this_week()
        .offset(offset)
        .with_context(|| format!("Week offset {} is out of range.", offset))?;
    let tasks = service
        .get_tasks(&week)
        .with_context(|| format!("Failed to fetch tasks for week {}.", week.key()))?;

    println!("{}", week);
    if tasks.is_empty() {
        println!("No tasks this week.");
        return Ok(());
    }

    let mut table = Table::new();
    table.add_row(row!["id", "task", "start", "end", "elapsed"]);
    for task in &tasks {
        table.add_row(row![
            fmt_id(task),
            textwrap::fill(&task.content, CONTENT_WIDTH),
            fmt_time(task.start),
            task.end.map(fmt_time).unwrap_or_else(|| "-".to_string()),
            fmt_elapsed(task)
        ]);
    }
    table.printstd();
    Ok(())
}

pub fn show_report(service: &TaskService, offset: i64) -> Result<()> {
    let week = Week::this_week()
        .offset(offset)
        .with_context(|| format!("Week offset {} is out of range.", offset))?;
    let tasks = service
        .get_tasks(&week)
        .with_context(|| format!("Failed to fetch tasks for week {}.", week.key()))?;
    let lines = report::completed(&week, &tasks);

    println!("{}", week);
    if lines.is_empty() {
        println!("Nothing completed this week.");
        return Ok(());
    }

    let mut table = Table::new();
    table.add_row(row!["task", "finished", "took"]);
    for line in lines {
        table.add_row(row![
            textwrap::fill(&line.content, CONTENT_WIDTH),
            line.end.with_timezone(&Local).format("%a %H:%M").to_string(),
            line.fmt_elapsed()
        ]);
    }
    table.printstd();
    Ok(())
}

pub fn export(service: &TaskService, output: Option<PathBuf>) -> Result<()> {
    let json = service
        .export()
        .and_then(|snapshot| snapshot.to_json())
        .context("Failed to export tasks.")?;

    match output {
        Some(path) => fs::write(&path, json)
            .with_context(|| format!("Failed to write {}.", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}

pub fn import(service: &mut TaskService, file: PathBuf) -> Result<()> {
    let text = fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}.", file.display()))?;
    let snapshot = Snapshot::parse(&text).context("Failed to parse export file.")?;
    service
        .import(&snapshot)
        .context("Failed to import tasks.")?;
    println!(
        "Imported {} open and {} finished tasks.",
        snapshot.open_tasks.len(),
        snapshot.finished_tasks.len()
    );
    Ok(())
}

pub fn reindex(service: &mut TaskService) -> Result<()> {
    let weeks = service.reindex().context("Failed to rebuild the week lookup.")?;
    println!("Indexed {} weeks.", weeks);
    Ok(())
}

fn fmt_id(task: &Task) -> String {
    match (task.id, task.is_ended()) {
        (Some(id), true) => format!("done {}", id),
        (Some(id), false) => format!("open {}", id),
        (None, _) => "-".to_string(),
    }
}

fn fmt_time(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%a %d %b %H:%M").to_string()
}

fn fmt_elapsed(task: &Task) -> String {
    match task.duration() {
        Some(elapsed) => report::fmt_elapsed(elapsed),
        None => "ongoing".to_string(),
    }
}
