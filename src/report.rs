use chrono::{DateTime, Duration, Utc};

use crate::task::Task;
use crate::week::Week;

/// One completed item of the weekly report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub content: String,
    pub end: DateTime<Utc>,
    pub elapsed: Duration,
}

impl ReportLine {
    /// Elapsed time, rounded to hours below a day and to days above.
    pub fn fmt_elapsed(&self) -> String {
        fmt_elapsed(self.elapsed)
    }
}

/// The tasks finished during the week, ordered by end time.
pub fn completed(week: &Week, tasks: &[Task]) -> Vec<ReportLine> {
    let mut lines: Vec<ReportLine> = tasks
        .iter()
        .filter_map(|task| match task.end {
            Some(end) if week.includes(end) => Some(ReportLine {
                content: task.content.clone(),
                end,
                elapsed: end - task.start,
            }),
            _ => None,
        })
        .collect();
    lines.sort_by_key(|line| line.end);
    lines
}

pub fn fmt_elapsed(elapsed: Duration) -> String {
    let minutes = elapsed.num_minutes() as f64;
    let hours = minutes / 60.0;
    if hours < 24.0 {
        format!("{} hours", hours.round())
    } else {
        format!("{} days", (hours / 24.0).round())
    }
}
