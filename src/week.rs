//! Week arithmetic. Weeks run from Monday to Sunday, on the UTC calendar.

use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Canonical identifier of a Monday-starting week, rendered as `YYYY-M-D`
/// (the date of the Monday, without zero padding).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WeekKey(NaiveDate);

impl WeekKey {
    /// Key of the week containing the given instant.
    pub fn of(date: DateTime<Utc>) -> WeekKey {
        WeekKey::of_date(date.naive_utc().date())
    }

    pub fn of_date(date: NaiveDate) -> WeekKey {
        let mut monday = date;
        // sundays belong to the week that started six days earlier
        if monday.weekday() == Weekday::Sun {
            monday = monday - Duration::days(1);
        }
        while monday.weekday() != Weekday::Mon {
            monday = monday - Duration::days(1);
        }
        WeekKey(monday)
    }

    pub fn monday(&self) -> NaiveDate {
        self.0
    }

    pub fn next(&self) -> WeekKey {
        WeekKey(self.0 + Duration::days(7))
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.0.year(), self.0.month(), self.0.day())
    }
}

impl FromStr for WeekKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<WeekKey, Error> {
        let invalid = || Error::InvalidWeekKey(s.to_string());

        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != 3 {
            return Err(invalid());
        }
        let year = parts[0].parse::<i32>().map_err(|_| invalid())?;
        let month = parts[1].parse::<u32>().map_err(|_| invalid())?;
        let day = parts[2].parse::<u32>().map_err(|_| invalid())?;

        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
        let key = WeekKey(date);
        // only the rendered form is accepted: no padding, signs or non-mondays
        if date.weekday() != Weekday::Mon || key.to_string() != s {
            return Err(invalid());
        }
        Ok(key)
    }
}

impl TryFrom<String> for WeekKey {
    type Error = Error;

    fn try_from(s: String) -> Result<WeekKey, Error> {
        s.parse()
    }
}

impl From<WeekKey> for String {
    fn from(key: WeekKey) -> String {
        key.to_string()
    }
}

/// Every week key touched by the interval `[start, end]`, in order.
///
/// Walks forward from the week of `start` seven days at a time until the week
/// of `end` is reached. A reversed interval yields the week of `start` alone.
pub fn week_keys(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<WeekKey> {
    let last = WeekKey::of(end);
    let mut current = WeekKey::of(start);
    let mut keys = vec![current];

    while current < last {
        current = current.next();
        keys.push(current);
    }
    keys
}

/// A calendar week used for queries: `[monday 00:00, next monday 00:00)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Week {
    start: DateTime<Utc>,
}

impl Week {
    pub fn containing(date: DateTime<Utc>) -> Week {
        Week::from_key(WeekKey::of(date))
    }

    pub fn from_key(key: WeekKey) -> Week {
        Week {
            start: Utc.from_utc_datetime(&key.monday().and_time(NaiveTime::MIN)),
        }
    }

    pub fn this_week() -> Week {
        Week::containing(Utc::now())
    }

    pub fn next(&self) -> Week {
        Week {
            start: self.start + Duration::weeks(1),
        }
    }

    pub fn previous(&self) -> Week {
        Week {
            start: self.start - Duration::weeks(1),
        }
    }

    /// The week `n` weeks after this one (before, for negative `n`), or
    /// `None` when it falls outside the supported calendar.
    pub fn offset(&self, n: i64) -> Option<Week> {
        let start = self.start.checked_add_signed(Duration::try_weeks(n)?)?;
        start.checked_add_signed(Duration::weeks(1))?;
        Some(Week { start })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Exclusive end of the week.
    pub fn end(&self) -> DateTime<Utc> {
        self.start + Duration::weeks(1)
    }

    pub fn includes(&self, date: DateTime<Utc>) -> bool {
        date >= self.start && date < self.end()
    }

    pub fn key(&self) -> WeekKey {
        WeekKey::of(self.start)
    }
}

impl fmt::Display for Week {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let last = self.end() - Duration::days(1);
        write!(
            f,
            "{} - {}",
            self.start.format("%a %d %b %Y"),
            last.format("%a %d %b %Y")
        )
    }
}
