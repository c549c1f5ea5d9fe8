use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::fmt;

// Day zero of spreadsheet serial dates (Lotus 1-2-3 leap year bug included).
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

// Serial for 9999-12-31, the last date spreadsheets can hold.
const MAX_SERIAL: i64 = 2_958_465;

// Two-digit years go first: %Y would happily read "24" as year 24.
const DATE_FORMATS: &[&str] = &[
    "%d/%m/%y",
    "%d-%m-%y",
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y/%m/%d",
    "%d %B %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Priority {
    High,
    Medium,
    Low,
    Unranked(String),
}

impl Priority {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_lowercase().as_str() {
            "high" => Priority::High,
            "medium" => Priority::Medium,
            "low" => Priority::Low,
            _ => Priority::Unranked(trimmed.to_string()),
        }
    }

    /// Sort rank: High=0, Medium=1, Low=2, anything else=3.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
            Priority::Unranked(_) => 3,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
            Priority::Unranked(raw) if raw.is_empty() => "Unranked",
            Priority::Unranked(raw) => raw.as_str(),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub task: String,
    pub due_date: NaiveDate,
    pub priority: Priority,
    pub completed: bool,
}

impl TaskRecord {
    pub fn new(task: impl Into<String>, due_date: NaiveDate, priority: Priority, completed: bool) -> Self {
        TaskRecord {
            task: task.into(),
            due_date,
            priority,
            completed,
        }
    }
}

/// Parses a due date cell using a day-first convention.
///
/// ISO dates and day-first layouts are accepted, along with date-times whose
/// date part is kept. A bare integer is treated as a spreadsheet serial date
/// when it falls between 1 and the serial of 9999-12-31.
pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    let cell = raw.trim();
    if cell.is_empty() {
        return None;
    }

    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(cell, fmt).ok())
    {
        return Some(date);
    }

    if let Some(datetime) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(cell, fmt).ok())
    {
        return Some(datetime.date());
    }

    if cell.chars().all(|c| c.is_ascii_digit()) {
        let serial: i64 = cell.parse().ok()?;
        if !(1..=MAX_SERIAL).contains(&serial) {
            return None;
        }
        let (y, m, d) = SERIAL_EPOCH;
        return NaiveDate::from_ymd_opt(y, m, d)?.checked_add_signed(Duration::try_days(serial)?);
    }

    None
}

/// True exactly when the trimmed, upper-cased cell reads `TRUE`.
pub fn parse_completed(raw: &str) -> bool {
    raw.trim().to_uppercase() == "TRUE"
}
