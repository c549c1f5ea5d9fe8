use crate::task_record::{Priority, TaskRecord, parse_completed, parse_due_date};
use std::collections::BTreeMap;
use thiserror::Error;

const TASK_LABEL: &str = "task";
const DUE_DATE_LABEL: &str = "duedate";
const PRIORITY_LABEL: &str = "priority";
const COMPLETED_LABELS: &[&str] = &["completed?", "completed"];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SheetParseError {
    #[error("No header row with both \"Task\" and \"Due Date\" columns was found")]
    MissingHeader,
}

/// Why a data row never became a [`TaskRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowIssue {
    EmptyTask,
    InvalidDueDate(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub row: usize,
    pub issue: RowIssue,
}

#[derive(Debug, Default)]
pub struct ParsedSheet {
    pub records: Vec<TaskRecord>,
    pub skipped: Vec<SkippedRow>,
}

/// Lower-cases a column label and strips every whitespace character, so
/// "Due Date", "due date" and " DueDate " all compare equal.
pub fn normalize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug)]
struct Columns {
    task: usize,
    due_date: usize,
    priority: Option<usize>,
    completed: Option<usize>,
}

impl Columns {
    fn locate(header: &[String]) -> Option<Self> {
        let labels: Vec<String> = header.iter().map(|h| normalize_label(h)).collect();
        let find = |wanted: &str| labels.iter().position(|l| l == wanted);

        Some(Columns {
            task: find(TASK_LABEL)?,
            due_date: find(DUE_DATE_LABEL)?,
            priority: find(PRIORITY_LABEL),
            completed: COMPLETED_LABELS.iter().find_map(|label| find(*label)),
        })
    }
}

/// Parses raw rows of string cells. The header row may sit anywhere above
/// the data; everything before it is ignored.
pub fn parse_rows(rows: &[Vec<String>]) -> Result<ParsedSheet, SheetParseError> {
    let (header_index, columns) = rows
        .iter()
        .enumerate()
        .find_map(|(i, row)| Columns::locate(row).map(|c| (i, c)))
        .ok_or(SheetParseError::MissingHeader)?;

    let mut sheet = ParsedSheet::default();

    for (offset, row) in rows[header_index + 1..].iter().enumerate() {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let cell = move |index: usize| row.get(index).map(|c| c.trim()).unwrap_or("");
        let optional = |index: Option<usize>| index.map(cell).unwrap_or("");

        let row_number = header_index + 1 + offset;
        match build_record(
            cell(columns.task),
            cell(columns.due_date),
            optional(columns.priority),
            optional(columns.completed),
        ) {
            Ok(record) => sheet.records.push(record),
            Err(issue) => sheet.skipped.push(SkippedRow { row: row_number, issue }),
        }
    }

    Ok(sheet)
}

/// Parses pre-keyed records, the shape a "get all records" call returns.
/// Keys are column labels and go through the same normalization as a header
/// row.
pub fn parse_records(records: &[BTreeMap<String, String>]) -> Result<ParsedSheet, SheetParseError> {
    let Some(first) = records.first() else {
        return Ok(ParsedSheet::default());
    };

    let header: Vec<String> = first.keys().cloned().collect();
    if Columns::locate(&header).is_none() {
        return Err(SheetParseError::MissingHeader);
    }

    let mut sheet = ParsedSheet::default();

    for (row, record) in records.iter().enumerate() {
        let normalized: BTreeMap<String, &str> = record
            .iter()
            .map(|(k, v)| (normalize_label(k), v.trim()))
            .collect();
        let field = |label: &str| normalized.get(label).copied().unwrap_or("");

        let completed = COMPLETED_LABELS
            .iter()
            .find_map(|label| normalized.get(*label).copied())
            .unwrap_or("");

        match build_record(field(TASK_LABEL), field(DUE_DATE_LABEL), field(PRIORITY_LABEL), completed) {
            Ok(record) => sheet.records.push(record),
            Err(issue) => sheet.skipped.push(SkippedRow { row, issue }),
        }
    }

    Ok(sheet)
}

fn build_record(task: &str, due: &str, priority: &str, completed: &str) -> Result<TaskRecord, RowIssue> {
    if task.is_empty() {
        return Err(RowIssue::EmptyTask);
    }

    let due_date = parse_due_date(due).ok_or_else(|| RowIssue::InvalidDueDate(due.to_string()))?;

    Ok(TaskRecord::new(
        task,
        due_date,
        Priority::parse(priority),
        parse_completed(completed),
    ))
}
