use crate::classifier::Bucket;
use crate::task_record::TaskRecord;
use serde::{Deserialize, Serialize};

pub const EMPTY_PLACEHOLDER: &str = "- None";
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// How a bucket is rendered into the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rendering {
    /// One line per task.
    #[default]
    Itemized,
    /// Total count plus a count per priority level.
    Summary,
}

pub struct TaskFormatter {
    date_format: String,
}

impl Default for TaskFormatter {
    fn default() -> Self {
        TaskFormatter::new(DEFAULT_DATE_FORMAT)
    }
}

impl TaskFormatter {
    pub fn new(date_format: impl Into<String>) -> Self {
        TaskFormatter {
            date_format: date_format.into(),
        }
    }

    pub fn render(&self, bucket: &Bucket, rendering: Rendering) -> String {
        match rendering {
            Rendering::Itemized => self.itemized(bucket),
            Rendering::Summary => summary(bucket),
        }
    }

    pub fn itemized(&self, bucket: &Bucket) -> String {
        if bucket.is_empty() {
            return EMPTY_PLACEHOLDER.to_string();
        }

        sorted_tasks(bucket)
            .into_iter()
            .map(|task| self.line(task))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn line(&self, task: &TaskRecord) -> String {
        format!(
            "- {} ({} priority, due {})",
            task.task,
            task.priority,
            task.due_date.format(&self.date_format)
        )
    }
}

/// Tasks of a bucket in display order. The sort is stable, so rows that tie
/// on both keys keep their sheet order.
pub fn sorted_tasks(bucket: &Bucket) -> Vec<&TaskRecord> {
    let mut tasks: Vec<&TaskRecord> = bucket.tasks.iter().collect();
    if bucket.kind.is_time_sensitive() {
        tasks.sort_by_key(|t| (t.due_date, t.priority.rank()));
    } else {
        tasks.sort_by_key(|t| (t.priority.rank(), t.due_date));
    }
    tasks
}

/// Count-by-priority rendering, levels in High, Medium, Low, unranked order.
pub fn summary(bucket: &Bucket) -> String {
    if bucket.is_empty() {
        return EMPTY_PLACEHOLDER.to_string();
    }

    let mut per_rank = [0usize; 4];
    for task in &bucket.tasks {
        per_rank[task.priority.rank() as usize] += 1;
    }

    let noun = if bucket.len() == 1 { "task" } else { "tasks" };
    let mut lines = vec![format!("{} {}", bucket.len(), noun)];
    for (label, count) in ["High", "Medium", "Low", "Unranked"].iter().zip(per_rank) {
        if count > 0 {
            lines.push(format!("- {}: {}", label, count));
        }
    }

    lines.join("\n")
}
