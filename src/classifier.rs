use crate::task_record::TaskRecord;
use chrono::{Duration, NaiveDate};

/// Days past today that still count as "upcoming" (inclusive).
pub const UPCOMING_WINDOW_DAYS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketKind {
    Overdue,
    DueToday,
    Upcoming,
    Later,
}

impl BucketKind {
    pub const ALL: [BucketKind; 4] = [
        BucketKind::Overdue,
        BucketKind::DueToday,
        BucketKind::Upcoming,
        BucketKind::Later,
    ];

    pub fn for_date(due: NaiveDate, today: NaiveDate) -> Self {
        let horizon = today + Duration::days(UPCOMING_WINDOW_DAYS);
        if due < today {
            BucketKind::Overdue
        } else if due == today {
            BucketKind::DueToday
        } else if due <= horizon {
            BucketKind::Upcoming
        } else {
            BucketKind::Later
        }
    }

    /// Overdue and due-today lists are ordered oldest first; the rest lead
    /// with priority.
    pub fn is_time_sensitive(self) -> bool {
        matches!(self, BucketKind::Overdue | BucketKind::DueToday)
    }
}

#[derive(Debug, Clone)]
pub struct Bucket {
    pub kind: BucketKind,
    pub tasks: Vec<TaskRecord>,
}

impl Bucket {
    pub fn new(kind: BucketKind) -> Self {
        Bucket { kind, tasks: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketCounts {
    pub overdue: usize,
    pub due_today: usize,
    pub upcoming: usize,
    pub later: usize,
}

#[derive(Debug, Clone)]
pub struct Buckets {
    pub overdue: Bucket,
    pub due_today: Bucket,
    pub upcoming: Bucket,
    pub later: Bucket,
}

impl Buckets {
    pub fn get(&self, kind: BucketKind) -> &Bucket {
        match kind {
            BucketKind::Overdue => &self.overdue,
            BucketKind::DueToday => &self.due_today,
            BucketKind::Upcoming => &self.upcoming,
            BucketKind::Later => &self.later,
        }
    }

    fn get_mut(&mut self, kind: BucketKind) -> &mut Bucket {
        match kind {
            BucketKind::Overdue => &mut self.overdue,
            BucketKind::DueToday => &mut self.due_today,
            BucketKind::Upcoming => &mut self.upcoming,
            BucketKind::Later => &mut self.later,
        }
    }

    pub fn counts(&self) -> BucketCounts {
        BucketCounts {
            overdue: self.overdue.len(),
            due_today: self.due_today.len(),
            upcoming: self.upcoming.len(),
            later: self.later.len(),
        }
    }
}

/// Splits incomplete tasks into the four due-date buckets relative to
/// `today`. Completed tasks are dropped. Input order is kept within each
/// bucket.
pub fn classify<I>(records: I, today: NaiveDate) -> Buckets
where
    I: IntoIterator<Item = TaskRecord>,
{
    let mut buckets = Buckets {
        overdue: Bucket::new(BucketKind::Overdue),
        due_today: Bucket::new(BucketKind::DueToday),
        upcoming: Bucket::new(BucketKind::Upcoming),
        later: Bucket::new(BucketKind::Later),
    };

    for record in records.into_iter().filter(|r| !r.completed) {
        let kind = BucketKind::for_date(record.due_date, today);
        buckets.get_mut(kind).tasks.push(record);
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task_record::Priority;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(name: &str, due: NaiveDate, completed: bool) -> TaskRecord {
        TaskRecord::new(name, due, Priority::Medium, completed)
    }

    fn names(bucket: &Bucket) -> Vec<&str> {
        bucket.tasks.iter().map(|t| t.task.as_str()).collect()
    }

    #[test]
    fn test_overdue_and_completed_example() {
        let today = date(2024, 1, 5);
        let records = vec![
            TaskRecord::new("Buy milk", date(2024, 1, 1), Priority::High, false),
            TaskRecord::new("Call dentist", date(2024, 1, 10), Priority::Low, true),
        ];

        let buckets = classify(records, today);
        assert_eq!(names(&buckets.overdue), vec!["Buy milk"]);
        assert!(buckets.due_today.is_empty());
        assert!(buckets.upcoming.is_empty());
        assert!(buckets.later.is_empty());
    }

    #[test]
    fn test_boundaries() {
        let today = date(2024, 1, 5);
        let records = vec![
            task("yesterday", date(2024, 1, 4), false),
            task("today", date(2024, 1, 5), false),
            task("tomorrow", date(2024, 1, 6), false),
            task("edge", date(2024, 1, 8), false),
            task("beyond", date(2024, 1, 9), false),
        ];

        let buckets = classify(records, today);
        assert_eq!(names(&buckets.overdue), vec!["yesterday"]);
        assert_eq!(names(&buckets.due_today), vec!["today"]);
        assert_eq!(names(&buckets.upcoming), vec!["tomorrow", "edge"]);
        assert_eq!(names(&buckets.later), vec!["beyond"]);
    }

    #[test]
    fn test_partition_is_total_and_exclusive() {
        let today = date(2024, 3, 1);
        let records: Vec<TaskRecord> = (-10..=10)
            .map(|offset| {
                let due = today + Duration::days(offset);
                task(&format!("task {}", offset), due, offset % 4 == 0)
            })
            .collect();
        let incomplete: Vec<String> = records
            .iter()
            .filter(|r| !r.completed)
            .map(|r| r.task.clone())
            .collect();

        let buckets = classify(records, today);

        let mut seen: Vec<String> = BucketKind::ALL
            .iter()
            .flat_map(|kind| buckets.get(*kind).tasks.iter().map(|t| t.task.clone()))
            .collect();
        assert_eq!(seen.len(), incomplete.len());
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), incomplete.len());

        for kind in BucketKind::ALL {
            for record in &buckets.get(kind).tasks {
                assert_eq!(BucketKind::for_date(record.due_date, today), kind);
                assert!(!record.completed);
            }
        }
    }

    #[test]
    fn test_counts() {
        let today = date(2024, 1, 5);
        let records = vec![
            task("a", date(2024, 1, 1), false),
            task("b", date(2024, 1, 2), false),
            task("c", date(2024, 1, 5), false),
            task("d", date(2024, 2, 1), false),
        ];

        let counts = classify(records, today).counts();
        assert_eq!(
            counts,
            BucketCounts { overdue: 2, due_today: 1, upcoming: 0, later: 1 }
        );
    }
}
