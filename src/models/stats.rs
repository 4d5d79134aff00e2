use chrono::NaiveDate;
use super::task::{Priority, Task, TaskStatus};

/// Aggregate counters shown beside the task list.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub todo: usize,
    pub overdue: usize,
    pub high_priority_open: usize,
}

impl TaskStats {
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>, today: NaiveDate) -> Self {
        tasks.into_iter().fold(Self::default(), |mut stats, task| {
            stats.total += 1;
            match task.status {
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Todo => stats.todo += 1,
            }
            if task.is_overdue(today) {
                stats.overdue += 1;
            }
            if task.priority == Priority::High && !task.is_completed() {
                stats.high_priority_open += 1;
            }
            stats
        })
    }

    /// Completed share in percent; zero for an empty list.
    pub fn completion_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 / self.total as f64 * 100.0
    }

    pub fn needs_attention(&self) -> bool {
        self.overdue > 0 || self.high_priority_open > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(id: i64, status: TaskStatus, priority: Priority, due: Option<NaiveDate>) -> Task {
        Task {
            id,
            title: format!("task {}", id),
            description: String::new(),
            priority,
            status,
            due_date: due,
            created_at: Utc::now(),
            user_id: None,
        }
    }

    #[test]
    fn empty_list_has_zero_rate() {
        let tasks: Vec<Task> = Vec::new();
        let stats = TaskStats::from_tasks(&tasks, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(stats, TaskStats::default());
        assert_eq!(stats.completion_rate(), 0.0);
        assert!(!stats.needs_attention());
    }

    #[test]
    fn counts_by_status_priority_and_due_date() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let yesterday = today.pred_opt();
        let tasks = vec![
            task(1, TaskStatus::Completed, Priority::High, yesterday),
            task(2, TaskStatus::Todo, Priority::High, yesterday),
            task(3, TaskStatus::InProgress, Priority::Low, Some(today)),
            task(4, TaskStatus::Todo, Priority::Medium, None),
        ];

        let stats = TaskStats::from_tasks(&tasks, today);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.todo, 2);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.high_priority_open, 1);
        assert_eq!(stats.completion_rate(), 25.0);
        assert!(stats.needs_attention());
    }
}
