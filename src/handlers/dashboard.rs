use std::sync::Arc;
use chrono::NaiveDate;
use crate::errors::{ClientError, ClientResult};
use crate::models::{StatusFilter, Task, TaskFields, TaskId, TaskStats, TaskStatus, UserRecord};
use crate::services::{Session, TaskRepository};

/// View state behind the task dashboard: the caller's tasks as last seen
/// from the repository, plus the status filter.
///
/// Local state only changes after the repository call succeeds. There is no
/// revision check, so concurrent edits from elsewhere are overwritten by
/// whichever write lands last.
pub struct Dashboard {
    repo: Arc<dyn TaskRepository>,
    session: Session,
    tasks: Vec<Task>,
    filter: StatusFilter,
}

impl Dashboard {
    pub fn new(repo: Arc<dyn TaskRepository>, session: Session) -> Self {
        Self {
            repo,
            session,
            tasks: Vec::new(),
            filter: StatusFilter::All,
        }
    }

    pub fn user(&self) -> Option<UserRecord> {
        self.session.current_user()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
    }

    /// Tasks matching the current filter, in repository order.
    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.tasks.iter().filter(|task| self.filter.matches(task)).collect()
    }

    /// Statistics always cover every task, whatever the filter.
    pub fn stats(&self, today: NaiveDate) -> TaskStats {
        TaskStats::from_tasks(&self.tasks, today)
    }

    pub async fn load(&mut self) -> ClientResult<&[Task]> {
        tracing::info!("Fetching tasks");
        let result = self.repo.list().await;
        self.tasks = self.settle(result, "fetching tasks")?;
        tracing::debug!("Loaded {} tasks", self.tasks.len());
        Ok(&self.tasks)
    }

    pub async fn create_task(&mut self, fields: TaskFields) -> ClientResult<Task> {
        let result = self.repo.create(fields).await;
        let task = self.settle(result, "creating task")?;
        self.tasks.push(task.clone());
        Ok(task)
    }

    pub async fn update_task(&mut self, id: TaskId, fields: TaskFields) -> ClientResult<Task> {
        let result = self.repo.update(id, fields).await;
        let task = self.settle(result, "updating task")?;
        self.replace(task.clone());
        Ok(task)
    }

    pub async fn delete_task(&mut self, id: TaskId) -> ClientResult<()> {
        let result = self.repo.remove(id).await;
        self.settle(result, "deleting task")?;
        self.tasks.retain(|task| task.id != id);
        Ok(())
    }

    /// Sends the task's current fields with only the status changed.
    pub async fn change_status(&mut self, id: TaskId, status: TaskStatus) -> ClientResult<Task> {
        let mut fields = self
            .tasks
            .iter()
            .find(|task| task.id == id)
            .map(Task::fields)
            .ok_or_else(|| ClientError::NotFound(format!("Task {} not found", id)))?;
        fields.status = status;

        let result = self.repo.update(id, fields).await;
        let task = self.settle(result, "updating status")?;
        self.replace(task.clone());
        Ok(task)
    }

    fn replace(&mut self, updated: Task) {
        match self.tasks.iter_mut().find(|task| task.id == updated.id) {
            Some(slot) => *slot = updated,
            None => self.tasks.push(updated),
        }
    }

    // Logs failures; an unrecoverable auth failure ends the session so the
    // front end falls back to the login screen.
    fn settle<T>(&mut self, result: ClientResult<T>, action: &str) -> ClientResult<T> {
        result.inspect_err(|e| {
            tracing::error!("Error {}: {}", action, e);
            if e.requires_login() {
                self.tasks.clear();
                if let Err(logout_err) = self.session.logout() {
                    tracing::warn!("Failed to clear session after auth failure: {}", logout_err);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use async_trait::async_trait;
    use chrono::Utc;
    use crate::models::{AuthResponse, Priority};
    use crate::services::{KeyValueStore, MemoryStore};

    /// Repository double that records calls and can be told to reject auth.
    #[derive(Default)]
    struct FakeRepo {
        tasks: Mutex<Vec<Task>>,
        reject_auth: bool,
    }

    #[async_trait]
    impl TaskRepository for FakeRepo {
        async fn list(&self) -> ClientResult<Vec<Task>> {
            if self.reject_auth {
                return Err(ClientError::Auth("Token is invalid or expired".into()));
            }
            Ok(self.tasks.lock().unwrap().clone())
        }

        async fn create(&self, fields: TaskFields) -> ClientResult<Task> {
            let fields = fields.validated()?;
            let mut tasks = self.tasks.lock().unwrap();
            let task = Task {
                id: tasks.len() as TaskId + 1,
                title: fields.title,
                description: fields.description,
                priority: fields.priority,
                status: fields.status,
                due_date: fields.due_date,
                created_at: Utc::now(),
                user_id: Some(1),
            };
            tasks.push(task.clone());
            Ok(task)
        }

        async fn update(&self, id: TaskId, fields: TaskFields) -> ClientResult<Task> {
            let mut tasks = self.tasks.lock().unwrap();
            let task = tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| ClientError::NotFound(format!("Task {} not found", id)))?;
            task.apply(fields);
            Ok(task.clone())
        }

        async fn remove(&self, id: TaskId) -> ClientResult<()> {
            let mut tasks = self.tasks.lock().unwrap();
            let before = tasks.len();
            tasks.retain(|t| t.id != id);
            if tasks.len() == before {
                return Err(ClientError::NotFound(format!("Task {} not found", id)));
            }
            Ok(())
        }
    }

    fn session() -> Session {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let session = Session::new(store);
        session
            .begin(&AuthResponse {
                user: UserRecord { id: 1, name: "alice".into(), email: "alice@example.com".into() },
                access: "T1".into(),
                refresh: "R1".into(),
            })
            .unwrap();
        session
    }

    #[tokio::test]
    async fn mutations_reconcile_local_state() {
        let mut dashboard = Dashboard::new(Arc::new(FakeRepo::default()), session());
        dashboard.load().await.unwrap();
        assert!(dashboard.tasks().is_empty());

        let first = dashboard.create_task(TaskFields::titled("Write report")).await.unwrap();
        let second = dashboard
            .create_task(TaskFields { priority: Priority::High, ..TaskFields::titled("Review") })
            .await
            .unwrap();
        assert_eq!(dashboard.tasks().len(), 2);

        dashboard.change_status(first.id, TaskStatus::Completed).await.unwrap();
        assert_eq!(dashboard.tasks()[0].status, TaskStatus::Completed);
        assert_eq!(dashboard.tasks()[0].title, "Write report");

        dashboard.set_filter(StatusFilter::Status(TaskStatus::Todo));
        let visible: Vec<TaskId> = dashboard.visible_tasks().iter().map(|t| t.id).collect();
        assert_eq!(visible, vec![second.id]);

        let stats = dashboard.stats(Utc::now().date_naive());
        assert_eq!(stats.total, 2);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.high_priority_open, 1);

        dashboard.delete_task(first.id).await.unwrap();
        assert_eq!(dashboard.tasks().len(), 1);
    }

    #[tokio::test]
    async fn failed_mutation_leaves_state_untouched() {
        let mut dashboard = Dashboard::new(Arc::new(FakeRepo::default()), session());
        dashboard.create_task(TaskFields::titled("Keep me")).await.unwrap();

        assert!(matches!(dashboard.delete_task(99).await, Err(ClientError::NotFound(_))));
        assert!(matches!(
            dashboard.create_task(TaskFields::titled("")).await,
            Err(ClientError::Validation { .. })
        ));
        assert!(matches!(
            dashboard.change_status(42, TaskStatus::Completed).await,
            Err(ClientError::NotFound(_))
        ));
        assert_eq!(dashboard.tasks().len(), 1);
    }

    #[tokio::test]
    async fn auth_failure_ends_the_session() {
        let session = session();
        let repo = FakeRepo { reject_auth: true, ..FakeRepo::default() };
        let mut dashboard = Dashboard::new(Arc::new(repo), session.clone());

        assert!(matches!(dashboard.load().await, Err(ClientError::Auth(_))));
        assert!(!session.is_authenticated());
        assert_eq!(session.tokens().access_token(), None);
        assert_eq!(dashboard.user(), None);
    }
}
