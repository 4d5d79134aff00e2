use std::sync::{Arc, Mutex, PoisonError};
use async_trait::async_trait;
use chrono::Utc;
use crate::errors::{ClientError, ClientResult};
use crate::models::{Task, TaskFields, TaskId, UserId};
use super::api_client::{endpoints, ApiClient, ApiRequest};
use super::session::{Session, TASKS_KEY};
use super::storage::{get_json, set_json, KeyValueStore};

/// Task CRUD for the signed-in user. Ownership comes from the session, never
/// from a caller-supplied user id.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// All of the caller's tasks, in the order the backing store keeps them.
    async fn list(&self) -> ClientResult<Vec<Task>>;

    /// Title is required; the other fields fall back to medium priority and todo status.
    async fn create(&self, fields: TaskFields) -> ClientResult<Task>;

    /// Full replacement of the mutable fields. Last write wins.
    async fn update(&self, id: TaskId, fields: TaskFields) -> ClientResult<Task>;

    async fn remove(&self, id: TaskId) -> ClientResult<()>;
}

/// Tasks owned by the server. The server scopes every call to the bearer
/// token's subject and assigns ids.
pub struct RemoteTaskRepository {
    client: ApiClient,
}

impl RemoteTaskRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TaskRepository for RemoteTaskRepository {
    async fn list(&self) -> ClientResult<Vec<Task>> {
        let tasks: Vec<Task> = self.client.send_json(ApiRequest::get(endpoints::TASKS)).await?;
        tracing::debug!("Fetched {} tasks", tasks.len());
        Ok(tasks)
    }

    async fn create(&self, fields: TaskFields) -> ClientResult<Task> {
        let fields = fields.validated()?;
        let task: Task = self
            .client
            .send_json(ApiRequest::post(endpoints::TASKS, &fields)?)
            .await?;
        tracing::debug!("Created task {}", task.id);
        Ok(task)
    }

    async fn update(&self, id: TaskId, fields: TaskFields) -> ClientResult<Task> {
        let fields = fields.validated()?;
        self.client
            .send_json(ApiRequest::put(endpoints::task(id), &fields)?)
            .await
    }

    async fn remove(&self, id: TaskId) -> ClientResult<()> {
        self.client.send_empty(ApiRequest::delete(endpoints::task(id))).await?;
        tracing::debug!("Deleted task {}", id);
        Ok(())
    }
}

/// Offline mode: every user's tasks in one blob in local storage, filtered
/// by the session user. Ids are millisecond timestamps, bumped when two
/// creates land in the same millisecond.
pub struct LocalTaskRepository {
    store: Arc<dyn KeyValueStore>,
    session: Session,
    // Serializes the read-modify-write of the shared blob
    write_lock: Mutex<()>,
}

impl LocalTaskRepository {
    pub fn new(session: Session) -> Self {
        Self {
            store: session.store(),
            session,
            write_lock: Mutex::new(()),
        }
    }

    fn owner(&self) -> ClientResult<UserId> {
        self.session
            .user_id()
            .ok_or_else(|| ClientError::Auth("Not authenticated".into()))
    }

    fn load_all(&self) -> ClientResult<Vec<Task>> {
        Ok(get_json(self.store.as_ref(), TASKS_KEY)?.unwrap_or_default())
    }

    fn save_all(&self, tasks: &[Task]) -> ClientResult<()> {
        set_json(self.store.as_ref(), TASKS_KEY, tasks)?;
        Ok(())
    }

    fn next_id(tasks: &[Task]) -> TaskId {
        let now = Utc::now().timestamp_millis();
        match tasks.iter().map(|task| task.id).max() {
            Some(highest) if highest >= now => highest + 1,
            _ => now,
        }
    }

    fn position(tasks: &[Task], id: TaskId, owner: UserId) -> ClientResult<usize> {
        tasks
            .iter()
            .position(|task| task.id == id && task.user_id == Some(owner))
            .ok_or_else(|| ClientError::NotFound(format!("Task {} not found", id)))
    }
}

#[async_trait]
impl TaskRepository for LocalTaskRepository {
    async fn list(&self) -> ClientResult<Vec<Task>> {
        let owner = self.owner()?;
        let tasks = self.load_all()?;
        Ok(tasks
            .into_iter()
            .filter(|task| task.user_id == Some(owner))
            .collect())
    }

    async fn create(&self, fields: TaskFields) -> ClientResult<Task> {
        let fields = fields.validated()?;
        let owner = self.owner()?;
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut tasks = self.load_all()?;
        let task = Task {
            id: Self::next_id(&tasks),
            title: fields.title,
            description: fields.description,
            priority: fields.priority,
            status: fields.status,
            due_date: fields.due_date,
            created_at: Utc::now(),
            user_id: Some(owner),
        };
        tasks.push(task.clone());
        self.save_all(&tasks)?;

        tracing::debug!("Created local task {}", task.id);
        Ok(task)
    }

    async fn update(&self, id: TaskId, fields: TaskFields) -> ClientResult<Task> {
        let fields = fields.validated()?;
        let owner = self.owner()?;
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut tasks = self.load_all()?;
        let index = Self::position(&tasks, id, owner)?;
        tasks[index].apply(fields);
        let updated = tasks[index].clone();
        self.save_all(&tasks)?;
        Ok(updated)
    }

    async fn remove(&self, id: TaskId) -> ClientResult<()> {
        let owner = self.owner()?;
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut tasks = self.load_all()?;
        let index = Self::position(&tasks, id, owner)?;
        tasks.remove(index);
        self.save_all(&tasks)?;
        tracing::debug!("Deleted local task {}", id);
        Ok(())
    }
}
