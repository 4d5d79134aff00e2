use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use super::user::UserId;
use crate::errors::{ClientError, ClientResult};

pub type TaskId = i64;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Priority {
    #[serde(rename = "low", alias = "Low")]
    Low,
    // "Medium" is the server model's own default spelling
    #[default]
    #[serde(rename = "medium", alias = "Medium")]
    Medium,
    #[serde(rename = "high", alias = "High")]
    High,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "todo", alias = "To Do")]
    Todo,
    #[serde(rename = "in-progress", alias = "In Progress")]
    InProgress,
    #[serde(rename = "completed", alias = "Completed")]
    Completed,
}

/// Which tasks the dashboard shows. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Status(TaskStatus),
}

/// A task as owned by the backing store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, with = "due_date")]
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "user", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

/// The mutable fields of a task, sent on create and as the full replacement on update.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct TaskFields {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, with = "due_date")]
    pub due_date: Option<NaiveDate>,
}

impl TaskFields {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Trims the title and rejects it when nothing is left.
    pub fn validated(mut self) -> ClientResult<Self> {
        let trimmed = self.title.trim();
        if trimmed.is_empty() {
            return Err(ClientError::invalid_field("title", "Task title is required"));
        }
        if trimmed.len() != self.title.len() {
            self.title = trimmed.to_string();
        }
        Ok(self)
    }
}

impl Task {
    pub fn fields(&self) -> TaskFields {
        TaskFields {
            title: self.title.clone(),
            description: self.description.clone(),
            priority: self.priority,
            status: self.status,
            due_date: self.due_date,
        }
    }

    // Overwrites every mutable field, keeping identity and ownership
    pub fn apply(&mut self, fields: TaskFields) {
        self.title = fields.title;
        self.description = fields.description;
        self.priority = fields.priority;
        self.status = fields.status;
        self.due_date = fields.due_date;
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Open tasks whose due date lies strictly before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_completed() && self.due_date.is_some_and(|due| due < today)
    }
}

impl StatusFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Status(status) => task.status == *status,
        }
    }
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.pad("all"),
            StatusFilter::Status(status) => status.fmt(f),
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority '{}', expected low, medium or high", other)),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "todo" | "to do" => Ok(TaskStatus::Todo),
            "in-progress" | "in progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(format!(
                "unknown status '{}', expected todo, in-progress or completed",
                other
            )),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        s.parse().map(StatusFilter::Status)
    }
}

/// Due dates go out as `YYYY-MM-DD` and come back either that way or as a
/// full RFC 3339 timestamp, since the server stores a datetime.
pub(crate) mod due_date {
    use chrono::{DateTime, NaiveDate};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => serializer.serialize_str(&date.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => parse(text).map(Some).map_err(de::Error::custom),
        }
    }

    pub fn parse(text: &str) -> Result<NaiveDate, String> {
        if let Ok(date) = NaiveDate::parse_from_str(text, FORMAT) {
            return Ok(date);
        }
        DateTime::parse_from_rfc3339(text)
            .map(|stamp| stamp.date_naive())
            .map_err(|_| format!("invalid due date '{}'", text))
    }
}
