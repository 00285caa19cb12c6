//! Task records and embedded participant/checklist lists.
//!
//! The three embedded lists (`assignees`, `collaborators`, `todo_list`)
//! historically lived in the storage row as JSON-encoded strings. They are
//! typed fields here; the lenient deserializers keep old or mangled rows
//! readable by decoding a missing/malformed value as the empty list.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

/// Task workflow status.
///
/// `Pending` is never produced by status derivation; it is only preserved
/// when set externally (manual edits), so it stays a legal stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    New,
    InProgress,
    Pending,
    Completed,
    Overdue,
}

impl TaskStatus {
    /// Derive the status that a progress update at `now` produces.
    pub fn derive(progress: u8, due_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        if progress >= 100 {
            Self::Completed
        } else if due_date.is_some_and(|due| now > due) {
            Self::Overdue
        } else {
            Self::InProgress
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::InProgress => "InProgress",
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::Overdue => "Overdue",
        }
    }
}

/// Invitation state of a collaborator entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollabStatus {
    Pending,
    Accepted,
}

/// A user invited (or designated) to join a task's participant set.
///
/// A user id appears at most once among a task's collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collaborator {
    pub uid: Uuid,
    pub status: CollabStatus,
}

/// One checklist item on a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: Uuid,
    pub text: String,
    pub done: bool,
}

impl TodoItem {
    pub fn new(text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            done: false,
        }
    }
}

/// The central record: a unit of delegated work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    pub status: TaskStatus,
    /// 0..=100; 100 iff status is Completed.
    pub progress: u8,
    pub department_id: Uuid,
    /// Creator of the task; owns its existence.
    pub assigned_by: Uuid,
    /// Primary participant set. Never empty after creation.
    #[serde(default, deserialize_with = "lenient_list")]
    pub assignees: Vec<Uuid>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub collaborators: Vec<Collaborator>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub todo_list: Vec<TodoItem>,
    pub start_date: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    /// Set exactly when progress reaches 100.
    pub completed_date: Option<DateTime<Utc>>,
    pub score: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn has_assignee(&self, user_id: Uuid) -> bool {
        self.assignees.contains(&user_id)
    }

    /// Add to the assignee set; skips silently if already present.
    pub fn add_assignee(&mut self, user_id: Uuid) {
        if !self.has_assignee(user_id) {
            self.assignees.push(user_id);
        }
    }

    pub fn remove_assignee(&mut self, user_id: Uuid) {
        self.assignees.retain(|id| *id != user_id);
    }

    pub fn collaborator_index(&self, user_id: Uuid) -> Option<usize> {
        self.collaborators.iter().position(|c| c.uid == user_id)
    }

    /// A task whose creator is also among its assignees. Such tasks need an
    /// external superior to grade them.
    pub fn is_self_assigned(&self) -> bool {
        self.has_assignee(self.assigned_by)
    }

    /// True when the stored status should lazily flip to Overdue at `now`.
    pub fn is_past_due(&self, now: DateTime<Utc>) -> bool {
        self.status != TaskStatus::Completed
            && self.status != TaskStatus::Overdue
            && self.due_date.is_some_and(|due| now > due)
    }
}

/// Decode an embedded list field, treating a missing, null, or malformed
/// value as empty. Also accepts the legacy encoding where the list arrives
/// as a JSON string.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(decode_embedded_list(value))
}

pub(crate) fn decode_embedded_list<T: DeserializeOwned>(value: serde_json::Value) -> Vec<T> {
    match value {
        serde_json::Value::Array(_) => serde_json::from_value(value).unwrap_or_default(),
        serde_json::Value::String(s) => serde_json::from_str(&s).unwrap_or_default(),
        _ => Vec::new(),
    }
}
