//! Request/response types for the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit::ActivityEntry;
use crate::roles::Role;
use crate::store::TaskComment;
use crate::task::{CollabStatus, Priority, Task, TaskError, TaskStatus, TodoAction, TodoItem};
use crate::user::User;

// ─────────────────────────────────────────────────────────────────────────────
// Requests
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    pub progress: u8,
}

#[derive(Debug, Deserialize)]
pub struct GradeRequest {
    pub score: i32,
}

#[derive(Debug, Deserialize)]
pub struct AddCollaboratorRequest {
    pub target_user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct RespondCollaboratorRequest {
    pub action: crate::task::CollabAction,
}

/// Checklist mutation as submitted by the client.
#[derive(Debug, Deserialize)]
pub struct TodoRequest {
    pub action: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub todo_id: Option<Uuid>,
}

impl TodoRequest {
    pub fn into_action(self) -> Result<TodoAction, TaskError> {
        match self.action.as_str() {
            "ADD" => {
                let text = self
                    .text
                    .ok_or_else(|| TaskError::Validation("text is required for ADD".into()))?;
                Ok(TodoAction::Add { text })
            }
            "TOGGLE" => {
                let todo_id = self.todo_id.ok_or_else(|| {
                    TaskError::Validation("todo_id is required for TOGGLE".into())
                })?;
                Ok(TodoAction::Toggle { todo_id })
            }
            "DELETE" => {
                let todo_id = self.todo_id.ok_or_else(|| {
                    TaskError::Validation("todo_id is required for DELETE".into())
                })?;
                Ok(TodoAction::Delete { todo_id })
            }
            other => Err(TaskError::Validation(format!(
                "unknown checklist action: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub fullname: String,
    pub username: String,
    pub role: Role,
    pub department_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CreateDepartmentRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    #[serde(default)]
    pub filter: crate::task::TaskFilter,
}

// ─────────────────────────────────────────────────────────────────────────────
// Responses
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UserBrief {
    pub id: Uuid,
    pub fullname: String,
    pub role: Role,
}

impl From<&User> for UserBrief {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            fullname: u.fullname.clone(),
            role: u.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CollaboratorView {
    pub id: Uuid,
    pub fullname: String,
    pub role: Option<Role>,
    pub status: CollabStatus,
}

#[derive(Debug, Serialize)]
pub struct TaskSummary {
    pub id: Uuid,
    pub title: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub progress: u8,
    pub department_id: Uuid,
    pub assigned_by: Uuid,
    pub assignee_names: String,
    pub due_date: Option<DateTime<Utc>>,
    pub score: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl TaskSummary {
    pub fn from_task(task: &Task, names: &std::collections::HashMap<Uuid, String>) -> Self {
        let assignee_names = task
            .assignees
            .iter()
            .map(|id| names.get(id).cloned().unwrap_or_else(|| "Unknown".into()))
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            id: task.id,
            title: task.title.clone(),
            priority: task.priority,
            status: task.status,
            progress: task.progress,
            department_id: task.department_id,
            assigned_by: task.assigned_by,
            assignee_names,
            due_date: task.due_date,
            score: task.score,
            created_at: task.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub creator_name: String,
    pub assignee_list: Vec<UserBrief>,
    pub collaborator_list: Vec<CollaboratorView>,
    pub comments: Vec<CommentView>,
    pub history: Vec<ActivityEntry>,
    pub is_assigner: bool,
    pub is_assignee: bool,
    pub can_score: bool,
}

#[derive(Debug, Serialize)]
pub struct CommentView {
    pub id: Uuid,
    pub user: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl CommentView {
    pub fn from_comment(
        c: &TaskComment,
        names: &std::collections::HashMap<Uuid, String>,
    ) -> Self {
        Self {
            id: c.id,
            user: names
                .get(&c.user_id)
                .cloned()
                .unwrap_or_else(|| "Unknown".into()),
            content: c.comment.clone(),
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TodoListResponse {
    pub success: bool,
    pub todos: Vec<TodoItem>,
}

#[derive(Debug, Serialize)]
pub struct CollabResponse {
    pub success: bool,
    pub status: Option<CollabStatus>,
}
