//! Task operations: assignment, lifecycle, collaboration, scoring,
//! checklist, and new-task notification fan-out.
//!
//! Every mutation is a single read-modify-write through
//! [`RecordStore::update_task`]. Audit writes happen after the primary
//! mutation and never fail it.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::audit::{ActivityEntry, AuditAction, AuditLogger};
use crate::notify::{SharedNotificationHub, TaskEvent};
use crate::roles::Role;
use crate::store::{SharedRecordStore, TaskComment};
use crate::user::User;

use super::authorize;
use super::error::{TaskError, TaskResult};
use super::types::{CollabStatus, Collaborator, Priority, Task, TaskStatus, TodoItem};

const ENTITY_TASK: &str = "TASK";

/// Assignee field of a create request. Accepts a single id, a list of ids,
/// or a JSON-encoded list; blank and null entries are dropped.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AssigneeInput {
    Many(Vec<serde_json::Value>),
    One(serde_json::Value),
}

impl Default for AssigneeInput {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl AssigneeInput {
    /// Normalize to a deduplicated id list, dropping anything unusable.
    pub fn normalize(&self) -> Vec<Uuid> {
        let values: Vec<serde_json::Value> = match self {
            Self::Many(values) => values.clone(),
            Self::One(value) => vec![value.clone()],
        };

        let mut ids = Vec::new();
        for value in values {
            Self::collect_id(value, &mut ids);
        }

        let mut deduped = Vec::new();
        for id in ids {
            if !deduped.contains(&id) {
                deduped.push(id);
            }
        }
        deduped
    }

    /// Extract ids from one submitted value, dropping blank and null
    /// entries individually so one bad element never discards the rest.
    fn collect_id(value: serde_json::Value, ids: &mut Vec<Uuid>) {
        match value {
            serde_json::Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() || trimmed == "null" || trimmed == "undefined" {
                    return;
                }
                if trimmed.starts_with('[') {
                    // Legacy clients submit the list JSON-encoded; filter
                    // its elements the same way as a plain list.
                    if let Ok(elements) =
                        serde_json::from_str::<Vec<serde_json::Value>>(trimmed)
                    {
                        for element in elements {
                            Self::collect_id(element, ids);
                        }
                    }
                } else if let Ok(id) = trimmed.parse::<Uuid>() {
                    ids.push(id);
                }
            }
            other => {
                if let Ok(id) = serde_json::from_value::<Uuid>(other) {
                    ids.push(id);
                }
            }
        }
    }
}

/// Input for task creation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub assigned_to: AssigneeInput,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Which slice of the task list a user is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskFilter {
    #[default]
    General,
    Mine,
    AssignedByMe,
}

/// Response to a collaboration invitation (or a voluntary exit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollabAction {
    Accept,
    Decline,
    Remove,
}

/// Checklist mutation.
#[derive(Debug, Clone)]
pub enum TodoAction {
    Add { text: String },
    Toggle { todo_id: Uuid },
    Delete { todo_id: Uuid },
}

/// The task engine. Holds the store, audit log, and notification hub by
/// handle; cheap to clone.
#[derive(Clone)]
pub struct TaskService {
    store: SharedRecordStore,
    audit: AuditLogger,
    hub: SharedNotificationHub,
}

impl TaskService {
    pub fn new(store: SharedRecordStore, audit: AuditLogger, hub: SharedNotificationHub) -> Self {
        Self { store, audit, hub }
    }

    // ── Assignment ───────────────────────────────────────────────────────

    /// Create a task and notify its assignees.
    ///
    /// Every distinct target other than the actor must be strictly
    /// outranked by the actor (ADMIN excepted); self-assignment is always
    /// permitted.
    pub async fn create_task(&self, actor: &User, input: CreateTaskInput) -> TaskResult<Task> {
        let assignees = input.assigned_to.normalize();
        if assignees.is_empty() {
            return Err(TaskError::Validation(
                "at least one assignee is required".to_string(),
            ));
        }

        for target_id in &assignees {
            if *target_id == actor.id {
                continue;
            }
            let target = self.store.get_user(*target_id).await.ok_or_else(|| {
                TaskError::NotFound(format!("assignee {} does not exist", target_id))
            })?;
            authorize::check_assignment(actor, &target)?;
        }

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            priority: input.priority,
            status: TaskStatus::New,
            progress: 0,
            department_id: actor.department_id,
            assigned_by: actor.id,
            assignees,
            collaborators: Vec::new(),
            todo_list: Vec::new(),
            start_date: input.start_date.unwrap_or(now),
            due_date: input.due_date,
            completed_date: None,
            score: None,
            created_at: now,
            updated_at: now,
        };

        self.store.insert_task(task.clone()).await;
        self.audit
            .record(
                actor.id,
                AuditAction::Create,
                ENTITY_TASK,
                task.id,
                format!("Assigned new task: {}", task.title),
            )
            .await;

        // Recipients are exactly the normalized assignee list at creation.
        let event = TaskEvent::NewTask {
            task_id: task.id,
            title: task.title.clone(),
        };
        self.hub.publish_all(&task.assignees, &event).await;

        tracing::info!("Task {} created by {}", task.id, actor.username);
        Ok(task)
    }

    /// Tasks visible to `actor` under the given filter, newest first.
    pub async fn list_tasks(&self, actor: &User, filter: TaskFilter) -> Vec<Task> {
        let all = self.store.list_tasks().await;
        let mut tasks: Vec<Task> = if actor.role == Role::Admin {
            match filter {
                TaskFilter::General => all,
                // The admin dashboard only uses the system-wide view.
                _ => Vec::new(),
            }
        } else {
            all.into_iter()
                .filter(|t| match filter {
                    TaskFilter::General => t.department_id == actor.department_id,
                    TaskFilter::Mine => t.has_assignee(actor.id),
                    TaskFilter::AssignedByMe => t.assigned_by == actor.id,
                })
                .collect()
        };
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks
    }

    // ── Lifecycle ────────────────────────────────────────────────────────

    /// Fetch a task for display, lazily flipping it to Overdue when its
    /// due date has passed. This and progress updates are the only places
    /// overdue status is computed; there is no background sweep.
    pub async fn get_task_detail(&self, task_id: Uuid) -> TaskResult<Task> {
        let task = self
            .store
            .get_task(task_id)
            .await
            .ok_or_else(|| TaskError::NotFound(format!("task {}", task_id)))?;

        if task.is_past_due(Utc::now()) {
            return self
                .store
                .update_task(task_id, |t| {
                    t.status = TaskStatus::Overdue;
                    Ok(t.clone())
                })
                .await;
        }
        Ok(task)
    }

    /// Update progress and re-derive the status.
    pub async fn update_progress(
        &self,
        task_id: Uuid,
        progress: u8,
        actor_id: Uuid,
    ) -> TaskResult<Task> {
        if progress > 100 {
            return Err(TaskError::Validation(format!(
                "progress must be between 0 and 100, got {}",
                progress
            )));
        }

        let now = Utc::now();
        let task = self
            .store
            .update_task(task_id, |t| {
                t.progress = progress;
                t.status = TaskStatus::derive(progress, t.due_date, now);
                t.completed_date = if t.status == TaskStatus::Completed {
                    Some(now)
                } else {
                    None
                };
                Ok(t.clone())
            })
            .await?;

        self.audit
            .record(
                actor_id,
                AuditAction::UpdateProgress,
                ENTITY_TASK,
                task_id,
                format!(
                    "Progress updated: {}% (status: {})",
                    progress,
                    task.status.as_str()
                ),
            )
            .await;
        Ok(task)
    }

    // ── Scoring ──────────────────────────────────────────────────────────

    /// Whether `actor` may put a score on `task`. Pure; used by the detail
    /// view and enforced by [`TaskService::grade_task`].
    pub fn can_score(task: &Task, actor: &User) -> bool {
        authorize::can_score(task, actor)
    }

    /// Record a score. The write itself is trivial; the authority rule
    /// lives in [`authorize::can_score`].
    pub async fn grade_task(&self, actor: &User, task_id: Uuid, score: i32) -> TaskResult<Task> {
        let task = self
            .store
            .get_task(task_id)
            .await
            .ok_or_else(|| TaskError::NotFound(format!("task {}", task_id)))?;

        if !authorize::can_score(&task, actor) {
            return Err(TaskError::Authorization(
                "you are not allowed to score this task".to_string(),
            ));
        }

        let task = self
            .store
            .update_task(task_id, |t| {
                t.score = Some(score);
                Ok(t.clone())
            })
            .await?;

        self.audit
            .record(
                actor.id,
                AuditAction::Grade,
                ENTITY_TASK,
                task_id,
                format!("Scored task: {}", score),
            )
            .await;
        Ok(task)
    }

    // ── Collaboration ────────────────────────────────────────────────────

    /// Invite (or designate) a collaborator.
    ///
    /// An ADMIN actor or a strict superior adds the target as ACCEPTED and
    /// straight into the assignee set; anyone else leaves the entry
    /// PENDING until the target responds.
    pub async fn add_collaborator(
        &self,
        task_id: Uuid,
        target_user_id: Uuid,
        actor_id: Uuid,
    ) -> TaskResult<CollabStatus> {
        let task = self
            .store
            .get_task(task_id)
            .await
            .ok_or_else(|| TaskError::NotFound(format!("task {}", task_id)))?;
        let actor = self
            .store
            .get_user(actor_id)
            .await
            .ok_or_else(|| TaskError::NotFound(format!("user {}", actor_id)))?;
        let target = self
            .store
            .get_user(target_user_id)
            .await
            .ok_or_else(|| TaskError::NotFound(format!("user {}", target_user_id)))?;

        if task.collaborator_index(target_user_id).is_some() {
            return Err(TaskError::Conflict(format!(
                "{} is already on the collaborator list",
                target.fullname
            )));
        }
        if target.role == Role::Admin {
            return Err(TaskError::Authorization(
                "administrators cannot be invited as collaborators".to_string(),
            ));
        }
        if !authorize::can_invite(&actor, &target) {
            return Err(TaskError::Authorization(format!(
                "{} is outside your invitation scope",
                target.fullname
            )));
        }

        let auto_accept = actor.role == Role::Admin || actor.role.outranks(target.role);
        let status = if auto_accept {
            CollabStatus::Accepted
        } else {
            CollabStatus::Pending
        };

        self.store
            .update_task(task_id, |t| {
                if t.collaborator_index(target_user_id).is_some() {
                    return Err(TaskError::Conflict(format!(
                        "{} is already on the collaborator list",
                        target.fullname
                    )));
                }
                t.collaborators.push(Collaborator {
                    uid: target_user_id,
                    status,
                });
                if status == CollabStatus::Accepted {
                    t.add_assignee(target_user_id);
                }
                Ok(())
            })
            .await?;

        let details = match status {
            CollabStatus::Accepted => format!("Designated collaborator: {}", target.fullname),
            CollabStatus::Pending => {
                format!("Invited collaborator: {} (awaiting approval)", target.fullname)
            }
        };
        self.audit
            .record(actor_id, AuditAction::AddCollab, ENTITY_TASK, task_id, details)
            .await;
        Ok(status)
    }

    /// Respond to an invitation, or leave the task after having accepted.
    pub async fn respond_collaborator(
        &self,
        task_id: Uuid,
        actor_id: Uuid,
        action: CollabAction,
    ) -> TaskResult<()> {
        self.store
            .update_task(task_id, |t| {
                let index = t.collaborator_index(actor_id).ok_or_else(|| {
                    TaskError::NotFound("you are not on the collaborator list".to_string())
                })?;
                match action {
                    CollabAction::Accept => {
                        t.collaborators[index].status = CollabStatus::Accepted;
                        t.add_assignee(actor_id);
                    }
                    CollabAction::Decline => {
                        // A pending invitee was never an assignee.
                        t.collaborators.remove(index);
                    }
                    CollabAction::Remove => {
                        t.collaborators.remove(index);
                        t.remove_assignee(actor_id);
                    }
                }
                Ok(())
            })
            .await?;

        let details = match action {
            CollabAction::Accept => "Accepted the collaboration invitation",
            CollabAction::Decline => "Declined the collaboration invitation",
            CollabAction::Remove => "Left the collaboration group",
        };
        self.audit
            .record(
                actor_id,
                AuditAction::RespondCollab,
                ENTITY_TASK,
                task_id,
                details,
            )
            .await;
        Ok(())
    }

    // ── Checklist ────────────────────────────────────────────────────────

    /// Apply a checklist mutation and return the resulting list.
    ///
    /// A TOGGLE or DELETE whose id does not match is a silent no-op and
    /// writes no audit entry.
    pub async fn update_todo_list(
        &self,
        task_id: Uuid,
        actor: &User,
        action: TodoAction,
    ) -> TaskResult<Vec<TodoItem>> {
        let task = self
            .store
            .get_task(task_id)
            .await
            .ok_or_else(|| TaskError::NotFound(format!("task {}", task_id)))?;
        if !authorize::can_edit_checklist(&task, actor) {
            return Err(TaskError::Authorization(
                "only the creator, an assignee, or an admin may edit the checklist".to_string(),
            ));
        }

        let (todos, log_detail) = self
            .store
            .update_task(task_id, |t| {
                let detail = match &action {
                    TodoAction::Add { text } => {
                        t.todo_list.push(TodoItem::new(text.clone()));
                        Some(format!("Added checklist item: {}", text))
                    }
                    TodoAction::Toggle { todo_id } => {
                        match t.todo_list.iter_mut().find(|item| item.id == *todo_id) {
                            Some(item) => {
                                item.done = !item.done;
                                Some(format!(
                                    "Marked {}: {}",
                                    if item.done { "done" } else { "not done" },
                                    item.text
                                ))
                            }
                            None => None,
                        }
                    }
                    TodoAction::Delete { todo_id } => {
                        match t.todo_list.iter().position(|item| item.id == *todo_id) {
                            Some(index) => {
                                let removed = t.todo_list.remove(index);
                                Some(format!("Removed checklist item: {}", removed.text))
                            }
                            None => None,
                        }
                    }
                };
                Ok((t.todo_list.clone(), detail))
            })
            .await?;

        if let Some(details) = log_detail {
            self.audit
                .record(actor.id, AuditAction::UpdateTodo, ENTITY_TASK, task_id, details)
                .await;
        }
        Ok(todos)
    }

    // ── Comments & history ───────────────────────────────────────────────

    pub async fn add_comment(
        &self,
        actor: &User,
        task_id: Uuid,
        text: String,
    ) -> TaskResult<TaskComment> {
        if self.store.get_task(task_id).await.is_none() {
            return Err(TaskError::NotFound(format!("task {}", task_id)));
        }
        let comment = TaskComment {
            id: Uuid::new_v4(),
            task_id,
            user_id: actor.id,
            comment: text,
            created_at: Utc::now(),
        };
        self.store.add_comment(comment.clone()).await;
        self.audit
            .record(
                actor.id,
                AuditAction::Comment,
                ENTITY_TASK,
                task_id,
                "Commented on task",
            )
            .await;
        Ok(comment)
    }

    /// Activity history for a task, newest first. Older tasks predate the
    /// audit log, so a CREATE entry is synthesized when none was stored.
    pub async fn task_history(&self, task: &Task) -> Vec<ActivityEntry> {
        let mut entries = self.store.activity_for(ENTITY_TASK, task.id).await;
        if !entries.iter().any(|e| e.action == AuditAction::Create) {
            entries.push(ActivityEntry {
                id: Uuid::new_v4(),
                user_id: task.assigned_by,
                action: AuditAction::Create,
                entity_type: ENTITY_TASK.to_string(),
                entity_id: task.id,
                details: format!("Assigned new task: {}", task.title),
                created_at: task.created_at,
            });
            entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RecordStore;
    use chrono::Duration;
    use std::sync::Arc;

    struct Fixture {
        service: TaskService,
        store: SharedRecordStore,
        hub: SharedNotificationHub,
        _dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store: SharedRecordStore = Arc::new(RecordStore::new(dir.path()));
        let hub: SharedNotificationHub = Arc::new(crate::notify::NotificationHub::new());
        let service = TaskService::new(
            Arc::clone(&store),
            AuditLogger::new(Arc::clone(&store)),
            Arc::clone(&hub),
        );
        Fixture {
            service,
            store,
            hub,
            _dir: dir,
        }
    }

    async fn add_user(store: &RecordStore, name: &str, role: Role, dept: Uuid) -> User {
        let user = User::new(name.to_string(), name.to_lowercase(), role, dept);
        store.add_user(user.clone()).await;
        user
    }

    fn input_for(ids: &[Uuid]) -> CreateTaskInput {
        CreateTaskInput {
            title: "Quarterly report".into(),
            description: "Compile the numbers".into(),
            priority: Priority::High,
            assigned_to: AssigneeInput::Many(
                ids.iter()
                    .map(|id| serde_json::Value::String(id.to_string()))
                    .collect(),
            ),
            start_date: None,
            due_date: None,
        }
    }

    #[test]
    fn test_assignee_input_normalization() {
        let id = Uuid::new_v4();
        let other = Uuid::new_v4();

        // Single id as a plain string.
        let one = AssigneeInput::One(serde_json::Value::String(id.to_string()));
        assert_eq!(one.normalize(), vec![id]);

        // JSON-encoded list with blanks and duplicates.
        let encoded = AssigneeInput::One(serde_json::Value::String(format!(
            "[\"{}\", \"{}\", \"{}\"]",
            id, other, id
        )));
        assert_eq!(encoded.normalize(), vec![id, other]);

        let messy = AssigneeInput::Many(vec![
            serde_json::Value::String("".into()),
            serde_json::Value::Null,
            serde_json::Value::String("null".into()),
            serde_json::Value::String(id.to_string()),
        ]);
        assert_eq!(messy.normalize(), vec![id]);

        assert!(AssigneeInput::default().normalize().is_empty());
    }

    #[test]
    fn test_encoded_list_drops_only_bad_entries() {
        let id = Uuid::new_v4();

        // A null or blank element inside a JSON-encoded list must not
        // take the valid ids down with it.
        let encoded = AssigneeInput::One(serde_json::Value::String(format!(
            "[\"{}\", null, \"\"]",
            id
        )));
        assert_eq!(encoded.normalize(), vec![id]);

        let all_bad = AssigneeInput::One(serde_json::Value::String("[null, \"\"]".into()));
        assert!(all_bad.normalize().is_empty());
    }

    #[tokio::test]
    async fn test_create_task_requires_assignees() {
        let f = fixture().await;
        let dept = Uuid::new_v4();
        let head = add_user(&f.store, "Alice", Role::Head, dept).await;
        let result = f.service.create_task(&head, input_for(&[])).await;
        assert!(matches!(result, Err(TaskError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_task_rank_rule() {
        let f = fixture().await;
        let dept = Uuid::new_v4();
        let head = add_user(&f.store, "Alice", Role::Head, dept).await;
        let staff = add_user(&f.store, "Bob", Role::Staff, dept).await;

        // Downward assignment succeeds with fresh-task defaults.
        let task = f.service.create_task(&head, input_for(&[staff.id])).await.unwrap();
        assert_eq!(task.status, TaskStatus::New);
        assert_eq!(task.progress, 0);
        assert_eq!(task.department_id, dept);
        assert!(task.collaborators.is_empty());

        // Upward assignment fails.
        let result = f.service.create_task(&staff, input_for(&[head.id])).await;
        assert!(matches!(result, Err(TaskError::Authorization(_))));
    }

    #[tokio::test]
    async fn test_self_assignment_always_succeeds() {
        let f = fixture().await;
        let staff = add_user(&f.store, "Bob", Role::Staff, Uuid::new_v4()).await;
        let task = f.service.create_task(&staff, input_for(&[staff.id])).await.unwrap();
        assert_eq!(task.assignees, vec![staff.id]);
        assert!(task.is_self_assigned());
    }

    #[tokio::test]
    async fn test_create_task_notifies_assignees() {
        let f = fixture().await;
        let dept = Uuid::new_v4();
        let head = add_user(&f.store, "Alice", Role::Head, dept).await;
        let staff = add_user(&f.store, "Bob", Role::Staff, dept).await;
        let mut rx = f.hub.subscribe(staff.id).await;

        let task = f.service.create_task(&head, input_for(&[staff.id])).await.unwrap();

        let TaskEvent::NewTask { task_id, .. } = rx.recv().await.unwrap();
        assert_eq!(task_id, task.id);
    }

    #[tokio::test]
    async fn test_progress_100_completes() {
        let f = fixture().await;
        let staff = add_user(&f.store, "Bob", Role::Staff, Uuid::new_v4()).await;
        let task = f.service.create_task(&staff, input_for(&[staff.id])).await.unwrap();

        let updated = f.service.update_progress(task.id, 100, staff.id).await.unwrap();
        assert_eq!(updated.status, TaskStatus::Completed);
        assert!(updated.completed_date.is_some());

        // Regressing below 100 clears the completion marker.
        let updated = f.service.update_progress(task.id, 80, staff.id).await.unwrap();
        assert_eq!(updated.status, TaskStatus::InProgress);
        assert!(updated.completed_date.is_none());
    }

    #[tokio::test]
    async fn test_progress_respects_due_date() {
        let f = fixture().await;
        let staff = add_user(&f.store, "Bob", Role::Staff, Uuid::new_v4()).await;

        let mut input = input_for(&[staff.id]);
        input.due_date = Some(Utc::now() - Duration::days(1));
        let late = f.service.create_task(&staff, input).await.unwrap();
        let updated = f.service.update_progress(late.id, 50, staff.id).await.unwrap();
        assert_eq!(updated.status, TaskStatus::Overdue);

        let mut input = input_for(&[staff.id]);
        input.due_date = Some(Utc::now() + Duration::days(1));
        let on_time = f.service.create_task(&staff, input).await.unwrap();
        let updated = f.service.update_progress(on_time.id, 50, staff.id).await.unwrap();
        assert_eq!(updated.status, TaskStatus::InProgress);
    }

    #[tokio::test]
    async fn test_progress_out_of_range_rejected() {
        let f = fixture().await;
        let staff = add_user(&f.store, "Bob", Role::Staff, Uuid::new_v4()).await;
        let task = f.service.create_task(&staff, input_for(&[staff.id])).await.unwrap();
        let result = f.service.update_progress(task.id, 101, staff.id).await;
        assert!(matches!(result, Err(TaskError::Validation(_))));
    }

    #[tokio::test]
    async fn test_detail_fetch_flips_overdue_lazily() {
        let f = fixture().await;
        let staff = add_user(&f.store, "Bob", Role::Staff, Uuid::new_v4()).await;
        let mut input = input_for(&[staff.id]);
        input.due_date = Some(Utc::now() - Duration::hours(1));
        let task = f.service.create_task(&staff, input).await.unwrap();
        assert_eq!(task.status, TaskStatus::New);

        let detail = f.service.get_task_detail(task.id).await.unwrap();
        assert_eq!(detail.status, TaskStatus::Overdue);
        // Persisted, not just rendered.
        assert_eq!(f.store.get_task(task.id).await.unwrap().status, TaskStatus::Overdue);
    }

    #[tokio::test]
    async fn test_superior_designates_peer_invites() {
        let f = fixture().await;
        let dept = Uuid::new_v4();
        let head = add_user(&f.store, "Alice", Role::Head, dept).await;
        let staff = add_user(&f.store, "Bob", Role::Staff, dept).await;
        let peer = add_user(&f.store, "Cleo", Role::Staff, dept).await;

        let task = f.service.create_task(&head, input_for(&[staff.id])).await.unwrap();

        // A strict superior designates: ACCEPTED and in the assignee set.
        let status = f.service.add_collaborator(task.id, peer.id, head.id).await.unwrap();
        assert_eq!(status, CollabStatus::Accepted);
        let task = f.store.get_task(task.id).await.unwrap();
        assert!(task.has_assignee(peer.id));

        // A peer invites: PENDING, not yet an assignee.
        let peer2 = add_user(&f.store, "Dana", Role::Staff, dept).await;
        let status = f.service.add_collaborator(task.id, peer2.id, staff.id).await.unwrap();
        assert_eq!(status, CollabStatus::Pending);
        let task = f.store.get_task(task.id).await.unwrap();
        assert!(!task.has_assignee(peer2.id));
    }

    #[tokio::test]
    async fn test_duplicate_collaborator_conflicts() {
        let f = fixture().await;
        let dept = Uuid::new_v4();
        let head = add_user(&f.store, "Alice", Role::Head, dept).await;
        let staff = add_user(&f.store, "Bob", Role::Staff, dept).await;
        let task = f.service.create_task(&head, input_for(&[head.id])).await.unwrap();

        f.service.add_collaborator(task.id, staff.id, head.id).await.unwrap();
        let result = f.service.add_collaborator(task.id, staff.id, head.id).await;
        assert!(matches!(result, Err(TaskError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_admin_target_cannot_be_invited() {
        let f = fixture().await;
        let dept = Uuid::new_v4();
        let head = add_user(&f.store, "Alice", Role::Head, dept).await;
        let admin = add_user(&f.store, "Root", Role::Admin, dept).await;
        let task = f.service.create_task(&head, input_for(&[head.id])).await.unwrap();

        let result = f.service.add_collaborator(task.id, admin.id, head.id).await;
        assert!(matches!(result, Err(TaskError::Authorization(_))));
    }

    #[tokio::test]
    async fn test_cross_department_invite_denied() {
        let f = fixture().await;
        let dept2 = Uuid::new_v4();
        let dept3 = Uuid::new_v4();
        let alice = add_user(&f.store, "Alice", Role::Head, dept2).await;
        let bob = add_user(&f.store, "Bob", Role::Staff, dept2).await;
        let carl = add_user(&f.store, "Carl", Role::Head, dept3).await;

        let task = f.service.create_task(&alice, input_for(&[bob.id])).await.unwrap();

        // Carl heads another department; Bob is STAFF, so the cross-HEAD
        // exception does not apply.
        let result = f.service.add_collaborator(task.id, bob.id, carl.id).await;
        assert!(matches!(result, Err(TaskError::Authorization(_))));
    }

    #[tokio::test]
    async fn test_accept_is_idempotent_on_assignees() {
        let f = fixture().await;
        let dept = Uuid::new_v4();
        let head = add_user(&f.store, "Alice", Role::Head, dept).await;
        let staff = add_user(&f.store, "Bob", Role::Staff, dept).await;
        let peer = add_user(&f.store, "Cleo", Role::Staff, dept).await;

        let task = f.service.create_task(&head, input_for(&[staff.id])).await.unwrap();
        f.service.add_collaborator(task.id, peer.id, staff.id).await.unwrap();

        f.service
            .respond_collaborator(task.id, peer.id, CollabAction::Accept)
            .await
            .unwrap();
        f.service
            .respond_collaborator(task.id, peer.id, CollabAction::Accept)
            .await
            .unwrap();

        let task = f.store.get_task(task.id).await.unwrap();
        assert_eq!(task.assignees.iter().filter(|id| **id == peer.id).count(), 1);
        assert_eq!(
            task.collaborators
                .iter()
                .filter(|c| c.uid == peer.id)
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_decline_and_remove() {
        let f = fixture().await;
        let dept = Uuid::new_v4();
        let head = add_user(&f.store, "Alice", Role::Head, dept).await;
        let staff = add_user(&f.store, "Bob", Role::Staff, dept).await;
        let peer = add_user(&f.store, "Cleo", Role::Staff, dept).await;

        let task = f.service.create_task(&head, input_for(&[staff.id])).await.unwrap();

        // Decline drops the entry; the invitee never reached assignees.
        f.service.add_collaborator(task.id, peer.id, staff.id).await.unwrap();
        f.service
            .respond_collaborator(task.id, peer.id, CollabAction::Decline)
            .await
            .unwrap();
        let t = f.store.get_task(task.id).await.unwrap();
        assert!(t.collaborator_index(peer.id).is_none());
        assert!(!t.has_assignee(peer.id));

        // Remove after acceptance drops both entry and assignee.
        f.service.add_collaborator(task.id, peer.id, staff.id).await.unwrap();
        f.service
            .respond_collaborator(task.id, peer.id, CollabAction::Accept)
            .await
            .unwrap();
        f.service
            .respond_collaborator(task.id, peer.id, CollabAction::Remove)
            .await
            .unwrap();
        let t = f.store.get_task(task.id).await.unwrap();
        assert!(t.collaborator_index(peer.id).is_none());
        assert!(!t.has_assignee(peer.id));
    }

    #[tokio::test]
    async fn test_respond_without_entry_is_not_found() {
        let f = fixture().await;
        let staff = add_user(&f.store, "Bob", Role::Staff, Uuid::new_v4()).await;
        let task = f.service.create_task(&staff, input_for(&[staff.id])).await.unwrap();
        let result = f
            .service
            .respond_collaborator(task.id, Uuid::new_v4(), CollabAction::Accept)
            .await;
        assert!(matches!(result, Err(TaskError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_grade_gated_by_can_score() {
        let f = fixture().await;
        let dept = Uuid::new_v4();
        let head = add_user(&f.store, "Alice", Role::Head, dept).await;
        let staff = add_user(&f.store, "Bob", Role::Staff, dept).await;
        let admin = add_user(&f.store, "Root", Role::Admin, dept).await;

        let task = f.service.create_task(&head, input_for(&[staff.id])).await.unwrap();

        // The delegate cannot grade their own delegated work.
        let result = f.service.grade_task(&staff, task.id, 7).await;
        assert!(matches!(result, Err(TaskError::Authorization(_))));

        // The creator and the admin can.
        let graded = f.service.grade_task(&head, task.id, 8).await.unwrap();
        assert_eq!(graded.score, Some(8));
        let graded = f.service.grade_task(&admin, task.id, 9).await.unwrap();
        assert_eq!(graded.score, Some(9));
    }

    #[tokio::test]
    async fn test_todo_actions_and_silent_noop() {
        let f = fixture().await;
        let dept = Uuid::new_v4();
        let staff = add_user(&f.store, "Bob", Role::Staff, dept).await;
        let outsider = add_user(&f.store, "Eve", Role::Staff, dept).await;
        let task = f.service.create_task(&staff, input_for(&[staff.id])).await.unwrap();

        let todos = f
            .service
            .update_todo_list(
                task.id,
                &staff,
                TodoAction::Add {
                    text: "Draft outline".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(todos.len(), 1);
        assert!(!todos[0].done);
        let item_id = todos[0].id;

        let todos = f
            .service
            .update_todo_list(task.id, &staff, TodoAction::Toggle { todo_id: item_id })
            .await
            .unwrap();
        assert!(todos[0].done);

        // Unknown id: list unchanged, no new audit entry.
        let before = f.store.activity_for(ENTITY_TASK, task.id).await.len();
        let todos = f
            .service
            .update_todo_list(
                task.id,
                &staff,
                TodoAction::Toggle {
                    todo_id: Uuid::new_v4(),
                },
            )
            .await
            .unwrap();
        assert_eq!(todos.len(), 1);
        assert!(todos[0].done);
        let after = f.store.activity_for(ENTITY_TASK, task.id).await.len();
        assert_eq!(before, after);

        // Outsiders are rejected.
        let result = f
            .service
            .update_todo_list(
                task.id,
                &outsider,
                TodoAction::Delete { todo_id: item_id },
            )
            .await;
        assert!(matches!(result, Err(TaskError::Authorization(_))));

        let todos = f
            .service
            .update_todo_list(task.id, &staff, TodoAction::Delete { todo_id: item_id })
            .await
            .unwrap();
        assert!(todos.is_empty());
    }

    #[tokio::test]
    async fn test_list_filters() {
        let f = fixture().await;
        let dept_a = Uuid::new_v4();
        let dept_b = Uuid::new_v4();
        let alice = add_user(&f.store, "Alice", Role::Head, dept_a).await;
        let bob = add_user(&f.store, "Bob", Role::Staff, dept_a).await;
        let hana = add_user(&f.store, "Hana", Role::Head, dept_b).await;
        let admin = add_user(&f.store, "Root", Role::Admin, dept_a).await;

        f.service.create_task(&alice, input_for(&[bob.id])).await.unwrap();
        f.service.create_task(&hana, input_for(&[hana.id])).await.unwrap();

        assert_eq!(f.service.list_tasks(&alice, TaskFilter::General).await.len(), 1);
        assert_eq!(f.service.list_tasks(&bob, TaskFilter::Mine).await.len(), 1);
        assert_eq!(f.service.list_tasks(&bob, TaskFilter::AssignedByMe).await.len(), 0);
        assert_eq!(
            f.service.list_tasks(&alice, TaskFilter::AssignedByMe).await.len(),
            1
        );
        assert_eq!(f.service.list_tasks(&admin, TaskFilter::General).await.len(), 2);
        assert_eq!(f.service.list_tasks(&admin, TaskFilter::Mine).await.len(), 0);
    }

    #[tokio::test]
    async fn test_history_synthesizes_create_entry() {
        let f = fixture().await;
        let staff = add_user(&f.store, "Bob", Role::Staff, Uuid::new_v4()).await;
        let task = f.service.create_task(&staff, input_for(&[staff.id])).await.unwrap();

        let history = f.service.task_history(&task).await;
        assert!(history.iter().any(|e| e.action == AuditAction::Create));

        // Even a task with no stored log gets a synthesized CREATE.
        let orphan = Task {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            ..task.clone()
        };
        let history = f.service.task_history(&orphan).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action, AuditAction::Create);
    }

    /// End-to-end scenario: Alice (HEAD, dept 2) assigns Bob (STAFF,
    /// dept 2); Bob completes; the admin grades; Carl (HEAD, dept 3)
    /// fails to invite Bob onto his own cross-department task.
    #[tokio::test]
    async fn test_department_scenario() {
        let f = fixture().await;
        let dept2 = Uuid::new_v4();
        let dept3 = Uuid::new_v4();
        let alice = add_user(&f.store, "Alice", Role::Head, dept2).await;
        let bob = add_user(&f.store, "Bob", Role::Staff, dept2).await;
        let carl = add_user(&f.store, "Carl", Role::Head, dept3).await;
        let admin = add_user(&f.store, "Root", Role::Admin, dept2).await;

        let task = f.service.create_task(&alice, input_for(&[bob.id])).await.unwrap();
        assert_eq!(task.status, TaskStatus::New);
        assert_eq!(task.progress, 0);

        let task_after = f.service.update_progress(task.id, 100, bob.id).await.unwrap();
        assert_eq!(task_after.status, TaskStatus::Completed);

        let graded = f.service.grade_task(&admin, task.id, 9).await.unwrap();
        assert_eq!(graded.score, Some(9));

        let result = f.service.add_collaborator(task.id, bob.id, carl.id).await;
        assert!(matches!(result, Err(TaskError::Authorization(_))));
    }
}
