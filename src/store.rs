//! Record store: users, departments, tasks, comments, and activity log.
//!
//! All records live in one `RwLock`-guarded map persisted to
//! `{data_dir}/records.json`. Every task mutation goes through
//! [`RecordStore::update_task`], a read-modify-write executed under the
//! write lock, so concurrent edits of a task's embedded lists serialize
//! instead of losing updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::audit::ActivityEntry;
use crate::roles::Role;
use crate::task::{Task, TaskError, TaskResult, TaskStatus};
use crate::user::{Department, User};

/// A comment left on a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskComment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Records {
    #[serde(default)]
    users: HashMap<Uuid, User>,
    #[serde(default)]
    departments: HashMap<Uuid, Department>,
    #[serde(default)]
    tasks: HashMap<Uuid, Task>,
    #[serde(default)]
    comments: Vec<TaskComment>,
    #[serde(default)]
    activity: Vec<ActivityEntry>,
}

/// Aggregate counts for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub total_departments: usize,
    pub total_users: usize,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub overdue_tasks: usize,
}

/// Disk-backed store for all records.
pub struct RecordStore {
    records: RwLock<Records>,
    storage_path: PathBuf,
}

/// Shared store wrapped in Arc for concurrent access.
pub type SharedRecordStore = Arc<RecordStore>;

impl RecordStore {
    /// Create a store, loading existing records from disk if available.
    pub fn new(data_dir: &Path) -> Self {
        let storage_path = data_dir.join("records.json");

        let records = if storage_path.exists() {
            match Self::load_from_path(&storage_path) {
                Ok(r) => {
                    tracing::info!("Loaded records from {}", storage_path.display());
                    r
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to load records from {}: {}, starting empty",
                        storage_path.display(),
                        e
                    );
                    Records::default()
                }
            }
        } else {
            Records::default()
        };

        Self {
            records: RwLock::new(records),
            storage_path,
        }
    }

    fn load_from_path(path: &Path) -> Result<Records, std::io::Error> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    async fn save_to_disk(&self) -> Result<(), std::io::Error> {
        let records = self.records.read().await;

        if let Some(parent) = self.storage_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(&*records)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        std::fs::write(&self.storage_path, contents)?;
        tracing::debug!("Saved records to {}", self.storage_path.display());
        Ok(())
    }

    async fn persist(&self) {
        if let Err(e) = self.save_to_disk().await {
            tracing::error!("Failed to save records to disk: {}", e);
        }
    }

    /// Seed a default department and admin account on first boot.
    pub async fn seed_if_empty(&self) {
        let empty = self.records.read().await.users.is_empty();
        if !empty {
            return;
        }

        let department = Department::new("General".to_string());
        let admin = User::new(
            "Administrator".to_string(),
            "admin".to_string(),
            Role::Admin,
            department.id,
        );
        tracing::info!(
            "Seeding initial admin account (user id {}, department {})",
            admin.id,
            department.id
        );

        {
            let mut records = self.records.write().await;
            records.departments.insert(department.id, department);
            records.users.insert(admin.id, admin);
        }
        self.persist().await;
    }

    // ── Users & departments ──────────────────────────────────────────────

    pub async fn add_user(&self, user: User) -> Uuid {
        let id = user.id;
        {
            let mut records = self.records.write().await;
            records.users.insert(id, user);
        }
        self.persist().await;
        id
    }

    pub async fn get_user(&self, id: Uuid) -> Option<User> {
        self.records.read().await.users.get(&id).cloned()
    }

    pub async fn list_users(&self) -> Vec<User> {
        self.records.read().await.users.values().cloned().collect()
    }

    pub async fn add_department(&self, department: Department) -> Uuid {
        let id = department.id;
        {
            let mut records = self.records.write().await;
            records.departments.insert(id, department);
        }
        self.persist().await;
        id
    }

    pub async fn list_departments(&self) -> Vec<Department> {
        self.records
            .read()
            .await
            .departments
            .values()
            .cloned()
            .collect()
    }

    // ── Tasks ────────────────────────────────────────────────────────────

    pub async fn insert_task(&self, task: Task) -> Uuid {
        let id = task.id;
        {
            let mut records = self.records.write().await;
            records.tasks.insert(id, task);
        }
        self.persist().await;
        id
    }

    pub async fn get_task(&self, id: Uuid) -> Option<Task> {
        self.records.read().await.tasks.get(&id).cloned()
    }

    pub async fn list_tasks(&self) -> Vec<Task> {
        self.records.read().await.tasks.values().cloned().collect()
    }

    /// Read-modify-write a task under the write lock.
    ///
    /// The closure works on a draft; the stored record is replaced (and
    /// `updated_at` bumped) only when the closure succeeds, so a failed
    /// operation is a true no-op.
    pub async fn update_task<T, F>(&self, id: Uuid, mutate: F) -> TaskResult<T>
    where
        F: FnOnce(&mut Task) -> TaskResult<T>,
    {
        let result = {
            let mut records = self.records.write().await;
            let task = records
                .tasks
                .get_mut(&id)
                .ok_or_else(|| TaskError::NotFound(format!("task {}", id)))?;
            let mut draft = task.clone();
            let value = mutate(&mut draft)?;
            draft.updated_at = Utc::now();
            *task = draft;
            value
        };
        self.persist().await;
        Ok(result)
    }

    /// Tasks counted for the admin dashboard.
    pub async fn stats(&self, now: DateTime<Utc>) -> StoreStats {
        let records = self.records.read().await;
        let tasks = records.tasks.values();
        let completed = records
            .tasks
            .values()
            .filter(|t| t.status == TaskStatus::Completed)
            .count();
        // Overdue is counted from due dates directly, not the stored
        // status, because the status only flips lazily on reads.
        let overdue = tasks
            .filter(|t| {
                t.status != TaskStatus::Completed && t.due_date.is_some_and(|due| due < now)
            })
            .count();
        StoreStats {
            total_departments: records.departments.len(),
            total_users: records.users.len(),
            total_tasks: records.tasks.len(),
            completed_tasks: completed,
            overdue_tasks: overdue,
        }
    }

    // ── Comments & activity ──────────────────────────────────────────────

    pub async fn add_comment(&self, comment: TaskComment) {
        {
            let mut records = self.records.write().await;
            records.comments.push(comment);
        }
        self.persist().await;
    }

    pub async fn comments_for(&self, task_id: Uuid) -> Vec<TaskComment> {
        let records = self.records.read().await;
        let mut comments: Vec<TaskComment> = records
            .comments
            .iter()
            .filter(|c| c.task_id == task_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        comments
    }

    /// Append an audit entry. The log is append-only; nothing removes or
    /// rewrites entries.
    pub async fn append_activity(&self, entry: ActivityEntry) -> Result<(), std::io::Error> {
        {
            let mut records = self.records.write().await;
            records.activity.push(entry);
        }
        self.save_to_disk().await
    }

    /// Activity for one entity, newest first.
    pub async fn activity_for(&self, entity_type: &str, entity_id: Uuid) -> Vec<ActivityEntry> {
        let records = self.records.read().await;
        let mut entries: Vec<ActivityEntry> = records
            .activity
            .iter()
            .filter(|e| e.entity_type == entity_type && e.entity_id == entity_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Priority;

    fn sample_task(dept: Uuid, creator: Uuid) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            title: "Quarterly report".into(),
            description: String::new(),
            priority: Priority::default(),
            status: TaskStatus::New,
            progress: 0,
            department_id: dept,
            assigned_by: creator,
            assignees: vec![creator],
            collaborators: Vec::new(),
            todo_list: Vec::new(),
            start_date: now,
            due_date: None,
            completed_date: None,
            score: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_roundtrip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let dept = Department::new("Radiology".into());
        let dept_id = dept.id;
        let user = User::new("Alice".into(), "alice".into(), Role::Head, dept_id);
        let user_id = user.id;

        {
            let store = RecordStore::new(dir.path());
            store.add_department(dept).await;
            store.add_user(user).await;
            store.insert_task(sample_task(dept_id, user_id)).await;
        }

        let reloaded = RecordStore::new(dir.path());
        assert_eq!(reloaded.list_users().await.len(), 1);
        assert_eq!(reloaded.list_tasks().await.len(), 1);
        assert_eq!(reloaded.list_tasks().await[0].assignees, vec![user_id]);
    }

    #[tokio::test]
    async fn test_update_task_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let result = store.update_task(Uuid::new_v4(), |_| Ok(())).await;
        assert!(matches!(result, Err(TaskError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_task_failure_leaves_record_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let task = sample_task(Uuid::new_v4(), Uuid::new_v4());
        let id = store.insert_task(task).await;

        let result: TaskResult<()> = store
            .update_task(id, |t| {
                t.progress = 40;
                Err(TaskError::Validation("nope".into()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(store.get_task(id).await.unwrap().progress, 0);
    }

    #[tokio::test]
    async fn test_seed_if_empty_only_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        store.seed_if_empty().await;
        store.seed_if_empty().await;
        assert_eq!(store.list_users().await.len(), 1);
        assert_eq!(store.list_departments().await.len(), 1);
        assert_eq!(store.list_users().await[0].role, Role::Admin);
    }

    #[tokio::test]
    async fn test_activity_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let entity = Uuid::new_v4();
        let user = Uuid::new_v4();
        for (i, details) in ["first", "second"].iter().enumerate() {
            let entry = ActivityEntry {
                id: Uuid::new_v4(),
                user_id: user,
                action: crate::audit::AuditAction::Create,
                entity_type: "TASK".into(),
                entity_id: entity,
                details: details.to_string(),
                created_at: Utc::now() + chrono::Duration::seconds(i as i64),
            };
            store.append_activity(entry).await.unwrap();
        }
        let entries = store.activity_for("TASK", entity).await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].details, "second");
    }
}
