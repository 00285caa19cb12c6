//! Append-only activity log.
//!
//! Audit writes are best-effort relative to the business operation that
//! triggered them: a failed write is reported on the operational log and
//! never rolls back or fails the primary mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::store::RecordStore;

/// Kind of action recorded against an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    UpdateProgress,
    Grade,
    AddCollab,
    RespondCollab,
    UpdateTodo,
    Comment,
}

/// One immutable audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

/// Writes activity entries through the record store, swallowing failures.
#[derive(Clone)]
pub struct AuditLogger {
    store: Arc<RecordStore>,
}

impl AuditLogger {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    pub async fn record(
        &self,
        user_id: Uuid,
        action: AuditAction,
        entity_type: &str,
        entity_id: Uuid,
        details: impl Into<String>,
    ) {
        let entry = ActivityEntry {
            id: Uuid::new_v4(),
            user_id,
            action,
            entity_type: entity_type.to_string(),
            entity_id,
            details: details.into(),
            created_at: Utc::now(),
        };
        if let Err(e) = self.store.append_activity(entry).await {
            tracing::warn!("Failed to write audit entry: {}", e);
        }
    }
}
