//! Task API endpoints.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Extension, Path as AxumPath, Query, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

use crate::task::{CreateTaskInput, Task, TaskService};
use crate::user::User;

use super::routes::AppState;
use super::types::*;

fn err(e: crate::task::TaskError) -> (StatusCode, String) {
    e.into_response()
}

async fn name_map(state: &AppState) -> HashMap<Uuid, String> {
    state
        .store
        .list_users()
        .await
        .into_iter()
        .map(|u| (u.id, u.fullname))
        .collect()
}

/// POST /api/tasks - Create a task and notify its assignees.
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<User>,
    Json(input): Json<CreateTaskInput>,
) -> Result<Json<Task>, (StatusCode, String)> {
    let task = state.service.create_task(&actor, input).await.map_err(err)?;
    Ok(Json(task))
}

/// GET /api/tasks?filter=general|mine|assigned_by_me - List visible tasks.
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<User>,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<Vec<TaskSummary>>, (StatusCode, String)> {
    let tasks = state.service.list_tasks(&actor, query.filter).await;
    let names = name_map(&state).await;
    let summaries = tasks
        .iter()
        .map(|t| TaskSummary::from_task(t, &names))
        .collect();
    Ok(Json(summaries))
}

/// GET /api/tasks/:id - Full detail view with participants, history, and
/// the actor's permission flags.
pub async fn task_detail(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<User>,
    AxumPath(id): AxumPath<Uuid>,
) -> Result<Json<TaskDetail>, (StatusCode, String)> {
    let task = state.service.get_task_detail(id).await.map_err(err)?;
    let users = state.store.list_users().await;
    let names: HashMap<Uuid, String> = users
        .iter()
        .map(|u| (u.id, u.fullname.clone()))
        .collect();

    let assignee_list = task
        .assignees
        .iter()
        .filter_map(|uid| users.iter().find(|u| u.id == *uid))
        .map(UserBrief::from)
        .collect();

    let collaborator_list = task
        .collaborators
        .iter()
        .map(|c| {
            let user = users.iter().find(|u| u.id == c.uid);
            CollaboratorView {
                id: c.uid,
                fullname: user
                    .map(|u| u.fullname.clone())
                    .unwrap_or_else(|| "Unknown".into()),
                role: user.map(|u| u.role),
                status: c.status,
            }
        })
        .collect();

    let comments = state
        .store
        .comments_for(task.id)
        .await
        .iter()
        .map(|c| CommentView::from_comment(c, &names))
        .collect();

    let history = state.service.task_history(&task).await;

    let creator_name = names
        .get(&task.assigned_by)
        .cloned()
        .unwrap_or_else(|| "Unknown".into());
    let is_assigner = task.assigned_by == actor.id;
    let is_assignee = task.has_assignee(actor.id);
    let can_score = TaskService::can_score(&task, &actor);

    Ok(Json(TaskDetail {
        task,
        creator_name,
        assignee_list,
        collaborator_list,
        comments,
        history,
        is_assigner,
        is_assignee,
        can_score,
    }))
}

/// POST /api/tasks/:id/progress - Update progress and re-derive status.
pub async fn update_progress(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<User>,
    AxumPath(id): AxumPath<Uuid>,
    Json(req): Json<ProgressRequest>,
) -> Result<Json<Task>, (StatusCode, String)> {
    let task = state
        .service
        .update_progress(id, req.progress, actor.id)
        .await
        .map_err(err)?;
    Ok(Json(task))
}

/// POST /api/tasks/:id/grade - Score a task (subject to scoring authority).
pub async fn grade_task(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<User>,
    AxumPath(id): AxumPath<Uuid>,
    Json(req): Json<GradeRequest>,
) -> Result<Json<Task>, (StatusCode, String)> {
    let task = state
        .service
        .grade_task(&actor, id, req.score)
        .await
        .map_err(err)?;
    Ok(Json(task))
}

/// POST /api/tasks/:id/collaborators - Invite or designate a collaborator.
pub async fn add_collaborator(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<User>,
    AxumPath(id): AxumPath<Uuid>,
    Json(req): Json<AddCollaboratorRequest>,
) -> Result<Json<CollabResponse>, (StatusCode, String)> {
    let status = state
        .service
        .add_collaborator(id, req.target_user_id, actor.id)
        .await
        .map_err(err)?;
    Ok(Json(CollabResponse {
        success: true,
        status: Some(status),
    }))
}

/// POST /api/tasks/:id/collaborators/respond - Accept/decline/leave.
pub async fn respond_collaborator(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<User>,
    AxumPath(id): AxumPath<Uuid>,
    Json(req): Json<RespondCollaboratorRequest>,
) -> Result<Json<CollabResponse>, (StatusCode, String)> {
    state
        .service
        .respond_collaborator(id, actor.id, req.action)
        .await
        .map_err(err)?;
    Ok(Json(CollabResponse {
        success: true,
        status: None,
    }))
}

/// POST /api/tasks/:id/todo - Apply a checklist mutation.
pub async fn update_todo(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<User>,
    AxumPath(id): AxumPath<Uuid>,
    Json(req): Json<TodoRequest>,
) -> Result<Json<TodoListResponse>, (StatusCode, String)> {
    let action = req.into_action().map_err(err)?;
    let todos = state
        .service
        .update_todo_list(id, &actor, action)
        .await
        .map_err(err)?;
    Ok(Json(TodoListResponse {
        success: true,
        todos,
    }))
}

/// POST /api/tasks/:id/comments - Leave a comment.
pub async fn post_comment(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<User>,
    AxumPath(id): AxumPath<Uuid>,
    Json(req): Json<CommentRequest>,
) -> Result<Json<CommentView>, (StatusCode, String)> {
    let comment = state
        .service
        .add_comment(&actor, id, req.content)
        .await
        .map_err(err)?;
    Ok(Json(CommentView {
        id: comment.id,
        user: actor.fullname,
        content: comment.comment,
        created_at: comment.created_at,
    }))
}
