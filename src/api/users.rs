//! User and department directory endpoints.

use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::Json,
};

use crate::roles::Role;
use crate::user::{self, Department, User};

use super::routes::AppState;
use super::types::{CreateDepartmentRequest, CreateUserRequest, UserBrief};

/// GET /api/users - Directory listing (used for invite dropdowns).
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserBrief>>, (StatusCode, String)> {
    let users = state.store.list_users().await;
    let briefs = users.iter().filter(|u| u.is_active()).map(UserBrief::from).collect();
    Ok(Json(briefs))
}

/// POST /api/users - Create an account (admin only).
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<User>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<User>, (StatusCode, String)> {
    if actor.role != Role::Admin {
        return Err((
            StatusCode::FORBIDDEN,
            "Only administrators may create accounts".to_string(),
        ));
    }
    if req.fullname.trim().is_empty() || req.username.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Name and username cannot be empty".to_string(),
        ));
    }

    let user = User::new(req.fullname, req.username, req.role, req.department_id);
    state.store.add_user(user.clone()).await;
    tracing::info!("Created account {} ({})", user.username, user.id);
    Ok(Json(user))
}

/// GET /api/users/subordinates - Who the actor may see and manage,
/// most senior first.
pub async fn list_subordinates(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<User>,
) -> Result<Json<Vec<UserBrief>>, (StatusCode, String)> {
    let users = state.store.list_users().await;
    let subordinates = user::subordinates_of(&actor, &users)
        .into_iter()
        .map(UserBrief::from)
        .collect();
    Ok(Json(subordinates))
}

/// GET /api/departments - List departments.
pub async fn list_departments(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Department>>, (StatusCode, String)> {
    Ok(Json(state.store.list_departments().await))
}

/// POST /api/departments - Create a department (admin only).
pub async fn create_department(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<User>,
    Json(req): Json<CreateDepartmentRequest>,
) -> Result<Json<Department>, (StatusCode, String)> {
    if actor.role != Role::Admin {
        return Err((
            StatusCode::FORBIDDEN,
            "Only administrators may create departments".to_string(),
        ));
    }
    if req.name.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Name cannot be empty".to_string()));
    }
    let department = Department::new(req.name);
    state.store.add_department(department.clone()).await;
    Ok(Json(department))
}
