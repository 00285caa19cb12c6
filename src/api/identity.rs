//! Actor identification middleware.
//!
//! Authentication flows (passwords, sessions) live outside this service;
//! callers identify the acting user with an `x-user-id` header. The
//! middleware resolves it against the store and injects the full `User`
//! record as a request extension so handlers get a verified actor.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use uuid::Uuid;

use super::routes::AppState;

pub const USER_HEADER: &str = "x-user-id";

pub async fn identify(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let header = req
        .headers()
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<Uuid>().ok());

    let Some(user_id) = header else {
        return (
            StatusCode::UNAUTHORIZED,
            format!("Missing or invalid {} header", USER_HEADER),
        )
            .into_response();
    };

    match state.store.get_user(user_id).await {
        Some(user) if user.is_active() => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Some(_) => (StatusCode::UNAUTHORIZED, "Account is inactive".to_string()).into_response(),
        None => (StatusCode::UNAUTHORIZED, "Unknown user".to_string()).into_response(),
    }
}
