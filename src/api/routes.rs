//! HTTP router and shared application state.

use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::audit::AuditLogger;
use crate::config::Config;
use crate::notify::{NotificationHub, SharedNotificationHub};
use crate::roles::Role;
use crate::store::{RecordStore, SharedRecordStore, StoreStats};
use crate::task::TaskService;
use crate::user::User;

use super::{events, identity, tasks, users};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: SharedRecordStore,
    pub service: TaskService,
    pub hub: SharedNotificationHub,
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let store: SharedRecordStore = Arc::new(RecordStore::new(&config.data_dir));
    store.seed_if_empty().await;

    let hub: SharedNotificationHub = Arc::new(NotificationHub::new());
    let service = TaskService::new(
        Arc::clone(&store),
        AuditLogger::new(Arc::clone(&store)),
        Arc::clone(&hub),
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        service,
        hub,
    });

    let protected_routes = Router::new()
        .route("/api/stats", get(get_stats))
        .route("/api/tasks", post(tasks::create_task))
        .route("/api/tasks", get(tasks::list_tasks))
        .route("/api/tasks/:id", get(tasks::task_detail))
        .route("/api/tasks/:id/progress", post(tasks::update_progress))
        .route("/api/tasks/:id/grade", post(tasks::grade_task))
        .route("/api/tasks/:id/collaborators", post(tasks::add_collaborator))
        .route(
            "/api/tasks/:id/collaborators/respond",
            post(tasks::respond_collaborator),
        )
        .route("/api/tasks/:id/todo", post(tasks::update_todo))
        .route("/api/tasks/:id/comments", post(tasks::post_comment))
        .route("/api/users", get(users::list_users))
        .route("/api/users", post(users::create_user))
        .route("/api/users/subordinates", get(users::list_subordinates))
        .route("/api/departments", get(users::list_departments))
        .route("/api/departments", post(users::create_department))
        .route("/api/events", get(events::event_stream))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            identity::identify,
        ));

    let app = Router::new()
        .route("/api/health", get(health))
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// GET /api/health - Liveness probe.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /api/stats - Admin dashboard counters.
async fn get_stats(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<User>,
) -> Result<Json<StoreStats>, (StatusCode, String)> {
    if actor.role != Role::Admin {
        return Err((
            StatusCode::FORBIDDEN,
            "Only administrators may view system stats".to_string(),
        ));
    }
    Ok(Json(state.store.stats(chrono::Utc::now()).await))
}
