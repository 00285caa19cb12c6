//! Server-sent event stream for task notifications.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use tokio::sync::broadcast;

use crate::user::User;

use super::routes::AppState;

/// GET /api/events - Subscribe to the actor's notification channel.
pub async fn event_stream(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<User>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.hub.subscribe(actor.id).await;
    tracing::debug!("User {} subscribed to events", actor.id);

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => yield Ok(Event::default().event("task").data(json)),
                    Err(e) => tracing::warn!("Failed to encode event: {}", e),
                },
                // A slow consumer missed events; keep streaming.
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
