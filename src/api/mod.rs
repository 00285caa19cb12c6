//! HTTP API surface.

mod events;
mod identity;
mod routes;
mod tasks;
mod types;
mod users;

pub use routes::{serve, AppState};
