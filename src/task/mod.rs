//! Task domain: records, authorization rules, and the task engine.
//!
//! Pure decisions live in `authorize`; everything that touches the store,
//! audit log, or notification hub goes through [`TaskService`].

pub mod authorize;
mod error;
mod service;
mod types;

pub use error::{TaskError, TaskResult};
pub use service::{
    AssigneeInput, CollabAction, CreateTaskInput, TaskFilter, TaskService, TodoAction,
};
pub use types::{CollabStatus, Collaborator, Priority, Task, TaskStatus, TodoItem};
