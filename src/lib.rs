//! # taskhub
//!
//! A departmental task-assignment and tracking service.
//!
//! This library provides:
//! - An HTTP API for assigning, tracking, and scoring tasks
//! - Rank-based authorization across a role hierarchy
//! - Collaboration invitations with per-user real-time notification
//!
//! ## Task Flow
//! 1. A manager creates a task for one or more subordinates
//! 2. Assignees update progress; status derives from progress and due date
//! 3. Collaborators are invited (peers) or designated (by superiors)
//! 4. Completed work is scored by whoever holds scoring authority
//!
//! ## Modules
//! - `roles`: the authority weight table behind every permission check
//! - `task`: task records, authorization rules, and the task engine
//! - `store`: disk-backed record store for users, tasks, and the audit log
//! - `notify`: per-user notification channels surfaced over SSE

pub mod api;
pub mod audit;
pub mod config;
pub mod notify;
pub mod roles;
pub mod store;
pub mod task;
pub mod user;

pub use config::Config;
pub use roles::Role;
pub use task::{TaskError, TaskService};
