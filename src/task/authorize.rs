//! Pure authorization decisions for task operations.
//!
//! All rank comparisons go through [`Role::weight`] so every call site
//! agrees on the hierarchy. Functions here take records and return
//! decisions; they never touch the store.

use crate::roles::Role;
use crate::user::User;

use super::error::{TaskError, TaskResult};
use super::types::Task;

/// May `actor` assign a task to `target`?
///
/// Self-assignment is always permitted, whatever the relative rank.
/// Otherwise the actor must be ADMIN or strictly outrank the target.
pub fn check_assignment(actor: &User, target: &User) -> TaskResult<()> {
    if actor.id == target.id {
        return Ok(());
    }
    if actor.role == Role::Admin || actor.role.outranks(target.role) {
        return Ok(());
    }
    Err(TaskError::Authorization(format!(
        "cannot assign work to a peer or superior ({})",
        target.fullname
    )))
}

/// May `actor` invite `target` as a collaborator?
///
/// ADMIN may invite anyone (but admins themselves cannot be invited, which
/// is checked by the caller before this). Board members and department
/// heads may reach outside their department only to other HEADs; everyone
/// else stays inside their own department.
pub fn can_invite(actor: &User, target: &User) -> bool {
    let same_dept = actor.department_id == target.department_id;
    match actor.role {
        Role::Admin => true,
        Role::Director | Role::DeputyDirector => same_dept || target.role == Role::Head,
        Role::Head => same_dept || target.role == Role::Head,
        _ => same_dept,
    }
}

/// May `actor` put a score on `task`?
///
/// Self-assigned tasks (creator among the assignees) need an external
/// HEAD or DEPUTY to grade them; otherwise the delegator grades the
/// delegate, so only the creator may score.
pub fn can_score(task: &Task, actor: &User) -> bool {
    if actor.role == Role::Admin {
        return true;
    }
    if task.is_self_assigned() {
        matches!(actor.role, Role::Head | Role::Deputy) && actor.id != task.assigned_by
    } else {
        actor.id == task.assigned_by
    }
}

/// May `actor` edit the task's checklist?
///
/// ADMIN, the creator, or any current assignee. An accepted collaborator
/// is already in the assignee set by the time this is asked; a PENDING
/// invitee is not.
pub fn can_edit_checklist(task: &Task, actor: &User) -> bool {
    actor.role == Role::Admin || actor.id == task.assigned_by || task.has_assignee(actor.id)
}
