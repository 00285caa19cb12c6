//! User records and the subordinate-visibility rules.
//!
//! The visibility matrix mirrors the reporting structure: directors see
//! their own board plus department heads, heads see their department,
//! leaders see only the staff under them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roles::Role;

/// Account status; inactive users are hidden from directory listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

/// A member of the organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub fullname: String,
    pub username: String,
    pub role: Role,
    pub department_id: Uuid,
    pub status: UserStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    pub fn new(fullname: String, username: String, role: Role, department_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            fullname,
            username,
            role,
            department_id,
            status: UserStatus::Active,
            created_at: chrono::Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

/// A department the organization is divided into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub id: Uuid,
    pub name: String,
}

impl Department {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
        }
    }
}

/// Whether `target` appears in `viewer`'s subordinate directory.
///
/// - ADMIN sees everyone.
/// - DIRECTOR sees their own department plus every HEAD.
/// - DEPUTY_DIRECTOR sees their department below board level, plus every HEAD.
/// - HEAD and DEPUTY see their department.
/// - LEADER sees STAFF in their department.
/// - STAFF sees nobody.
pub fn is_visible_subordinate(viewer: &User, target: &User) -> bool {
    if target.id == viewer.id || !target.is_active() {
        return false;
    }
    let same_dept = target.department_id == viewer.department_id;
    match viewer.role {
        Role::Admin => true,
        Role::Director => same_dept || target.role == Role::Head,
        Role::DeputyDirector => {
            let below_board =
                target.role != Role::Director && target.role != Role::DeputyDirector;
            (same_dept && below_board) || target.role == Role::Head
        }
        Role::Head | Role::Deputy => same_dept,
        Role::Leader => same_dept && target.role == Role::Staff,
        Role::Staff | Role::Unknown => false,
    }
}

/// Filter and sort a directory listing for `viewer`: most senior first,
/// ties broken by name.
pub fn subordinates_of<'a>(viewer: &User, users: &'a [User]) -> Vec<&'a User> {
    let mut visible: Vec<&User> = users
        .iter()
        .filter(|u| is_visible_subordinate(viewer, u))
        .collect();
    visible.sort_by(|a, b| {
        b.role
            .weight()
            .cmp(&a.role.weight())
            .then_with(|| a.fullname.cmp(&b.fullname))
    });
    visible
}
