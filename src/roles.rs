//! Role hierarchy and authority weights.
//!
//! Every "can X act on Y" decision in the service compares the numeric
//! weights defined here. Keeping the table in one place avoids drift
//! between call sites.

use serde::{Deserialize, Serialize};

/// Organizational role, ordered by authority weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Director,
    DeputyDirector,
    Head,
    Deputy,
    Leader,
    Staff,
    /// Roles this build does not know about carry no authority.
    #[serde(other)]
    Unknown,
}

impl Role {
    /// Authority weight. Higher weight = more authority.
    pub fn weight(&self) -> i32 {
        match self {
            Self::Admin => 99,
            Self::Director => 10,
            Self::DeputyDirector => 9,
            Self::Head => 5,
            Self::Deputy => 4,
            Self::Leader => 3,
            Self::Staff => 1,
            Self::Unknown => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Director => "DIRECTOR",
            Self::DeputyDirector => "DEPUTY_DIRECTOR",
            Self::Head => "HEAD",
            Self::Deputy => "DEPUTY",
            Self::Leader => "LEADER",
            Self::Staff => "STAFF",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// True when this role strictly outranks `other`.
    pub fn outranks(&self, other: Role) -> bool {
        self.weight() > other.weight()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
