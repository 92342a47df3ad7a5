//! Coarse authorization tiers.
//!
//! A user's role is never stored on its own: it is always derived from the
//! superuser flag and group memberships through [`Role::derive`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Authorization tier of the signed-in user.
///
/// Tiers are ordered: `Admin > Manager > Viewer > None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// No recognized group.
    #[default]
    None,
    /// Read-only access to children, programs, and enrollments.
    Viewer,
    /// Viewer access plus editing of children, programs, and enrollments.
    Manager,
    /// Full access, including sponsors, donations, and staff.
    Admin,
}

impl Role {
    /// Derives the role from raw identity data.
    ///
    /// Superusers are always admins. Otherwise the `manager` group wins over
    /// the `viewer` group; group names compare case-insensitively.
    #[must_use]
    pub fn derive<I, S>(is_superuser: bool, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if is_superuser {
            return Self::Admin;
        }

        let mut role = Self::None;
        for group in groups {
            let group = group.as_ref();
            if group.eq_ignore_ascii_case("manager") {
                return Self::Manager;
            }
            if group.eq_ignore_ascii_case("viewer") {
                role = Self::Viewer;
            }
        }
        role
    }

    /// Returns the lowercase role name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Viewer => "viewer",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }

    /// Returns true if this role grants at least the privileges of `other`.
    #[must_use]
    pub fn at_least(&self, other: Role) -> bool {
        self.rank() >= other.rank()
    }

    fn rank(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Viewer => 1,
            Self::Manager => 2,
            Self::Admin => 3,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError {
    input: String,
}

impl fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.input)
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "viewer" => Ok(Self::Viewer),
            "none" | "" => Ok(Self::None),
            _ => Err(ParseRoleError {
                input: s.to_string(),
            }),
        }
    }
}
