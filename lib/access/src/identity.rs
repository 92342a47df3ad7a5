//! Raw identity of the signed-in user.

use crate::role::Role;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Identity as reported by the profile endpoint.
///
/// The role is not part of the identity: [`Identity::role`] derives it on
/// every call, so it cannot drift from the groups it is based on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Login name.
    pub username: String,
    /// Contact address, when the server reports one.
    #[serde(default)]
    pub email: Option<String>,
    /// Django superuser flag.
    #[serde(default)]
    pub is_superuser: bool,
    /// Group memberships.
    #[serde(default)]
    pub groups: BTreeSet<String>,
}

impl Identity {
    /// Creates an identity with no groups.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    /// Sets the superuser flag.
    #[must_use]
    pub fn with_superuser(mut self, is_superuser: bool) -> Self {
        self.is_superuser = is_superuser;
        self
    }

    /// Sets the group memberships.
    #[must_use]
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the role derived from the superuser flag and groups.
    #[must_use]
    pub fn role(&self) -> Role {
        Role::derive(self.is_superuser, &self.groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserialize_profile_response() {
        let identity: Identity = serde_json::from_value(json!({
            "username": "amina",
            "email": "amina@example.org",
            "is_superuser": false,
            "groups": ["Manager"],
        }))
        .expect("deserialize");

        assert_eq!(identity.username, "amina");
        assert_eq!(identity.email.as_deref(), Some("amina@example.org"));
        assert_eq!(identity.role(), Role::Manager);
    }

    #[test]
    fn missing_optional_fields_default() {
        let identity: Identity =
            serde_json::from_value(json!({"username": "guest"})).expect("deserialize");
        assert!(!identity.is_superuser);
        assert!(identity.groups.is_empty());
        assert_eq!(identity.role(), Role::None);
    }

    #[test]
    fn role_follows_identity_changes() {
        let mut identity = Identity::new("sam").with_groups(["viewer"]);
        assert_eq!(identity.role(), Role::Viewer);

        identity.groups.insert("manager".to_string());
        assert_eq!(identity.role(), Role::Manager);

        identity.is_superuser = true;
        assert_eq!(identity.role(), Role::Admin);
    }
}
