//! Navigation guards.
//!
//! Guards are pure functions of a session snapshot and token presence.
//! Role guards never redirect while the session is loading: the role is not
//! authoritative until the profile fetch resolves.

use crate::role::Role;
use crate::session::Session;
use serde::Serialize;
use smile_portal_client::{LOGIN_PATH, ROOT_PATH};
use std::fmt;

/// A capability check protecting a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Guard {
    /// An access token is stored.
    Authenticated,
    /// The role is Manager or Admin.
    ManagerOrAbove,
    /// The role is Admin.
    AdminOrAbove,
}

/// What the front end should do with a guarded view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "to")]
pub enum GuardOutcome {
    /// Render the view.
    Render,
    /// Render a neutral loading state.
    Loading,
    /// Navigate to another path instead.
    Redirect(&'static str),
}

impl Guard {
    /// Decides whether the guarded view may render.
    #[must_use]
    pub fn evaluate(&self, session: &Session, has_token: bool) -> GuardOutcome {
        match self {
            Self::Authenticated if has_token => GuardOutcome::Render,
            Self::Authenticated => GuardOutcome::Redirect(LOGIN_PATH),
            Self::ManagerOrAbove => role_gate(session, Role::Manager),
            Self::AdminOrAbove => role_gate(session, Role::Admin),
        }
    }
}

fn role_gate(session: &Session, minimum: Role) -> GuardOutcome {
    if session.is_loading() {
        GuardOutcome::Loading
    } else if session.role().at_least(minimum) {
        GuardOutcome::Render
    } else {
        GuardOutcome::Redirect(ROOT_PATH)
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Authenticated => "authenticated",
            Self::ManagerOrAbove => "manager-or-above",
            Self::AdminOrAbove => "admin-or-above",
        };
        f.write_str(name)
    }
}

impl fmt::Display for GuardOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Render => f.write_str("render"),
            Self::Loading => f.write_str("loading"),
            Self::Redirect(path) => write!(f, "redirect to {path}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;

    fn loaded(role: Role) -> Session {
        let identity = match role {
            Role::Admin => Identity::new("u").with_superuser(true),
            Role::Manager => Identity::new("u").with_groups(["manager"]),
            Role::Viewer => Identity::new("u").with_groups(["viewer"]),
            Role::None => return Session::signed_out(),
        };
        Session::signed_in(identity)
    }

    #[test]
    fn role_guards_wait_while_loading() {
        let session = Session::bootstrapping();
        assert_eq!(
            Guard::ManagerOrAbove.evaluate(&session, true),
            GuardOutcome::Loading
        );
        assert_eq!(
            Guard::AdminOrAbove.evaluate(&session, false),
            GuardOutcome::Loading
        );
    }

    #[test]
    fn manager_or_above() {
        let guard = Guard::ManagerOrAbove;
        assert_eq!(
            guard.evaluate(&loaded(Role::Viewer), true),
            GuardOutcome::Redirect("/")
        );
        assert_eq!(
            guard.evaluate(&loaded(Role::Manager), true),
            GuardOutcome::Render
        );
        assert_eq!(
            guard.evaluate(&loaded(Role::Admin), true),
            GuardOutcome::Render
        );
        assert_eq!(
            guard.evaluate(&loaded(Role::None), true),
            GuardOutcome::Redirect("/")
        );
    }

    #[test]
    fn admin_or_above() {
        let guard = Guard::AdminOrAbove;
        assert_eq!(
            guard.evaluate(&loaded(Role::Admin), true),
            GuardOutcome::Render
        );
        assert_eq!(
            guard.evaluate(&loaded(Role::Manager), true),
            GuardOutcome::Redirect("/")
        );
    }

    #[test]
    fn authenticated_checks_token_only() {
        let guard = Guard::Authenticated;
        assert_eq!(
            guard.evaluate(&loaded(Role::None), false),
            GuardOutcome::Redirect("/login")
        );
        // Token presence is enough, even before the profile resolves.
        assert_eq!(
            guard.evaluate(&Session::bootstrapping(), true),
            GuardOutcome::Render
        );
    }

    #[test]
    fn outcome_serialization_format() {
        let json = serde_json::to_value(GuardOutcome::Redirect("/login")).expect("serialize");
        assert_eq!(json, serde_json::json!({"outcome": "redirect", "to": "/login"}));

        let json = serde_json::to_value(GuardOutcome::Render).expect("serialize");
        assert_eq!(json, serde_json::json!({"outcome": "render"}));
    }
}
