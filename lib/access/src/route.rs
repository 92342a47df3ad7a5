//! The dashboard's route table.
//!
//! Paths mirror resource names: `/children`, `/children/add`,
//! `/children/edit/:id`. Every path except `/login` sits under the
//! authenticated root, and unknown paths fall back to the root.

use crate::guard::{Guard, GuardOutcome};
use crate::session::Session;
use serde::Serialize;
use smile_portal_client::Resource;
use smile_portal_core::RecordId;
use tracing::debug;

const AUTHENTICATED: &[Guard] = &[Guard::Authenticated];
const MANAGER: &[Guard] = &[Guard::Authenticated, Guard::ManagerOrAbove];
const ADMIN: &[Guard] = &[Guard::Authenticated, Guard::AdminOrAbove];

/// The screen a route shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "view", content = "resource")]
pub enum View {
    /// The login form.
    Login,
    /// The dashboard landing page.
    Welcome,
    /// A resource list.
    List(Resource),
    /// A create form.
    Add(Resource),
    /// An edit form for one record.
    Edit(Resource),
}

/// A route pattern and the guards protecting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    /// Pattern relative to the root; `:id` matches a record ID segment.
    pub pattern: &'static str,
    /// Screen shown by the route.
    pub view: View,
    /// Guards applied in order.
    pub guards: &'static [Guard],
}

impl Route {
    const fn new(pattern: &'static str, view: View, guards: &'static [Guard]) -> Self {
        Self {
            pattern,
            view,
            guards,
        }
    }

    fn matches(&self, segments: &[&str]) -> Option<Option<RecordId>> {
        let pattern: Vec<&str> = split(self.pattern);
        if pattern.len() != segments.len() {
            return None;
        }

        let mut id = None;
        for (expected, actual) in pattern.iter().zip(segments) {
            if *expected == ":id" {
                id = Some(actual.parse::<RecordId>().ok()?);
            } else if expected != actual {
                return None;
            }
        }
        Some(id)
    }
}

fn split(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Result of resolving a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteMatch<'a> {
    /// The matched route.
    pub route: &'a Route,
    /// The `:id` parameter, for edit routes.
    pub id: Option<RecordId>,
    /// True if the path matched nothing and resolved to the root.
    pub fallback: bool,
}

/// Result of navigating to a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation<'a> {
    /// Where the path resolved.
    #[serde(rename = "route")]
    pub matched: RouteMatch<'a>,
    /// What the guard chain decided.
    pub outcome: GuardOutcome,
}

/// The set of routes known to the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<Route>,
    root: usize,
}

impl RouteTable {
    /// The dashboard's routes.
    #[must_use]
    pub fn dashboard() -> Self {
        use Resource::{ChildPrograms, Children, Donations, Programs, Sponsors, Staff};

        let routes = vec![
            Route::new("login", View::Login, &[]),
            Route::new("", View::Welcome, AUTHENTICATED),
            Route::new("children", View::List(Children), AUTHENTICATED),
            Route::new("children/add", View::Add(Children), MANAGER),
            Route::new("children/edit/:id", View::Edit(Children), MANAGER),
            Route::new("programs/list", View::List(Programs), AUTHENTICATED),
            Route::new("programs/add", View::Add(Programs), MANAGER),
            Route::new("programs/edit/:id", View::Edit(Programs), MANAGER),
            Route::new("childprogram/list", View::List(ChildPrograms), AUTHENTICATED),
            Route::new("childprogram/add", View::Add(ChildPrograms), MANAGER),
            Route::new("childprogram/edit/:id", View::Edit(ChildPrograms), MANAGER),
            Route::new("sponsors/list", View::List(Sponsors), ADMIN),
            Route::new("sponsors/add", View::Add(Sponsors), ADMIN),
            Route::new("sponsors/edit/:id", View::Edit(Sponsors), ADMIN),
            Route::new("donations/list", View::List(Donations), ADMIN),
            Route::new("donations/add", View::Add(Donations), ADMIN),
            Route::new("donations/edit/:id", View::Edit(Donations), ADMIN),
            Route::new("staff", View::List(Staff), ADMIN),
            Route::new("staff/add", View::Add(Staff), ADMIN),
            Route::new("staff/edit/:id", View::Edit(Staff), ADMIN),
        ];
        Self { routes, root: 1 }
    }

    /// Returns every route.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Resolves a path, falling back to the root for unknown paths.
    ///
    /// An `:id` segment only matches a valid record ID.
    #[must_use]
    pub fn resolve(&self, path: &str) -> RouteMatch<'_> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments = split(path);

        for route in &self.routes {
            if let Some(id) = route.matches(&segments) {
                return RouteMatch {
                    route,
                    id,
                    fallback: false,
                };
            }
        }

        debug!(path, "unknown path, falling back to root");
        RouteMatch {
            route: &self.routes[self.root],
            id: None,
            fallback: true,
        }
    }

    /// Resolves a path and runs its guards in order.
    ///
    /// The first guard that does not render decides the outcome.
    #[must_use]
    pub fn navigate(&self, path: &str, session: &Session, has_token: bool) -> Navigation<'_> {
        let matched = self.resolve(path);
        let outcome = matched
            .route
            .guards
            .iter()
            .map(|guard| guard.evaluate(session, has_token))
            .find(|outcome| *outcome != GuardOutcome::Render)
            .unwrap_or(GuardOutcome::Render);

        Navigation { matched, outcome }
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::dashboard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;

    fn manager() -> Session {
        Session::signed_in(Identity::new("amina").with_groups(["Manager"]))
    }

    fn viewer() -> Session {
        Session::signed_in(Identity::new("sam").with_groups(["viewer"]))
    }

    fn admin() -> Session {
        Session::signed_in(Identity::new("root").with_superuser(true))
    }

    #[test]
    fn resolve_edit_route_with_id() {
        let table = RouteTable::dashboard();
        let matched = table.resolve("/children/edit/42");
        assert_eq!(matched.route.view, View::Edit(Resource::Children));
        assert_eq!(matched.id, Some(RecordId::new(42)));
        assert!(!matched.fallback);
    }

    #[test]
    fn resolve_ignores_trailing_slash_and_query() {
        let table = RouteTable::dashboard();
        let matched = table.resolve("/programs/list/?page=2");
        assert_eq!(matched.route.view, View::List(Resource::Programs));
    }

    #[test]
    fn unknown_paths_fall_back_to_root() {
        let table = RouteTable::dashboard();
        for path in ["/nowhere", "/children/edit/abc", "/staff/list", "/children/add/9"] {
            let matched = table.resolve(path);
            assert!(matched.fallback, "{path} should fall back");
            assert_eq!(matched.route.view, View::Welcome);
        }
    }

    #[test]
    fn root_resolves_to_welcome() {
        let table = RouteTable::dashboard();
        let matched = table.resolve("/");
        assert_eq!(matched.route.view, View::Welcome);
        assert!(!matched.fallback);
    }

    #[test]
    fn login_is_public() {
        let table = RouteTable::dashboard();
        let nav = table.navigate("/login", &Session::signed_out(), false);
        assert_eq!(nav.outcome, GuardOutcome::Render);
    }

    #[test]
    fn protected_paths_require_token_first() {
        let table = RouteTable::dashboard();
        for path in ["/", "/children", "/children/add", "/sponsors/list", "/unknown"] {
            let nav = table.navigate(path, &Session::signed_out(), false);
            assert_eq!(nav.outcome, GuardOutcome::Redirect("/login"), "{path}");
        }
    }

    #[test]
    fn lists_are_open_to_viewers() {
        let table = RouteTable::dashboard();
        for path in ["/children", "/programs/list", "/childprogram/list"] {
            let nav = table.navigate(path, &viewer(), true);
            assert_eq!(nav.outcome, GuardOutcome::Render, "{path}");
        }
    }

    #[test]
    fn edits_need_manager() {
        let table = RouteTable::dashboard();
        let nav = table.navigate("/programs/edit/3", &viewer(), true);
        assert_eq!(nav.outcome, GuardOutcome::Redirect("/"));

        let nav = table.navigate("/programs/edit/3", &manager(), true);
        assert_eq!(nav.outcome, GuardOutcome::Render);
        assert_eq!(nav.matched.id, Some(RecordId::new(3)));
    }

    #[test]
    fn admin_sections() {
        let table = RouteTable::dashboard();
        for path in ["/sponsors/add", "/donations/edit/7", "/staff"] {
            assert_eq!(
                table.navigate(path, &manager(), true).outcome,
                GuardOutcome::Redirect("/"),
                "{path}"
            );
            assert_eq!(
                table.navigate(path, &admin(), true).outcome,
                GuardOutcome::Render,
                "{path}"
            );
        }
    }

    #[test]
    fn loading_session_waits_on_role_routes() {
        let table = RouteTable::dashboard();
        let nav = table.navigate("/staff/add", &Session::bootstrapping(), true);
        assert_eq!(nav.outcome, GuardOutcome::Loading);

        let nav = table.navigate("/children", &Session::bootstrapping(), true);
        assert_eq!(nav.outcome, GuardOutcome::Render);
    }
}
