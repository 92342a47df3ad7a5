//! Session lifecycle and access control for the smile-portal dashboard.
//!
//! This crate provides:
//! - Role derivation (`Role`) from the superuser flag and group memberships
//! - The session store (`SessionStore`, `Session`) and its bootstrap
//! - The login flow (`LoginFlow`)
//! - Route guards (`Guard`), the dashboard route table (`RouteTable`), and
//!   the per-role menu (`menu_for`)
//!
//! # Access Control Model
//!
//! Access is tiered:
//! - Any stored access token grants the authenticated routes
//! - Managers may additionally add and edit children, programs, and
//!   enrollments
//! - Admins (and superusers) may additionally manage sponsors, donations,
//!   and staff
//!
//! # Example
//!
//! ```
//! use smile_portal_access::{Guard, GuardOutcome, Identity, Role, Session};
//!
//! let identity = Identity::new("amina")
//!     .with_groups(["Manager"]);
//! assert_eq!(identity.role(), Role::Manager);
//!
//! let session = Session::signed_in(identity);
//! assert_eq!(Guard::ManagerOrAbove.evaluate(&session, true), GuardOutcome::Render);
//! assert_eq!(Guard::AdminOrAbove.evaluate(&session, true), GuardOutcome::Redirect("/"));
//! ```

pub mod error;
pub mod guard;
pub mod identity;
pub mod login;
pub mod menu;
pub mod role;
pub mod route;
pub mod session;

pub use error::{LoginError, SessionError};
pub use guard::{Guard, GuardOutcome};
pub use identity::Identity;
pub use login::{LOGIN_TOKEN_PATH, LoginFlow};
pub use menu::{MenuEntry, MenuSection, menu_for};
pub use role::{ParseRoleError, Role};
pub use route::{Navigation, Route, RouteMatch, RouteTable, View};
pub use session::{PROFILE_PATH, Session, SessionHandle, SessionResetNavigator, SessionStore};
