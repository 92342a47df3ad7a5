//! Command-line interface definition.

use clap::{Args, Parser, Subcommand};
use smile_portal_client::Resource;
use smile_portal_core::RecordId;
use std::path::PathBuf;

/// Child sponsorship dashboard client.
#[derive(Debug, Parser)]
#[command(name = "smile-portal", version, about)]
pub struct Cli {
    /// Configuration file (defaults to `portal.toml` when present).
    #[arg(long, global = true, env = "SMILE_PORTAL_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in with a username and password.
    Login(LoginArgs),
    /// Sign out and forget stored credentials.
    Logout,
    /// Show the signed-in identity and role.
    Whoami,
    /// Show the dashboard sections available to the signed-in role.
    Menu,
    /// Check where navigating to a dashboard path would lead.
    Route(RouteArgs),
    /// Work with dashboard records.
    #[command(subcommand)]
    Resource(ResourceCommand),
}

/// Arguments for `smile-portal login`.
#[derive(Args)]
pub struct LoginArgs {
    /// Account username.
    #[arg(long, short)]
    pub username: String,

    /// Account password; read from standard input when omitted.
    #[arg(long, env = "SMILE_PORTAL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl std::fmt::Debug for LoginArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginArgs")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Arguments for `smile-portal route`.
#[derive(Debug, Args)]
pub struct RouteArgs {
    /// Dashboard path, e.g. `/children/edit/4`.
    pub path: String,
}

/// Record commands.
#[derive(Debug, Subcommand)]
pub enum ResourceCommand {
    /// List every record of a resource.
    List {
        /// Resource name, e.g. `children` or `sponsors`.
        resource: Resource,
    },
    /// Show one record.
    Get {
        resource: Resource,
        id: RecordId,
    },
    /// Create a record.
    Create(WriteArgs),
    /// Replace a record.
    Update {
        id: RecordId,
        #[command(flatten)]
        write: WriteArgs,
    },
    /// Delete a record.
    Delete {
        resource: Resource,
        id: RecordId,
    },
}

/// Payload of a create or update.
#[derive(Debug, Args)]
pub struct WriteArgs {
    /// Resource name.
    #[arg(long, short)]
    pub resource: Resource,

    /// Record fields as a JSON object.
    #[arg(long, short)]
    pub data: String,

    /// Photo to attach (children only).
    #[arg(long)]
    pub image: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_login() {
        let cli = Cli::try_parse_from(["smile-portal", "login", "-u", "amina", "--password", "pw"])
            .expect("parse");
        match cli.command {
            Command::Login(args) => {
                assert_eq!(args.username, "amina");
                assert_eq!(args.password.as_deref(), Some("pw"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn login_args_debug_hides_password() {
        let cli = Cli::try_parse_from([
            "smile-portal",
            "login",
            "-u",
            "amina",
            "--password",
            "hunter2-secret",
        ])
        .expect("parse");

        let rendered = format!("{cli:?}");
        assert!(rendered.contains("amina"));
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("hunter2-secret"));
    }

    #[test]
    fn parse_resource_update() {
        let cli = Cli::try_parse_from([
            "smile-portal",
            "resource",
            "update",
            "7",
            "--resource",
            "children",
            "--data",
            "{\"first_name\":\"Amina\"}",
            "--image",
            "photo.jpg",
        ])
        .expect("parse");

        let Command::Resource(ResourceCommand::Update { id, write }) = cli.command else {
            panic!("expected resource update");
        };
        assert_eq!(id, RecordId::new(7));
        assert_eq!(write.resource, Resource::Children);
        assert_eq!(write.image, Some(PathBuf::from("photo.jpg")));
    }

    #[test]
    fn rejects_unknown_resource() {
        let result = Cli::try_parse_from(["smile-portal", "resource", "list", "widgets"]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_bad_record_id() {
        let result = Cli::try_parse_from(["smile-portal", "resource", "get", "children", "-3"]);
        assert!(result.is_err());
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["smile-portal", "whoami", "--config", "dev.toml"])
            .expect("parse");
        assert_eq!(cli.config, Some(PathBuf::from("dev.toml")));
    }
}
