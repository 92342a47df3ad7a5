//! Command execution.
//!
//! Every command produces a JSON document that `main` prints to standard
//! output. Diagnostics go to standard error.

use crate::cli::{Command, LoginArgs, ResourceCommand, WriteArgs};
use crate::config::PortalConfig;
use crate::error::CliError;
use crate::navigator::TerminalNavigator;
use rootcause::prelude::ResultExt;
use serde_json::{Value as JsonValue, json};
use smile_portal_access::{
    LoginFlow, RouteTable, SessionHandle, SessionResetNavigator, SessionStore, menu_for,
};
use smile_portal_client::{
    ApiClient, ClientConfig, CredentialStore, FilePart, FileCredentialStore, Navigator,
    ReqwestTransport, ResourceClient, Transport,
};
use smile_portal_core::Result;
use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// A fully wired front end.
#[derive(Debug)]
pub struct App {
    store: Arc<SessionStore>,
    login: LoginFlow,
    resources: ResourceClient,
    routes: RouteTable,
}

impl App {
    /// Wires the front end against the configured API and credential file.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential file is unreadable or the HTTP
    /// client cannot be built.
    pub fn connect(config: &PortalConfig) -> Result<Self, CliError> {
        let credentials =
            FileCredentialStore::open(&config.credentials.path).context(CliError::Credentials)?;
        let transport = ReqwestTransport::new(config.api.clone()).context(CliError::Transport)?;
        debug!(base_url = %config.api.base_url, "client configured");

        Ok(Self::assemble(
            config.api.clone(),
            Arc::new(transport),
            Arc::new(credentials),
            Arc::new(TerminalNavigator),
        ))
    }

    /// Wires the front end from its parts.
    #[must_use]
    pub fn assemble(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let session = SessionHandle::new();
        let navigator = Arc::new(SessionResetNavigator::new(navigator, session.clone()));
        let client = Arc::new(ApiClient::new(config, transport, credentials, navigator));
        let store = Arc::new(SessionStore::new(client.clone(), session));

        Self {
            login: LoginFlow::new(store.clone()),
            resources: ResourceClient::new(client),
            store,
            routes: RouteTable::dashboard(),
        }
    }

    /// Runs a command and returns its output document.
    ///
    /// # Errors
    ///
    /// Returns an error describing the step that failed.
    pub async fn run(&self, command: Command) -> Result<JsonValue, CliError> {
        match command {
            Command::Login(args) => self.login(args).await,
            Command::Logout => self.logout(),
            Command::Whoami => self.whoami().await,
            Command::Menu => self.menu().await,
            Command::Route(args) => self.route(&args.path).await,
            Command::Resource(command) => self.resource(command).await,
        }
    }

    async fn login(&self, args: LoginArgs) -> Result<JsonValue, CliError> {
        let password = match args.password {
            Some(password) => password,
            None => prompt_password().context(CliError::Login)?,
        };

        let session = match self.login.login(&args.username, &password).await {
            Ok(session) => session,
            Err(report) => {
                eprintln!("{}", report.current_context().user_message());
                return Err(report.context(CliError::Login));
            }
        };

        Ok(json!({
            "username": session.username(),
            "role": session.role(),
            "menu": menu_for(session.role()),
        }))
    }

    fn logout(&self) -> Result<JsonValue, CliError> {
        let next = self.store.logout().context(CliError::Session)?;
        Ok(json!({ "next": next }))
    }

    async fn whoami(&self) -> Result<JsonValue, CliError> {
        let session = self.store.initialize().await.context(CliError::Session)?;
        Ok(json!({
            "identity": session.identity(),
            "role": session.role(),
        }))
    }

    async fn menu(&self) -> Result<JsonValue, CliError> {
        let session = self.store.initialize().await.context(CliError::Session)?;
        Ok(json!(menu_for(session.role())))
    }

    async fn route(&self, path: &str) -> Result<JsonValue, CliError> {
        let session = self.store.initialize().await.context(CliError::Session)?;
        let navigation = self
            .routes
            .navigate(path, &session, self.store.has_access_token());
        info!(path, outcome = %navigation.outcome, "navigation evaluated");
        serde_json::to_value(&navigation).context(CliError::Output)
    }

    async fn resource(&self, command: ResourceCommand) -> Result<JsonValue, CliError> {
        let resources = &self.resources;
        match command {
            ResourceCommand::List { resource } => {
                let records = resources.list(resource).await.context(CliError::Resource)?;
                Ok(JsonValue::Array(records))
            }
            ResourceCommand::Get { resource, id } => resources
                .retrieve(resource, id)
                .await
                .context(CliError::Resource),
            ResourceCommand::Create(write) => {
                let (record, image) = payload(&write)?;
                resources
                    .create(write.resource, &record, image)
                    .await
                    .context(CliError::Resource)
            }
            ResourceCommand::Update { id, write } => {
                let (record, image) = payload(&write)?;
                resources
                    .update(write.resource, id, &record, image)
                    .await
                    .context(CliError::Resource)
            }
            ResourceCommand::Delete { resource, id } => {
                resources
                    .delete(resource, id)
                    .await
                    .context(CliError::Resource)?;
                Ok(json!({ "deleted": id }))
            }
        }
    }
}

/// Reads the password from standard input. The terminal echoes it, so
/// interactive users should prefer `SMILE_PORTAL_PASSWORD` or a pipe.
fn prompt_password() -> std::io::Result<String> {
    eprint!("Password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn payload(write: &WriteArgs) -> Result<(JsonValue, Option<FilePart>), CliError> {
    let record = parse_record(&write.data)?;
    let image = write.image.as_deref().map(load_image).transpose()?;
    Ok((record, image))
}

/// Parses record fields given on the command line.
///
/// # Errors
///
/// Returns `CliError::InvalidInput` unless `data` is a JSON object.
pub fn parse_record(data: &str) -> Result<JsonValue, CliError> {
    let record: JsonValue = serde_json::from_str(data).map_err(|e| CliError::InvalidInput {
        reason: format!("record is not valid JSON: {e}"),
    })?;
    if !record.is_object() {
        return Err(CliError::InvalidInput {
            reason: "record must be a JSON object".to_string(),
        }
        .into());
    }
    Ok(record)
}

/// Reads an image to upload.
///
/// # Errors
///
/// Returns `CliError::InvalidInput` if the file cannot be read.
pub fn load_image(path: &Path) -> Result<FilePart, CliError> {
    let content = std::fs::read(path).map_err(|e| CliError::InvalidInput {
        reason: format!("cannot read image {}: {e}", path.display()),
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    Ok(FilePart {
        file_name,
        mime_type: mime_for(path).to_string(),
        content,
    })
}

fn mime_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::RouteArgs;
    use smile_portal_client::testing::{RecordingNavigator, ScriptedTransport};
    use smile_portal_client::{
        CredentialKey, Credentials, MemoryCredentialStore, Method, REFRESH_PATH, Resource,
    };
    use smile_portal_core::RecordId;
    use std::io::Write as _;

    struct Harness {
        app: App,
        transport: Arc<ScriptedTransport>,
        credentials: Arc<MemoryCredentialStore>,
        navigator: Arc<RecordingNavigator>,
    }

    fn harness(transport: ScriptedTransport, credentials: MemoryCredentialStore) -> Harness {
        let transport = Arc::new(transport);
        let credentials = Arc::new(credentials);
        let navigator = Arc::new(RecordingNavigator::new());
        let app = App::assemble(
            ClientConfig::default(),
            transport.clone(),
            credentials.clone(),
            navigator.clone(),
        );
        Harness {
            app,
            transport,
            credentials,
            navigator,
        }
    }

    fn signed_in() -> MemoryCredentialStore {
        MemoryCredentialStore::with_credentials(&Credentials::new("access-1", "refresh-1"))
    }

    fn viewer_profile() -> ScriptedTransport {
        ScriptedTransport::new().reply(
            Method::Get,
            "/user/profile/",
            200,
            json!({"username": "sam", "is_superuser": false, "groups": ["Viewer"]}),
        )
    }

    #[tokio::test]
    async fn login_reports_role_and_menu() {
        let h = harness(
            ScriptedTransport::new().reply(
                Method::Post,
                "/token/",
                200,
                json!({
                    "access": "a",
                    "refresh": "r",
                    "role": "viewer",
                    "username": "sam",
                    "groups": ["viewer"],
                    "is_superuser": false,
                }),
            ),
            MemoryCredentialStore::new(),
        );

        let output = h
            .app
            .run(Command::Login(LoginArgs {
                username: "sam".to_string(),
                password: Some("pw".to_string()),
            }))
            .await
            .unwrap();

        assert_eq!(output["role"], "viewer");
        assert_eq!(output["menu"].as_array().map(Vec::len), Some(3));
        assert_eq!(
            h.credentials.get(CredentialKey::Role).as_deref(),
            Some("viewer")
        );
    }

    #[tokio::test]
    async fn whoami_without_credentials() {
        let h = harness(ScriptedTransport::new(), MemoryCredentialStore::new());
        let output = h.app.run(Command::Whoami).await.unwrap();
        assert_eq!(output, json!({"identity": null, "role": "none"}));
        assert!(h.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn route_redirects_viewer_from_add_form() {
        let h = harness(viewer_profile(), signed_in());
        let output = h
            .app
            .run(Command::Route(RouteArgs {
                path: "/children/add".to_string(),
            }))
            .await
            .unwrap();

        assert_eq!(output["outcome"], json!({"outcome": "redirect", "to": "/"}));
        assert_eq!(output["route"]["route"]["pattern"], "children/add");
    }

    #[tokio::test]
    async fn route_without_token_goes_to_login() {
        let h = harness(ScriptedTransport::new(), MemoryCredentialStore::new());
        let output = h
            .app
            .run(Command::Route(RouteArgs {
                path: "/sponsors/list".to_string(),
            }))
            .await
            .unwrap();
        assert_eq!(output["outcome"]["to"], "/login");
    }

    #[tokio::test]
    async fn list_survives_expired_token() {
        let h = harness(
            ScriptedTransport::new()
                .reply(Method::Get, "/programs/", 401, json!({}))
                .reply(Method::Post, REFRESH_PATH, 200, json!({"access": "access-2"}))
                .reply(Method::Get, "/programs/", 200, json!([{"id": 1, "name": "Literacy"}])),
            signed_in(),
        );

        let output = h
            .app
            .run(Command::Resource(ResourceCommand::List {
                resource: Resource::Programs,
            }))
            .await
            .unwrap();

        assert_eq!(output, json!([{"id": 1, "name": "Literacy"}]));
        assert_eq!(h.credentials.access_token().as_deref(), Some("access-2"));
        assert!(h.navigator.redirects().is_empty());
    }

    #[tokio::test]
    async fn failed_refresh_signs_out() {
        let h = harness(
            ScriptedTransport::new()
                .reply(Method::Get, "/donations/", 401, json!({}))
                .reply(Method::Post, REFRESH_PATH, 401, json!({})),
            signed_in(),
        );

        let result = h
            .app
            .run(Command::Resource(ResourceCommand::List {
                resource: Resource::Donations,
            }))
            .await;

        assert!(result.is_err());
        assert!(h.credentials.is_empty());
        assert_eq!(h.navigator.redirects(), vec!["/login".to_string()]);
    }

    #[tokio::test]
    async fn delete_reports_id() {
        let h = harness(
            ScriptedTransport::new().reply(Method::Delete, "/sponsors/9/", 204, JsonValue::Null),
            signed_in(),
        );
        let output = h
            .app
            .run(Command::Resource(ResourceCommand::Delete {
                resource: Resource::Sponsors,
                id: RecordId::new(9),
            }))
            .await
            .unwrap();
        assert_eq!(output, json!({"deleted": 9}));
    }

    #[tokio::test]
    async fn logout_clears_credentials() {
        let h = harness(ScriptedTransport::new(), signed_in());
        let output = h.app.run(Command::Logout).await.unwrap();
        assert_eq!(output, json!({"next": "/login"}));
        assert!(h.credentials.is_empty());
    }

    #[test]
    fn record_must_be_object() {
        assert!(parse_record("{\"name\": \"Literacy\"}").is_ok());
        assert!(parse_record("[1, 2]").is_err());
        assert!(parse_record("not json").is_err());
    }

    #[test]
    fn load_image_guesses_mime_type() {
        let mut file = tempfile::Builder::new()
            .suffix(".JPG")
            .tempfile()
            .expect("tempfile");
        file.write_all(&[0xff, 0xd8, 0xff]).expect("write");

        let part = load_image(file.path()).expect("load");
        assert_eq!(part.mime_type, "image/jpeg");
        assert_eq!(part.content, vec![0xff, 0xd8, 0xff]);
        assert!(part.file_name.ends_with(".JPG"));
    }

    #[test]
    fn missing_image_is_invalid_input() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_image(&dir.path().join("absent.png")).unwrap_err();
        assert!(matches!(
            err.current_context(),
            CliError::InvalidInput { .. }
        ));
    }
}
