//! Centralized front-end configuration.
//!
//! Configuration is loaded via the `config` crate from an optional TOML
//! file and `SMILE_PORTAL__*` environment variables, with environment
//! variables taking precedence. Nested keys use `__`, e.g.
//! `SMILE_PORTAL__API__BASE_URL`.
//!
//! See [`ClientConfig`] for the API settings.

use serde::Deserialize;
use smile_portal_client::ClientConfig;
use std::path::{Path, PathBuf};

/// Default configuration file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "portal.toml";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "SMILE_PORTAL";

/// Front-end configuration composed from library configs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PortalConfig {
    /// API client configuration.
    #[serde(default)]
    pub api: ClientConfig,

    /// Credential persistence configuration.
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

/// Where credentials are persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CredentialsConfig {
    /// Path of the credential file.
    #[serde(default = "default_credentials_path")]
    pub path: PathBuf,
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from(".smile-portal/credentials.json")
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            path: default_credentials_path(),
        }
    }
}

impl PortalConfig {
    /// Loads configuration from `file` (or `portal.toml` if present) and
    /// the environment.
    ///
    /// An explicitly named file must exist; the default file is optional.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read or a value is invalid.
    pub fn load(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        Self::from_sources(file, environment())
    }

    fn from_sources(
        file: Option<&Path>,
        env: config::Environment,
    ) -> Result<Self, config::ConfigError> {
        let file_source = match file {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        config::Config::builder()
            .add_source(file_source)
            .add_source(env)
            .build()?
            .try_deserialize()
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let vars: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        environment().source(Some(vars))
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = PortalConfig::from_sources(None, env(&[])).expect("load");

        assert_eq!(config.api.base_url, "http://localhost:8000/api/");
        assert_eq!(config.api.timeout_ms, 5000);
        assert!(!config.api.coalesce_refresh);
        assert_eq!(
            config.credentials.path,
            PathBuf::from(".smile-portal/credentials.json")
        );
    }

    #[test]
    fn environment_overrides() {
        let config = PortalConfig::from_sources(
            None,
            env(&[
                ("SMILE_PORTAL__API__BASE_URL", "https://portal.example.org/api/"),
                ("SMILE_PORTAL__API__TIMEOUT_MS", "2500"),
                ("SMILE_PORTAL__API__COALESCE_REFRESH", "true"),
                ("SMILE_PORTAL__CREDENTIALS__PATH", "/tmp/creds.json"),
            ]),
        )
        .expect("load");

        assert_eq!(config.api.base_url, "https://portal.example.org/api/");
        assert_eq!(config.api.timeout_ms, 2500);
        assert!(config.api.coalesce_refresh);
        assert_eq!(config.credentials.path, PathBuf::from("/tmp/creds.json"));
    }

    #[test]
    fn file_then_environment() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("tempfile");
        writeln!(
            file,
            "[api]\nbase_url = \"http://10.0.0.5:8000/api/\"\ntimeout_ms = 9000\n"
        )
        .expect("write");

        let config = PortalConfig::from_sources(
            Some(file.path()),
            env(&[("SMILE_PORTAL__API__TIMEOUT_MS", "1000")]),
        )
        .expect("load");

        assert_eq!(config.api.base_url, "http://10.0.0.5:8000/api/");
        assert_eq!(config.api.timeout_ms, 1000);
    }

    #[test]
    fn named_file_must_exist() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.toml");
        assert!(PortalConfig::from_sources(Some(&path), env(&[])).is_err());
    }

    #[test]
    fn invalid_value_is_rejected() {
        let result = PortalConfig::from_sources(
            None,
            env(&[("SMILE_PORTAL__API__TIMEOUT_MS", "soon")]),
        );
        assert!(result.is_err());
    }
}
