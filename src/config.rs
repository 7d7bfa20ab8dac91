//! Configuration for the section composer.
//!
//! Settings live in `.composer/composer.toml` and are layered
//! file → environment (`COMPOSER_*`) → CLI flags.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! port = 3140
//! host = "127.0.0.1"
//! dev_mode = false
//! site_title = "VSM Marathon"
//!
//! [database]
//! path = "sections.db"
//!
//! [auth]
//! admin_token = "change-me"
//!
//! [logging]
//! filter = "info"
//! json = false
//!
//! [remote]
//! url = "http://127.0.0.1:3140"
//! token = "change-me"
//! queue_file = "pending.json"
//! ```
//!
//! Relative paths are resolved against the `.composer` directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::sections::server::{DEFAULT_PORT, ServerConfig};

pub const COMPOSER_DIR: &str = ".composer";
pub const CONFIG_FILE: &str = "composer.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    /// Permissive CORS for a separately served admin UI.
    #[serde(default)]
    pub dev_mode: bool,
    #[serde(default = "default_site_title")]
    pub site_title: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_site_title() -> String {
    "Homepage".to_string()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            dev_mode: false,
            site_title: default_site_title(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSection {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("sections.db")
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthSection {
    /// Bearer token for admin routes. Unset leaves admin routes open.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSection {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteSection {
    /// Server targeted by `remote` and `queue flush`. Defaults to the local server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Falls back to `auth.admin_token` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default = "default_queue_file")]
    pub queue_file: PathBuf,
}

fn default_queue_file() -> PathBuf {
    PathBuf::from("pending.json")
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            queue_file: default_queue_file(),
        }
    }
}

/// Contents of `composer.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComposerToml {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub auth: AuthSection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub remote: RemoteSection,
}

impl ComposerToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse composer.toml")
    }

    /// Load `composer.toml` from `composer_dir`, or defaults if it doesn't exist.
    pub fn load_or_default(composer_dir: &Path) -> Result<Self> {
        let config_path = composer_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize composer.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0: the server will bind a random port".to_string());
        }
        if self.server.site_title.trim().is_empty() {
            warnings.push("server.site_title is empty".to_string());
        }
        match self.auth.admin_token.as_deref() {
            None => warnings.push(
                "auth.admin_token is not set: admin routes accept unauthenticated writes"
                    .to_string(),
            ),
            Some(token) if token.trim().is_empty() => {
                warnings.push("auth.admin_token is empty".to_string())
            }
            Some(_) => {}
        }
        if tracing_subscriber::EnvFilter::try_new(&self.logging.filter).is_err() {
            warnings.push(format!(
                "Invalid logging.filter '{}': not a valid tracing filter directive",
                self.logging.filter
            ));
        }
        if let Some(url) = &self.remote.url
            && !is_http_url(url)
        {
            warnings.push(format!(
                "Invalid remote.url '{}': should start with http:// or https://",
                url
            ));
        }

        warnings
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Overrides taken from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub verbose: bool,
    pub log_json: bool,
    pub port: Option<u16>,
    pub db_path: Option<PathBuf>,
    pub dev_mode: bool,
    pub remote_url: Option<String>,
}

/// Resolved configuration: `composer.toml`, then `COMPOSER_*` environment
/// variables, then CLI flags.
#[derive(Debug, Clone)]
pub struct ComposerConfig {
    pub project_dir: PathBuf,
    pub composer_dir: PathBuf,
    pub toml: ComposerToml,
    env: HashMap<String, String>,
    pub cli: CliOverrides,
}

impl ComposerConfig {
    /// Load configuration for `project_dir` using the process environment.
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let composer_dir = project_dir.join(COMPOSER_DIR);
        let toml = ComposerToml::load_or_default(&composer_dir)?;
        let env = std::env::vars()
            .filter(|(key, _)| key.starts_with("COMPOSER_"))
            .collect();
        Ok(Self::from_parts(project_dir, toml, env))
    }

    /// Build from already-loaded parts. The environment is passed in explicitly.
    pub fn from_parts(project_dir: PathBuf, toml: ComposerToml, env: HashMap<String, String>) -> Self {
        let composer_dir = project_dir.join(COMPOSER_DIR);
        Self {
            project_dir,
            composer_dir,
            toml,
            env,
            cli: CliOverrides::default(),
        }
    }

    pub fn with_cli(mut self, cli: CliOverrides) -> Self {
        self.cli = cli;
        self
    }

    fn env(&self, key: &str) -> Option<&str> {
        self.env
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    pub fn config_file(&self) -> PathBuf {
        self.composer_dir.join(CONFIG_FILE)
    }

    /// Port (CLI → env → file).
    pub fn port(&self) -> u16 {
        self.cli
            .port
            .or_else(|| self.env("COMPOSER_PORT").and_then(|v| v.parse().ok()))
            .unwrap_or(self.toml.server.port)
    }

    pub fn host(&self) -> String {
        self.env("COMPOSER_HOST")
            .map(str::to_string)
            .unwrap_or_else(|| self.toml.server.host.clone())
    }

    pub fn dev_mode(&self) -> bool {
        self.cli.dev_mode || self.env("COMPOSER_DEV").is_some_and(is_truthy) || self.toml.server.dev_mode
    }

    /// Database path (CLI → env → file, relative to `.composer`).
    pub fn db_path(&self) -> PathBuf {
        if let Some(path) = &self.cli.db_path {
            return path.clone();
        }
        if let Some(path) = self.env("COMPOSER_DB_PATH") {
            return PathBuf::from(path);
        }
        self.composer_dir.join(&self.toml.database.path)
    }

    pub fn admin_token(&self) -> Option<String> {
        self.env("COMPOSER_ADMIN_TOKEN")
            .map(str::to_string)
            .or_else(|| self.toml.auth.admin_token.clone())
            .filter(|token| !token.trim().is_empty())
    }

    /// Default tracing filter; `RUST_LOG` still wins at subscriber init.
    pub fn log_filter(&self) -> String {
        if self.cli.verbose {
            "debug".to_string()
        } else {
            self.toml.logging.filter.clone()
        }
    }

    pub fn log_json(&self) -> bool {
        self.cli.log_json
            || self.env("COMPOSER_LOG_JSON").is_some_and(is_truthy)
            || self.toml.logging.json
    }

    /// Remote server URL (CLI → env → file → local server).
    pub fn remote_url(&self) -> String {
        self.cli
            .remote_url
            .clone()
            .or_else(|| self.env("COMPOSER_REMOTE_URL").map(str::to_string))
            .or_else(|| self.toml.remote.url.clone())
            .unwrap_or_else(|| format!("http://127.0.0.1:{}", self.port()))
    }

    pub fn remote_token(&self) -> Option<String> {
        self.env("COMPOSER_REMOTE_TOKEN")
            .map(str::to_string)
            .or_else(|| self.toml.remote.token.clone())
            .or_else(|| self.admin_token())
    }

    pub fn queue_path(&self) -> PathBuf {
        self.composer_dir.join(&self.toml.remote.queue_file)
    }

    pub fn server_config(&self, open_browser: bool) -> ServerConfig {
        ServerConfig {
            port: self.port(),
            host: self.host(),
            db_path: self.db_path(),
            admin_token: self.admin_token(),
            site_title: self.toml.server.site_title.clone(),
            dev_mode: self.dev_mode(),
            open_browser,
        }
    }

    /// File warnings plus environment values that could not be parsed.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = self.toml.validate();
        if let Some(port) = self.env("COMPOSER_PORT")
            && port.parse::<u16>().is_err()
        {
            warnings.push(format!("COMPOSER_PORT '{}' is not a valid port, ignored", port));
        }
        if let Some(url) = self.env("COMPOSER_REMOTE_URL")
            && !is_http_url(url)
        {
            warnings.push(format!(
                "COMPOSER_REMOTE_URL '{}': should start with http:// or https://",
                url
            ));
        }
        if self.env("COMPOSER_ADMIN_TOKEN").is_some() {
            // An env token makes the file's missing-token warning moot.
            warnings.retain(|w| !w.starts_with("auth.admin_token is not set"));
        }
        warnings
    }
}
