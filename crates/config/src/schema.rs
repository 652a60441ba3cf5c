use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

fn default_auth_base_url() -> String {
    "https://auth0.openai.com".to_string()
}
fn default_client_id() -> String {
    "DMg91f5PCHQtc7u018WKiL0zopKdiHle".to_string()
}
fn default_audience() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_redirect_uri() -> String {
    "https://labs.openai.com/auth/callback".to_string()
}
fn default_scope() -> String {
    "openid profile email offline_access".to_string()
}
// base64 of {"name":"auth0-spa-js","version":"1.20.1"}
fn default_auth0_client() -> String {
    "eyJuYW1lIjoiYXV0aDAtc3BhLWpzIiwidmVyc2lvbiI6IjEuMjAuMSJ9".to_string()
}
fn default_browser_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/105.0.0.0 Safari/537.36"
        .to_string()
}
fn default_verifier_length() -> usize {
    43
}
fn default_timeout_secs() -> u64 {
    30
}

/// Identity-provider settings for the headless login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Identity-provider origin (defaults to `https://auth0.openai.com`).
    #[serde(default = "default_auth_base_url")]
    pub base_url: String,
    /// OAuth client id of the labs web app.
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default = "default_audience")]
    pub audience: String,
    /// Callback URL the provider redirects to with the authorization code.
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    /// Opaque SDK descriptor sent as `auth0Client`.
    #[serde(default = "default_auth0_client")]
    pub auth0_client: String,
    /// Desktop-browser `User-Agent`; the provider refuses unknown agents.
    #[serde(default = "default_browser_user_agent")]
    pub user_agent: String,
    /// Length of the random PKCE code verifier (defaults to 43).
    #[serde(default = "default_verifier_length")]
    pub verifier_length: usize,
    /// Per-request timeout in seconds (defaults to 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: default_auth_base_url(),
            client_id: default_client_id(),
            audience: default_audience(),
            redirect_uri: default_redirect_uri(),
            scope: default_scope(),
            auth0_client: default_auth0_client(),
            user_agent: default_browser_user_agent(),
            verifier_length: default_verifier_length(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AuthConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_labs_base_url() -> String {
    "https://labs.openai.com".to_string()
}
fn default_poll_interval_ms() -> u64 {
    1000
}
fn default_batch_size() -> u32 {
    4
}
fn default_client_user_agent() -> String {
    concat!("labs-client/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Labs service settings for session creation and task polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabsConfig {
    /// Labs service origin (defaults to `https://labs.openai.com`).
    #[serde(default = "default_labs_base_url")]
    pub base_url: String,
    /// Delay between task status reads in milliseconds (defaults to 1000).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Give up polling after this many seconds. Unset means poll until terminal.
    #[serde(default)]
    pub poll_timeout_secs: Option<u64>,
    /// Images requested per task when the caller does not say (defaults to 4).
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    #[serde(default = "default_client_user_agent")]
    pub user_agent: String,
    /// Per-request timeout in seconds (defaults to 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LabsConfig {
    fn default() -> Self {
        Self {
            base_url: default_labs_base_url(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_timeout_secs: None,
            batch_size: default_batch_size(),
            user_agent: default_client_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LabsConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub fn poll_timeout(&self) -> Option<Duration> {
        self.poll_timeout_secs.map(Duration::from_secs)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Logging settings; `RUST_LOG` takes precedence when set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub labs: LabsConfig,
    #[serde(default)]
    pub log: LogConfig,
}

const ENV_PREFIX: &str = "LABS_";

impl Config {
    /// Parses configuration from a YAML string, merged with defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the YAML is invalid or extraction fails.
    #[allow(clippy::result_large_err)]
    pub fn from_yaml(yaml: &str) -> Result<Self, figment::Error> {
        use figment::{
            Figment,
            providers::{Format as _, Serialized, Yaml},
        };
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::string(yaml))
            .extract()
    }

    /// Loads configuration from a file path, merged with defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the file cannot be read or parsed.
    #[allow(clippy::result_large_err)]
    pub fn from_file(path: &Path) -> Result<Self, figment::Error> {
        use figment::{
            Figment,
            providers::{Format as _, Serialized, Yaml},
        };
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .extract()
    }

    /// Loads defaults, then the optional YAML file, then `LABS_*` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the file or an environment value cannot be parsed.
    #[allow(clippy::result_large_err)]
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        use figment::{
            Figment,
            providers::{Env, Format as _, Serialized, Yaml},
        };
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
    }
}
