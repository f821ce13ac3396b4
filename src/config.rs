use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Upstream constants
// ---------------------------------------------------------------------------

/// Default chat host. Also serves the session endpoint.
pub const DEFAULT_CHAT_BASE_URL: &str = "https://chat.openai.com";

/// Conversation endpoint path, relative to the chat host.
pub const CONVERSATION_PATH: &str = "/backend-api/conversation";

/// Session endpoint path, relative to the auth host.
pub const SESSION_PATH: &str = "/api/auth/session";

/// Page the browser would be on when it refreshes its session.
pub const REFERER_PATH: &str = "/chat";

/// Cookie carrying the long-lived session token.
pub const SESSION_COOKIE: &str = "__Secure-next-auth.session-token";

/// Cookie carrying the anti-bot clearance token.
pub const CLEARANCE_COOKIE: &str = "cf_clearance";

/// Browser identity the upstream accepts for conversation requests.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.1 Safari/605.1.15";

pub const ACCEPT_LANGUAGE: &str = "en-GB,en-US;q=0.9,en;q=0.8";

pub const DEFAULT_MODEL: &str = "text-davinci-002-render";

// ---------------------------------------------------------------------------
// Environment override tracking
// ---------------------------------------------------------------------------

/// Tracks which configuration settings are overridden by environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    overrides: HashMap<String, String>,
}

impl EnvOverrides {
    /// Check whether a setting key (e.g. "backend.model") is overridden by an env var.
    pub fn is_overridden(&self, key: &str) -> bool {
        self.overrides.contains_key(key)
    }

    /// Get the env var name that overrides the given setting key.
    pub fn env_var_for(&self, key: &str) -> Option<&str> {
        self.overrides.get(key).map(String::as_str)
    }

    pub fn all(&self) -> &HashMap<String, String> {
        &self.overrides
    }

    fn record(&mut self, key: &str, env_var: &str) {
        self.overrides.insert(key.to_string(), env_var.to_string());
    }
}

// ---------------------------------------------------------------------------
// Main configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub clearance: ClearanceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Env var overrides are not serialized to TOML.
    #[serde(skip)]
    pub env_overrides: EnvOverrides,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    #[serde(default = "default_chat_base_url")]
    pub chat_base_url: String,
    /// Host of the session endpoint. Usually the chat host.
    #[serde(default = "default_chat_base_url")]
    pub auth_base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            chat_base_url: default_chat_base_url(),
            auth_base_url: default_chat_base_url(),
            user_agent: default_user_agent(),
            model: default_model(),
        }
    }
}

impl BackendConfig {
    pub fn conversation_url(&self) -> String {
        join_url(&self.chat_base_url, CONVERSATION_PATH)
    }

    pub fn session_url(&self) -> String {
        join_url(&self.auth_base_url, SESSION_PATH)
    }

    pub fn referer_url(&self) -> String {
        join_url(&self.chat_base_url, REFERER_PATH)
    }

    /// Chat host root, probed when validating a clearance pair.
    pub fn chat_root_url(&self) -> String {
        join_url(&self.chat_base_url, "/")
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Whole-request timeout for buffered calls. Streams are not bounded by it.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClearanceConfig {
    #[serde(default)]
    pub store: ClearanceBackend,
    #[serde(default = "default_clearance_path")]
    pub path: PathBuf,
}

impl Default for ClearanceConfig {
    fn default() -> Self {
        Self {
            store: ClearanceBackend::default(),
            path: default_clearance_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ClearanceBackend {
    #[default]
    Memory,
    File,
}

impl std::fmt::Display for ClearanceBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::File => write!(f, "file"),
        }
    }
}

impl FromStr for ClearanceBackend {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            _ => Err(format!("Unknown clearance store: {s}")),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_chat_base_url() -> String {
    DEFAULT_CHAT_BASE_URL.to_string()
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
const fn default_connect_timeout() -> u64 {
    10
}
const fn default_request_timeout() -> u64 {
    300
}
fn default_clearance_path() -> PathBuf {
    std::env::var_os("XDG_DATA_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local").join("share")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chatgpt-bridge")
        .join("clearance.json")
}
fn default_log_level() -> String {
    "info".to_string()
}

// ---------------------------------------------------------------------------
// Config loading and env overrides
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a TOML file, then apply environment variable
    /// overrides. Any setting prefixed with `CHATGPT_BRIDGE_` takes precedence
    /// over the file value and is tracked in `env_overrides`.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with(path, |name| std::env::var(name).ok())
    }

    /// [`load`](Self::load) with overrides drawn from `lookup`.
    fn load_with(path: &Path, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Failed to read '{}': {e}", path.display()))
            })?;
            toml::from_str::<Config>(&content).map_err(|e| {
                Error::Config(format!("Failed to parse '{}': {e}", path.display()))
            })?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_overrides_from(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Save the file-level configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write '{}': {e}", path.display())))?;
        Ok(())
    }

    /// Reject base URLs that do not parse.
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("backend.chat_base_url", &self.backend.chat_base_url),
            ("backend.auth_base_url", &self.backend.auth_base_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| Error::Config(format!("{key} is not a valid URL ({value}): {e}")))?;
        }
        if self.backend.user_agent.trim().is_empty() {
            return Err(Error::Config("backend.user_agent is empty".into()));
        }
        Ok(())
    }

    /// Apply overrides from an arbitrary variable lookup.
    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let mut ov = EnvOverrides::default();

        macro_rules! env_str {
            ($key:expr, $env:expr, $field:expr) => {
                if let Some(val) = lookup($env) {
                    $field = val;
                    ov.record($key, $env);
                }
            };
        }
        macro_rules! env_bool {
            ($key:expr, $env:expr, $field:expr) => {
                if let Some(val) = lookup($env) {
                    $field = matches!(val.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
                    ov.record($key, $env);
                }
            };
        }
        macro_rules! env_parse {
            ($key:expr, $env:expr, $field:expr) => {
                if let Some(val) = lookup($env) {
                    if let Ok(parsed) = val.parse() {
                        $field = parsed;
                        ov.record($key, $env);
                    }
                }
            };
        }

        // -- Backend --
        env_str!("backend.chat_base_url", "CHATGPT_BRIDGE_CHAT_URL", self.backend.chat_base_url);
        env_str!("backend.auth_base_url", "CHATGPT_BRIDGE_AUTH_URL", self.backend.auth_base_url);
        env_str!("backend.user_agent", "CHATGPT_BRIDGE_USER_AGENT", self.backend.user_agent);
        env_str!("backend.model", "CHATGPT_BRIDGE_MODEL", self.backend.model);

        // -- HTTP --
        env_parse!(
            "http.connect_timeout_secs",
            "CHATGPT_BRIDGE_CONNECT_TIMEOUT",
            self.http.connect_timeout_secs
        );
        env_parse!(
            "http.request_timeout_secs",
            "CHATGPT_BRIDGE_REQUEST_TIMEOUT",
            self.http.request_timeout_secs
        );

        // -- Clearance --
        env_parse!("clearance.store", "CHATGPT_BRIDGE_CLEARANCE_STORE", self.clearance.store);
        if let Some(val) = lookup("CHATGPT_BRIDGE_CLEARANCE_PATH") {
            self.clearance.path = PathBuf::from(val);
            ov.record("clearance.path", "CHATGPT_BRIDGE_CLEARANCE_PATH");
        }

        // -- Logging --
        env_str!("logging.level", "CHATGPT_BRIDGE_LOG_LEVEL", self.logging.level);
        env_bool!("logging.json", "CHATGPT_BRIDGE_LOG_JSON", self.logging.json);

        self.env_overrides = ov;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
