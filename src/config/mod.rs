use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::core::options::{with_credentials, with_filter, Credentials, SubscribeOption};

/// Base URL used to expand short topic names.
pub const DEFAULT_BASE_URL: &str = "https://ntfy.sh";

const DEFAULT_RECONNECT_DELAY_MS: u64 = 10_000;
/// Lower bound for the reconnect delay; smaller values are raised to it.
pub const MIN_RECONNECT_DELAY_MS: u64 = 100;
const DEFAULT_QUEUE_CAPACITY: usize = 50;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("config parse error: {0}")]
    Parse(String),
}

/// Client configuration, as read from `client.yml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub default_host: String,
    pub default_user: String,
    pub default_password: Option<String>,
    pub default_token: String,
    pub default_command: String,
    pub subscribe: Vec<SubscribeEntry>,
    pub reconnect_delay_ms: u64,
    pub queue_capacity: usize,
}

/// One `subscribe:` entry of the configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SubscribeEntry {
    pub topic: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
    pub command: String,
    #[serde(rename = "if")]
    pub conditions: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_host: DEFAULT_BASE_URL.to_string(),
            default_user: String::new(),
            default_password: None,
            default_token: String::new(),
            default_command: String::new(),
            subscribe: Vec::new(),
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl Config {
    /// Reads a config file; `.yml`/`.yaml` as YAML, anything else as TOML.
    /// Keys missing from the file keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let raw = fs::read_to_string(path_ref)?;
        let ext = path_ref
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("toml")
            .to_ascii_lowercase();

        if ext == "yaml" || ext == "yml" {
            let cfg: Config = serde_yaml::from_str(&raw)?;
            Ok(cfg)
        } else {
            let cfg: Config = toml::from_str(&raw)?;
            Ok(cfg)
        }
    }

    /// Load configuration from an optional file path and environment variables.
    ///
    /// The file comes from `path`, else `NTFY_CONFIG`, else defaults are used.
    /// Precedence: file values provide defaults, environment variables override.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let env_path = env::var("NTFY_CONFIG").ok();
        let effective_path = path.map(|s| s.to_string()).or(env_path);

        let mut cfg = match effective_path {
            Some(p) => Self::from_file(p)?,
            None => Config::default(),
        };

        if let Ok(v) = env::var("NTFY_DEFAULT_HOST") {
            cfg.default_host = v;
        }

        if let Ok(v) = env::var("NTFY_DEFAULT_USER") {
            cfg.default_user = v;
        }

        if let Ok(v) = env::var("NTFY_DEFAULT_PASSWORD") {
            cfg.default_password = Some(v);
        }

        if let Ok(v) = env::var("NTFY_DEFAULT_TOKEN") {
            cfg.default_token = v;
        }

        if let Ok(v) = env::var("NTFY_RECONNECT_DELAY_MS") {
            cfg.reconnect_delay_ms = v
                .parse()
                .map_err(|e| ConfigError::Parse(format!("NTFY_RECONNECT_DELAY_MS: {e}")))?;
        }

        Ok(cfg)
    }

    /// Fixed delay between connection attempts, never below
    /// [`MIN_RECONNECT_DELAY_MS`].
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms.max(MIN_RECONNECT_DELAY_MS))
    }

    /// Credentials to use for `entry`.
    ///
    /// Per-topic settings beat defaults, and within each level a token beats
    /// user and password. An empty token counts as unset.
    pub fn credentials_for(&self, entry: &SubscribeEntry) -> Option<Credentials> {
        if let Some(token) = entry.token.as_deref().filter(|t| !t.is_empty()) {
            return Some(Credentials::Token(token.to_string()));
        }
        if let (Some(user), Some(password)) = (&entry.user, &entry.password) {
            return Some(Credentials::Basic {
                user: user.clone(),
                password: password.clone(),
            });
        }
        self.default_credentials()
    }

    /// Options for subscribing to `entry`: its credentials, then one filter per
    /// `if:` condition.
    pub fn subscribe_options(&self, entry: &SubscribeEntry) -> Vec<SubscribeOption> {
        self.credentials_for(entry)
            .map(|c| with_credentials(&c))
            .into_iter()
            .chain(entry.conditions.iter().map(|(k, v)| with_filter(k, v)))
            .collect()
    }

    pub fn default_credentials(&self) -> Option<Credentials> {
        if !self.default_token.is_empty() {
            return Some(Credentials::Token(self.default_token.clone()));
        }
        match &self.default_password {
            Some(password) if !self.default_user.is_empty() => Some(Credentials::Basic {
                user: self.default_user.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }
}
