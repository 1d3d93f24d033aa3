//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream ERP configuration.
    pub dolibarr: DolibarrConfig,
    /// Local JSON store configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Web Push configuration.
    #[serde(default)]
    pub push: PushConfig,
    /// Scheduled reminder configuration.
    #[serde(default)]
    pub cron: CronConfig,
    /// Client feature toggles.
    #[serde(default)]
    pub features: FeatureConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Dolibarr REST API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DolibarrConfig {
    /// Base URL of the REST API, e.g. `https://erp.example.com/api/index.php`.
    pub api_url: String,
    /// Server-side API key used for unauthenticated flows (registration,
    /// center listing, reminders).
    #[serde(default)]
    pub admin_api_key: Option<String>,
    /// Outbound request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// IANA timezone of the ERP's wall-clock timestamps and shift times.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

/// Local JSON store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the JSON documents.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// VAPID configuration for Web Push.
#[derive(Debug, Clone, Deserialize)]
pub struct PushConfig {
    /// Public key (base64 URL-safe encoded).
    #[serde(default)]
    pub vapid_public_key: Option<String>,
    /// Private key (base64 URL-safe encoded).
    #[serde(default)]
    pub vapid_private_key: Option<String>,
    /// Subject (a `mailto:` or `https:` URL).
    #[serde(default = "default_vapid_subject")]
    pub subject: String,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            vapid_public_key: None,
            vapid_private_key: None,
            subject: default_vapid_subject(),
        }
    }
}

/// Shift reminder configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CronConfig {
    /// Bearer secret expected by the reminder endpoint. While empty the
    /// endpoint refuses every caller.
    #[serde(default)]
    pub secret: String,
    /// Accept reminder triggers without the secret (development only).
    #[serde(default)]
    pub allow_insecure: bool,
    /// How far ahead of a shift boundary a reminder is sent.
    #[serde(default = "default_reminder_window")]
    pub reminder_window_minutes: i64,
    /// Run sweeps in-process on this interval. Disabled when unset.
    #[serde(default)]
    pub interval_secs: Option<u64>,
}

impl Default for CronConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            allow_insecure: false,
            reminder_window_minutes: default_reminder_window(),
            interval_secs: None,
        }
    }
}

/// Client feature toggles served to the front end.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureConfig {
    /// Log the user out right after clocking in or out.
    #[serde(default)]
    pub logout_after_clock: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_timeout_secs() -> u64 {
    30
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_vapid_subject() -> String {
    "mailto:admin@example.com".to_string()
}

const fn default_reminder_window() -> i64 {
    15
}

fn default_timezone() -> String {
    "Europe/Madrid".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `FICHAJES_ENV`)
    /// 3. Environment variables with `FICHAJES_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("FICHAJES_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("FICHAJES")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("FICHAJES")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Configuration pointing at the given ERP with defaults everywhere else.
    #[must_use]
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            server: ServerConfig::default(),
            dolibarr: DolibarrConfig {
                api_url: api_url.into(),
                admin_api_key: None,
                timeout_secs: default_timeout_secs(),
                timezone: default_timezone(),
            },
            storage: StorageConfig::default(),
            push: PushConfig::default(),
            cron: CronConfig::default(),
            features: FeatureConfig::default(),
        }
    }
}
