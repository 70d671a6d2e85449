//! Configuration for the DOCSIS exporter.
//!
//! Flat settings layered with figment (built-in defaults, an optional
//! TOML file, then raw environment variables), validated once at
//! startup and translated into `docsis_core` config types.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use docsis_core::{ClickHouseConfig, ExporterConfig, ModemConfig, TlsVerification};

/// Smallest accepted queue limit.
pub const MIN_QUEUE_LIMIT: usize = 25;

/// Environment variables read on top of the file layer.
pub const ENV_KEYS: [&str; 17] = [
    "MODEM_NAME",
    "MODEM_URL",
    "MODEM_USERNAME",
    "MODEM_PASSWORD",
    "MODEM_INSECURE",
    "MODEM_CA_CERT",
    "MODEM_TIMEOUT",
    "CLICKHOUSE_URL",
    "CLICKHOUSE_USERNAME",
    "CLICKHOUSE_PASSWORD",
    "CLICKHOUSE_DATABASE",
    "CLICKHOUSE_TABLE",
    "CLICKHOUSE_TIMEOUT",
    "CLICKHOUSE_QUEUE_LIMIT",
    "SCRAPE_DELAY",
    "WRITE_RETRY_DELAY",
    "LOG_LEVEL",
];

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {key}")]
    Missing { key: &'static str },

    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("config file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Log level ───────────────────────────────────────────────────────

/// Operator-facing log level names.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// `tracing` filter directive for this level.
    pub fn filter_directive(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error | Self::Critical => "error",
        }
    }
}

// ── Settings ────────────────────────────────────────────────────────

/// Raw settings as read from file and environment.
///
/// Field names are the lowercased environment variable names.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub modem_name: String,
    pub modem_url: Option<String>,
    pub modem_username: Option<String>,
    pub modem_password: Option<String>,
    /// Accept the modem's self-signed certificate.
    pub modem_insecure: bool,
    /// CA bundle for the modem; only used when `modem_insecure` is off.
    pub modem_ca_cert: Option<PathBuf>,
    /// Seconds.
    pub modem_timeout: u64,

    pub clickhouse_url: Option<String>,
    pub clickhouse_username: Option<String>,
    pub clickhouse_password: Option<String>,
    pub clickhouse_database: Option<String>,
    pub clickhouse_table: String,
    /// Seconds.
    pub clickhouse_timeout: u64,
    pub clickhouse_queue_limit: usize,

    /// Seconds between scrapes.
    pub scrape_delay: u64,
    /// Seconds to back off after a failed insert.
    pub write_retry_delay: u64,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            modem_name: "FAST3895".into(),
            modem_url: None,
            modem_username: None,
            modem_password: None,
            modem_insecure: true,
            modem_ca_cert: None,
            modem_timeout: 30,
            clickhouse_url: None,
            clickhouse_username: None,
            clickhouse_password: None,
            clickhouse_database: None,
            clickhouse_table: "docsis".into(),
            clickhouse_timeout: 30,
            clickhouse_queue_limit: 1000,
            scrape_delay: 10,
            write_retry_delay: 5,
            log_level: LogLevel::Info.to_string(),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("modem_name", &self.modem_name)
            .field("modem_url", &self.modem_url)
            .field("modem_username", &self.modem_username)
            .field("modem_insecure", &self.modem_insecure)
            .field("clickhouse_url", &self.clickhouse_url)
            .field("clickhouse_database", &self.clickhouse_database)
            .field("clickhouse_table", &self.clickhouse_table)
            .field("scrape_delay", &self.scrape_delay)
            .field("clickhouse_queue_limit", &self.clickhouse_queue_limit)
            .field("log_level", &self.log_level)
            .finish_non_exhaustive()
    }
}

/// Validated configuration, ready for `docsis_core`.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub exporter: ExporterConfig,
    pub clickhouse: ClickHouseConfig,
    pub log_level: LogLevel,
}

// ── Loading ─────────────────────────────────────────────────────────

/// Build the provider chain: defaults, then `path` if given, then env.
pub fn figment(path: Option<&Path>) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(Settings::default()));
    if let Some(path) = path {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(Env::raw().only(&ENV_KEYS))
}

/// Load and validate settings from file and environment.
pub fn load(path: Option<&Path>) -> Result<Loaded, ConfigError> {
    if let Some(path) = path {
        if !path.is_file() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    }
    Settings::from_figment(&figment(path))?.into_configs()
}

impl Settings {
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        Ok(figment.extract()?)
    }

    /// Validate and translate into core config types.
    pub fn into_configs(self) -> Result<Loaded, ConfigError> {
        let log_level: LogLevel = self.log_level.parse().map_err(|_| ConfigError::Validation {
            field: "LOG_LEVEL",
            reason: format!(
                "expected DEBUG, INFO, WARNING, ERROR or CRITICAL, got '{}'",
                self.log_level
            ),
        })?;

        if self.modem_name.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "MODEM_NAME",
                reason: "must not be empty".into(),
            });
        }
        if self.scrape_delay < 1 {
            return Err(ConfigError::Validation {
                field: "SCRAPE_DELAY",
                reason: "must be at least 1 second".into(),
            });
        }
        if self.clickhouse_queue_limit < MIN_QUEUE_LIMIT {
            return Err(ConfigError::Validation {
                field: "CLICKHOUSE_QUEUE_LIMIT",
                reason: format!(
                    "must be at least {MIN_QUEUE_LIMIT}, got {}",
                    self.clickhouse_queue_limit
                ),
            });
        }
        positive_secs("MODEM_TIMEOUT", self.modem_timeout)?;
        positive_secs("CLICKHOUSE_TIMEOUT", self.clickhouse_timeout)?;
        validate_table(&self.clickhouse_table)?;

        let tls = if self.modem_insecure {
            TlsVerification::DangerAcceptInvalid
        } else if let Some(path) = self.modem_ca_cert {
            TlsVerification::CustomCa(path)
        } else {
            TlsVerification::SystemDefaults
        };

        let modem = ModemConfig {
            url: parse_url("MODEM_URL", &required("MODEM_URL", self.modem_url)?)?,
            name: self.modem_name,
            username: required("MODEM_USERNAME", self.modem_username)?,
            password: SecretString::from(required("MODEM_PASSWORD", self.modem_password)?),
            tls,
            timeout: Duration::from_secs(self.modem_timeout),
        };

        let clickhouse = ClickHouseConfig {
            url: parse_url(
                "CLICKHOUSE_URL",
                &required("CLICKHOUSE_URL", self.clickhouse_url)?,
            )?,
            username: required("CLICKHOUSE_USERNAME", self.clickhouse_username)?,
            password: SecretString::from(required(
                "CLICKHOUSE_PASSWORD",
                self.clickhouse_password,
            )?),
            database: required("CLICKHOUSE_DATABASE", self.clickhouse_database)?,
            table: self.clickhouse_table,
            timeout: Duration::from_secs(self.clickhouse_timeout),
        };

        let mut exporter = ExporterConfig::new(modem);
        exporter.scrape_interval = Duration::from_secs(self.scrape_delay);
        exporter.queue_capacity = self.clickhouse_queue_limit;
        exporter.write_retry_delay = Duration::from_secs(self.write_retry_delay);

        Ok(Loaded {
            exporter,
            clickhouse,
            log_level,
        })
    }
}

// ── Validation helpers ──────────────────────────────────────────────

fn required(key: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing { key })
}

fn parse_url(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::Validation {
        field,
        reason: format!("'{raw}' is not a valid URL: {e}"),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Validation {
            field,
            reason: format!("unsupported scheme '{other}', expected http or https"),
        }),
    }
}

fn positive_secs(field: &'static str, secs: u64) -> Result<(), ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Validation {
            field,
            reason: "must be at least 1 second".into(),
        });
    }
    Ok(())
}

fn validate_table(table: &str) -> Result<(), ConfigError> {
    let valid = !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(ConfigError::Validation {
            field: "CLICKHOUSE_TABLE",
            reason: format!("'{table}' is not a plain table identifier"),
        })
    }
}
