//! Exporter error types with miette diagnostics.
//!
//! Maps `ConfigError` and `CoreError` into operator-facing errors with
//! help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use docsis_config::ConfigError;
use docsis_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const CONFIG: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid configuration")]
    #[diagnostic(
        code(docsis::config),
        help(
            "Required: MODEM_URL, MODEM_USERNAME, MODEM_PASSWORD, CLICKHOUSE_URL,\n\
             CLICKHOUSE_USERNAME, CLICKHOUSE_PASSWORD, CLICKHOUSE_DATABASE.\n\
             Set them in the environment or in the file passed with --config."
        )
    )]
    Config(#[source] ConfigError),

    // ── Modem ────────────────────────────────────────────────────────
    #[error("Could not connect to modem at {url}")]
    #[diagnostic(
        code(docsis::connection_failed),
        help(
            "Check that the modem is reachable and MODEM_URL is correct.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Modem login failed: {message}")]
    #[diagnostic(
        code(docsis::auth_failed),
        help("Verify MODEM_USERNAME and MODEM_PASSWORD.")
    )]
    AuthFailed { message: String },

    #[error("Modem request timed out")]
    #[diagnostic(
        code(docsis::timeout),
        help("Increase MODEM_TIMEOUT or check the modem's responsiveness.")
    )]
    Timeout,

    // ── Everything else ──────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(docsis::pipeline))]
    Pipeline(CoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => exit_code::CONFIG,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::ConnectionFailed { .. } | Self::Timeout => exit_code::CONNECTION,
            Self::Pipeline(_) | Self::Io(_) => exit_code::GENERAL,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::Timeout => Self::Timeout,
            CoreError::Config { message } => Self::Config(ConfigError::Validation {
                field: "transport",
                reason: message,
            }),
            other => Self::Pipeline(other),
        }
    }
}
