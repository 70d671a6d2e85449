// ── Core error types ──
//
// Errors surfaced by the pipeline. Transport-layer failures from
// `docsis-api` are folded into a handful of variants; the scrape loop
// decides per variant whether the pipeline stops or the cycle is skipped.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to modem at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Modem authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Modem request timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Modem error: {message}")]
    Modem { message: String },

    #[error("Malformed modem reply: {message}")]
    MalformedReply { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether this error should stop the whole pipeline rather than
    /// skip a cycle.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. } | Self::Config { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<docsis_api::Error> for CoreError {
    fn from(err: docsis_api::Error) -> Self {
        match err {
            docsis_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            docsis_api::Error::SessionNotEstablished => CoreError::AuthenticationFailed {
                message: "no modem session established".into(),
            },
            docsis_api::Error::Device { description } => CoreError::Modem {
                message: description,
            },
            docsis_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                }
            }
            docsis_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            docsis_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS error: {msg}"),
            },
            docsis_api::Error::Http { status, body } => CoreError::Modem {
                message: format!("HTTP {status}: {body}"),
            },
            docsis_api::Error::Deserialization { message, body: _ } => {
                CoreError::MalformedReply { message }
            }
            docsis_api::Error::MissingAction { id } => CoreError::MalformedReply {
                message: format!("reply is missing action {id}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_auth_and_config_are_fatal() {
        let auth: CoreError = docsis_api::Error::Authentication {
            message: "bad password".into(),
        }
        .into();
        assert!(auth.is_fatal());

        let device: CoreError = docsis_api::Error::Device {
            description: "XMO_INVALID_SESSION_ERR".into(),
        }
        .into();
        assert!(!device.is_fatal());

        let tls: CoreError = docsis_api::Error::Tls("invalid CA cert".into()).into();
        assert!(tls.is_fatal());

        let missing: CoreError = docsis_api::Error::MissingAction { id: 7 }.into();
        assert!(matches!(missing, CoreError::MalformedReply { .. }));
        assert!(!missing.is_fatal());
    }
}
