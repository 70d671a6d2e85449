use thiserror::Error;

/// Top-level error type for the `docsis-api` crate.
///
/// Covers every failure mode of the modem's `/cgi/json-req` endpoint:
/// authentication, device-reported errors, transport, and reply decoding.
/// `docsis-core` decides which of these are fatal and which only skip a cycle.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected (wrong credentials, bad status, malformed reply).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// A session request was attempted before `login()` succeeded.
    #[error("No modem session established -- login required")]
    SessionNotEstablished,

    // ── Device ──────────────────────────────────────────────────────
    /// The modem answered with an error descriptor other than
    /// `XMO_REQUEST_NO_ERR`. Usually an expired or replaced session.
    #[error("Modem reported error: {description}")]
    Device { description: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Non-success HTTP status on a session request.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// The reply did not contain a callback for the given action id.
    #[error("Reply is missing action {id}")]
    MissingAction { id: u32 },
}

impl Error {
    /// Returns `true` if the modem itself rejected the request, which is
    /// the signal to log in again.
    pub fn is_device_error(&self) -> bool {
        matches!(self, Self::Device { .. })
    }
}
