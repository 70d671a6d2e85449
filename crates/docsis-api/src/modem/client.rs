// Modem JSON-RPC HTTP client
//
// Wraps `reqwest::Client` with the modem's form-encoded request envelope,
// reply parsing, and the session it authenticates. Login/logout and the
// telemetry scrape live in sibling files as inherent methods.

use secrecy::SecretString;
use tracing::{debug, trace};
use url::Url;

use crate::auth::AuthKeyInput;
use crate::error::Error;
use crate::protocol::{Action, ENDPOINT_PATH, Reply, ReplyEnvelope, Request, RequestEnvelope};
use crate::session::Session;
use crate::transport::TransportConfig;

/// Client for one modem's `/cgi/json-req` endpoint.
///
/// Owns the [`Session`]: every method that talks to the modem takes
/// `&mut self`, so the request counter is never shared between tasks.
pub struct ModemClient {
    http: reqwest::Client,
    base_url: Url,
    endpoint: Url,
    username: String,
    password: SecretString,
    session: Session,
}

impl std::fmt::Debug for ModemClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModemClient")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl ModemClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the modem root, e.g. `https://192.168.0.1`.
    pub fn new(
        base_url: Url,
        username: String,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(http, base_url, username, password)
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        username: String,
        password: SecretString,
    ) -> Result<Self, Error> {
        let endpoint = base_url.join(ENDPOINT_PATH)?;
        Ok(Self {
            http,
            base_url,
            endpoint,
            username,
            password,
            session: Session::default(),
        })
    }

    /// Current session state.
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub(crate) fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub(crate) fn username(&self) -> &str {
        &self.username
    }

    /// Derive an auth key with this client's credentials.
    pub(crate) fn auth_key(&self, request_id: u64, nonce: u64, initial_login: bool) -> String {
        AuthKeyInput {
            username: &self.username,
            password: &self.password,
            request_id,
            nonce,
            initial_login,
        }
        .derive()
    }

    /// Issue a request within the current session.
    ///
    /// Allocates the next request id, signs the batch with a fresh auth
    /// key, and returns the parsed reply. The caller inspects the reply's
    /// error descriptor.
    pub(crate) async fn session_request(&mut self, actions: Vec<Action>) -> Result<Reply, Error> {
        if !self.session.is_authenticated() {
            return Err(Error::SessionNotEstablished);
        }

        let request_id = self.session.next_request_id();
        let nonce = self.session.nonce();
        let auth_key = self.auth_key(request_id, nonce, false);

        let envelope = RequestEnvelope {
            request: Request {
                id: request_id,
                session_id: self.session.session_id(),
                priority: false,
                actions,
                cnonce: nonce,
                auth_key,
            },
        };
        self.post(&envelope).await
    }

    /// POST a request envelope as the `req` form field and parse the reply.
    pub(crate) async fn post(&self, envelope: &RequestEnvelope<'_>) -> Result<Reply, Error> {
        let payload = serde_json::to_string(envelope).map_err(|e| Error::Deserialization {
            message: format!("failed to encode request: {e}"),
            body: String::new(),
        })?;

        debug!(request_id = envelope.request.id, "POST {}", self.endpoint);
        trace!(payload = %payload, "modem request");

        let resp = self
            .http
            .post(self.endpoint.clone())
            .form(&[("req", payload.as_str())])
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;
        trace!(%status, body = %body, "modem reply");

        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                body: preview(&body).to_owned(),
            });
        }

        let envelope: ReplyEnvelope = serde_json::from_str(&body).map_err(|e| {
            Error::Deserialization {
                message: format!("{e} (body preview: {:?})", preview(&body)),
                body: body.clone(),
            }
        })?;
        Ok(envelope.reply)
    }
}

fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
