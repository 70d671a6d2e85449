// Modem session login/logout
//
// `logIn` is signed with a client-generated nonce and request id 0; the
// reply hands out the session id and the nonce used to sign every
// following request. Logging in again replaces the whole session.

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::auth::generate_cnonce;
use crate::error::Error;
use crate::modem::client::ModemClient;
use crate::protocol::{Action, LoginParameters, Request, RequestEnvelope};

impl ModemClient {
    /// Authenticate and establish a fresh session.
    ///
    /// Resets the request counter to 0 and replaces any previous session
    /// id and nonce. A non-success HTTP status, an unparseable reply, or a
    /// modem error descriptor other than `XMO_REQUEST_NO_ERR` yields
    /// [`Error::Authentication`]. Transport failures are returned as-is so
    /// callers can tell an unreachable modem from rejected credentials.
    pub async fn login(&mut self) -> Result<(), Error> {
        info!("logging in to modem");

        let cnonce = generate_cnonce();
        let auth_key = self.auth_key(0, cnonce, true);
        self.session_mut().begin_login();

        let envelope = RequestEnvelope {
            request: Request {
                id: 0,
                session_id: "0",
                priority: true,
                actions: vec![Action::log_in(0, self.username())],
                cnonce,
                auth_key,
            },
        };

        let reply = match self.post(&envelope).await {
            Ok(reply) => reply,
            Err(Error::Http { status, body }) => {
                self.session_mut().fail();
                return Err(Error::Authentication {
                    message: format!("login failed (HTTP {status}): {body}"),
                });
            }
            Err(Error::Deserialization { message, .. }) => {
                self.session_mut().fail();
                return Err(Error::Authentication {
                    message: format!("malformed login reply: {message}"),
                });
            }
            Err(e) => {
                self.session_mut().fail();
                return Err(e);
            }
        };

        if !reply.is_ok() {
            self.session_mut().fail();
            return Err(Error::Authentication {
                message: format!(
                    "invalid modem username or password ({})",
                    reply.error.description
                ),
            });
        }

        let params = reply
            .action(0)
            .and_then(|a| a.parameters())
            .ok_or_else(|| "login reply has no callback parameters".to_owned())
            .and_then(|p| {
                LoginParameters::deserialize(p).map_err(|e| format!("bad login parameters: {e}"))
            });

        let params = match params {
            Ok(params) => params,
            Err(message) => {
                self.session_mut().fail();
                return Err(Error::Authentication { message });
            }
        };

        debug!(session_id = %params.id, nonce = params.nonce, "session established");
        self.session_mut().establish(params.id, params.nonce);
        info!("logged in");
        Ok(())
    }

    /// End the current session.
    ///
    /// The local session is cleared whether or not the modem accepts the
    /// `logOut`. A no-op when no session is established.
    pub async fn logout(&mut self) -> Result<(), Error> {
        if !self.session().is_authenticated() {
            debug!("no modem session to log out of");
            return Ok(());
        }

        let result = self.session_request(vec![Action::log_out(0)]).await;
        self.session_mut().clear();

        let reply = result?;
        if !reply.is_ok() {
            warn!(error = %reply.error.description, "modem rejected logout");
            return Err(Error::Device {
                description: reply.error.description,
            });
        }

        debug!("logout complete");
        Ok(())
    }
}
