// Modem session state
//
// Tracks the device-issued session id and nonce plus the per-session
// request counter. Owned by `ModemClient`; nothing else mutates it.

use strum::Display;

/// Lifecycle of a modem session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated,
    /// A login is in flight to replace an earlier session.
    Reauthenticating,
    /// The last login attempt was rejected.
    Failed,
}

/// Session identifiers and counters for the current login.
#[derive(Debug, Clone)]
pub struct Session {
    request_counter: u64,
    nonce: u64,
    session_id: String,
    state: SessionState,
    /// Set once a login has succeeded; cleared only by logout.
    had_session: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            request_counter: 0,
            nonce: 0,
            session_id: String::new(),
            state: SessionState::Unauthenticated,
            had_session: false,
        }
    }
}

impl Session {
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Id of the last request issued in this session (0 right after login).
    pub fn request_counter(&self) -> u64 {
        self.request_counter
    }

    /// Advance the counter and return the id for the next request.
    ///
    /// The login request itself uses id 0, so the first session request
    /// gets 1.
    pub fn next_request_id(&mut self) -> u64 {
        self.request_counter += 1;
        self.request_counter
    }

    /// Enter the authenticating state ahead of a `logIn` request.
    pub(crate) fn begin_login(&mut self) {
        self.state = if self.had_session {
            SessionState::Reauthenticating
        } else {
            SessionState::Authenticating
        };
        self.request_counter = 0;
    }

    /// Store the identifiers handed out by a successful login.
    pub(crate) fn establish(&mut self, session_id: String, nonce: u64) {
        self.session_id = session_id;
        self.nonce = nonce;
        self.request_counter = 0;
        self.state = SessionState::Authenticated;
        self.had_session = true;
    }

    pub(crate) fn fail(&mut self) {
        self.session_id.clear();
        self.nonce = 0;
        self.state = SessionState::Failed;
    }

    /// Drop the current session after the modem rejected it. The next
    /// login counts as a re-authentication.
    pub fn invalidate(&mut self) {
        if self.state == SessionState::Authenticated {
            self.state = SessionState::Unauthenticated;
        }
    }

    /// Forget the session entirely (after logout).
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}
