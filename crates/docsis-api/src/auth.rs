// Request authentication for the modem's JSON-RPC endpoint
//
// Every request carries an `auth-key` that proves knowledge of the password
// without sending it. The key is a chain of three SHA-512 digests over the
// credentials, the session nonce, and the request id.

use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};

/// Path component mixed into every auth key. Must match the endpoint the
/// request is actually posted to.
pub const AUTH_KEY_SUFFIX: &str = "JSON:/cgi/json-req";

/// Lower bound (inclusive) for client-generated login nonces.
pub const CNONCE_MIN: u64 = 10_000_000;
/// Upper bound (inclusive) for client-generated login nonces.
pub const CNONCE_MAX: u64 = 100_000_000;

/// Inputs to a single auth-key derivation.
#[derive(Debug, Clone, Copy)]
pub struct AuthKeyInput<'a> {
    pub username: &'a str,
    pub password: &'a SecretString,
    pub request_id: u64,
    pub nonce: u64,
    /// The initial `logIn` request leaves the nonce out of the login hash.
    pub initial_login: bool,
}

impl AuthKeyInput<'_> {
    /// Derive the lowercase hex auth key for this input.
    pub fn derive(self) -> String {
        let hashed_password = sha512_hex(self.password.expose_secret());

        let login_nonce = if self.initial_login {
            String::new()
        } else {
            self.nonce.to_string()
        };
        let hashed_login = sha512_hex(&format!(
            "{}:{login_nonce}:{hashed_password}",
            self.username
        ));

        sha512_hex(&format!(
            "{hashed_login}:{}:{}:{AUTH_KEY_SUFFIX}",
            self.request_id, self.nonce
        ))
    }
}

/// Convenience wrapper around [`AuthKeyInput::derive`].
pub fn derive_auth_key(
    username: &str,
    password: &SecretString,
    request_id: u64,
    nonce: u64,
    initial_login: bool,
) -> String {
    AuthKeyInput {
        username,
        password,
        request_id,
        nonce,
        initial_login,
    }
    .derive()
}

/// Random client nonce for a fresh login.
pub fn generate_cnonce() -> u64 {
    rand::thread_rng().gen_range(CNONCE_MIN..=CNONCE_MAX)
}

fn sha512_hex(input: &str) -> String {
    hex::encode(Sha512::digest(input.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_owned())
    }

    #[test]
    fn password_digest_is_lowercase_sha512() {
        assert_eq!(
            sha512_hex("hunter2"),
            "6b97ed68d14eb3f1aa959ce5d49c7dc612e1eb1dafd73b1e705847483fd6a6c8\
             09f2ceb4e8df6ff9984c6298ff0285cace6614bf8daa9f0070101b6c89899e22"
        );
    }

    #[test]
    fn initial_login_key_omits_nonce_from_login_hash() {
        let key = derive_auth_key("admin", &secret("hunter2"), 0, 12_345_678, true);
        assert_eq!(
            key,
            "e9a9c513626e47bbca1bd00d858c44dbf330e18f1fa1c715b890a184ea018b6f\
             741210836e84e8d13564dc259728bfa1b8668046777dffb2915befebf3b9ac68"
        );
    }

    #[test]
    fn session_key_includes_nonce_in_login_hash() {
        let key = derive_auth_key("admin", &secret("hunter2"), 7, 987_654_321, false);
        assert_eq!(
            key,
            "28ea1f5619d296e96f29a45ebf03606b1794d416b9e6339d3844ef5dab5f68d9\
             f7ce9af4c9c3c1cc06fc2f98b65a929d363bd1cded113d4a2bd5ce2770671bf9"
        );
    }

    #[test]
    fn login_flag_changes_the_key() {
        let pw = secret("hunter2");
        let initial = derive_auth_key("admin", &pw, 0, 42, true);
        let session = derive_auth_key("admin", &pw, 0, 42, false);
        assert_ne!(initial, session);
        assert_eq!(initial.len(), 128);
        assert!(initial.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn cnonce_stays_in_range() {
        for _ in 0..1_000 {
            let n = generate_cnonce();
            assert!((CNONCE_MIN..=CNONCE_MAX).contains(&n));
        }
    }
}
