// Wire types for the `/cgi/json-req` endpoint
//
// Requests are `{"request": {...}}` documents sent as the `req` field of a
// form body. Replies are `{"reply": {"error": {...}, "actions": [...]}}`.
// Only the parts of the envelope this crate reads are modeled; unknown
// fields are ignored.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Error description the modem uses for "no error".
pub const NO_ERROR: &str = "XMO_REQUEST_NO_ERR";

/// Path of the JSON-RPC endpoint, relative to the modem base URL.
pub const ENDPOINT_PATH: &str = "/cgi/json-req";

// ── Request ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct RequestEnvelope<'a> {
    pub request: Request<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Request<'a> {
    pub id: u64,
    #[serde(rename = "session-id")]
    pub session_id: &'a str,
    pub priority: bool,
    pub actions: Vec<Action>,
    pub cnonce: u64,
    #[serde(rename = "auth-key")]
    pub auth_key: String,
}

/// One action inside a request batch.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Action {
    /// `getValue` read against an xpath.
    Read {
        id: u32,
        method: &'static str,
        xpath: &'static str,
        options: Value,
    },
    /// `logIn` / `logOut` and other parameterized calls.
    Call {
        id: u32,
        method: &'static str,
        parameters: Value,
    },
}

impl Action {
    pub fn get_value(id: u32, xpath: &'static str) -> Self {
        Self::Read {
            id,
            method: "getValue",
            xpath,
            options: json!({ "capability-flags": { "interface": true } }),
        }
    }

    pub fn log_in(id: u32, user: &str) -> Self {
        Self::Call {
            id,
            method: "logIn",
            parameters: json!({
                "user": user,
                "persistent": "true",
                "session-options": {
                    "nss": [
                        { "name": "gtw", "uri": "http://sagemcom.com/gateway-data" }
                    ],
                    "language": "ident",
                    "context-flags": {
                        "get-content-name": true,
                        "local-time": true
                    },
                    "capability-depth": 2,
                    "capability-flags": {
                        "name": true,
                        "default-value": false,
                        "restriction": true,
                        "description": false
                    },
                    "time-format": "ISO_8601",
                    "jwt-auth": "true"
                }
            }),
        }
    }

    pub fn log_out(id: u32) -> Self {
        Self::Call {
            id,
            method: "logOut",
            parameters: json!({}),
        }
    }
}

// ── Reply ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct ReplyEnvelope {
    pub reply: Reply,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Reply {
    pub error: ReplyError,
    #[serde(default)]
    pub actions: Vec<ActionReply>,
}

impl Reply {
    pub fn is_ok(&self) -> bool {
        self.error.description == NO_ERROR
    }

    /// Find the reply for a request action id.
    ///
    /// Matches on the declared `id` when the modem echoes it; replies
    /// without ids fall back to their position in the batch.
    pub fn action(&self, id: u32) -> Option<&ActionReply> {
        self.actions
            .iter()
            .find(|a| a.id == Some(id))
            .or_else(|| {
                let idx = usize::try_from(id).ok()?;
                self.actions.get(idx).filter(|a| a.id.is_none())
            })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReplyError {
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActionReply {
    #[serde(default)]
    pub id: Option<u32>,
    #[serde(default)]
    pub callbacks: Vec<Callback>,
}

impl ActionReply {
    pub fn parameters(&self) -> Option<&Value> {
        self.callbacks.first().map(|c| &c.parameters)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct Callback {
    #[serde(default)]
    pub parameters: Value,
}

/// `parameters` of a successful `logIn` callback.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginParameters {
    #[serde(deserialize_with = "de_u64")]
    pub nonce: u64,
    #[serde(deserialize_with = "de_string")]
    pub id: String,
}

// ── Lenient scalar decoding ─────────────────────────────────────────
//
// Firmware revisions disagree on whether numbers are sent as JSON numbers
// or as strings, so numeric fields accept both.

#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrStr {
    Int(u64),
    Signed(i64),
    Float(f64),
    Str(String),
}

pub(crate) fn de_u64<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    match NumOrStr::deserialize(d)? {
        NumOrStr::Int(n) => Ok(n),
        NumOrStr::Signed(n) => u64::try_from(n).map_err(de::Error::custom),
        NumOrStr::Float(f) => Err(de::Error::custom(format!("expected integer, got {f}"))),
        NumOrStr::Str(s) => s.trim().parse().map_err(de::Error::custom),
    }
}

pub(crate) fn de_i64<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    match NumOrStr::deserialize(d)? {
        NumOrStr::Int(n) => i64::try_from(n).map_err(de::Error::custom),
        NumOrStr::Signed(n) => Ok(n),
        NumOrStr::Float(f) => Err(de::Error::custom(format!("expected integer, got {f}"))),
        NumOrStr::Str(s) => s.trim().parse().map_err(de::Error::custom),
    }
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub(crate) fn de_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    match NumOrStr::deserialize(d)? {
        NumOrStr::Int(n) => Ok(n as f64),
        NumOrStr::Signed(n) => Ok(n as f64),
        NumOrStr::Float(f) => Ok(f),
        NumOrStr::Str(s) => s.trim().parse().map_err(de::Error::custom),
    }
}

pub(crate) fn de_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match NumOrStr::deserialize(d)? {
        NumOrStr::Int(n) => n.to_string(),
        NumOrStr::Signed(n) => n.to_string(),
        NumOrStr::Float(f) => f.to_string(),
        NumOrStr::Str(s) => s,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn request_serializes_with_hyphenated_keys() {
        let envelope = RequestEnvelope {
            request: Request {
                id: 3,
                session_id: "42",
                priority: false,
                actions: vec![Action::get_value(0, "Device/DeviceInfo/UpTime")],
                cnonce: 1234,
                auth_key: "abc".into(),
            },
        };
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            json!({
                "request": {
                    "id": 3,
                    "session-id": "42",
                    "priority": false,
                    "actions": [{
                        "id": 0,
                        "method": "getValue",
                        "xpath": "Device/DeviceInfo/UpTime",
                        "options": { "capability-flags": { "interface": true } }
                    }],
                    "cnonce": 1234,
                    "auth-key": "abc"
                }
            })
        );
    }

    #[test]
    fn login_action_carries_user() {
        let value = serde_json::to_value(Action::log_in(0, "admin")).unwrap();
        assert_eq!(value["method"], "logIn");
        assert_eq!(value["parameters"]["user"], "admin");
        assert_eq!(value["parameters"]["session-options"]["capability-depth"], 2);
    }

    #[test]
    fn reply_lookup_prefers_declared_id() {
        let reply: ReplyEnvelope = serde_json::from_value(json!({
            "reply": {
                "error": { "description": NO_ERROR },
                "actions": [
                    { "id": 1, "callbacks": [{ "parameters": { "value": "b" } }] },
                    { "id": 0, "callbacks": [{ "parameters": { "value": "a" } }] }
                ]
            }
        }))
        .unwrap();
        let reply = reply.reply;
        assert!(reply.is_ok());
        assert_eq!(reply.action(0).unwrap().parameters().unwrap()["value"], "a");
        assert_eq!(reply.action(1).unwrap().parameters().unwrap()["value"], "b");
        assert!(reply.action(2).is_none());
    }

    #[test]
    fn reply_lookup_falls_back_to_position() {
        let reply: ReplyEnvelope = serde_json::from_value(json!({
            "reply": {
                "error": { "description": NO_ERROR },
                "actions": [
                    { "callbacks": [{ "parameters": { "value": "first" } }] },
                    { "callbacks": [{ "parameters": { "value": "second" } }] }
                ]
            }
        }))
        .unwrap();
        assert_eq!(
            reply.reply.action(1).unwrap().parameters().unwrap()["value"],
            "second"
        );
    }

    #[test]
    fn login_parameters_accept_numbers_or_strings() {
        let p: LoginParameters =
            serde_json::from_value(json!({ "nonce": "55512", "id": 17 })).unwrap();
        assert_eq!(p.nonce, 55_512);
        assert_eq!(p.id, "17");

        let p: LoginParameters =
            serde_json::from_value(json!({ "nonce": 99, "id": "abc" })).unwrap();
        assert_eq!(p.nonce, 99);
        assert_eq!(p.id, "abc");
    }
}
