#![allow(clippy::unwrap_used)]
// Integration tests for `ModemClient` using wiremock.

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use docsis_api::{Error, ModemClient, SessionState, derive_auth_key};

const PASSWORD: &str = "hunter2";

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ModemClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = ModemClient::with_client(
        reqwest::Client::new(),
        base_url,
        "admin".into(),
        SecretString::from(PASSWORD.to_owned()),
    )
    .unwrap();
    (server, client)
}

fn secret() -> SecretString {
    SecretString::from(PASSWORD.to_owned())
}

fn login_reply(session_id: u64, nonce: &str) -> Value {
    json!({
        "reply": {
            "uid": 0,
            "id": 0,
            "error": { "code": 16_777_216, "description": "XMO_REQUEST_NO_ERR" },
            "actions": [{
                "uid": 1,
                "id": 0,
                "error": { "code": 16_777_216, "description": "XMO_NO_ERR" },
                "callbacks": [{
                    "uid": 1,
                    "result": { "code": 16_777_238, "description": "XMO_NO_ERR" },
                    "xpath": "",
                    "parameters": { "id": session_id, "nonce": nonce }
                }]
            }]
        }
    })
}

fn error_reply(description: &str) -> Value {
    json!({
        "reply": {
            "error": { "code": 16_777_219, "description": description },
            "actions": []
        }
    })
}

fn value_action(id: u32, value: &Value) -> Value {
    json!({ "id": id, "callbacks": [{ "parameters": { "value": value } }] })
}

fn telemetry_reply(downstream_ids: &[i64]) -> Value {
    let downstreams: Vec<Value> = downstream_ids
        .iter()
        .map(|id| {
            json!({
                "ChannelID": id, "Frequency": 602_000_000, "Modulation": "QAM256",
                "SymbolRate": 5_360_537, "BandWidth": 8_000_000, "PowerLevel": 3.2,
                "SNR": 38.9, "UnerroredCodewords": 100, "CorrectableCodewords": 2,
                "UncorrectableCodewords": 0
            })
        })
        .collect();

    json!({
        "reply": {
            "error": { "description": "XMO_REQUEST_NO_ERR" },
            "actions": [
                value_action(0, &json!("2023-04-01")),
                value_action(1, &json!({ "MemoryStatus": { "Total": 512_000, "Free": 128_000 } })),
                value_action(2, &json!("Sagemcom")),
                value_action(3, &json!("FAST3895")),
                value_action(4, &json!({ "ProcessStatus": {
                    "CPUUsage": 7,
                    "LoadAverage": { "Load1": 0.5, "Load5": 0.4, "Load15": 0.3 }
                }})),
                value_action(5, &json!("SG4K10002816t")),
                value_action(6, &json!(3600)),
                value_action(7, &Value::Array(downstreams)),
                value_action(8, &json!([{
                    "ChannelID": 1, "Frequency": 36_000_000, "Modulation": "QAM64",
                    "SymbolRate": 5120, "PowerLevel": 44.5
                }]))
            ]
        }
    })
}

async fn mount_login(server: &MockServer, session_id: u64, nonce: &str) {
    Mock::given(method("POST"))
        .and(path("/cgi/json-req"))
        .and(body_string_contains("logIn"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_reply(session_id, nonce)))
        .mount(server)
        .await;
}

/// Decode every JSON request the modem received, in arrival order.
async fn sent_requests(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| {
            let (_, req) = url::form_urlencoded::parse(&r.body)
                .find(|(k, _)| k == "req")
                .unwrap();
            serde_json::from_str::<Value>(&req).unwrap()["request"].clone()
        })
        .collect()
}

// ── Login ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_establishes_session() {
    let (server, mut client) = setup().await;
    mount_login(&server, 7, "123456").await;

    client.login().await.unwrap();

    let session = client.session();
    assert_eq!(session.state(), SessionState::Authenticated);
    assert_eq!(session.session_id(), "7");
    assert_eq!(session.nonce(), 123_456);
    assert_eq!(session.request_counter(), 0);

    let sent = sent_requests(&server).await;
    assert_eq!(sent.len(), 1);
    let req = &sent[0];
    assert_eq!(req["id"], 0);
    assert_eq!(req["session-id"], "0");
    assert_eq!(req["priority"], true);
    assert_eq!(req["actions"][0]["method"], "logIn");
    assert_eq!(req["actions"][0]["parameters"]["user"], "admin");

    let cnonce = req["cnonce"].as_u64().unwrap();
    assert!((10_000_000..=100_000_000).contains(&cnonce));
    assert_eq!(
        req["auth-key"],
        derive_auth_key("admin", &secret(), 0, cnonce, true)
    );
}

#[tokio::test]
async fn test_login_rejected_by_device() {
    let (server, mut client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/cgi/json-req"))
        .respond_with(ResponseTemplate::new(200).set_body_json(error_reply("XMO_AUTHENTICATION_ERR")))
        .mount(&server)
        .await;

    let result = client.login().await;

    match result {
        Err(Error::Authentication { ref message }) => {
            assert!(
                message.contains("XMO_AUTHENTICATION_ERR"),
                "expected device error in message, got: {message}"
            );
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
    assert_eq!(client.session().state(), SessionState::Failed);
}

#[tokio::test]
async fn test_login_http_failure() {
    let (server, mut client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let result = client.login().await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_login_malformed_reply() {
    let (server, mut client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let result = client.login().await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn test_login_reply_without_parameters() {
    let (server, mut client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "reply": { "error": { "description": "XMO_REQUEST_NO_ERR" }, "actions": [] }
        })))
        .mount(&server)
        .await;

    let result = client.login().await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

// ── Scrape ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_scrape_before_login() {
    let (_server, mut client) = setup().await;

    let result = client.scrape_telemetry().await;

    assert!(
        matches!(result, Err(Error::SessionNotEstablished)),
        "expected SessionNotEstablished, got: {result:?}"
    );
}

#[tokio::test]
async fn test_scrape_signs_requests_with_increasing_ids() {
    let (server, mut client) = setup().await;
    mount_login(&server, 42, "987654321").await;

    Mock::given(method("POST"))
        .and(path("/cgi/json-req"))
        .and(body_string_contains("getValue"))
        .respond_with(ResponseTemplate::new(200).set_body_json(telemetry_reply(&[3, 1, 2])))
        .mount(&server)
        .await;

    client.login().await.unwrap();
    for _ in 0..3 {
        client.scrape_telemetry().await.unwrap();
    }
    assert_eq!(client.session().request_counter(), 3);

    let sent = sent_requests(&server).await;
    assert_eq!(sent.len(), 4);
    for (expected_id, req) in (1_u64..=3).zip(&sent[1..]) {
        assert_eq!(req["id"], expected_id);
        assert_eq!(req["session-id"], "42");
        assert_eq!(req["priority"], false);
        assert_eq!(req["cnonce"], 987_654_321);
        assert_eq!(req["actions"].as_array().unwrap().len(), 9);
        assert_eq!(
            req["auth-key"],
            derive_auth_key("admin", &secret(), expected_id, 987_654_321, false)
        );
    }

    // A second login resets the counter.
    client.login().await.unwrap();
    assert_eq!(client.session().request_counter(), 0);
    client.scrape_telemetry().await.unwrap();
    let sent = sent_requests(&server).await;
    assert_eq!(sent.last().unwrap()["id"], 1);
}

#[tokio::test]
async fn test_scrape_preserves_channel_order() {
    let (server, mut client) = setup().await;
    mount_login(&server, 1, "5").await;

    Mock::given(method("POST"))
        .and(body_string_contains("getValue"))
        .respond_with(ResponseTemplate::new(200).set_body_json(telemetry_reply(&[9, 4, 17, 2])))
        .mount(&server)
        .await;

    client.login().await.unwrap();
    let scrape = client.scrape_telemetry().await.unwrap();

    let ids: Vec<i64> = scrape
        .reply
        .downstreams
        .iter()
        .map(|c| c.channel_id)
        .collect();
    assert_eq!(ids, vec![9, 4, 17, 2]);
    assert_eq!(scrape.reply.upstreams.len(), 1);
    assert_eq!(scrape.reply.uptime, 3600);
}

#[tokio::test]
async fn test_scrape_device_error_invalidates_session() {
    let (server, mut client) = setup().await;
    mount_login(&server, 1, "5").await;

    Mock::given(method("POST"))
        .and(body_string_contains("getValue"))
        .respond_with(ResponseTemplate::new(200).set_body_json(error_reply("XMO_INVALID_SESSION_ERR")))
        .mount(&server)
        .await;

    client.login().await.unwrap();
    let result = client.scrape_telemetry().await;

    match result {
        Err(ref e @ Error::Device { ref description }) => {
            assert_eq!(description, "XMO_INVALID_SESSION_ERR");
            assert!(e.is_device_error());
        }
        other => panic!("expected Device error, got: {other:?}"),
    }
    assert!(!client.session().is_authenticated());

    let again = client.scrape_telemetry().await;
    assert!(matches!(again, Err(Error::SessionNotEstablished)));
}

// ── Logout ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_logout_clears_session() {
    let (server, mut client) = setup().await;
    mount_login(&server, 3, "77").await;

    Mock::given(method("POST"))
        .and(body_string_contains("logOut"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "reply": { "error": { "description": "XMO_REQUEST_NO_ERR" }, "actions": [] }
        })))
        .mount(&server)
        .await;

    client.login().await.unwrap();
    client.logout().await.unwrap();

    assert_eq!(client.session().state(), SessionState::Unauthenticated);
    let sent = sent_requests(&server).await;
    assert_eq!(sent[1]["actions"][0]["method"], "logOut");
    assert_eq!(sent[1]["id"], 1);

    // Logging out twice is a no-op.
    client.logout().await.unwrap();
    assert_eq!(sent_requests(&server).await.len(), 2);
}
