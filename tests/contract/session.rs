use std::sync::Arc;

use chatgpt_bridge::config::{DEFAULT_USER_AGENT, SESSION_PATH};
use chatgpt_bridge::{Clearance, ClearanceStore, Error, MemoryClearanceStore};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{client_for, client_with_store, header_str};

const SESSION_COOKIE: &str = "__Secure-next-auth.session-token";

fn session_body() -> serde_json::Value {
    serde_json::json!({
        "user": {
            "id": "user-1",
            "name": "Ada",
            "email": "ada@example.com",
            "image": "https://example.com/a.png",
            "picture": "https://example.com/a.png",
            "groups": [],
            "features": ["beta"]
        },
        "expires": "2030-01-01T00:00:00.000Z",
        "accessToken": "fresh-access"
    })
}

#[tokio::test]
async fn test_refresh_keeps_supplied_token_without_rotation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SESSION_PATH))
        .and(header("cookie", "__Secure-next-auth.session-token=sess-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let identity = client.refresh_session("sess-1").await.unwrap();

    assert_eq!(identity.access_token, "fresh-access");
    assert_eq!(identity.session_token, "sess-1");
    assert_eq!(identity.user.email, "ada@example.com");
    assert_eq!(identity.user.features, vec!["beta"]);
    assert!(identity.expires.is_some());
    assert!(!identity.is_expired());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(header_str(&requests[0], "user-agent"), DEFAULT_USER_AGENT);
    assert_eq!(header_str(&requests[0], "accept"), "*/*");
    assert!(header_str(&requests[0], "referer").ends_with("/chat"));
}

#[tokio::test]
async fn test_refresh_adopts_rotated_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SESSION_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("set-cookie", "__Host-next-auth.csrf-token=abc; Path=/")
                .append_header(
                    "set-cookie",
                    format!("{SESSION_COOKIE}=NEW; Path=/; Secure; HttpOnly; SameSite=Lax"),
                )
                .set_body_json(session_body()),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let identity = client.refresh_session("sess-1").await.unwrap();
    assert_eq!(identity.session_token, "NEW");
}

#[tokio::test]
async fn test_refresh_sends_stored_clearance_pair() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SESSION_PATH))
        .and(header(
            "cookie",
            "__Secure-next-auth.session-token=sess-1; cf_clearance=cf-1",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body()))
        .expect(1)
        .mount(&server)
        .await;

    let store = MemoryClearanceStore::with_clearance(Clearance::new("cf-1", "PairedAgent/1.0"));
    let client = client_with_store(&server, Arc::new(store));
    client.refresh_session("sess-1").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(header_str(&requests[0], "user-agent"), "PairedAgent/1.0");
}

#[tokio::test]
async fn test_refresh_forbidden_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SESSION_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.refresh_session("sess-1").await.unwrap_err();

    match err {
        Error::Status(status) => {
            assert_eq!(status.code, 403);
            assert_eq!(status.body, "forbidden");
        }
        other => panic!("Expected Status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_refresh_rejects_empty_token_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.refresh_session("  ").await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
async fn test_update_clearance_stores_pair_on_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("cookie", "cf_clearance=cf-2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryClearanceStore::new());
    let client = client_with_store(&server, store.clone());
    let stored = client.update_clearance("cf-2", "Agent/2.0").await.unwrap();

    assert_eq!(stored.token, "cf-2");
    let loaded = store.load().unwrap().unwrap();
    assert_eq!(loaded.token, "cf-2");
    assert_eq!(loaded.user_agent, "Agent/2.0");
    assert_eq!(client.clearance().unwrap(), Some(loaded));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(header_str(&requests[0], "user-agent"), "Agent/2.0");
}

#[tokio::test]
async fn test_update_clearance_rejected_leaves_store_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(403).set_body_string("challenge"))
        .mount(&server)
        .await;

    let previous = Clearance::new("cf-old", "Agent/1.0");
    let store = Arc::new(MemoryClearanceStore::with_clearance(previous.clone()));
    let client = client_with_store(&server, store.clone());

    let err = client.update_clearance("cf-new", "Agent/2.0").await.unwrap_err();
    assert_eq!(err.status_code(), Some(403));
    assert_eq!(store.load().unwrap(), Some(previous));
}

#[tokio::test]
async fn test_update_clearance_requires_both_halves() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(matches!(
        client.update_clearance("", "Agent/1.0").await,
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        client.update_clearance("cf-1", "").await,
        Err(Error::InvalidInput(_))
    ));
    assert!(client.clearance().unwrap().is_none());
}

#[tokio::test]
async fn test_refresh_accepts_user_without_avatar() {
    let server = MockServer::start().await;
    let mut body = session_body();
    body["user"]["image"] = serde_json::Value::Null;
    body["user"]["picture"] = serde_json::Value::Null;
    Mock::given(method("GET"))
        .and(path(SESSION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let identity = client.refresh_session("sess-1").await.unwrap();
    assert_eq!(identity.access_token, "fresh-access");
    assert!(identity.user.image.is_empty());
}

#[tokio::test]
async fn test_refresh_non_json_body_is_decode_error_with_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SESSION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>challenge</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.refresh_session("sess-1").await.unwrap_err();
    match err {
        Error::Decode { line, .. } => assert_eq!(line, "<html>challenge</html>"),
        other => panic!("Expected Decode error, got {other:?}"),
    }
}
