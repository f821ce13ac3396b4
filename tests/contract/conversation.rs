use std::ops::ControlFlow;

use chatgpt_bridge::config::{CONVERSATION_PATH, DEFAULT_USER_AGENT};
use chatgpt_bridge::{ConversationThread, Error, StreamOutcome};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{ACCESS_TOKEN, body_of, client_for, frame, header_str};

async fn mount_conversation(server: &MockServer, accept: &str, body: String) {
    Mock::given(method("POST"))
        .and(path(CONVERSATION_PATH))
        .and(header("authorization", "Bearer access-1"))
        .and(header("accept", accept))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, accept))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_text_mode_returns_final_frame() {
    let server = MockServer::start().await;
    let body = body_of(&[
        frame("conv-1", "asst-1", "Hel"),
        frame("conv-1", "asst-1", "Hello"),
        frame("conv-1", "asst-1", "Hello there"),
    ]);
    mount_conversation(&server, "application/json", body).await;

    let client = client_for(&server);
    let request = ConversationThread::default().next_request("hi");
    let response = client.conversation(ACCESS_TOKEN, &request).await.unwrap();

    assert_eq!(response.text(), Some("Hello there"));
    assert_eq!(response.conversation_id, "conv-1");
    assert_eq!(response.message_id(), Some("asst-1"));
}

#[tokio::test]
async fn test_request_shape_on_first_and_follow_up_turn() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CONVERSATION_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body_of(&[frame("conv-7", "asst-7", "ok")]), "application/json"),
        )
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut thread = ConversationThread::new("model-x");
    let first = thread.next_request("first");
    let response = client.conversation(ACCESS_TOKEN, &first).await.unwrap();
    thread.record(&response).unwrap();
    let second = thread.next_request("second");
    client.conversation(ACCESS_TOKEN, &second).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(header_str(&requests[0], "user-agent"), DEFAULT_USER_AGENT);

    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["action"], "next");
    assert_eq!(body["model"], "model-x");
    assert!(body.get("conversation_id").is_none());
    assert_eq!(body["parent_message_id"], first.parent_message_id.as_str());
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["messages"][0]["content"]["content_type"], "text");
    assert_eq!(body["messages"][0]["content"]["parts"][0], "first");

    let body: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert_eq!(body["conversation_id"], "conv-7");
    assert_eq!(body["parent_message_id"], "asst-7");
}

#[tokio::test]
async fn test_text_mode_forbidden_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CONVERSATION_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = ConversationThread::default().next_request("hi");
    let err = client.conversation(ACCESS_TOKEN, &request).await.unwrap_err();

    match &err {
        Error::Status(status) => {
            assert_eq!(status.code, 403);
            assert_eq!(status.status_text, "403 Forbidden");
            assert_eq!(status.body, "forbidden");
        }
        other => panic!("Expected Status error, got {other:?}"),
    }
    assert!(err.requires_reauth());
}

#[tokio::test]
async fn test_text_mode_sentinel_only_is_malformed() {
    let server = MockServer::start().await;
    mount_conversation(&server, "application/json", "data: [DONE]\n\n".into()).await;

    let client = client_for(&server);
    let request = ConversationThread::default().next_request("hi");
    let err = client.conversation(ACCESS_TOKEN, &request).await.unwrap_err();
    assert!(matches!(err, Error::MalformedBody(_)));
}

#[tokio::test]
async fn test_stream_skips_noise_and_delivers_in_order() {
    let server = MockServer::start().await;
    let body = [
        frame("conv-1", "asst-1", "A"),
        "data: {keepalive".to_string(),
        frame("conv-1", "asst-1", "AB"),
        String::new(),
        frame("conv-1", "asst-1", "ABC"),
        "data: [DONE]".to_string(),
    ]
    .join("\n");
    mount_conversation(&server, "text/event-stream", body).await;

    let client = client_for(&server);
    let request = ConversationThread::default().next_request("hi");
    let mut connected = 0;
    let mut seen = Vec::new();

    let outcome = client
        .conversation_stream(
            ACCESS_TOKEN,
            &request,
            || connected += 1,
            |frame| {
                seen.push(frame.text().unwrap_or_default().to_string());
                Ok(ControlFlow::Continue(()))
            },
        )
        .await
        .unwrap();

    assert_eq!(connected, 1);
    assert_eq!(seen, vec!["A", "AB", "ABC"]);
    let last = outcome.into_response().unwrap();
    assert_eq!(last.text(), Some("ABC"));
}

#[tokio::test]
async fn test_stream_cancel_stops_after_first_frame() {
    let server = MockServer::start().await;
    let body = body_of(&[
        frame("conv-1", "asst-1", "A"),
        frame("conv-1", "asst-1", "AB"),
        frame("conv-1", "asst-1", "ABC"),
    ]);
    mount_conversation(&server, "text/event-stream", body).await;

    let client = client_for(&server);
    let request = ConversationThread::default().next_request("hi");
    let mut calls = 0;

    let outcome = client
        .conversation_stream(ACCESS_TOKEN, &request, || {}, |_| {
            calls += 1;
            Ok(ControlFlow::Break(()))
        })
        .await
        .unwrap();

    assert_eq!(outcome, StreamOutcome::Cancelled);
    assert_eq!(calls, 1);
}

#[tokio::test]
async fn test_stream_forbidden_never_connects() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CONVERSATION_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = ConversationThread::default().next_request("hi");
    let mut connected = false;

    let err = client
        .conversation_stream(ACCESS_TOKEN, &request, || connected = true, |_| {
            Ok(ControlFlow::Continue(()))
        })
        .await
        .unwrap_err();

    assert!(!connected);
    assert_eq!(err.status_code(), Some(403));
    match err {
        Error::Status(status) => assert_eq!(status.body, "forbidden"),
        other => panic!("Expected Status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_host_is_transport_error() {
    let client = chatgpt_bridge::ChatClient::builder()
        .base_url("http://127.0.0.1:1")
        .build()
        .unwrap();
    let request = ConversationThread::default().next_request("hi");

    let err = client.conversation(ACCESS_TOKEN, &request).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(err.status_code(), None);
}
