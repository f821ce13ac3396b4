use std::sync::Arc;

use chatgpt_bridge::{ChatClient, ClearanceStore, MemoryClearanceStore};
use wiremock::MockServer;

pub const ACCESS_TOKEN: &str = "access-1";

/// Client pointed at the mock server for both chat and auth hosts.
pub fn client_for(server: &MockServer) -> ChatClient {
    client_with_store(server, Arc::new(MemoryClearanceStore::new()))
}

pub fn client_with_store(server: &MockServer, store: Arc<dyn ClearanceStore>) -> ChatClient {
    ChatClient::builder()
        .base_url(server.uri())
        .store(store)
        .build()
        .expect("client should build against the mock server")
}

/// One `data: ` frame line carrying a cumulative assistant answer.
pub fn frame(conversation_id: &str, message_id: &str, text: &str) -> String {
    let body = serde_json::json!({
        "message": {
            "id": message_id,
            "role": "assistant",
            "content": { "content_type": "text", "parts": [text] },
            "create_time": null,
            "update_time": null,
            "end_turn": null,
            "weight": 1.0,
            "recipient": "all"
        },
        "conversation_id": conversation_id,
        "error": null
    });
    format!("data: {body}")
}

/// Frames joined the way upstream pads them, ending with the sentinel.
pub fn body_of(frames: &[String]) -> String {
    let mut body = frames.join("\n\n");
    body.push_str("\n\ndata: [DONE]\n\n");
    body
}

pub fn header_str<'a>(request: &'a wiremock::Request, name: &str) -> &'a str {
    request
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
