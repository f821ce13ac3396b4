//! Conversation request and response shapes for `backend-api/conversation`.

use serde::{Deserialize, Serialize};

use super::lenient::{null_as_default, nullable_strings};

/// Action used for every forward turn.
pub const ACTION_NEXT: &str = "next";

/// Content type of plain text messages.
pub const CONTENT_TYPE_TEXT: &str = "text";

/// Role tag for messages written by the caller.
pub const ROLE_USER: &str = "user";

/// A single outbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Caller-generated unique id (a random UUID).
    pub id: String,
    /// Open role tag: `user`, `assistant`, ...
    pub role: String,
    pub content: ChatContent,
}

impl ChatMessage {
    /// A user text message with a fresh random id.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: ROLE_USER.to_string(),
            content: ChatContent::text(text),
        }
    }
}

/// Body of an outbound message. `parts` is never empty when sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatContent {
    pub content_type: String,
    pub parts: Vec<String>,
}

impl ChatContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content_type: CONTENT_TYPE_TEXT.to_string(),
            parts: vec![text.into()],
        }
    }
}

/// Request body for the conversation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub action: String,
    /// Absent on the first turn of a new conversation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub messages: Vec<ChatMessage>,
    /// Id of the immediately preceding message, or a root sentinel.
    pub parent_message_id: String,
    pub model: String,
}

impl ChatRequest {
    /// Build a `next` turn carrying a single message.
    pub fn next(
        message: ChatMessage,
        conversation_id: Option<String>,
        parent_message_id: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            action: ACTION_NEXT.to_string(),
            conversation_id,
            messages: vec![message],
            parent_message_id: parent_message_id.into(),
            model: model.into(),
        }
    }

    /// Check the invariants the upstream relies on before sending.
    pub fn validate(&self) -> crate::Result<()> {
        if self.messages.is_empty() {
            return Err(crate::Error::InvalidInput("request has no messages".into()));
        }
        if let Some(msg) = self.messages.iter().find(|m| m.content.parts.is_empty()) {
            return Err(crate::Error::InvalidInput(format!(
                "message {} has no content parts",
                msg.id
            )));
        }
        if self.parent_message_id.is_empty() {
            return Err(crate::Error::InvalidInput("parent_message_id is empty".into()));
        }
        Ok(())
    }
}

/// Content of an assistant message. Only `parts[0]` carries text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatResponseContent {
    #[serde(deserialize_with = "null_as_default")]
    pub content_type: String,
    #[serde(deserialize_with = "nullable_strings")]
    pub parts: Vec<String>,
}

/// The assistant message inside a frame.
///
/// Every field is optional on the wire: absent or `null` values decode to
/// their zero value instead of rejecting the frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatResponseMessage {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub role: String,
    #[serde(deserialize_with = "null_as_default")]
    pub content: ChatResponseContent,
    // Upstream has sent both strings and epoch floats here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_turn: Option<serde_json::Value>,
    #[serde(deserialize_with = "null_as_default")]
    pub weight: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub recipient: String,
}

/// One decoded frame: a cumulative snapshot of the answer so far.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatResponse {
    /// Null on error frames.
    pub message: Option<ChatResponseMessage>,
    #[serde(deserialize_with = "null_as_default")]
    pub conversation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatResponse {
    /// The accumulated answer text (`parts[0]`).
    pub fn text(&self) -> Option<&str> {
        self.message
            .as_ref()
            .and_then(|m| m.content.parts.first())
            .map(String::as_str)
    }

    /// Id of the assistant message, used as the next turn's parent.
    pub fn message_id(&self) -> Option<&str> {
        self.message.as_ref().map(|m| m.id.as_str())
    }
}
