//! Threading state for a linear conversation.

use crate::config::DEFAULT_MODEL;
use crate::error::{Error, Result};
use crate::models::{ChatMessage, ChatRequest, ChatResponse};

/// Tracks the conversation id and the last message id between turns.
///
/// Each response is fed back through [`record`](Self::record) so the next
/// request extends the conversation instead of starting a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationThread {
    conversation_id: Option<String>,
    parent_message_id: String,
    model: String,
}

impl Default for ConversationThread {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

impl ConversationThread {
    /// A new conversation. The first turn hangs off a random root id.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            conversation_id: None,
            parent_message_id: uuid::Uuid::new_v4().to_string(),
            model: model.into(),
        }
    }

    /// Continue an existing conversation after `parent_message_id`.
    pub fn resume(
        model: impl Into<String>,
        conversation_id: impl Into<String>,
        parent_message_id: impl Into<String>,
    ) -> Self {
        Self {
            conversation_id: Some(conversation_id.into()),
            parent_message_id: parent_message_id.into(),
            model: model.into(),
        }
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn parent_message_id(&self) -> &str {
        &self.parent_message_id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the request for the next user turn.
    pub fn next_request(&self, text: impl Into<String>) -> ChatRequest {
        ChatRequest::next(
            ChatMessage::user_text(text),
            self.conversation_id.clone(),
            self.parent_message_id.clone(),
            self.model.clone(),
        )
    }

    /// Advance past an assistant response.
    ///
    /// Adopts the conversation id on first sight. A response for a different
    /// conversation is rejected and leaves the thread unchanged.
    pub fn record(&mut self, response: &ChatResponse) -> Result<()> {
        if !response.conversation_id.is_empty() {
            match &self.conversation_id {
                Some(current) if *current != response.conversation_id => {
                    return Err(Error::ConversationMismatch {
                        expected: current.clone(),
                        actual: response.conversation_id.clone(),
                    });
                }
                Some(_) => {}
                None => self.conversation_id = Some(response.conversation_id.clone()),
            }
        }

        if let Some(id) = response.message_id().filter(|id| !id.is_empty()) {
            self.parent_message_id = id.to_string();
        }
        Ok(())
    }
}
