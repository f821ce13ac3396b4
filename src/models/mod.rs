//! Wire data shapes.

pub mod chat;
pub mod clearance;
mod lenient;
pub mod session;

pub use chat::{
    ACTION_NEXT, CONTENT_TYPE_TEXT, ROLE_USER,
    ChatContent, ChatMessage, ChatRequest, ChatResponse, ChatResponseContent,
    ChatResponseMessage,
};
pub use clearance::Clearance;
pub use session::{SessionIdentity, SessionUser};
