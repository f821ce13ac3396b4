//! Client for the ChatGPT web backend.
//!
//! Sends conversation turns in buffered or streaming mode, decodes the
//! `data: `-framed replies, and keeps the browser-style session alive through
//! the cookie-based refresh endpoint.
//!
//! ```text
//! ConversationThread -> ChatClient::invoke -> decode::{extract, decode_stream}
//!                                          \-> transport::status (non-2xx)
//! ChatClient::refresh_session -> session::refresh <- storage::ClearanceStore
//! ```

pub mod client;
pub mod config;
pub mod conversation;
pub mod decode;
pub mod error;
pub mod models;
pub mod session;
pub mod storage;
pub mod transport;

pub use client::{ChatClient, ChatClientBuilder};
pub use config::Config;
pub use conversation::ConversationThread;
pub use decode::StreamOutcome;
pub use error::{Error, Result, StatusError};
pub use models::{ChatRequest, ChatResponse, Clearance, SessionIdentity};
pub use storage::{ClearanceStore, FileClearanceStore, MemoryClearanceStore};
pub use transport::AcceptMode;
