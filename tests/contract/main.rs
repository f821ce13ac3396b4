//! Contract tests against a mock upstream.

mod common;
mod conversation;
mod session;
