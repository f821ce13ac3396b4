//! Anti-bot clearance pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A clearance token and the User-Agent it was issued to.
///
/// Upstream binds the two together, so they are stored, loaded and sent as
/// one value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clearance {
    pub token: String,
    pub user_agent: String,
    pub captured_at: DateTime<Utc>,
}

impl Clearance {
    pub fn new(token: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user_agent: user_agent.into(),
            captured_at: Utc::now(),
        }
    }

    /// Both halves must be present for the pair to be usable.
    pub fn validate(&self) -> crate::Result<()> {
        if self.token.trim().is_empty() {
            return Err(crate::Error::InvalidInput("clearance token is empty".into()));
        }
        if self.user_agent.trim().is_empty() {
            return Err(crate::Error::InvalidInput(
                "clearance user agent is empty".into(),
            ));
        }
        Ok(())
    }
}
