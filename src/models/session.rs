//! Session identity returned by `api/auth/session`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lenient::{null_as_default, nullable_strings};

/// Safety margin for expiry checks (60 seconds).
const EXPIRY_SAFETY_MARGIN_SECS: i64 = 60;

/// Proactive refresh buffer (5 minutes).
const REFRESH_BUFFER_SECS: i64 = 300;

/// The signed-in account.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionUser {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    /// `null` for accounts without an avatar.
    #[serde(deserialize_with = "null_as_default")]
    pub image: String,
    #[serde(deserialize_with = "null_as_default")]
    pub picture: String,
    #[serde(deserialize_with = "nullable_strings")]
    pub groups: Vec<String>,
    #[serde(deserialize_with = "nullable_strings")]
    pub features: Vec<String>,
}

/// Access token plus identity, as produced by a session refresh.
///
/// `session_token` rotates on every refresh: persist the returned value, not
/// the one that was sent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIdentity {
    #[serde(default, deserialize_with = "null_as_default")]
    pub user: SessionUser,
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub access_token: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub session_token: String,
}

impl SessionIdentity {
    /// True when the access token has expired or will within 60 seconds.
    /// A session without an expiry never reports expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_within(EXPIRY_SAFETY_MARGIN_SECS)
    }

    /// True when the access token expires within 5 minutes.
    #[must_use]
    pub fn needs_refresh(&self) -> bool {
        self.expires_within(REFRESH_BUFFER_SECS)
    }

    fn expires_within(&self, secs: i64) -> bool {
        match self.expires {
            Some(exp) => exp.timestamp() <= Utc::now().timestamp() + secs,
            None => false,
        }
    }
}
