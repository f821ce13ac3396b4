//! Cookie-based session refresh and clearance capture.
//!
//! The session endpoint behaves like a browser page, not an API: it expects
//! the session cookie, the clearance cookie and the User-Agent the clearance
//! was issued to, and answers with a JSON identity plus a rotated session
//! cookie in `Set-Cookie`.

mod clearance;

pub use clearance::update_clearance;

use tracing::{debug, info, instrument};

use crate::config::{BackendConfig, SESSION_COOKIE};
use crate::error::{Error, Result};
use crate::models::SessionIdentity;
use crate::storage::ClearanceStore;
use crate::transport::headers::{find_set_cookie, session_headers};
use crate::transport::{HttpTransport, ensure_success};

/// Exchange a session token for a fresh access token and identity.
///
/// The returned `session_token` is the rotated cookie when upstream sent one,
/// otherwise the token that was passed in.
#[instrument(skip_all, fields(store = store.name()))]
pub async fn refresh(
    transport: &HttpTransport,
    backend: &BackendConfig,
    store: &dyn ClearanceStore,
    session_token: &str,
) -> Result<SessionIdentity> {
    if session_token.trim().is_empty() {
        return Err(Error::InvalidInput("session token is empty".into()));
    }

    let clearance = store.load()?;
    if clearance.is_none() {
        debug!("No clearance pair stored, refreshing with the default user agent");
    }

    let headers = session_headers(
        session_token,
        clearance.as_ref(),
        &backend.user_agent,
        &backend.referer_url(),
    )?;
    let response = transport.get(&backend.session_url(), headers).await?;
    let response = ensure_success(response).await?;

    let rotated = find_set_cookie(response.headers(), SESSION_COOKIE);
    let body = response.bytes().await?;
    let mut identity: SessionIdentity =
        serde_json::from_slice(&body).map_err(|source| Error::Decode {
            line: String::from_utf8_lossy(&body).into_owned(),
            source,
        })?;

    identity.session_token = match rotated {
        Some(token) => {
            info!(user = identity.user.id.as_str(), "Session token rotated");
            token
        }
        None => {
            debug!("No rotated session cookie, keeping the supplied token");
            session_token.to_string()
        }
    };

    Ok(identity)
}
