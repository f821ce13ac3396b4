//! Clearance pair validation against the chat host.

use tracing::{info, instrument};

use crate::config::BackendConfig;
use crate::error::Result;
use crate::models::Clearance;
use crate::storage::ClearanceStore;
use crate::transport::headers::clearance_probe_headers;
use crate::transport::{HttpTransport, ensure_success};

/// Check a clearance pair against the chat host and store it on success.
///
/// The store is only written after a 2xx answer. Either half being empty is
/// rejected before any request is made.
#[instrument(skip_all, fields(store = store.name()))]
pub async fn update_clearance(
    transport: &HttpTransport,
    backend: &BackendConfig,
    store: &dyn ClearanceStore,
    token: &str,
    user_agent: &str,
) -> Result<Clearance> {
    let clearance = Clearance::new(token, user_agent);
    clearance.validate()?;

    let headers = clearance_probe_headers(&clearance, &backend.referer_url())?;
    let response = transport.get(&backend.chat_root_url(), headers).await?;
    ensure_success(response).await?;

    store.save(&clearance)?;
    info!("Clearance pair updated");
    Ok(clearance)
}
