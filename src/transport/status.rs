//! Non-2xx classification.
//!
//! Every operation funnels its response through here. Nothing is retried.

use tracing::warn;

use crate::error::{Error, Result, StatusError};

/// Pass a 2xx response through, or consume it into a [`StatusError`].
pub async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    Err(Error::Status(status_error(response).await))
}

/// Read the full body of a failed response into a [`StatusError`].
///
/// A body that cannot be read is replaced by the read error's text.
pub async fn status_error(response: reqwest::Response) -> StatusError {
    let status = response.status();
    let body = match response.text().await {
        Ok(text) => text,
        Err(e) => e.to_string(),
    };
    warn!(status = status.as_u16(), body = body.as_str(), "Upstream returned an error status");
    StatusError::new(status, body)
}
