//! HTTP client for the chat and auth hosts.

use reqwest::header::HeaderMap;
use tracing::debug;

use crate::config::HttpConfig;
use crate::error::Result;
use crate::models::ChatRequest;
use crate::transport::{AcceptMode, headers};

/// Sends requests upstream. Status handling is left to the caller.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Buffered calls, bounded by the request timeout.
    client: reqwest::Client,
    /// Streaming calls: connect timeout only, the body may stay open.
    stream_client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()?;
        let stream_client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()?;
        Ok(Self {
            client,
            stream_client,
        })
    }

    /// Use one caller-supplied client for both modes.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            stream_client: client.clone(),
            client,
        }
    }

    /// `POST` a conversation turn and return the raw response.
    ///
    /// Dropping the response (or its body stream) closes the connection.
    pub async fn post_conversation(
        &self,
        url: &str,
        access_token: &str,
        request: &ChatRequest,
        accept: AcceptMode,
        user_agent: &str,
    ) -> Result<reqwest::Response> {
        let hdrs = headers::conversation_headers(access_token, accept, user_agent)?;
        let body = serde_json::to_vec(request)?;
        let client = match accept {
            AcceptMode::Json => &self.client,
            AcceptMode::EventStream => &self.stream_client,
        };

        debug!(
            url,
            accept = accept.as_str(),
            conversation_id = request.conversation_id.as_deref().unwrap_or(""),
            "Sending conversation request"
        );

        let response = client.post(url).headers(hdrs).body(body).send().await?;
        debug!(status = response.status().as_u16(), "Conversation response received");
        Ok(response)
    }

    /// `GET` with fully prepared headers.
    pub async fn get(&self, url: &str, hdrs: HeaderMap) -> Result<reqwest::Response> {
        debug!(url, "Sending GET request");
        let response = self.client.get(url).headers(hdrs).send().await?;
        debug!(status = response.status().as_u16(), "GET response received");
        Ok(response)
    }
}
