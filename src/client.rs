//! Main client entry point.

use std::ops::ControlFlow;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::{BackendConfig, ClearanceBackend, Config, HttpConfig};
use crate::decode::{self, StreamOutcome};
use crate::error::{Error, Result};
use crate::models::{ChatRequest, ChatResponse, Clearance, SessionIdentity};
use crate::session;
use crate::storage::{ClearanceStore, FileClearanceStore, MemoryClearanceStore};
use crate::transport::{AcceptMode, HttpTransport, LineStream, ensure_success};

/// Client for the conversation and session endpoints.
///
/// Calls share no mutable state apart from the clearance store, so one
/// client can serve any number of concurrent conversations.
///
/// # Examples
///
/// ```rust,no_run
/// use chatgpt_bridge::{ChatClient, ConversationThread};
///
/// # async fn example() -> chatgpt_bridge::Result<()> {
/// let client = ChatClient::builder().build()?;
/// let identity = client.refresh_session("session-token").await?;
///
/// let mut thread = ConversationThread::default();
/// let request = thread.next_request("Hello!");
/// let response = client.conversation(&identity.access_token, &request).await?;
/// thread.record(&response)?;
///
/// println!("{}", response.text().unwrap_or_default());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ChatClient {
    backend: Arc<BackendConfig>,
    transport: HttpTransport,
    store: Arc<dyn ClearanceStore>,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("backend", &self.backend)
            .field("store", &self.store.name())
            .finish_non_exhaustive()
    }
}

impl ChatClient {
    /// Create a builder for configuring the client.
    pub fn builder() -> ChatClientBuilder {
        ChatClientBuilder::new()
    }

    /// Build a client from loaded configuration, including its clearance
    /// store backend.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store: Arc<dyn ClearanceStore> = match config.clearance.store {
            ClearanceBackend::Memory => Arc::new(MemoryClearanceStore::new()),
            ClearanceBackend::File => Arc::new(FileClearanceStore::new(&config.clearance.path)),
        };
        ChatClientBuilder::new()
            .backend(config.backend.clone())
            .http(config.http.clone())
            .store(store)
            .build()
    }

    pub fn backend(&self) -> &BackendConfig {
        &self.backend
    }

    /// Send a conversation turn and return the successful raw response.
    ///
    /// A non-2xx answer is consumed into [`Error::Status`].
    pub async fn invoke(
        &self,
        access_token: &str,
        request: &ChatRequest,
        accept: AcceptMode,
    ) -> Result<reqwest::Response> {
        if access_token.trim().is_empty() {
            return Err(Error::InvalidInput("access token is empty".into()));
        }
        request.validate()?;

        let response = self
            .transport
            .post_conversation(
                &self.backend.conversation_url(),
                access_token,
                request,
                accept,
                &self.backend.user_agent,
            )
            .await?;
        ensure_success(response).await
    }

    /// Send a turn in buffered mode and return the final frame.
    pub async fn conversation(
        &self,
        access_token: &str,
        request: &ChatRequest,
    ) -> Result<ChatResponse> {
        let response = self.invoke(access_token, request, AcceptMode::Json).await?;
        let body = response.bytes().await?;
        debug!(bytes = body.len(), "Buffered conversation body received");
        decode::extract(&body)
    }

    /// Send a turn in streaming mode, handing each frame to `on_frame`.
    ///
    /// `on_connect` runs once the 2xx status is confirmed, before the body is
    /// read. Returning `ControlFlow::Break` from `on_frame` stops the stream
    /// and closes the connection.
    pub async fn conversation_stream<C, F>(
        &self,
        access_token: &str,
        request: &ChatRequest,
        on_connect: C,
        on_frame: F,
    ) -> Result<StreamOutcome>
    where
        C: FnOnce(),
        F: FnMut(&ChatResponse) -> Result<ControlFlow<()>>,
    {
        let response = self
            .invoke(access_token, request, AcceptMode::EventStream)
            .await?;
        let lines = LineStream::new(response.bytes_stream());
        decode::decode_stream(lines, on_connect, on_frame).await
    }

    /// Exchange a session token for a fresh access token.
    pub async fn refresh_session(&self, session_token: &str) -> Result<SessionIdentity> {
        session::refresh(&self.transport, &self.backend, &*self.store, session_token).await
    }

    /// Validate a clearance pair and store it for later refreshes.
    pub async fn update_clearance(&self, token: &str, user_agent: &str) -> Result<Clearance> {
        session::update_clearance(&self.transport, &self.backend, &*self.store, token, user_agent)
            .await
    }

    /// The clearance pair currently in use, if any.
    pub fn clearance(&self) -> Result<Option<Clearance>> {
        self.store.load()
    }
}

/// Builder for [`ChatClient`].
pub struct ChatClientBuilder {
    backend: BackendConfig,
    http: HttpConfig,
    store: Option<Arc<dyn ClearanceStore>>,
    reqwest_client: Option<reqwest::Client>,
}

impl ChatClientBuilder {
    pub fn new() -> Self {
        Self {
            backend: BackendConfig::default(),
            http: HttpConfig::default(),
            store: None,
            reqwest_client: None,
        }
    }

    /// Endpoints, User-Agent and model.
    pub fn backend(mut self, backend: BackendConfig) -> Self {
        self.backend = backend;
        self
    }

    /// Override both chat and auth hosts.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.backend.auth_base_url = url.clone();
        self.backend.chat_base_url = url;
        self
    }

    /// Timeouts. Ignored when a custom reqwest client is supplied.
    pub fn http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    /// Clearance store. Defaults to a fresh in-memory store.
    pub fn store(mut self, store: Arc<dyn ClearanceStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set a custom reqwest client.
    pub fn reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.reqwest_client = Some(client);
        self
    }

    pub fn build(self) -> Result<ChatClient> {
        for url in [&self.backend.chat_base_url, &self.backend.auth_base_url] {
            url::Url::parse(url)
                .map_err(|e| Error::Config(format!("Invalid base URL '{url}': {e}")))?;
        }

        let transport = match self.reqwest_client {
            Some(client) => HttpTransport::with_client(client),
            None => HttpTransport::new(&self.http)?,
        };
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryClearanceStore::new()));

        info!(
            chat = self.backend.chat_base_url.as_str(),
            store = store.name(),
            "ChatClient initialized"
        );
        Ok(ChatClient {
            backend: Arc::new(self.backend),
            transport,
            store,
        })
    }
}

impl Default for ChatClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
