//! HTTP backend implementation for MDChat
//!
//! This module implements the ChatBackend trait against the MD Agents REST
//! server (`/api/new_chat`, `/api/list_chats`, `/api/history/{id}`,
//! `/api/chat`).

use crate::backend::{ChatBackend, ConversationSummary, HistoryRecord, SendReply};
use crate::config::BackendConfig;
use crate::error::{MdChatError, Result};

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// HTTP chat backend
///
/// # Examples
///
/// ```no_run
/// use mdchat::backend::{ChatBackend, HttpBackend};
/// use mdchat::config::BackendConfig;
///
/// # async fn example() -> mdchat::error::Result<()> {
/// let backend = HttpBackend::new(BackendConfig::default())?;
/// let chat_id = backend.create_conversation().await?;
/// let reply = backend.send_message(&chat_id, "Hello").await?;
/// println!("{}", reply.reply);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

/// Response from `POST /api/new_chat`
#[derive(Debug, Deserialize)]
struct CreateResponse {
    #[serde(alias = "conversation_id")]
    chat_id: String,
}

/// Response from `GET /api/list_chats`
#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default, alias = "conversations")]
    chats: Vec<ConversationSummary>,
}

/// Response from `GET /api/history/{id}`
#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    history: Vec<HistoryRecord>,
}

/// Request body for `POST /api/chat`
#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    chat_id: &'a str,
    message: &'a str,
}

impl HttpBackend {
    /// Create a new HTTP backend
    ///
    /// # Errors
    ///
    /// Returns error if the base URL cannot be parsed or the HTTP client
    /// cannot be built
    ///
    /// # Examples
    ///
    /// ```
    /// use mdchat::backend::HttpBackend;
    /// use mdchat::config::BackendConfig;
    ///
    /// let backend = HttpBackend::new(BackendConfig::default()).unwrap();
    /// assert_eq!(backend.base_url(), "http://127.0.0.1:8000/");
    /// ```
    pub fn new(config: BackendConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            MdChatError::Config(format!("Invalid backend URL {}: {}", config.base_url, e))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("mdchat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MdChatError::Config(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!("Initialized HTTP backend: base_url={}", base_url);

        Ok(Self { client, base_url })
    }

    /// Get the configured base URL
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Build an endpoint URL by appending path segments to the base URL
    ///
    /// Segments are percent-encoded, so conversation ids are safe to pass
    /// through unchanged.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                MdChatError::Config(format!("Backend URL cannot be a base: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Turn a transport error into a network failure
    fn unreachable(what: &str, err: reqwest::Error) -> anyhow::Error {
        tracing::warn!("Failed to reach backend for {}: {}", what, err);
        anyhow::Error::new(MdChatError::Http(err))
            .context(format!("Failed to reach backend for {}", what))
    }

    /// Reject non-success responses
    async fn ensure_success(response: Response, what: &str) -> Result<Response> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Backend returned error {} for {}: {}", status, what, error_text);
            return Err(MdChatError::Network(format!(
                "{} failed with status {}: {}",
                what, status, error_text
            ))
            .into());
        }
        Ok(response)
    }

    /// Decode a successful JSON response
    async fn decode<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
        let response = Self::ensure_success(response, what).await?;
        response.json::<T>().await.map_err(|e| {
            tracing::error!("Failed to parse {} response: {}", what, e);
            MdChatError::Network(format!("Failed to parse {} response: {}", what, e)).into()
        })
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn create_conversation(&self) -> Result<String> {
        let url = self.endpoint(&["api", "new_chat"])?;
        tracing::debug!("Creating conversation: POST {}", url);

        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(|e| Self::unreachable("create conversation", e))?;

        let created: CreateResponse = Self::decode(response, "create conversation").await?;
        Ok(created.chat_id)
    }

    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>> {
        let url = self.endpoint(&["api", "list_chats"])?;
        tracing::debug!("Listing conversations: GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::unreachable("list conversations", e))?;

        let listed: ListResponse = Self::decode(response, "list conversations").await?;
        tracing::debug!("Backend listed {} conversations", listed.chats.len());
        Ok(listed.chats)
    }

    async fn get_history(&self, conversation_id: &str) -> Result<Vec<HistoryRecord>> {
        let url = self.endpoint(&["api", "history", conversation_id])?;
        tracing::debug!("Fetching history: GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::unreachable("get history", e))?;

        let history: HistoryResponse = Self::decode(response, "get history").await?;
        Ok(history.history)
    }

    async fn delete_conversation(&self, conversation_id: &str) -> Result<()> {
        let url = self.endpoint(&["api", "history", conversation_id])?;
        tracing::debug!("Deleting conversation: DELETE {}", url);

        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|e| Self::unreachable("delete conversation", e))?;

        Self::ensure_success(response, "delete conversation").await?;
        Ok(())
    }

    async fn send_message(&self, conversation_id: &str, message: &str) -> Result<SendReply> {
        let url = self.endpoint(&["api", "chat"])?;
        tracing::debug!(
            "Sending message: POST {} ({} chars)",
            url,
            message.chars().count()
        );

        let response = self
            .client
            .post(url)
            .json(&SendRequest {
                chat_id: conversation_id,
                message,
            })
            .send()
            .await
            .map_err(|e| Self::unreachable("send message", e))?;

        Self::decode(response, "send message").await
    }

    async fn health(&self) -> Result<()> {
        let url = self.endpoint(&[])?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::unreachable("health check", e))?;

        Self::ensure_success(response, "health check").await?;
        Ok(())
    }
}
