// ABOUTME: HTTP client for the support backend's conversation and message endpoints.
// ABOUTME: Implements ChatBackend; create-or-get falls back to a lookup on 409.

use anyhow::{Context, Result};
use async_trait::async_trait;
use deskchat_core::model::{Conversation, CreateConversation, Message};
use deskchat_core::traits::ChatBackend;
use reqwest::{header, StatusCode};
use url::Url;

use crate::transport::join_segments;

#[derive(Clone)]
pub struct RestBackend {
    base_url: Url,
    client: reqwest::Client,
    cookie: Option<String>,
}

impl RestBackend {
    /// `cookie` is sent verbatim as the Cookie header on every call
    pub fn new(base_url: &str, cookie: Option<String>) -> Result<Self> {
        let base_url = Url::parse(base_url).context("Invalid backend URL")?;
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url,
            client,
            cookie,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        join_segments(&self.base_url, segments)
    }

    fn get(&self, url: Url) -> reqwest::RequestBuilder {
        self.with_cookie(self.client.get(url))
    }

    fn with_cookie(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.cookie {
            Some(cookie) => request.header(header::COOKIE, cookie),
            None => request,
        }
    }

    /// Fetch a single conversation by id
    pub async fn get_conversation(&self, conversation_id: &str) -> Result<Conversation> {
        let url = self.endpoint(&["api", "conversations", conversation_id])?;
        let response = self
            .get(url)
            .send()
            .await
            .context("Failed to reach backend")?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Failed to fetch conversation {}: {}",
                conversation_id,
                response.status()
            );
        }

        response
            .json()
            .await
            .context("Invalid conversation from backend")
    }
}

#[async_trait]
impl ChatBackend for RestBackend {
    async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        let url = self.endpoint(&["api", "conversations"])?;
        let response = self
            .get(url)
            .send()
            .await
            .context("Failed to reach backend")?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to fetch conversations: {}", response.status());
        }

        let conversations: Vec<Conversation> = response
            .json()
            .await
            .context("Invalid conversation list from backend")?;
        tracing::debug!(count = conversations.len(), "Fetched conversations");
        Ok(conversations)
    }

    async fn create_conversation(&self, request: &CreateConversation) -> Result<Conversation> {
        let url = self.endpoint(&["api", "conversations"])?;
        let response = self
            .with_cookie(self.client.post(url))
            .json(request)
            .send()
            .await
            .context("Failed to reach backend")?;

        if response.status() == StatusCode::CONFLICT {
            tracing::debug!(conversation = %request.conversation_id, "Conversation already exists");
            return self.get_conversation(&request.conversation_id).await;
        }
        if !response.status().is_success() {
            anyhow::bail!(
                "Failed to create conversation {}: {}",
                request.conversation_id,
                response.status()
            );
        }

        response
            .json()
            .await
            .context("Invalid conversation from backend")
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let url = self.endpoint(&["api", "messages", conversation_id])?;
        let response = self
            .get(url)
            .send()
            .await
            .context("Failed to reach backend")?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Failed to fetch messages for {}: {}",
                conversation_id,
                response.status()
            );
        }

        let messages: Vec<Message> = response
            .json()
            .await
            .context("Invalid message list from backend")?;
        tracing::debug!(conversation = %conversation_id, count = messages.len(), "Fetched history");
        Ok(messages)
    }
}
