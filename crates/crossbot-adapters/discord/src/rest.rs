//! reqwest-backed [`DiscordHttp`].

use std::time::Duration;

use async_trait::async_trait;
use crossbot_core::{DeliveryError, DeliveryResult};
use reqwest::{Client, ClientBuilder, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::http::DiscordHttp;
use crate::model::{ApplicationCommand, ChannelRecord, InteractionResponse, MessagePayload};

/// Discord REST API base.
pub const API_BASE: &str = "https://discord.com/api/v10";

/// A bot-token authenticated REST client.
pub struct RestClient {
    client: Client,
    token: String,
    base: String,
}

impl RestClient {
    pub fn new(token: impl Into<String>) -> DeliveryResult<Self> {
        Self::with_timeout(token, Duration::from_secs(30))
    }

    pub fn with_timeout(token: impl Into<String>, timeout: Duration) -> DeliveryResult<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(DeliveryError::transport)?;
        Ok(Self {
            client,
            token: token.into(),
            base: API_BASE.to_string(),
        })
    }

    /// Points the client at another API base, e.g. a proxy.
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("Authorization", format!("Bot {}", self.token))
    }

    async fn execute(&self, request: RequestBuilder) -> DeliveryResult<reqwest::Response> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(DeliveryError::transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), %body, "Discord API error");
        Err(match status {
            StatusCode::NOT_FOUND => DeliveryError::Rejected(format!("404 Not Found: {body}")),
            status if status.is_client_error() => {
                DeliveryError::Rejected(format!("HTTP {}: {body}", status.as_u16()))
            }
            status => DeliveryError::Transport(format!("HTTP {}: {body}", status.as_u16())),
        })
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> DeliveryResult<T> {
        self.execute(request)
            .await?
            .json()
            .await
            .map_err(DeliveryError::transport)
    }
}

#[async_trait]
impl DiscordHttp for RestClient {
    async fn fetch_channel(&self, channel_id: &str) -> DeliveryResult<ChannelRecord> {
        trace!(%channel_id, "GET channel");
        let request = self.client.get(self.url(&format!("/channels/{channel_id}")));
        self.execute_json(request).await.map_err(|e| match e {
            DeliveryError::Rejected(_) => DeliveryError::ChannelNotFound {
                id: channel_id.to_string(),
            },
            other => other,
        })
    }

    async fn create_message(
        &self,
        channel_id: &str,
        payload: &MessagePayload,
    ) -> DeliveryResult<()> {
        let request = self
            .client
            .post(self.url(&format!("/channels/{channel_id}/messages")))
            .json(payload);
        self.execute(request).await.map(drop)
    }

    async fn create_interaction_response(
        &self,
        interaction_id: &str,
        token: &str,
        response: &InteractionResponse,
    ) -> DeliveryResult<()> {
        let request = self
            .client
            .post(self.url(&format!("/interactions/{interaction_id}/{token}/callback")))
            .json(response);
        self.execute(request).await.map(drop)
    }

    async fn create_followup_message(
        &self,
        application_id: &str,
        token: &str,
        payload: &MessagePayload,
    ) -> DeliveryResult<()> {
        let request = self
            .client
            .post(self.url(&format!("/webhooks/{application_id}/{token}")))
            .json(payload);
        self.execute(request).await.map(drop)
    }

    async fn bulk_overwrite_global_commands(
        &self,
        application_id: &str,
        commands: &[ApplicationCommand],
    ) -> DeliveryResult<()> {
        debug!(%application_id, count = commands.len(), "PUT application commands");
        let request = self
            .client
            .put(self.url(&format!("/applications/{application_id}/commands")))
            .json(commands);
        self.execute(request).await.map(drop)
    }
}
