//! The Discord HTTP capability.
//!
//! The normalizer, repliers and catalog only talk to Discord through
//! [`DiscordHttp`]. The `rest` feature provides a reqwest-backed
//! implementation; tests and custom gateways plug in their own.

use std::sync::Arc;

use async_trait::async_trait;
use crossbot_core::DeliveryResult;

use crate::model::{ApplicationCommand, ChannelRecord, InteractionResponse, MessagePayload};

#[async_trait]
pub trait DiscordHttp: Send + Sync {
    /// `GET /channels/{channel_id}`
    async fn fetch_channel(&self, channel_id: &str) -> DeliveryResult<ChannelRecord>;

    /// `POST /channels/{channel_id}/messages`
    async fn create_message(&self, channel_id: &str, payload: &MessagePayload)
    -> DeliveryResult<()>;

    /// `POST /interactions/{interaction_id}/{token}/callback`
    async fn create_interaction_response(
        &self,
        interaction_id: &str,
        token: &str,
        response: &InteractionResponse,
    ) -> DeliveryResult<()>;

    /// `POST /webhooks/{application_id}/{token}`
    async fn create_followup_message(
        &self,
        application_id: &str,
        token: &str,
        payload: &MessagePayload,
    ) -> DeliveryResult<()>;

    /// `PUT /applications/{application_id}/commands`
    async fn bulk_overwrite_global_commands(
        &self,
        application_id: &str,
        commands: &[ApplicationCommand],
    ) -> DeliveryResult<()>;
}

/// Shared handle to the HTTP capability.
pub type SharedHttp = Arc<dyn DiscordHttp>;
