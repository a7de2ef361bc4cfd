//! In-memory HTTP capability for tests.

use std::time::Duration;

use async_trait::async_trait;
use crossbot_core::{DeliveryError, DeliveryResult};
use parking_lot::Mutex;

use crate::http::DiscordHttp;
use crate::model::{ApplicationCommand, ChannelRecord, InteractionResponse, MessagePayload};

/// Records every call as a short line.
#[derive(Default)]
pub(crate) struct MockHttp {
    pub(crate) calls: Mutex<Vec<String>>,
    pub(crate) commands: Mutex<Vec<ApplicationCommand>>,
    pub(crate) known_channels: Vec<&'static str>,
    pub(crate) reject_overwrite: bool,
    pub(crate) reject_response: bool,
    pub(crate) respond_delay: Option<Duration>,
}

#[async_trait]
impl DiscordHttp for MockHttp {
    async fn fetch_channel(&self, channel_id: &str) -> DeliveryResult<ChannelRecord> {
        self.calls.lock().push(format!("fetch {channel_id}"));
        if self.known_channels.contains(&channel_id) {
            Ok(ChannelRecord {
                id: channel_id.to_string(),
                name: None,
                parent_id: None,
            })
        } else {
            Err(DeliveryError::ChannelNotFound {
                id: channel_id.to_string(),
            })
        }
    }

    async fn create_message(
        &self,
        channel_id: &str,
        _payload: &MessagePayload,
    ) -> DeliveryResult<()> {
        self.calls.lock().push(format!("message {channel_id}"));
        Ok(())
    }

    async fn create_interaction_response(
        &self,
        interaction_id: &str,
        _token: &str,
        response: &InteractionResponse,
    ) -> DeliveryResult<()> {
        if let Some(delay) = self.respond_delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().push(format!(
            "respond {interaction_id} flags={:?}",
            response.data.flags
        ));
        if self.reject_response {
            return Err(DeliveryError::Rejected("404: Unknown interaction".into()));
        }
        Ok(())
    }

    async fn create_followup_message(
        &self,
        application_id: &str,
        _token: &str,
        _payload: &MessagePayload,
    ) -> DeliveryResult<()> {
        self.calls.lock().push(format!("followup {application_id}"));
        Ok(())
    }

    async fn bulk_overwrite_global_commands(
        &self,
        application_id: &str,
        commands: &[ApplicationCommand],
    ) -> DeliveryResult<()> {
        self.calls
            .lock()
            .push(format!("overwrite {application_id} {}", commands.len()));
        if self.reject_overwrite {
            return Err(DeliveryError::Rejected("401: Unauthorized".into()));
        }
        *self.commands.lock() = commands.to_vec();
        Ok(())
    }
}
