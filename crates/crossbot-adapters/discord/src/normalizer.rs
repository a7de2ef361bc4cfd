//! Discord interaction normalizer.
//!
//! Turns one [`Interaction`] into a [`ReceivedInteraction`]:
//!
//! | Interaction | kind | key | raw options |
//! |---|---|---|---|
//! | application command | `command` | command name | typed option values |
//! | button | `button` | custom id | none |
//! | select menu | `selectMenu` | custom id | `values`: selected values |
//! | modal submit | `modal` | custom id | text inputs keyed by custom id |
//!
//! Pings and autocomplete requests yield nothing.
//!
//! Server and channel records prefer the [`DiscordCache`], then whatever the
//! payload itself carries, then an ID-only stub.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use crossbot_core::{
    ChannelInfo, ChannelResolver, ComponentType, DeliveryResult, GeneratedMessage,
    MessageTarget, Origin, RawOptions, ReceivedInteraction, Replier, ServerInfo, Source,
};
use crossbot_framework::Normalizer;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::http::SharedHttp;
use crate::model::{
    ChannelRecord, CommandDataOption, Interaction, InteractionData, InteractionResponse,
    InteractionType, MessagePayload, component_type, user_info,
};

// =============================================================================
// Cache
// =============================================================================

/// Read access to whatever guild and channel state the gateway client keeps.
pub trait DiscordCache: Send + Sync {
    fn guild(&self, guild_id: &str) -> Option<ServerInfo>;
    fn channel(&self, channel_id: &str) -> Option<ChannelRecord>;
}

/// A simple cache fed by the gateway client.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    guilds: RwLock<HashMap<String, ServerInfo>>,
    channels: RwLock<HashMap<String, ChannelRecord>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_guild(&self, guild: ServerInfo) {
        self.guilds.write().insert(guild.id.clone(), guild);
    }

    pub fn insert_channel(&self, channel: ChannelRecord) {
        self.channels.write().insert(channel.id.clone(), channel);
    }

    pub fn remove_guild(&self, guild_id: &str) {
        self.guilds.write().remove(guild_id);
    }
}

impl DiscordCache for InMemoryCache {
    fn guild(&self, guild_id: &str) -> Option<ServerInfo> {
        self.guilds.read().get(guild_id).cloned()
    }

    fn channel(&self, channel_id: &str) -> Option<ChannelRecord> {
        self.channels.read().get(channel_id).cloned()
    }
}

// =============================================================================
// Capabilities bound into the interaction
// =============================================================================

/// Sends straight to a known channel.
struct ChannelTarget {
    http: SharedHttp,
    channel_id: String,
}

#[async_trait]
impl MessageTarget for ChannelTarget {
    async fn send(&self, message: &GeneratedMessage) -> DeliveryResult<()> {
        self.http
            .create_message(&self.channel_id, &MessagePayload::for_channel(message))
            .await
    }
}

/// Fetches the channel before handing out a target.
struct ChannelFetcher {
    http: SharedHttp,
}

#[async_trait]
impl ChannelResolver for ChannelFetcher {
    async fn resolve(&self, channel_id: &str) -> DeliveryResult<Arc<dyn MessageTarget>> {
        let channel = self.http.fetch_channel(channel_id).await?;
        Ok(Arc::new(ChannelTarget {
            http: Arc::clone(&self.http),
            channel_id: channel.id,
        }))
    }
}

/// Answers the interaction: the first reply is the interaction response,
/// later replies are follow-up messages.
pub struct InteractionReplier {
    http: SharedHttp,
    interaction_id: String,
    application_id: String,
    token: String,
    responded: Mutex<bool>,
}

impl InteractionReplier {
    pub fn new(http: SharedHttp, interaction: &Interaction) -> Self {
        Self {
            http,
            interaction_id: interaction.id.clone(),
            application_id: interaction.application_id.clone(),
            token: interaction.token.clone(),
            responded: Mutex::new(false),
        }
    }
}

#[async_trait]
impl Replier for InteractionReplier {
    async fn reply(&self, message: &GeneratedMessage) -> DeliveryResult<()> {
        let payload = MessagePayload::from_message(message);

        // Held until the interaction response completes, so no followup
        // overtakes it.
        let mut responded = self.responded.lock().await;
        if *responded {
            drop(responded);
            return self
                .http
                .create_followup_message(&self.application_id, &self.token, &payload)
                .await;
        }

        self.http
            .create_interaction_response(
                &self.interaction_id,
                &self.token,
                &InteractionResponse::message(payload),
            )
            .await?;
        *responded = true;
        Ok(())
    }
}

// =============================================================================
// Normalizer
// =============================================================================

/// Normalizes Discord interactions.
pub struct DiscordNormalizer {
    http: SharedHttp,
    cache: Arc<dyn DiscordCache>,
}

impl DiscordNormalizer {
    pub fn new(http: SharedHttp, cache: Arc<dyn DiscordCache>) -> Self {
        Self { http, cache }
    }

    fn server(&self, interaction: &Interaction) -> Option<ServerInfo> {
        let guild_id = interaction.guild_id.as_deref()?;
        Some(
            self.cache
                .guild(guild_id)
                .unwrap_or_else(|| ServerInfo::from_id(guild_id)),
        )
    }

    fn channel(&self, interaction: &Interaction) -> Option<ChannelInfo> {
        let channel_id = interaction.channel_id()?;

        let known = self.cache.channel(channel_id).or_else(|| {
            interaction.channel.as_ref().map(|c| ChannelRecord {
                id: c.id.clone(),
                name: c.name.clone(),
                parent_id: c.parent_id.clone(),
            })
        });

        Some(match known {
            Some(record) => {
                let target = Arc::new(ChannelTarget {
                    http: Arc::clone(&self.http),
                    channel_id: record.id.clone(),
                });
                let info =
                    ChannelInfo::resolved(record.id, target).with_parent_id(record.parent_id);
                match record.name {
                    Some(name) => info.with_name(name),
                    None => info,
                }
            }
            None => ChannelInfo::by_id(
                channel_id,
                Arc::new(ChannelFetcher {
                    http: Arc::clone(&self.http),
                }),
            ),
        })
    }
}

impl Normalizer for DiscordNormalizer {
    type Event = Interaction;

    fn source(&self) -> Source {
        Source::Discord
    }

    fn normalize(&self, interaction: Interaction) -> Option<ReceivedInteraction> {
        let data = interaction.data.as_ref();
        let (kind, key, raw_options) = match (interaction.kind, data) {
            (InteractionType::ApplicationCommand, Some(data)) => (
                ComponentType::Command,
                data.name.clone()?,
                command_options(&data.options),
            ),
            (InteractionType::MessageComponent, Some(data)) => component_parts(data)?,
            (InteractionType::ModalSubmit, Some(data)) => (
                ComponentType::Modal,
                data.custom_id.clone()?,
                modal_options(data),
            ),
            (kind, _) => {
                trace!(?kind, "Interaction not handled");
                return None;
            }
        };

        let Some(author) = interaction.author() else {
            debug!(interaction_id = %interaction.id, "Interaction without an author, skipping");
            return None;
        };
        let user = user_info(author, interaction.member.as_ref());

        let server = self.server(&interaction);
        let channel = self.channel(&interaction);
        let replier = Arc::new(InteractionReplier::new(Arc::clone(&self.http), &interaction));

        let origin = Origin::Discord {
            interaction_id: interaction.id.clone(),
            application_id: interaction.application_id.clone(),
            is_component: kind != ComponentType::Command,
        };

        Some(
            ReceivedInteraction::new(origin, kind, key, user, replier)
                .with_options(raw_options)
                .with_server(server)
                .with_channel(channel),
        )
    }
}

/// Flattens command options; a subcommand contributes its name under
/// `subcommand` and its own options at top level.
fn command_options(options: &[CommandDataOption]) -> RawOptions {
    let mut raw = RawOptions::new();
    collect_command_options(options, &mut raw);
    raw
}

fn collect_command_options(options: &[CommandDataOption], raw: &mut RawOptions) {
    for option in options {
        if option.is_subcommand() {
            raw.insert("subcommand".into(), Value::String(option.name.clone()));
            collect_command_options(&option.options, raw);
        } else if let Some(value) = &option.value {
            raw.insert(option.name.clone(), value.clone());
        }
    }
}

fn component_parts(data: &InteractionData) -> Option<(ComponentType, String, RawOptions)> {
    let key = data.custom_id.clone()?;
    let code = data.component_type?;

    if code == component_type::BUTTON {
        Some((ComponentType::Button, key, RawOptions::new()))
    } else if component_type::is_select(code) {
        let mut raw = RawOptions::new();
        raw.insert(
            "values".into(),
            Value::Array(data.values.iter().cloned().map(Value::String).collect()),
        );
        Some((ComponentType::SelectMenu, key, raw))
    } else {
        trace!(component_type = code, "Unsupported component type");
        None
    }
}

fn modal_options(data: &InteractionData) -> RawOptions {
    data.components
        .iter()
        .flat_map(|row| row.components.iter())
        .filter_map(|field| {
            field
                .value
                .clone()
                .map(|value| (field.custom_id.clone(), Value::String(value)))
        })
        .collect()
}
