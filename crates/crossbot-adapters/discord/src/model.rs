//! Discord wire types.
//!
//! Only the subset of the interaction object the normalizer reads, plus the
//! outbound message, interaction-response and application-command shapes.

use crossbot_core::{GeneratedMessage, UserInfo};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::permissions;

/// Interaction kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "u8")]
pub enum InteractionType {
    Ping,
    ApplicationCommand,
    MessageComponent,
    Autocomplete,
    ModalSubmit,
    Unknown(u8),
}

impl From<u8> for InteractionType {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Ping,
            2 => Self::ApplicationCommand,
            3 => Self::MessageComponent,
            4 => Self::Autocomplete,
            5 => Self::ModalSubmit,
            other => Self::Unknown(other),
        }
    }
}

/// Component type codes carried by `MessageComponent` interactions.
pub mod component_type {
    pub const ACTION_ROW: u8 = 1;
    pub const BUTTON: u8 = 2;
    pub const STRING_SELECT: u8 = 3;
    pub const TEXT_INPUT: u8 = 4;
    pub const USER_SELECT: u8 = 5;
    pub const ROLE_SELECT: u8 = 6;
    pub const MENTIONABLE_SELECT: u8 = 7;
    pub const CHANNEL_SELECT: u8 = 8;

    /// Returns `true` for every select-menu variant.
    pub fn is_select(code: u8) -> bool {
        matches!(
            code,
            STRING_SELECT | USER_SELECT | ROLE_SELECT | MENTIONABLE_SELECT | CHANNEL_SELECT
        )
    }
}

/// An inbound interaction.
#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    pub id: String,
    pub application_id: String,
    #[serde(rename = "type")]
    pub kind: InteractionType,
    #[serde(default)]
    pub data: Option<InteractionData>,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    /// Partial channel object, sent by newer API versions.
    #[serde(default)]
    pub channel: Option<PartialChannel>,
    /// Set inside guilds.
    #[serde(default)]
    pub member: Option<Member>,
    /// Set in DMs.
    #[serde(default)]
    pub user: Option<User>,
    pub token: String,
}

impl Interaction {
    /// The acting user, whether in a guild or a DM.
    pub fn author(&self) -> Option<&User> {
        self.member
            .as_ref()
            .and_then(|m| m.user.as_ref())
            .or(self.user.as_ref())
    }

    /// The channel ID, from either the partial object or the bare field.
    pub fn channel_id(&self) -> Option<&str> {
        self.channel
            .as_ref()
            .map(|c| c.id.as_str())
            .or(self.channel_id.as_deref())
    }
}

/// Payload of command, component and modal interactions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InteractionData {
    /// Command name.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub options: Vec<CommandDataOption>,
    /// Component or modal custom id.
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default)]
    pub component_type: Option<u8>,
    /// Selected values of a select menu.
    #[serde(default)]
    pub values: Vec<String>,
    /// Submitted rows of a modal.
    #[serde(default)]
    pub components: Vec<ActionRow>,
}

/// A supplied command option. Subcommands nest their own options.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandDataOption {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub options: Vec<CommandDataOption>,
}

impl CommandDataOption {
    /// Subcommand (1) or subcommand group (2).
    pub fn is_subcommand(&self) -> bool {
        matches!(self.kind, 1 | 2)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionRow {
    #[serde(default)]
    pub components: Vec<ModalField>,
}

/// A submitted modal text input.
#[derive(Debug, Clone, Deserialize)]
pub struct ModalField {
    pub custom_id: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PartialChannel {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub nick: Option<String>,
    /// Guild-specific avatar hash.
    #[serde(default)]
    pub avatar: Option<String>,
    /// Permission bitfield as a decimal string.
    #[serde(default)]
    pub permissions: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl User {
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar
            .as_ref()
            .map(|hash| format!("{CDN_BASE}/avatars/{}/{hash}.png", self.id))
    }
}

const CDN_BASE: &str = "https://cdn.discordapp.com";

/// Builds the canonical user record from the interaction's author.
pub(crate) fn user_info(user: &User, member: Option<&Member>) -> UserInfo {
    let display_name = member
        .and_then(|m| m.nick.clone())
        .or_else(|| user.global_name.clone())
        .unwrap_or_else(|| user.username.clone());

    let permissions = member
        .and_then(|m| m.permissions.as_deref())
        .and_then(|raw| raw.parse::<u64>().ok())
        .map(permissions::flag_names)
        .unwrap_or_default();

    UserInfo {
        id: user.id.clone(),
        display_name: Some(display_name),
        username: Some(user.username.clone()),
        avatar_url: user.avatar_url(),
        permissions,
    }
}

/// A channel as returned by `GET /channels/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

// =============================================================================
// Outbound
// =============================================================================

/// Only visible to the invoking user.
pub const EPHEMERAL_FLAG: u64 = 1 << 6;

/// Body of create-message and interaction-response calls.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MessagePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<EmbedPayload>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
}

impl MessagePayload {
    /// Renders a message for an interaction response.
    pub fn from_message(message: &GeneratedMessage) -> Self {
        let components = if message.links.is_empty() {
            Vec::new()
        } else {
            let buttons: Vec<Value> = message
                .links
                .iter()
                .map(|link| {
                    serde_json::json!({
                        "type": component_type::BUTTON,
                        "style": 5,
                        "label": link.label,
                        "url": link.url,
                    })
                })
                .collect();
            vec![serde_json::json!({
                "type": component_type::ACTION_ROW,
                "components": buttons,
            })]
        };

        Self {
            content: message.content.clone(),
            embeds: message
                .embeds
                .iter()
                .map(|embed| EmbedPayload {
                    title: embed.title.clone(),
                    description: embed.description.clone(),
                    color: embed.color,
                    fields: embed
                        .fields
                        .iter()
                        .map(|f| EmbedFieldPayload {
                            name: f.name.clone(),
                            value: f.value.clone(),
                            inline: f.inline,
                        })
                        .collect(),
                    footer: embed.footer.clone().map(|text| EmbedFooter { text }),
                })
                .collect(),
            components,
            flags: message.ephemeral.then_some(EPHEMERAL_FLAG),
        }
    }

    /// Renders a message for a plain channel send, where ephemeral is not
    /// available.
    pub fn for_channel(message: &GeneratedMessage) -> Self {
        Self {
            flags: None,
            ..Self::from_message(message)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedFieldPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedFieldPayload {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

/// `CHANNEL_MESSAGE_WITH_SOURCE`
pub const RESPONSE_CHANNEL_MESSAGE: u8 = 4;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    pub data: MessagePayload,
}

impl InteractionResponse {
    pub fn message(data: MessagePayload) -> Self {
        Self {
            kind: RESPONSE_CHANNEL_MESSAGE,
            data,
        }
    }
}

// =============================================================================
// Application commands
// =============================================================================

/// `CHAT_INPUT`
pub const COMMAND_CHAT_INPUT: u8 = 1;

/// A global application command declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationCommand {
    #[serde(rename = "type")]
    pub kind: u8,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ApplicationCommandOption>,
}

/// Option type codes.
pub mod option_type {
    pub const STRING: u8 = 3;
    pub const INTEGER: u8 = 4;
    pub const BOOLEAN: u8 = 5;
    pub const NUMBER: u8 = 10;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationCommandOption {
    #[serde(rename = "type")]
    pub kind: u8,
    pub name: String,
    pub description: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<CommandChoice>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandChoice {
    pub name: String,
    pub value: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_interaction_deserializes() {
        let raw = json!({
            "id": "1",
            "application_id": "2",
            "type": 2,
            "token": "t",
            "guild_id": "g",
            "channel_id": "c",
            "member": {
                "nick": "Nicky",
                "permissions": "8",
                "user": { "id": "u", "username": "nick", "avatar": "abc" }
            },
            "data": {
                "name": "ping",
                "options": [{ "name": "loud", "type": 5, "value": true }]
            }
        });

        let interaction: Interaction = serde_json::from_value(raw).unwrap();
        assert_eq!(interaction.kind, InteractionType::ApplicationCommand);
        assert_eq!(interaction.author().unwrap().id, "u");
        assert_eq!(interaction.channel_id(), Some("c"));

        let user = user_info(interaction.author().unwrap(), interaction.member.as_ref());
        assert_eq!(user.display_name.as_deref(), Some("Nicky"));
        assert_eq!(
            user.avatar_url.as_deref(),
            Some("https://cdn.discordapp.com/avatars/u/abc.png")
        );
        assert!(user.has_permission("Administrator"));
    }

    #[test]
    fn test_unknown_interaction_type_is_kept() {
        assert_eq!(InteractionType::from(42), InteractionType::Unknown(42));
    }

    #[test]
    fn test_payload_renders_links_and_flags() {
        let message = GeneratedMessage::error("Oops", "Something broke")
            .with_link("Support Server", "https://example.com")
            .ephemeral(true);

        let payload = serde_json::to_value(MessagePayload::from_message(&message)).unwrap();
        assert_eq!(payload["flags"], json!(64));
        assert_eq!(payload["embeds"][0]["title"], json!("Oops"));
        assert_eq!(payload["components"][0]["components"][0]["style"], json!(5));

        let channel = serde_json::to_value(MessagePayload::for_channel(&message)).unwrap();
        assert!(channel.get("flags").is_none());
    }
}
