//! Guilded wire types.

use crossbot_core::{GeneratedMessage, ServerInfo, UserInfo};
use serde::{Deserialize, Serialize};

/// A chat message as delivered by `ChatMessageCreated`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    #[serde(default)]
    pub server_id: Option<String>,
    pub channel_id: String,
    #[serde(default)]
    pub content: String,
    /// Author ID.
    pub created_by: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub about: Option<String>,
}

impl From<&Server> for ServerInfo {
    fn from(server: &Server) -> Self {
        Self {
            id: server.id.clone(),
            owner_id: Some(server.owner_id.clone()),
            name: Some(server.name.clone()),
            icon_url: server.avatar.clone(),
            description: server.about.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            display_name: Some(user.name.clone()),
            username: Some(user.name.clone()),
            avatar_url: user.avatar.clone(),
            permissions: Vec::new(),
        }
    }
}

/// A message event together with whatever the client had cached for it.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub message: ChatMessage,
    pub server: Option<Server>,
    pub channel: Option<Channel>,
    pub author: Option<User>,
}

impl MessageEvent {
    /// An event with nothing resolved beyond the message itself.
    pub fn bare(message: ChatMessage) -> Self {
        Self {
            message,
            server: None,
            channel: None,
            author: None,
        }
    }
}

// =============================================================================
// Outbound
// =============================================================================

/// Body of `POST /channels/{channelId}/messages`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessagePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<ChatEmbed>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reply_message_ids: Vec<String>,
    /// Only visible to the mentioned and replied-to users.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_private: bool,
}

impl ChatMessagePayload {
    /// Renders a message. Link buttons become markdown links in the content.
    pub fn from_message(message: &GeneratedMessage) -> Self {
        let mut content = message.content.clone();
        if !message.links.is_empty() {
            let links: Vec<String> = message
                .links
                .iter()
                .map(|link| format!("[{}]({})", link.label, link.url))
                .collect();
            let links = links.join(" ");
            content = Some(match content {
                Some(text) => format!("{text}\n{links}"),
                None => links,
            });
        }

        Self {
            content,
            embeds: message
                .embeds
                .iter()
                .map(|embed| ChatEmbed {
                    title: embed.title.clone(),
                    description: embed.description.clone(),
                    color: embed.color,
                    fields: embed
                        .fields
                        .iter()
                        .map(|f| ChatEmbedField {
                            name: f.name.clone(),
                            value: f.value.clone(),
                            inline: f.inline,
                        })
                        .collect(),
                    footer: embed.footer.clone().map(|text| ChatEmbedFooter { text }),
                })
                .collect(),
            reply_message_ids: Vec::new(),
            is_private: false,
        }
    }

    /// Turns the payload into a reply; ephemeral replies become private.
    pub fn replying_to(mut self, message_id: impl Into<String>, private: bool) -> Self {
        self.reply_message_ids = vec![message_id.into()];
        self.is_private = private;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatEmbed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<ChatEmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<ChatEmbedFooter>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatEmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatEmbedFooter {
    pub text: String,
}
