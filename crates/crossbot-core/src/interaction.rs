//! The canonical interaction model.
//!
//! Every platform adapter translates its native events into a single
//! [`ReceivedInteraction`]. The value carries:
//!
//! - shared required fields (`key`, `kind`, `raw_options`, `user`)
//! - optional `server` / `channel` records, filled using the best data the
//!   adapter had at hand (a fully cached object, or just an ID)
//! - an [`Origin`] tag carrying per-platform extensions
//! - a bound reply capability, the only sanctioned way back to the user
//!
//! ```text
//! ReceivedInteraction { key, kind, raw_options, user, replier }
//! ├── server:  Option<ServerInfo>
//! ├── channel: Option<ChannelInfo> ── send() ─┬─ Resolved(MessageTarget)
//! │                                           └─ ById(ChannelResolver) → fetch → send
//! └── origin:  Origin::{Discord, Guilded}
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::error::DeliveryResult;
use crate::message::GeneratedMessage;

/// Raw, untyped options attached to an interaction.
///
/// Structured platforms put already-typed JSON values here; text commands put
/// strings and leave coercion to the options handler.
pub type RawOptions = HashMap<String, Value>;

// ============================================================================
// Source & ComponentType
// ============================================================================

/// The chat platform an interaction came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Discord,
    Guilded,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Discord => "discord",
            Self::Guilded => "guilded",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of user-triggerable action a component handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComponentType {
    Command,
    Button,
    SelectMenu,
    Modal,
}

impl ComponentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Button => "button",
            Self::SelectMenu => "selectMenu",
            Self::Modal => "modal",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown component type name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown component type '{0}'")]
pub struct UnknownComponentType(pub String);

impl FromStr for ComponentType {
    type Err = UnknownComponentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "command" => Ok(Self::Command),
            "button" => Ok(Self::Button),
            "selectmenu" | "select_menu" | "select-menu" => Ok(Self::SelectMenu),
            "modal" => Ok(Self::Modal),
            _ => Err(UnknownComponentType(s.to_string())),
        }
    }
}

// ============================================================================
// Context records
// ============================================================================

/// The server (guild) an interaction happened in.
///
/// Only `id` is guaranteed; the other fields are left empty when the adapter
/// had nothing but an ID to work with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub id: String,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ServerInfo {
    /// A stub carrying only the server ID.
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

/// The user who triggered the interaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Permission flag names held by the user in the current context.
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl UserInfo {
    /// A stub carrying only the user ID.
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Returns `true` if the user holds the named permission flag.
    pub fn has_permission(&self, flag: &str) -> bool {
        self.permissions.iter().any(|p| p.eq_ignore_ascii_case(flag))
    }
}

// ============================================================================
// Capabilities
// ============================================================================

/// A resolved destination that messages can be sent to directly.
#[async_trait]
pub trait MessageTarget: Send + Sync {
    async fn send(&self, message: &GeneratedMessage) -> DeliveryResult<()>;
}

/// Fetches a channel by ID when the adapter only knew its ID.
#[async_trait]
pub trait ChannelResolver: Send + Sync {
    async fn resolve(&self, channel_id: &str) -> DeliveryResult<Arc<dyn MessageTarget>>;
}

/// Replies to the event an interaction was built from.
#[async_trait]
pub trait Replier: Send + Sync {
    async fn reply(&self, message: &GeneratedMessage) -> DeliveryResult<()>;
}

enum ChannelBinding {
    Resolved(Arc<dyn MessageTarget>),
    ById(Arc<dyn ChannelResolver>),
}

/// The channel an interaction happened in, with a bound `send` capability.
pub struct ChannelInfo {
    pub id: String,
    pub name: Option<String>,
    pub parent_id: Option<String>,
    binding: ChannelBinding,
}

impl ChannelInfo {
    /// A channel the adapter already holds a live handle for.
    pub fn resolved(id: impl Into<String>, target: Arc<dyn MessageTarget>) -> Self {
        Self {
            id: id.into(),
            name: None,
            parent_id: None,
            binding: ChannelBinding::Resolved(target),
        }
    }

    /// A channel known only by ID; sending fetches it first.
    pub fn by_id(id: impl Into<String>, resolver: Arc<dyn ChannelResolver>) -> Self {
        Self {
            id: id.into(),
            name: None,
            parent_id: None,
            binding: ChannelBinding::ById(resolver),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_parent_id(mut self, parent_id: Option<String>) -> Self {
        self.parent_id = parent_id;
        self
    }

    /// Returns `true` if the channel was resolved at normalization time.
    pub fn is_resolved(&self) -> bool {
        matches!(self.binding, ChannelBinding::Resolved(_))
    }

    /// Sends a message to this channel.
    pub async fn send(&self, message: &GeneratedMessage) -> DeliveryResult<()> {
        match &self.binding {
            ChannelBinding::Resolved(target) => target.send(message).await,
            ChannelBinding::ById(resolver) => {
                trace!(channel_id = %self.id, "Fetching channel before send");
                let target = resolver.resolve(&self.id).await?;
                target.send(message).await
            }
        }
    }
}

impl fmt::Debug for ChannelInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parent_id", &self.parent_id)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

// ============================================================================
// Origin
// ============================================================================

/// Per-platform extension of an interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Origin {
    /// A structured Discord interaction.
    Discord {
        interaction_id: String,
        application_id: String,
        /// `true` for message components and modals, `false` for commands.
        is_component: bool,
    },
    /// A prefixed text message on Guilded.
    Guilded {
        message_id: String,
        /// Full message content, prefix included.
        content: String,
        /// Whitespace-split tokens after the command key.
        args: Vec<String>,
    },
}

impl Origin {
    pub fn source(&self) -> Source {
        match self {
            Self::Discord { .. } => Source::Discord,
            Self::Guilded { .. } => Source::Guilded,
        }
    }
}

// ============================================================================
// ReceivedInteraction
// ============================================================================

/// One normalized inbound event, consumed once by the dispatcher.
pub struct ReceivedInteraction {
    /// Name of the target component.
    pub key: String,
    /// Component type the event targets.
    pub kind: ComponentType,
    pub raw_options: RawOptions,
    pub server: Option<ServerInfo>,
    pub channel: Option<ChannelInfo>,
    pub user: UserInfo,
    pub origin: Origin,
    replier: Arc<dyn Replier>,
}

impl ReceivedInteraction {
    /// Creates an interaction with no options and no server/channel context.
    pub fn new(
        origin: Origin,
        kind: ComponentType,
        key: impl Into<String>,
        user: UserInfo,
        replier: Arc<dyn Replier>,
    ) -> Self {
        Self {
            key: key.into(),
            kind,
            raw_options: RawOptions::new(),
            server: None,
            channel: None,
            user,
            origin,
            replier,
        }
    }

    pub fn with_options(mut self, raw_options: RawOptions) -> Self {
        self.raw_options = raw_options;
        self
    }

    pub fn with_server(mut self, server: Option<ServerInfo>) -> Self {
        self.server = server;
        self
    }

    pub fn with_channel(mut self, channel: Option<ChannelInfo>) -> Self {
        self.channel = channel;
        self
    }

    /// The platform this interaction came from.
    pub fn source(&self) -> Source {
        self.origin.source()
    }

    /// Returns `true` for platform-native interactive components
    /// (buttons, menus, modals) as opposed to commands.
    pub fn is_platform_component(&self) -> bool {
        matches!(
            self.origin,
            Origin::Discord {
                is_component: true,
                ..
            }
        )
    }

    /// Replies to the originating event.
    pub async fn reply(&self, message: &GeneratedMessage) -> DeliveryResult<()> {
        self.replier.reply(message).await
    }
}

impl fmt::Debug for ReceivedInteraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceivedInteraction")
            .field("source", &self.source())
            .field("kind", &self.kind)
            .field("key", &self.key)
            .field("raw_options", &self.raw_options)
            .field("server", &self.server)
            .field("channel", &self.channel)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeliveryError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<GeneratedMessage>>,
    }

    #[async_trait]
    impl MessageTarget for Recorder {
        async fn send(&self, message: &GeneratedMessage) -> DeliveryResult<()> {
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    struct Resolver {
        target: Arc<Recorder>,
        known: &'static str,
    }

    #[async_trait]
    impl ChannelResolver for Resolver {
        async fn resolve(&self, channel_id: &str) -> DeliveryResult<Arc<dyn MessageTarget>> {
            if channel_id == self.known {
                Ok(self.target.clone())
            } else {
                Err(DeliveryError::ChannelNotFound {
                    id: channel_id.to_string(),
                })
            }
        }
    }

    #[test]
    fn test_component_type_round_trip() {
        for kind in [
            ComponentType::Command,
            ComponentType::Button,
            ComponentType::SelectMenu,
            ComponentType::Modal,
        ] {
            assert_eq!(kind.as_str().parse::<ComponentType>(), Ok(kind));
        }
        assert!("slider".parse::<ComponentType>().is_err());
    }

    #[tokio::test]
    async fn test_resolved_and_by_id_channels_deliver_alike() {
        let recorder = Arc::new(Recorder::default());
        let resolved = ChannelInfo::resolved("c1", recorder.clone());
        let lazy = ChannelInfo::by_id(
            "c1",
            Arc::new(Resolver {
                target: recorder.clone(),
                known: "c1",
            }),
        );

        resolved.send(&GeneratedMessage::text("a")).await.unwrap();
        lazy.send(&GeneratedMessage::text("b")).await.unwrap();

        let sent = recorder.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(resolved.is_resolved());
        assert!(!lazy.is_resolved());
    }

    #[tokio::test]
    async fn test_by_id_channel_surfaces_fetch_failure() {
        let channel = ChannelInfo::by_id(
            "missing",
            Arc::new(Resolver {
                target: Arc::new(Recorder::default()),
                known: "c1",
            }),
        );
        let err = channel.send(&GeneratedMessage::text("x")).await.unwrap_err();
        assert!(matches!(err, DeliveryError::ChannelNotFound { .. }));
    }
}
