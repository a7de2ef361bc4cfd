//! Guilded message normalizer.
//!
//! Guilded has no structured commands, so every chat message is a candidate:
//! only messages starting with a configured prefix become interactions, always
//! of type `command`, with `--flag value` pairs as raw options.

use std::sync::Arc;

use async_trait::async_trait;
use crossbot_core::{
    ChannelInfo, ChannelResolver, ComponentType, DeliveryResult, GeneratedMessage,
    MessageTarget, Origin, RawOptions, ReceivedInteraction, Replier, ServerInfo, Source, UserInfo,
};
use crossbot_framework::Normalizer;
use serde_json::Value;
use tracing::{debug, trace};

use crate::model::{Channel, ChatMessagePayload, MessageEvent};
use crate::prefix::PrefixParser;

/// The Guilded HTTP capability.
#[async_trait]
pub trait GuildedHttp: Send + Sync {
    /// `GET /channels/{channelId}`
    async fn fetch_channel(&self, channel_id: &str) -> DeliveryResult<Channel>;

    /// `POST /channels/{channelId}/messages`
    async fn create_message(
        &self,
        channel_id: &str,
        payload: &ChatMessagePayload,
    ) -> DeliveryResult<()>;
}

/// Shared handle to the HTTP capability.
pub type SharedHttp = Arc<dyn GuildedHttp>;

struct ChannelTarget {
    http: SharedHttp,
    channel_id: String,
}

#[async_trait]
impl MessageTarget for ChannelTarget {
    async fn send(&self, message: &GeneratedMessage) -> DeliveryResult<()> {
        self.http
            .create_message(&self.channel_id, &ChatMessagePayload::from_message(message))
            .await
    }
}

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

/// Replies to the triggering message; ephemeral replies are sent private.
struct MessageReplier {
    http: SharedHttp,
    channel_id: String,
    message_id: String,
}

#[async_trait]
impl Replier for MessageReplier {
    async fn reply(&self, message: &GeneratedMessage) -> DeliveryResult<()> {
        let payload = ChatMessagePayload::from_message(message)
            .replying_to(self.message_id.clone(), message.ephemeral);
        self.http.create_message(&self.channel_id, &payload).await
    }
}

/// Normalizes Guilded chat messages.
pub struct GuildedNormalizer {
    http: SharedHttp,
    parser: PrefixParser,
}

impl GuildedNormalizer {
    pub fn new(http: SharedHttp, parser: PrefixParser) -> Self {
        Self { http, parser }
    }

    pub fn parser(&self) -> &PrefixParser {
        &self.parser
    }

    fn channel(&self, event: &MessageEvent) -> ChannelInfo {
        match &event.channel {
            Some(channel) => ChannelInfo::resolved(
                channel.id.clone(),
                Arc::new(ChannelTarget {
                    http: Arc::clone(&self.http),
                    channel_id: channel.id.clone(),
                }),
            )
            .with_name(channel.name.clone())
            .with_parent_id(channel.parent_id.clone()),
            None => ChannelInfo::by_id(
                event.message.channel_id.clone(),
                Arc::new(ChannelFetcher {
                    http: Arc::clone(&self.http),
                }),
            ),
        }
    }
}

impl Normalizer for GuildedNormalizer {
    type Event = MessageEvent;

    fn source(&self) -> Source {
        Source::Guilded
    }

    fn normalize(&self, event: MessageEvent) -> Option<ReceivedInteraction> {
        if !self.parser.is_enabled() {
            debug!("No prefix configured, not listening for text commands");
            return None;
        }

        let Some(parsed) = self.parser.parse(&event.message.content) else {
            trace!(message_id = %event.message.id, "Message is not a command");
            return None;
        };

        let server = event
            .server
            .as_ref()
            .map(ServerInfo::from)
            .or_else(|| event.message.server_id.as_deref().map(ServerInfo::from_id));

        let user = event
            .author
            .as_ref()
            .map(UserInfo::from)
            .unwrap_or_else(|| UserInfo::from_id(event.message.created_by.clone()));

        let channel = self.channel(&event);

        let raw_options: RawOptions = parsed
            .flags
            .into_iter()
            .map(|(name, value)| (name, Value::String(value)))
            .collect();

        let replier = Arc::new(MessageReplier {
            http: Arc::clone(&self.http),
            channel_id: event.message.channel_id.clone(),
            message_id: event.message.id.clone(),
        });

        let origin = Origin::Guilded {
            message_id: event.message.id,
            content: event.message.content,
            args: parsed.args,
        };

        Some(
            ReceivedInteraction::new(origin, ComponentType::Command, parsed.key, user, replier)
                .with_options(raw_options)
                .with_server(server)
                .with_channel(Some(channel)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChatMessage, Server, User};
    use crossbot_core::DeliveryError;
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Default)]
    struct MockHttp {
        calls: Mutex<Vec<String>>,
        payloads: Mutex<Vec<ChatMessagePayload>>,
    }

    #[async_trait]
    impl GuildedHttp for MockHttp {
        async fn fetch_channel(&self, channel_id: &str) -> DeliveryResult<Channel> {
            self.calls.lock().push(format!("fetch {channel_id}"));
            if channel_id == "gone" {
                return Err(DeliveryError::ChannelNotFound {
                    id: channel_id.to_string(),
                });
            }
            Ok(Channel {
                id: channel_id.to_string(),
                name: "general".into(),
                parent_id: None,
            })
        }

        async fn create_message(
            &self,
            channel_id: &str,
            payload: &ChatMessagePayload,
        ) -> DeliveryResult<()> {
            self.calls.lock().push(format!("message {channel_id}"));
            self.payloads.lock().push(payload.clone());
            Ok(())
        }
    }

    fn message(content: &str) -> ChatMessage {
        ChatMessage {
            id: "m1".into(),
            server_id: Some("s1".into()),
            channel_id: "c1".into(),
            content: content.into(),
            created_by: "u1".into(),
        }
    }

    fn normalizer(http: Arc<MockHttp>) -> GuildedNormalizer {
        GuildedNormalizer::new(http, PrefixParser::new(["!"]))
    }

    #[test]
    fn test_prefixed_message_becomes_command() {
        let n = normalizer(Arc::default());
        let interaction = n
            .normalize(MessageEvent::bare(message("!ping --loud true")))
            .unwrap();

        assert_eq!(interaction.source(), Source::Guilded);
        assert_eq!(interaction.kind, ComponentType::Command);
        assert_eq!(interaction.key, "ping");
        assert_eq!(interaction.raw_options.len(), 1);
        assert_eq!(interaction.raw_options["loud"], json!("true"));
        assert!(!interaction.is_platform_component());
        match &interaction.origin {
            Origin::Guilded { args, content, .. } => {
                assert_eq!(args, &vec!["--loud".to_string(), "true".to_string()]);
                assert_eq!(content, "!ping --loud true");
            }
            other => panic!("unexpected origin {other:?}"),
        }
    }

    #[test]
    fn test_unprefixed_or_disabled_yields_nothing() {
        let n = normalizer(Arc::default());
        assert!(n.normalize(MessageEvent::bare(message("ping"))).is_none());

        let disabled = GuildedNormalizer::new(
            Arc::new(MockHttp::default()),
            PrefixParser::new(Vec::<String>::new()),
        );
        assert!(disabled.normalize(MessageEvent::bare(message("!ping"))).is_none());
    }

    #[test]
    fn test_fallback_ladder() {
        let n = normalizer(Arc::default());

        let bare = n.normalize(MessageEvent::bare(message("!ping"))).unwrap();
        assert_eq!(bare.server, Some(ServerInfo::from_id("s1")));
        assert_eq!(bare.user, UserInfo::from_id("u1"));
        assert!(!bare.channel.as_ref().unwrap().is_resolved());

        let mut dm = message("!ping");
        dm.server_id = None;
        assert!(n.normalize(MessageEvent::bare(dm)).unwrap().server.is_none());

        let full = n
            .normalize(MessageEvent {
                message: message("!ping"),
                server: Some(Server {
                    id: "s1".into(),
                    owner_id: "owner".into(),
                    name: "Crossbot HQ".into(),
                    avatar: None,
                    about: Some("home".into()),
                }),
                channel: Some(Channel {
                    id: "c1".into(),
                    name: "bots".into(),
                    parent_id: Some("cat".into()),
                }),
                author: Some(User {
                    id: "u1".into(),
                    name: "Alice".into(),
                    avatar: Some("https://img.example/a.png".into()),
                }),
            })
            .unwrap();

        let server = full.server.as_ref().unwrap();
        assert_eq!(server.owner_id.as_deref(), Some("owner"));
        assert_eq!(server.description.as_deref(), Some("home"));
        assert_eq!(full.user.display_name.as_deref(), Some("Alice"));
        assert_eq!(full.user.username.as_deref(), Some("Alice"));
        assert!(full.user.permissions.is_empty());
        let channel = full.channel.as_ref().unwrap();
        assert!(channel.is_resolved());
        assert_eq!(channel.name.as_deref(), Some("bots"));
    }

    #[test]
    fn test_channel_send_and_reply() {
        tokio_test::block_on(async {
            let http = Arc::new(MockHttp::default());
            let n = normalizer(http.clone());
            let interaction = n.normalize(MessageEvent::bare(message("!ping"))).unwrap();

            interaction
                .channel
                .as_ref()
                .unwrap()
                .send(&GeneratedMessage::text("hello"))
                .await
                .unwrap();
            interaction
                .reply(&GeneratedMessage::text("pong").ephemeral(true))
                .await
                .unwrap();

            assert_eq!(
                *http.calls.lock(),
                vec!["fetch c1", "message c1", "message c1"]
            );
            let payloads = http.payloads.lock();
            assert!(payloads[0].reply_message_ids.is_empty());
            assert_eq!(payloads[1].reply_message_ids, vec!["m1"]);
            assert!(payloads[1].is_private);
        });
    }

    #[tokio::test]
    async fn test_unfetchable_channel_surfaces_error() {
        let n = normalizer(Arc::default());
        let mut gone = message("!ping");
        gone.channel_id = "gone".into();

        let interaction = n.normalize(MessageEvent::bare(gone)).unwrap();
        let err = interaction
            .channel
            .as_ref()
            .unwrap()
            .send(&GeneratedMessage::text("hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::ChannelNotFound { .. }));
    }
}
