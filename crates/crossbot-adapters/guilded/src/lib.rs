//! # Crossbot Adapter for Guilded
//!
//! Turns prefixed Guilded chat messages into crossbot command interactions.
//!
//! The websocket client is not part of this crate: it pushes each
//! `ChatMessageCreated` event (with whatever server, channel and author it
//! has cached) into a channel consumed by a
//! [`Listener`](crossbot_framework::Listener) built on [`GuildedNormalizer`].
//!
//! ```rust,ignore
//! let normalizer = GuildedNormalizer::new(http, PrefixParser::new(["!"]));
//! let listener = Listener::new(normalizer, dispatcher);
//! let handle = listener.start_listening(events_rx);
//! ```

pub mod model;
pub mod normalizer;
pub mod prefix;

pub use model::{ChatMessage, ChatMessagePayload, MessageEvent};
pub use normalizer::{GuildedHttp, GuildedNormalizer, SharedHttp};
pub use prefix::{ParsedCommand, PrefixParser, extract_flags};
