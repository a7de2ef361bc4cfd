//! # Crossbot Core
//!
//! Foundation types for the crossbot dispatch engine.
//!
//! - **Interactions**: the canonical [`ReceivedInteraction`] every platform
//!   event is normalized into, with its [`ServerInfo`], [`ChannelInfo`] and
//!   [`UserInfo`] records and the bound reply capability.
//! - **Messages**: platform-neutral [`GeneratedMessage`] payloads.
//! - **Options**: declared [`OptionSchema`]s and the per-dispatch
//!   [`OptionsHandler`].
//! - **Errors**: the shared error taxonomy.
//!
//! ```text
//! platform event ──▶ Normalizer ──▶ ReceivedInteraction ──▶ Dispatcher
//!                                          │
//!                                          └── reply / channel.send ──▶ platform
//! ```

pub mod error;
pub mod interaction;
pub mod message;
pub mod options;

pub use error::{
    BoxError, DeliveryError, DeliveryResult, OptionError, OptionResult, OptionViolation,
    OptionsValidationError,
};
pub use interaction::{
    ChannelInfo, ChannelResolver, ComponentType, MessageTarget, Origin, RawOptions,
    ReceivedInteraction, Replier, ServerInfo, Source, UnknownComponentType, UserInfo,
};
pub use message::{Embed, EmbedField, EmbedStyle, GeneratedMessage, LinkButton};
pub use options::{OptionChoice, OptionSchema, OptionType, OptionValue, OptionsHandler};

/// Prelude for common imports.
pub mod prelude {
    pub use super::{
        BoxError, ComponentType, GeneratedMessage, OptionSchema, OptionsHandler,
        ReceivedInteraction,
    };
}
