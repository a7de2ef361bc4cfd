//! # Crossbot Adapter for Discord
//!
//! Normalizes Discord interactions into crossbot's canonical
//! [`ReceivedInteraction`](crossbot_core::ReceivedInteraction) and keeps the
//! application's global command catalog in sync with the registry.
//!
//! The gateway connection is not part of this crate. A gateway client pushes
//! each `INTERACTION_CREATE` payload into a channel consumed by a
//! [`Listener`](crossbot_framework::Listener) built on [`DiscordNormalizer`],
//! and calls [`DiscordCatalog::mark_ready`] when `READY` arrives.
//!
//! ```rust,ignore
//! let http: SharedHttp = Arc::new(RestClient::new(token)?);
//! let listener = Listener::new(
//!     DiscordNormalizer::new(http.clone(), Arc::new(InMemoryCache::new())),
//!     dispatcher,
//! );
//! let catalog = Arc::new(DiscordCatalog::new(http));
//! runtime.add_synchronizer(CommandSynchronizer::new(catalog.clone(), registry));
//! ```
//!
//! ## Features
//!
//! - `rest`: [`RestClient`], a reqwest implementation of [`DiscordHttp`].

pub mod catalog;
pub mod http;
pub mod model;
pub mod normalizer;
pub mod permissions;

#[cfg(feature = "rest")]
pub mod rest;

#[cfg(test)]
mod testing;

pub use catalog::{CatalogError, DEFAULT_DESCRIPTION, DiscordCatalog, declare_command};
pub use http::{DiscordHttp, SharedHttp};
pub use model::{ApplicationCommand, ApplicationCommandOption, Interaction, InteractionType};
pub use normalizer::{DiscordCache, DiscordNormalizer, InMemoryCache, InteractionReplier};

#[cfg(feature = "rest")]
pub use rest::RestClient;
