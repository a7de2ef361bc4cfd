//! # Crossbot
//!
//! A platform-agnostic command and component dispatch engine for chat bots.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐    ┌────────────┐    ┌────────────┐    ┌──────────┐    ┌───────────┐
//! │ platform │───▶│  Listener  │───▶│ Normalizer │───▶│Dispatcher│───▶│ Component │
//! │  events  │    │ (mpsc rx)  │    │ (per-plat.)│    │          │    │   .run()  │
//! └──────────┘    └────────────┘    └────────────┘    └────┬─────┘    └───────────┘
//!                                                          │ lookup
//!                  ┌────────────────┐   after load   ┌─────▼─────┐
//!                  │ Remote catalog │◀───────────────│ Registry  │
//!                  └────────────────┘ (Synchronizer) └───────────┘
//! ```
//!
//! - **Components** are commands, buttons, select menus and modals keyed by
//!   `(type, key)`; groups of them are registered at compile time with
//!   [`register_components!`](crate::framework::register_components).
//! - **Normalizers** turn Discord interactions and Guilded prefixed messages
//!   into one canonical interaction.
//! - The **dispatcher** resolves the component, parses and validates options,
//!   runs precondition checks and contains any fault raised by `run`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use crossbot::prelude::*;
//!
//! struct Ping;
//!
//! #[async_trait]
//! impl Component for Ping {
//!     fn kind(&self) -> ComponentType { ComponentType::Command }
//!     fn key(&self) -> &str { "ping" }
//!
//!     async fn run(&self, interaction: &ReceivedInteraction, _: &OptionsHandler)
//!         -> Result<(), BoxError>
//!     {
//!         interaction.reply(&GeneratedMessage::text("Pong!")).await?;
//!         Ok(())
//!     }
//! }
//!
//! fn general() -> Result<Vec<BoxedComponent>, BoxError> {
//!     Ok(vec![Arc::new(Ping)])
//! }
//!
//! register_components!(GENERAL, "general", general);
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = CrossbotRuntime::load()?;
//!     runtime.load_components().await;
//!     // start platform listeners here
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` (default), `yaml-config`: configuration file formats
//! - `json-log`: JSON log output
//! - `discord`: Discord normalizer and command catalog
//! - `rest`: reqwest-based Discord REST client (implies `discord`)
//! - `guilded`: Guilded prefix-command normalizer

pub use crossbot_core as core;
pub use crossbot_framework as framework;
pub use crossbot_runtime as runtime;

#[cfg(feature = "discord")]
pub use crossbot_adapter_discord as discord;
#[cfg(feature = "guilded")]
pub use crossbot_adapter_guilded as guilded;

/// Everything needed to write components and start a bot.
pub mod prelude {
    pub use std::sync::Arc;

    pub use crossbot_framework::prelude::*;
    pub use crossbot_framework::{
        CheckResult, DispatchOutcome, Listener, PreconditionCheck, RequirePermissions, ServerOnly,
    };
    pub use crossbot_runtime::CrossbotRuntime;
}
