//! The component contract.
//!
//! A component is a registered handler for one `(type, key)` pair. The
//! dispatcher resolves it from the registry, runs its `validate` hook and, if
//! that passes, its `run` hook inside a failure boundary.
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//! use crossbot_framework::prelude::*;
//!
//! struct Ping;
//!
//! #[async_trait]
//! impl Component for Ping {
//!     fn kind(&self) -> ComponentType { ComponentType::Command }
//!     fn key(&self) -> &str { "ping" }
//!
//!     async fn run(&self, interaction: &ReceivedInteraction, _: &OptionsHandler) -> Result<(), BoxError> {
//!         interaction.reply(&GeneratedMessage::text("Pong!")).await?;
//!         Ok(())
//!     }
//! }
//! ```
//!
//! The dispatcher provides no deduplication: a redelivered event runs the
//! component again, so `run` should tolerate repeated invocation.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use crossbot_core::{
    BoxError, ComponentType, GeneratedMessage, OptionSchema, OptionsHandler, ReceivedInteraction,
};

/// A registered handler definition.
#[async_trait]
pub trait Component: Send + Sync {
    /// The component type this handler answers to.
    fn kind(&self) -> ComponentType;

    /// Platform-agnostic name, unique per type.
    fn key(&self) -> &str;

    fn description(&self) -> Option<&str> {
        None
    }

    /// Ordered option schema; empty by default.
    fn options(&self) -> &[OptionSchema] {
        &[]
    }

    /// Checks preconditions before `run`.
    ///
    /// Returning `Some` rejects the dispatch and sends the payload back as
    /// the reply. The default rejects when the supplied options violate the
    /// declared schema.
    async fn validate(
        &self,
        _interaction: &ReceivedInteraction,
        options: &OptionsHandler,
    ) -> Option<GeneratedMessage> {
        options
            .validate()
            .err()
            .map(|e| GeneratedMessage::error("Invalid Options", e.to_string()).ephemeral(true))
    }

    /// Executes the component. Any user-visible output goes through the
    /// interaction's reply or channel capabilities.
    async fn run(
        &self,
        interaction: &ReceivedInteraction,
        options: &OptionsHandler,
    ) -> Result<(), BoxError>;
}

/// Shared handle to a component.
pub type BoxedComponent = Arc<dyn Component>;

/// Composite registry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentKey {
    pub kind: ComponentType,
    pub key: String,
}

impl ComponentKey {
    pub fn new(kind: ComponentType, key: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
        }
    }

    /// The key a component registers under.
    pub fn of(component: &dyn Component) -> Self {
        Self::new(component.kind(), component.key())
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind, self.key)
    }
}
