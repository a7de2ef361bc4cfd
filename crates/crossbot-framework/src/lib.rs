//! # Crossbot Framework
//!
//! The dispatch engine built on top of the core types.
//!
//! This layer provides:
//! - The [`Component`] contract every registered handler implements
//! - Compile-time component groups and other [`DefinitionSource`]s
//! - The [`ComponentRegistry`] keyed by `(type, key)`
//! - The [`Dispatcher`] pipeline with precondition checks and failure containment
//! - The [`CommandSynchronizer`] reconciling a remote command catalog
//! - Generic platform [`Listener`]s driven by a per-platform [`Normalizer`]

pub mod checks;
pub mod component;
pub mod dispatcher;
pub mod error;
pub mod listener;
pub mod registry;
pub mod source;
pub mod sync;
pub mod usage;

#[cfg(test)]
mod testing;

pub use linkme;

pub use checks::{
    BoxedCheck, CheckResult, NoChecks, PreconditionCheck, RequirePermissions, ServerOnly,
};
pub use component::{BoxedComponent, Component, ComponentKey};
pub use dispatcher::{
    DEFAULT_COLLECTOR_PREFIX, DispatchOutcome, Dispatcher, DispatcherBuilder, FAILURE_TITLE,
    IgnoreReason,
};
pub use error::{SourceError, SyncError, SyncResult};
pub use listener::{Listener, Normalizer};
pub use registry::{ComponentRegistry, LoadReport};
pub use source::{
    BoxedSource, COMPONENT_GROUPS, ComponentGroup, DefinitionSource, LoadFn, StaticSource,
    all_linked_sources, linked_sources,
};
pub use sync::{CatalogSync, CommandSynchronizer, RemoteCatalog, SyncOutcome};
pub use usage::UsageTracker;

/// Prelude for writing components.
pub mod prelude {
    pub use async_trait::async_trait;

    pub use crate::component::{BoxedComponent, Component};
    pub use crate::register_components;
    pub use crossbot_core::prelude::*;
}
