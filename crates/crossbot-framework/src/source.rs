//! Definition sources feeding the component registry.
//!
//! Components are registered at compile time rather than discovered on disk.
//! Each crate contributes named [`ComponentGroup`]s to the [`COMPONENT_GROUPS`]
//! distributed slice; the runtime resolves the configured group names against
//! it with [`linked_sources`].
//!
//! ```rust,ignore
//! use crossbot_framework::{BoxedComponent, register_components};
//!
//! fn moderation() -> Result<Vec<BoxedComponent>, BoxError> {
//!     Ok(vec![Arc::new(Kick), Arc::new(Ban)])
//! }
//!
//! register_components!(MODERATION, "moderation", moderation);
//! ```
//!
//! Each group loads independently: a failing group is reported by the
//! registry as a warning and never prevents the other groups from loading.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use crossbot_core::BoxError;
use linkme::distributed_slice;

use crate::component::BoxedComponent;
use crate::error::SourceError;

/// Produces the components of one group.
pub type LoadFn = fn() -> Result<Vec<BoxedComponent>, BoxError>;

/// A named, compile-time registered group of component definitions.
#[derive(Clone, Copy)]
pub struct ComponentGroup {
    /// Group name, matched against `components.groups` in the config.
    pub name: &'static str,
    /// Factory for the group's components.
    pub load: LoadFn,
}

impl fmt::Debug for ComponentGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentGroup")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Every component group linked into the binary.
#[distributed_slice]
pub static COMPONENT_GROUPS: [ComponentGroup];

/// Registers a [`ComponentGroup`] into [`COMPONENT_GROUPS`].
///
/// `register_components!(STATIC_NAME, "group-name", loader_fn);`
#[macro_export]
macro_rules! register_components {
    ($ident:ident, $name:expr, $load:expr $(,)?) => {
        #[$crate::linkme::distributed_slice($crate::source::COMPONENT_GROUPS)]
        #[linkme(crate = $crate::linkme)]
        static $ident: $crate::source::ComponentGroup = $crate::source::ComponentGroup {
            name: $name,
            load: $load,
        };
    };
}

// =============================================================================
// DefinitionSource
// =============================================================================

/// One loadable group of component definitions.
#[async_trait]
pub trait DefinitionSource: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Produces the group's components, or fails as a whole.
    async fn load(&self) -> Result<Vec<BoxedComponent>, BoxError>;
}

/// Shared handle to a definition source.
pub type BoxedSource = Arc<dyn DefinitionSource>;

#[async_trait]
impl DefinitionSource for ComponentGroup {
    fn name(&self) -> &str {
        self.name
    }

    async fn load(&self) -> Result<Vec<BoxedComponent>, BoxError> {
        (self.load)()
    }
}

/// An explicit in-code table of components.
pub struct StaticSource {
    name: String,
    components: Vec<BoxedComponent>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, components: Vec<BoxedComponent>) -> Self {
        Self {
            name: name.into(),
            components,
        }
    }
}

#[async_trait]
impl DefinitionSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<Vec<BoxedComponent>, BoxError> {
        Ok(self.components.clone())
    }
}

/// Stand-in for a configured group name nothing registered.
struct MissingGroup(String);

#[async_trait]
impl DefinitionSource for MissingGroup {
    fn name(&self) -> &str {
        &self.0
    }

    async fn load(&self) -> Result<Vec<BoxedComponent>, BoxError> {
        Err(SourceError::GroupNotFound(self.0.clone()).into())
    }
}

/// Resolves group names against [`COMPONENT_GROUPS`], in the given order.
///
/// Unknown names still yield a source; it fails when loaded so the registry
/// reports it like any other broken group.
pub fn linked_sources<S: AsRef<str>>(names: &[S]) -> Vec<BoxedSource> {
    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            match COMPONENT_GROUPS.iter().find(|group| group.name == name) {
                Some(group) => Arc::new(*group) as BoxedSource,
                None => Arc::new(MissingGroup(name.to_string())) as BoxedSource,
            }
        })
        .collect()
}

/// Every linked group as a source.
pub fn all_linked_sources() -> Vec<BoxedSource> {
    COMPONENT_GROUPS
        .iter()
        .map(|group| Arc::new(*group) as BoxedSource)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Recorded;
    use crossbot_core::ComponentType;

    fn utility() -> Result<Vec<BoxedComponent>, BoxError> {
        Ok(vec![Recorded::command("uptime").boxed()])
    }

    crate::register_components!(TEST_UTILITY, "test-utility", utility);

    #[tokio::test]
    async fn test_linked_group_is_found() {
        let sources = linked_sources(&["test-utility"]);
        assert_eq!(sources.len(), 1);
        let components = sources[0].load().await.unwrap();
        assert_eq!(components[0].key(), "uptime");
        assert_eq!(components[0].kind(), ComponentType::Command);
        assert!(all_linked_sources().iter().any(|s| s.name() == "test-utility"));
    }

    #[tokio::test]
    async fn test_unknown_group_fails_on_load() {
        let sources = linked_sources(&["nope"]);
        let err = sources[0].load().await.err().unwrap();
        assert_eq!(err.to_string(), "no component group named 'nope' is registered");
    }
}
