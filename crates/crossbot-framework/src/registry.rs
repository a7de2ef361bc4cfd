//! The component registry.
//!
//! Maps a composite `(type, key)` to a registered component. The mapping is
//! an immutable snapshot behind an `Arc`; every mutation builds a new map and
//! swaps it in, so a concurrent [`get`](ComponentRegistry::get) sees the
//! registry either fully before or fully after a `load` / `reload`.
//!
//! ```rust,ignore
//! let registry = ComponentRegistry::new();
//! let report = registry.load(linked_sources(&config.components.groups)).await;
//! info!(%report, "Components loaded");
//!
//! // later
//! registry.reload().await;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crossbot_core::options::find_duplicate_name;
use crossbot_core::{BoxError, ComponentType};
use futures::FutureExt;
use futures::future;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::component::{BoxedComponent, ComponentKey};
use crate::error::SourceError;
use crate::source::BoxedSource;

type ComponentMap = HashMap<ComponentKey, BoxedComponent>;

/// Summary of one `load` or `reload`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Components inserted (overwrites included).
    pub loaded: usize,
    /// Names of groups that failed to load.
    pub failed: Vec<String>,
    /// Components skipped because their option schema was invalid.
    pub rejected: Vec<String>,
}

impl LoadReport {
    /// Returns `true` if every group and component loaded.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.rejected.is_empty()
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} component(s) loaded, {} group(s) failed, {} component(s) rejected",
            self.loaded,
            self.failed.len(),
            self.rejected.len()
        )
    }
}

/// Process-wide store of loaded components.
pub struct ComponentRegistry {
    components: RwLock<Arc<ComponentMap>>,
    /// Sources of the most recent `load`, replayed by `reload`.
    sources: RwLock<Vec<BoxedSource>>,
    /// Serializes writers; readers never take it.
    write_lock: Mutex<()>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            components: RwLock::new(Arc::new(HashMap::new())),
            sources: RwLock::new(Vec::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Loads every source and merges the results over the current entries.
    ///
    /// Duplicate keys are overwritten silently, later sources winning. A
    /// source that fails is logged and skipped.
    pub async fn load(&self, sources: Vec<BoxedSource>) -> LoadReport {
        let _guard = self.write_lock.lock().await;
        *self.sources.write() = sources.clone();

        let (loaded, report) = collect(&sources).await;
        let mut next = self.components.read().as_ref().clone();
        for component in loaded {
            let key = ComponentKey::of(component.as_ref());
            if next.insert(key.clone(), component).is_some() {
                debug!(component = %key, "Overwrote existing component");
            }
        }
        self.swap(next);

        info!(%report, total = self.len(), "Component load finished");
        report
    }

    /// Replaces the registry with a fresh load of the last used sources.
    ///
    /// Equivalent to `clear()` followed by `load()`, but the new map is built
    /// off to the side and swapped in once.
    pub async fn reload(&self) -> LoadReport {
        let _guard = self.write_lock.lock().await;
        let sources = self.sources.read().clone();

        let (loaded, report) = collect(&sources).await;
        let next: ComponentMap = loaded
            .into_iter()
            .map(|component| (ComponentKey::of(component.as_ref()), component))
            .collect();
        self.swap(next);

        info!(%report, total = self.len(), "Component reload finished");
        report
    }

    /// Removes every entry. Waits for an in-flight `load` or `reload` to
    /// finish first.
    pub async fn clear(&self) {
        let _guard = self.write_lock.lock().await;
        self.swap(HashMap::new());
        debug!("Component registry cleared");
    }

    fn swap(&self, next: ComponentMap) {
        *self.components.write() = Arc::new(next);
    }

    /// Looks up a component by type and key.
    pub fn get(&self, kind: ComponentType, key: &str) -> Option<BoxedComponent> {
        self.components
            .read()
            .get(&ComponentKey::new(kind, key))
            .cloned()
    }

    /// The current immutable snapshot.
    pub fn snapshot(&self) -> Arc<HashMap<ComponentKey, BoxedComponent>> {
        Arc::clone(&self.components.read())
    }

    /// All components of one type, ordered by key.
    pub fn components_of(&self, kind: ComponentType) -> Vec<BoxedComponent> {
        let snapshot = self.snapshot();
        let mut matching: Vec<(&ComponentKey, &BoxedComponent)> =
            snapshot.iter().filter(|(k, _)| k.kind == kind).collect();
        matching.sort_by(|a, b| a.0.cmp(b.0));
        matching.into_iter().map(|(_, c)| Arc::clone(c)).collect()
    }

    /// All registered keys, ordered.
    pub fn keys(&self) -> Vec<ComponentKey> {
        let mut keys: Vec<ComponentKey> = self.snapshot().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.components.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.read().is_empty()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("len", &self.len())
            .field("sources", &self.sources.read().len())
            .finish()
    }
}

/// Loads all sources concurrently; results are applied in source order.
async fn collect(sources: &[BoxedSource]) -> (Vec<BoxedComponent>, LoadReport) {
    let results = future::join_all(sources.iter().map(|source| async move {
        let outcome = AssertUnwindSafe(source.load())
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                Err(BoxError::from(SourceError::Panicked(
                    source.name().to_string(),
                )))
            });
        (source.name().to_string(), outcome)
    }))
    .await;

    let mut report = LoadReport::default();
    let mut loaded = Vec::new();

    for (name, outcome) in results {
        match outcome {
            Ok(components) => {
                for component in components {
                    if let Some(dup) = find_duplicate_name(component.options()) {
                        let key = ComponentKey::of(component.as_ref());
                        warn!(
                            component = %key,
                            option = dup,
                            "Component declares a duplicate option name, skipping it"
                        );
                        report.rejected.push(key.to_string());
                        continue;
                    }
                    loaded.push(component);
                }
            }
            Err(e) => {
                warn!(
                    group = %name,
                    error = %e,
                    "Failed to load component group, continuing with the others"
                );
                report.failed.push(name);
            }
        }
    }

    report.loaded = loaded.len();
    (loaded, report)
}
