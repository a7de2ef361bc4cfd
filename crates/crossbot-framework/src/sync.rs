//! Remote command synchronization.
//!
//! Some platforms keep their own catalog of the commands an application
//! offers. After every registry load, a [`CommandSynchronizer`] maps each
//! `command`-type component into the platform's declaration shape and submits
//! the whole set as one bulk replace. There is no incremental diff: each sync
//! overwrites the remote catalog.
//!
//! ```text
//! registry.load() ──▶ after_load()
//!                       ├─ catalog ready ──▶ bulk_replace(all commands)
//!                       └─ not ready ─────▶ wait for ready() once ──▶ bulk_replace
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use crossbot_core::{BoxError, ComponentType};
use tracing::{debug, info, warn};

use crate::component::Component;
use crate::error::{SyncError, SyncResult};
use crate::registry::ComponentRegistry;

/// A platform's remote command catalog.
#[async_trait]
pub trait RemoteCatalog: Send + Sync + 'static {
    /// The platform's command declaration shape.
    type Declaration: Send + Sync;

    /// Platform name used in logs.
    fn platform(&self) -> &str;

    /// Returns `true` once the platform connection can accept a bulk replace.
    fn is_ready(&self) -> bool;

    /// Resolves once the connection becomes ready.
    async fn ready(&self);

    /// Maps one command component into a declaration.
    fn declare(&self, component: &dyn Component) -> Self::Declaration;

    /// Replaces the entire remote catalog with `declarations`.
    async fn bulk_replace(&self, declarations: Vec<Self::Declaration>) -> Result<(), BoxError>;
}

/// What `after_load` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Submitted this many commands.
    Synced(usize),
    /// The catalog was not ready; a sync will run once it is.
    Deferred,
    /// A deferred sync was already waiting.
    AlreadyPending,
    /// The bulk replace failed; logged.
    Failed,
}

/// Object-safe handle over synchronizers for different catalogs.
#[async_trait]
pub trait CatalogSync: Send + Sync {
    fn platform(&self) -> &str;

    /// Reconciles the catalog after a registry load.
    async fn after_load(&self) -> SyncOutcome;
}

/// Pushes the registry's commands into one remote catalog.
pub struct CommandSynchronizer<C: RemoteCatalog> {
    catalog: Arc<C>,
    registry: Arc<ComponentRegistry>,
    pending: Arc<AtomicBool>,
}

impl<C: RemoteCatalog> CommandSynchronizer<C> {
    pub fn new(catalog: Arc<C>, registry: Arc<ComponentRegistry>) -> Self {
        Self {
            catalog,
            registry,
            pending: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn catalog(&self) -> &Arc<C> {
        &self.catalog
    }

    /// Returns `true` while a deferred sync waits for readiness.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// Submits every command in the registry right now.
    pub async fn sync_now(&self) -> SyncResult<usize> {
        sync_catalog(self.catalog.as_ref(), self.registry.as_ref()).await
    }

    /// Syncs immediately when the catalog is ready, otherwise defers the sync
    /// until it is. At most one deferred sync is pending at a time; it syncs
    /// the registry as it is when readiness fires.
    pub async fn after_load(&self) -> SyncOutcome {
        if self.catalog.is_ready() {
            return report(self.catalog.platform(), self.sync_now().await);
        }

        if self.pending.swap(true, Ordering::SeqCst) {
            debug!(platform = self.catalog.platform(), "Command sync already pending");
            return SyncOutcome::AlreadyPending;
        }

        debug!(
            platform = self.catalog.platform(),
            "Catalog not ready, deferring command sync"
        );
        let catalog = Arc::clone(&self.catalog);
        let registry = Arc::clone(&self.registry);
        let pending = Arc::clone(&self.pending);
        tokio::spawn(async move {
            catalog.ready().await;
            pending.store(false, Ordering::SeqCst);
            report(catalog.platform(), sync_catalog(catalog.as_ref(), registry.as_ref()).await);
        });

        SyncOutcome::Deferred
    }
}

#[async_trait]
impl<C: RemoteCatalog> CatalogSync for CommandSynchronizer<C> {
    fn platform(&self) -> &str {
        self.catalog.platform()
    }

    async fn after_load(&self) -> SyncOutcome {
        CommandSynchronizer::after_load(self).await
    }
}

impl<C: RemoteCatalog> fmt::Debug for CommandSynchronizer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSynchronizer")
            .field("platform", &self.catalog.platform())
            .field("pending", &self.is_pending())
            .finish()
    }
}

async fn sync_catalog<C: RemoteCatalog>(
    catalog: &C,
    registry: &ComponentRegistry,
) -> SyncResult<usize> {
    let declarations: Vec<C::Declaration> = registry
        .components_of(ComponentType::Command)
        .iter()
        .map(|component| catalog.declare(component.as_ref()))
        .collect();
    let count = declarations.len();

    catalog
        .bulk_replace(declarations)
        .await
        .map_err(|source| SyncError::Catalog {
            platform: catalog.platform().to_string(),
            source,
        })?;
    Ok(count)
}

fn report(platform: &str, result: SyncResult<usize>) -> SyncOutcome {
    match result {
        Ok(count) => {
            info!(platform, count, "Synced commands to remote catalog");
            SyncOutcome::Synced(count)
        }
        Err(e) => {
            warn!(platform, error = %e, "Failed to sync commands to remote catalog");
            SyncOutcome::Failed
        }
    }
}
