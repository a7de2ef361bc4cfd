//! Runtime orchestration: load → sync → listen → shutdown.
//!
//! ```rust,ignore
//! use crossbot_runtime::CrossbotRuntime;
//!
//! let runtime = CrossbotRuntime::builder()
//!     .config_file("config/crossbot.toml")
//!     .check(ServerOnly::new())
//!     .build()?;
//!
//! let catalog = runtime.discord_catalog(http.clone());
//! runtime.load_components().await;
//!
//! let listener = runtime.discord_listener(http, cache);
//! listener.start_listening(events);
//!
//! runtime.run().await?;
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crossbot_framework::{
    BoxedCheck, BoxedSource, CatalogSync, ComponentRegistry, DefinitionSource, Dispatcher,
    LoadReport, PreconditionCheck, SyncOutcome, UsageTracker, all_linked_sources, linked_sources,
};
use parking_lot::RwLock;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[cfg(any(feature = "discord", feature = "guilded"))]
use crossbot_framework::Listener;

use crate::config::{ConfigLoader, ConfigResult, CrossbotConfig};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

/// Owns the registry, dispatcher and usage tracker of one bot process.
pub struct CrossbotRuntime {
    config: CrossbotConfig,
    registry: Arc<ComponentRegistry>,
    usage: Arc<UsageTracker>,
    dispatcher: Arc<Dispatcher>,
    /// Loaded after the configured groups.
    extra_sources: RwLock<Vec<BoxedSource>>,
    synchronizers: RwLock<Vec<Arc<dyn CatalogSync>>>,
    shutdown: CancellationToken,
}

impl CrossbotRuntime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Loads configuration from the default locations.
    pub fn load() -> RuntimeResult<Self> {
        Ok(Self::builder().build()?)
    }

    /// Initializes logging and wires the dispatcher from `config`.
    pub fn from_config(config: CrossbotConfig) -> Self {
        Self::with_checks(config, Vec::new())
    }

    fn with_checks(config: CrossbotConfig, checks: Vec<BoxedCheck>) -> Self {
        logging::init_from_config(&config.logging);

        let registry = Arc::new(ComponentRegistry::new());
        let usage = Arc::new(UsageTracker::new());

        let mut dispatcher = Dispatcher::builder(Arc::clone(&registry))
            .usage(Arc::clone(&usage))
            .collector_prefix(config.dispatch.collector_prefix.clone())
            .enforce_preconditions(config.dispatch.enforce_preconditions)
            .maybe_support_url(config.support_url.clone());
        for check in checks {
            dispatcher = dispatcher.boxed_check(check);
        }
        let dispatcher = Arc::new(dispatcher.build());

        info!(
            log_level = %config.logging.level,
            groups = ?config.components.groups,
            prefixes = ?config.dispatch.prefixes,
            enforce_preconditions = config.dispatch.enforce_preconditions,
            "Runtime initialized from configuration"
        );

        Self {
            config,
            registry,
            usage,
            dispatcher,
            extra_sources: RwLock::new(Vec::new()),
            synchronizers: RwLock::new(Vec::new()),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &CrossbotConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn usage(&self) -> &Arc<UsageTracker> {
        &self.usage
    }

    /// Cancelled by [`stop`](Self::stop).
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Adds a source loaded after the configured groups, so its components
    /// win on key collisions.
    pub fn add_source(&self, source: impl DefinitionSource + 'static) {
        self.extra_sources.write().push(Arc::new(source));
    }

    /// Attaches a synchronizer triggered after every load.
    pub fn add_synchronizer(&self, synchronizer: impl CatalogSync + 'static) {
        info!(platform = synchronizer.platform(), "Synchronizer attached");
        self.synchronizers.write().push(Arc::new(synchronizer));
    }

    fn sources(&self) -> Vec<BoxedSource> {
        let groups = &self.config.components.groups;
        let mut sources = if groups.is_empty() {
            all_linked_sources()
        } else {
            linked_sources(groups)
        };
        sources.extend(self.extra_sources.read().iter().cloned());
        sources
    }

    /// Loads every configured group, then reconciles remote catalogs.
    pub async fn load_components(&self) -> LoadReport {
        let report = self.registry.load(self.sources()).await;
        self.log_report(&report);
        self.sync_all().await;
        report
    }

    /// Rebuilds the registry from the last loaded sources, then reconciles
    /// remote catalogs.
    pub async fn reload_components(&self) -> LoadReport {
        let report = self.registry.reload().await;
        self.log_report(&report);
        self.sync_all().await;
        report
    }

    fn log_report(&self, report: &LoadReport) {
        if report.is_complete() {
            info!(components = self.registry.len(), "{report}");
        } else {
            warn!(
                components = self.registry.len(),
                failed = ?report.failed,
                rejected = ?report.rejected,
                "{report}"
            );
        }
    }

    async fn sync_all(&self) {
        let synchronizers: Vec<_> = self.synchronizers.read().clone();
        for synchronizer in synchronizers {
            let outcome = synchronizer.after_load().await;
            debug!(platform = synchronizer.platform(), ?outcome, "Synchronizer triggered");
            if outcome == SyncOutcome::Failed {
                warn!(platform = synchronizer.platform(), "Remote catalog left stale");
            }
        }
    }

    /// Builds a Guilded listener using the configured prefixes.
    #[cfg(feature = "guilded")]
    pub fn guilded_listener(
        &self,
        http: crossbot_adapter_guilded::SharedHttp,
    ) -> Listener<crossbot_adapter_guilded::GuildedNormalizer> {
        use crossbot_adapter_guilded::{GuildedNormalizer, PrefixParser};

        let parser = PrefixParser::new(self.config.dispatch.prefixes.iter().cloned());
        if !parser.is_enabled() {
            warn!("No text-command prefix configured, Guilded messages will be ignored");
        }
        Listener::new(GuildedNormalizer::new(http, parser), Arc::clone(&self.dispatcher))
            .with_shutdown(self.shutdown.child_token())
    }

    #[cfg(feature = "discord")]
    pub fn discord_listener(
        &self,
        http: crossbot_adapter_discord::SharedHttp,
        cache: Arc<dyn crossbot_adapter_discord::DiscordCache>,
    ) -> Listener<crossbot_adapter_discord::DiscordNormalizer> {
        Listener::new(
            crossbot_adapter_discord::DiscordNormalizer::new(http, cache),
            Arc::clone(&self.dispatcher),
        )
        .with_shutdown(self.shutdown.child_token())
    }

    /// Creates the Discord command catalog and, unless
    /// `discord.sync_commands` is off, attaches a synchronizer for it.
    ///
    /// The gateway client must call
    /// [`DiscordCatalog::mark_ready`](crossbot_adapter_discord::DiscordCatalog::mark_ready)
    /// on `READY`.
    #[cfg(feature = "discord")]
    pub fn discord_catalog(
        &self,
        http: crossbot_adapter_discord::SharedHttp,
    ) -> Arc<crossbot_adapter_discord::DiscordCatalog> {
        use crossbot_framework::CommandSynchronizer;

        let catalog = Arc::new(crossbot_adapter_discord::DiscordCatalog::new(http));
        if self.config.discord.sync_commands {
            self.add_synchronizer(CommandSynchronizer::new(
                Arc::clone(&catalog),
                Arc::clone(&self.registry),
            ));
        } else {
            info!("Discord command sync disabled");
        }
        catalog
    }

    /// Runs until Ctrl+C (or SIGTERM on unix), then stops.
    pub async fn run(&self) -> RuntimeResult<()> {
        info!("Crossbot runtime is now running. Press Ctrl+C to stop.");
        let result = wait_for_shutdown().await;
        self.stop();
        result
    }

    /// Runs until `shutdown` completes, then stops.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            () = shutdown => {}
            () = self.shutdown.cancelled() => {}
        }
        self.stop();
    }

    /// Stops every listener created by this runtime. Dispatches already in
    /// flight run to completion.
    pub fn stop(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        info!("Stopping crossbot runtime");
        self.shutdown.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

impl fmt::Debug for CrossbotRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrossbotRuntime")
            .field("components", &self.registry.len())
            .field("users", &self.usage.count())
            .field("synchronizers", &self.synchronizers.read().len())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

async fn wait_for_shutdown() -> RuntimeResult<()> {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .map_err(RuntimeError::Signal)?;

        tokio::select! {
            result = signal::ctrl_c() => {
                result.map_err(RuntimeError::Signal)?;
                info!("Received Ctrl+C, shutting down");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await.map_err(RuntimeError::Signal)?;
        info!("Received Ctrl+C, shutting down");
    }

    Ok(())
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for a [`CrossbotRuntime`] with custom configuration sources and
/// precondition checks.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    checks: Vec<BoxedCheck>,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
            checks: Vec::new(),
        }
    }

    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    pub fn merge(mut self, config: CrossbotConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Adds a precondition check to the dispatcher.
    pub fn check(mut self, check: impl PreconditionCheck + 'static) -> Self {
        self.checks.push(Arc::new(check));
        self
    }

    pub fn build(self) -> ConfigResult<CrossbotRuntime> {
        let config = self.config_loader.load()?;
        Ok(CrossbotRuntime::with_checks(config, self.checks))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crossbot_core::{BoxError, ComponentType, OptionsHandler, ReceivedInteraction};
    use crossbot_framework::{BoxedComponent, Component, StaticSource, register_components};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Ping(&'static str);

    #[async_trait]
    impl Component for Ping {
        fn kind(&self) -> ComponentType {
            ComponentType::Command
        }

        fn key(&self) -> &str {
            self.0
        }

        async fn run(
            &self,
            _interaction: &ReceivedInteraction,
            _options: &OptionsHandler,
        ) -> Result<(), BoxError> {
            Ok(())
        }
    }

    fn runtime_group() -> Result<Vec<BoxedComponent>, BoxError> {
        Ok(vec![Arc::new(Ping("ping")) as BoxedComponent, Arc::new(Ping("pong"))])
    }

    register_components!(RUNTIME_TEST_GROUP, "runtime-test", runtime_group);

    #[derive(Default)]
    struct CountingSync {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CatalogSync for CountingSync {
        fn platform(&self) -> &str {
            "test"
        }

        async fn after_load(&self) -> SyncOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            SyncOutcome::Synced(0)
        }
    }

    fn config_with_groups(groups: &[&str]) -> CrossbotConfig {
        let mut config = CrossbotConfig::default();
        config.components.groups = groups.iter().map(|g| g.to_string()).collect();
        config
    }

    #[tokio::test]
    async fn test_load_configured_groups() {
        let runtime =
            CrossbotRuntime::from_config(config_with_groups(&["runtime-test", "missing"]));

        let report = runtime.load_components().await;
        assert_eq!(report.loaded, 2);
        assert_eq!(report.failed, vec!["missing"]);
        assert!(runtime.registry().get(ComponentType::Command, "pong").is_some());
    }

    #[tokio::test]
    async fn test_empty_groups_load_every_linked_group() {
        let runtime = CrossbotRuntime::from_config(CrossbotConfig::default());

        let report = runtime.load_components().await;
        assert!(report.is_complete());
        assert!(runtime.registry().get(ComponentType::Command, "ping").is_some());
    }

    #[tokio::test]
    async fn test_extra_sources_load_last() {
        let runtime = CrossbotRuntime::from_config(config_with_groups(&["runtime-test"]));
        let replacement: BoxedComponent = Arc::new(Ping("ping"));
        runtime.add_source(StaticSource::new("overrides", vec![Arc::clone(&replacement)]));

        runtime.load_components().await;
        let loaded = runtime.registry().get(ComponentType::Command, "ping").unwrap();
        assert!(Arc::ptr_eq(&loaded, &replacement));
    }

    #[tokio::test]
    async fn test_synchronizers_run_after_every_load() {
        let runtime = CrossbotRuntime::from_config(config_with_groups(&["runtime-test"]));
        let sync = CountingSync::default();
        let calls = Arc::clone(&sync.calls);
        runtime.add_synchronizer(sync);

        runtime.load_components().await;
        runtime.reload_components().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(runtime.registry().len(), 2);
    }

    #[test]
    fn test_dispatcher_uses_support_url() {
        let mut config = CrossbotConfig::default();
        config.support_url = Some("https://example.com/support".into());
        let runtime = CrossbotRuntime::from_config(config);

        let message = runtime.dispatcher().failure_message(ComponentType::Button);
        assert_eq!(message.links.len(), 1);
        assert_eq!(message.links[0].url, "https://example.com/support");
    }

    #[tokio::test]
    async fn test_run_until_stops_runtime() {
        let runtime = CrossbotRuntime::from_config(CrossbotConfig::default());
        let token = runtime.shutdown_token();

        tokio::time::timeout(
            Duration::from_secs(5),
            runtime.run_until(tokio::time::sleep(Duration::from_millis(10))),
        )
        .await
        .unwrap();

        assert!(runtime.is_stopped());
        assert!(token.is_cancelled());
    }
}
