//! The dispatch pipeline.
//!
//! Each [`ReceivedInteraction`] runs through a fixed sequence:
//!
//! 1. **Resolve** the component by `(type, key)`. Native components whose key
//!    carries the collector prefix belong to a message-scoped collector and
//!    are ignored, as are keys nothing is registered under.
//! 2. **Parse options** into an [`OptionsHandler`].
//! 3. **Precondition checks**, observed and logged. They only stop the
//!    dispatch when `enforce_preconditions` is on.
//! 4. **Validate** through the component's hook. A returned payload is sent
//!    back verbatim and the dispatch is rejected.
//! 5. **Mark usage** of the acting user.
//! 6. **Execute** `run` inside a failure boundary. Errors and panics are
//!    logged and replaced by a generic failure message.
//!
//! ```rust,ignore
//! let dispatcher = Dispatcher::builder(registry)
//!     .check(ServerOnly::new())
//!     .support_url("https://example.com/support")
//!     .build();
//!
//! match dispatcher.dispatch(interaction).await {
//!     DispatchOutcome::Succeeded => {}
//!     outcome => debug!(?outcome, "Dispatch did not succeed"),
//! }
//! ```
//!
//! Unrelated dispatches share nothing but the registry snapshot and the
//! usage tracker, so they can run concurrently in any order.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crossbot_core::{ComponentType, GeneratedMessage, OptionsHandler, ReceivedInteraction};
use futures::FutureExt;
use tracing::{Instrument, Level, debug, error, span, trace, warn};

use crate::checks::{BoxedCheck, CheckResult, PreconditionCheck};
use crate::component::BoxedComponent;
use crate::registry::ComponentRegistry;
use crate::usage::UsageTracker;

/// Default reserved prefix for collector-scoped component keys.
pub const DEFAULT_COLLECTOR_PREFIX: &str = "x-";

/// Title of the generic failure message.
pub const FAILURE_TITLE: &str = "An Error Has Occurred";

/// Why a dispatch was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// A native component keyed for a message-scoped collector.
    CollectorScoped,
    /// No component is registered under the key and type.
    Unrouted,
}

/// Terminal state of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Ignored(IgnoreReason),
    /// A precondition or the validate hook refused the interaction.
    Rejected,
    Succeeded,
    /// `run` returned an error or panicked.
    Failed,
}

/// Routes interactions to registered components.
pub struct Dispatcher {
    registry: Arc<ComponentRegistry>,
    checks: Vec<BoxedCheck>,
    usage: Arc<UsageTracker>,
    collector_prefix: String,
    enforce_preconditions: bool,
    support_url: Option<String>,
}

impl Dispatcher {
    /// A dispatcher with no checks and default settings.
    pub fn new(registry: Arc<ComponentRegistry>) -> Self {
        Self::builder(registry).build()
    }

    pub fn builder(registry: Arc<ComponentRegistry>) -> DispatcherBuilder {
        DispatcherBuilder {
            registry,
            checks: Vec::new(),
            usage: None,
            collector_prefix: DEFAULT_COLLECTOR_PREFIX.to_string(),
            enforce_preconditions: false,
            support_url: None,
        }
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    pub fn usage(&self) -> &Arc<UsageTracker> {
        &self.usage
    }

    /// Runs one interaction through the pipeline.
    pub async fn dispatch(&self, interaction: ReceivedInteraction) -> DispatchOutcome {
        let span = span!(
            Level::DEBUG,
            "dispatch",
            source = %interaction.source(),
            kind = %interaction.kind,
            key = %interaction.key,
        );
        self.process(interaction).instrument(span).await
    }

    async fn process(&self, interaction: ReceivedInteraction) -> DispatchOutcome {
        let component = match self.resolve(&interaction) {
            Ok(component) => component,
            Err(reason) => return DispatchOutcome::Ignored(reason),
        };

        let options = OptionsHandler::new(
            interaction.raw_options.clone(),
            component.options().to_vec(),
        );

        if let Some(rejection) = self.run_checks(&component, &interaction).await {
            debug!("Precondition check rejected the interaction");
            if let Some(message) = rejection {
                deliver(&interaction, &message).await;
            }
            return DispatchOutcome::Rejected;
        }

        if let Some(message) = component.validate(&interaction, &options).await {
            debug!("Component validation rejected the interaction");
            deliver(&interaction, &message).await;
            return DispatchOutcome::Rejected;
        }

        if self.usage.record(&interaction.user.id) {
            trace!(user_id = %interaction.user.id, "First interaction from user");
        }

        let result = AssertUnwindSafe(component.run(&interaction, &options))
            .catch_unwind()
            .await;

        let fault = match result {
            Ok(Ok(())) => {
                debug!("Component finished");
                return DispatchOutcome::Succeeded;
            }
            Ok(Err(e)) => e.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };

        error!(
            user_id = %interaction.user.id,
            error = %fault,
            "Component failed while running"
        );
        deliver(&interaction, &self.failure_message(interaction.kind)).await;
        DispatchOutcome::Failed
    }

    fn resolve(&self, interaction: &ReceivedInteraction) -> Result<BoxedComponent, IgnoreReason> {
        if interaction.is_platform_component()
            && interaction.key.starts_with(&self.collector_prefix)
        {
            debug!("Collector-scoped component, leaving it to its collector");
            return Err(IgnoreReason::CollectorScoped);
        }

        self.registry
            .get(interaction.kind, &interaction.key)
            .ok_or_else(|| {
                warn!("No component registered for interaction");
                IgnoreReason::Unrouted
            })
    }

    /// Returns `Some` only when an enforced check failed.
    async fn run_checks(
        &self,
        component: &BoxedComponent,
        interaction: &ReceivedInteraction,
    ) -> Option<Option<GeneratedMessage>> {
        for check in &self.checks {
            if let CheckResult::Fail(message) = check.check(component.as_ref(), interaction).await {
                debug!(check = check.name(), "Precondition check failed");
                if self.enforce_preconditions {
                    return Some(message);
                }
            }
        }
        None
    }

    /// The generic message sent when `run` fails.
    pub fn failure_message(&self, kind: ComponentType) -> GeneratedMessage {
        let noun = match kind {
            ComponentType::Command => "command",
            ComponentType::Button => "button",
            ComponentType::SelectMenu => "select menu",
            ComponentType::Modal => "modal",
        };
        let mut description = format!(
            "An unexpected error was encountered while running this {noun}, \
             my developers have already been notified!"
        );

        match &self.support_url {
            Some(url) => {
                description.push_str(" Feel free to join my support server in the mean time!");
                GeneratedMessage::error(FAILURE_TITLE, description)
                    .with_link("Support Server", url.clone())
                    .ephemeral(true)
            }
            None => GeneratedMessage::error(FAILURE_TITLE, description).ephemeral(true),
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("checks", &self.checks.len())
            .field("collector_prefix", &self.collector_prefix)
            .field("enforce_preconditions", &self.enforce_preconditions)
            .field("support_url", &self.support_url)
            .finish()
    }
}

/// Builder for [`Dispatcher`].
pub struct DispatcherBuilder {
    registry: Arc<ComponentRegistry>,
    checks: Vec<BoxedCheck>,
    usage: Option<Arc<UsageTracker>>,
    collector_prefix: String,
    enforce_preconditions: bool,
    support_url: Option<String>,
}

impl DispatcherBuilder {
    /// Adds a precondition check. Checks run in insertion order.
    pub fn check(mut self, check: impl PreconditionCheck + 'static) -> Self {
        self.checks.push(Arc::new(check));
        self
    }

    pub fn boxed_check(mut self, check: BoxedCheck) -> Self {
        self.checks.push(check);
        self
    }

    /// Shares an existing usage tracker instead of creating one.
    pub fn usage(mut self, usage: Arc<UsageTracker>) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn collector_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.collector_prefix = prefix.into();
        self
    }

    /// Makes failing precondition checks reject the dispatch.
    pub fn enforce_preconditions(mut self, enforce: bool) -> Self {
        self.enforce_preconditions = enforce;
        self
    }

    pub fn support_url(mut self, url: impl Into<String>) -> Self {
        self.support_url = Some(url.into());
        self
    }

    pub fn maybe_support_url(mut self, url: Option<String>) -> Self {
        self.support_url = url;
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            registry: self.registry,
            checks: self.checks,
            usage: self.usage.unwrap_or_default(),
            collector_prefix: self.collector_prefix,
            enforce_preconditions: self.enforce_preconditions,
            support_url: self.support_url,
        }
    }
}

async fn deliver(interaction: &ReceivedInteraction, message: &GeneratedMessage) {
    if let Err(e) = interaction.reply(message).await {
        warn!(error = %e, "Failed to deliver reply");
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
