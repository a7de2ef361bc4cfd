//! Precondition checks run by the dispatcher before `validate`.
//!
//! Checks are observational by default: a failing check is logged and the
//! dispatch continues. With `enforce_preconditions` enabled on the
//! dispatcher, a failing check rejects the dispatch and its payload (if any)
//! is sent as the reply.

use std::sync::Arc;

use async_trait::async_trait;
use crossbot_core::{GeneratedMessage, ReceivedInteraction};

use crate::component::Component;

/// Outcome of a precondition check.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckResult {
    Pass,
    /// The check failed, optionally with a message for the user.
    Fail(Option<GeneratedMessage>),
}

impl CheckResult {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// A platform- or deployment-specific guard.
#[async_trait]
pub trait PreconditionCheck: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    async fn check(
        &self,
        component: &dyn Component,
        interaction: &ReceivedInteraction,
    ) -> CheckResult;
}

/// Shared handle to a check.
pub type BoxedCheck = Arc<dyn PreconditionCheck>;

/// A check that always passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoChecks;

#[async_trait]
impl PreconditionCheck for NoChecks {
    fn name(&self) -> &str {
        "none"
    }

    async fn check(&self, _: &dyn Component, _: &ReceivedInteraction) -> CheckResult {
        CheckResult::Pass
    }
}

/// Fails for interactions that did not happen inside a server.
#[derive(Debug, Clone, Default)]
pub struct ServerOnly {
    message: Option<GeneratedMessage>,
}

impl ServerOnly {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the message sent back when the check fails and is enforced.
    pub fn with_message(mut self, message: GeneratedMessage) -> Self {
        self.message = Some(message);
        self
    }
}

#[async_trait]
impl PreconditionCheck for ServerOnly {
    fn name(&self) -> &str {
        "server-only"
    }

    async fn check(&self, _: &dyn Component, interaction: &ReceivedInteraction) -> CheckResult {
        if interaction.server.is_some() {
            CheckResult::Pass
        } else {
            CheckResult::Fail(self.message.clone())
        }
    }
}

/// Requires the user to hold every listed permission flag.
#[derive(Debug, Clone, Default)]
pub struct RequirePermissions {
    flags: Vec<String>,
}

impl RequirePermissions {
    pub fn new<I, S>(flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            flags: flags.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl PreconditionCheck for RequirePermissions {
    fn name(&self) -> &str {
        "require-permissions"
    }

    async fn check(&self, _: &dyn Component, interaction: &ReceivedInteraction) -> CheckResult {
        let missing: Vec<&str> = self
            .flags
            .iter()
            .filter(|flag| !interaction.user.has_permission(flag))
            .map(String::as_str)
            .collect();

        if missing.is_empty() {
            CheckResult::Pass
        } else {
            CheckResult::Fail(Some(
                GeneratedMessage::error(
                    "Missing Permissions",
                    format!("You need the following permissions: {}", missing.join(", ")),
                )
                .ephemeral(true),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Recorded, ReplyLog, structured_interaction, text_interaction};
    use crossbot_core::ComponentType;

    #[tokio::test]
    async fn test_server_only() {
        let component = Recorded::command("ping");
        let in_server = text_interaction(ComponentType::Command, "ping", Arc::default());
        let in_dm = structured_interaction(ComponentType::Command, "ping", Arc::default());

        let check = ServerOnly::new().with_message(GeneratedMessage::text("servers only"));
        assert!(check.check(&component, &in_server).await.is_pass());
        assert_eq!(
            check.check(&component, &in_dm).await,
            CheckResult::Fail(Some(GeneratedMessage::text("servers only")))
        );
    }

    #[tokio::test]
    async fn test_require_permissions_lists_missing_flags() {
        let component = Recorded::command("ban");
        let mut interaction =
            text_interaction(ComponentType::Command, "ban", Arc::new(ReplyLog::default()));
        interaction.user.permissions = vec!["KickMembers".into()];

        let check = RequirePermissions::new(["KickMembers", "BanMembers"]);
        let CheckResult::Fail(Some(message)) = check.check(&component, &interaction).await else {
            panic!("expected a failing check with a message");
        };
        assert!(message.to_plain_text().contains("BanMembers"));
        assert!(!message.to_plain_text().contains("KickMembers,"));

        interaction.user.permissions.push("banmembers".into());
        assert!(check.check(&component, &interaction).await.is_pass());
    }

    #[tokio::test]
    async fn test_no_checks_passes() {
        let component = Recorded::command("ping");
        let interaction = structured_interaction(ComponentType::Command, "ping", Arc::default());
        assert!(NoChecks.check(&component, &interaction).await.is_pass());
    }
}
