//! Test doubles shared by the framework's unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use crossbot_core::{
    BoxError, ComponentType, DeliveryError, DeliveryResult, GeneratedMessage, OptionSchema,
    OptionsHandler, Origin, ReceivedInteraction, Replier, ServerInfo, UserInfo,
};
use parking_lot::Mutex;

use crate::component::{BoxedComponent, Component};

enum Behavior {
    Succeed,
    Fail(&'static str),
    Panic,
    Reject(GeneratedMessage),
}

/// A component that records how often it ran.
pub(crate) struct Recorded {
    kind: ComponentType,
    key: String,
    description: Option<String>,
    options: Vec<OptionSchema>,
    behavior: Behavior,
    runs: AtomicUsize,
}

impl Recorded {
    pub(crate) fn of(kind: ComponentType, key: &str) -> Self {
        Self {
            kind,
            key: key.to_string(),
            description: None,
            options: Vec::new(),
            behavior: Behavior::Succeed,
            runs: AtomicUsize::new(0),
        }
    }

    pub(crate) fn command(key: &str) -> Self {
        Self::of(ComponentType::Command, key)
    }

    pub(crate) fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub(crate) fn option(mut self, option: OptionSchema) -> Self {
        self.options.push(option);
        self
    }

    pub(crate) fn failing(mut self, message: &'static str) -> Self {
        self.behavior = Behavior::Fail(message);
        self
    }

    pub(crate) fn panicking(mut self) -> Self {
        self.behavior = Behavior::Panic;
        self
    }

    pub(crate) fn rejecting(mut self, message: GeneratedMessage) -> Self {
        self.behavior = Behavior::Reject(message);
        self
    }

    pub(crate) fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub(crate) fn boxed(self) -> BoxedComponent {
        Arc::new(self)
    }
}

#[async_trait]
impl Component for Recorded {
    fn kind(&self) -> ComponentType {
        self.kind
    }

    fn key(&self) -> &str {
        &self.key
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn options(&self) -> &[OptionSchema] {
        &self.options
    }

    async fn validate(
        &self,
        _interaction: &ReceivedInteraction,
        options: &OptionsHandler,
    ) -> Option<GeneratedMessage> {
        match &self.behavior {
            Behavior::Reject(message) => Some(message.clone()),
            _ => options
                .validate()
                .err()
                .map(|e| GeneratedMessage::error("Invalid Options", e.to_string()).ephemeral(true)),
        }
    }

    async fn run(
        &self,
        _interaction: &ReceivedInteraction,
        _options: &OptionsHandler,
    ) -> Result<(), BoxError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Fail(message) => Err((*message).into()),
            Behavior::Panic => panic!("component exploded"),
            _ => Ok(()),
        }
    }
}

/// Captures every reply sent through it.
#[derive(Default)]
pub(crate) struct ReplyLog {
    replies: Mutex<Vec<GeneratedMessage>>,
    broken: bool,
}

impl ReplyLog {
    /// A replier whose deliveries always fail.
    pub(crate) fn broken() -> Self {
        Self {
            replies: Mutex::new(Vec::new()),
            broken: true,
        }
    }

    pub(crate) fn replies(&self) -> Vec<GeneratedMessage> {
        self.replies.lock().clone()
    }
}

#[async_trait]
impl Replier for ReplyLog {
    async fn reply(&self, message: &GeneratedMessage) -> DeliveryResult<()> {
        if self.broken {
            return Err(DeliveryError::Rejected("unknown interaction".into()));
        }
        self.replies.lock().push(message.clone());
        Ok(())
    }
}

/// A text-command interaction in a server.
pub(crate) fn text_interaction(
    kind: ComponentType,
    key: &str,
    replies: Arc<ReplyLog>,
) -> ReceivedInteraction {
    ReceivedInteraction::new(
        Origin::Guilded {
            message_id: "m1".into(),
            content: format!("!{key}"),
            args: Vec::new(),
        },
        kind,
        key,
        UserInfo::from_id("u1"),
        replies,
    )
    .with_server(Some(ServerInfo::from_id("s1")))
}

/// A structured interaction, optionally a native component.
pub(crate) fn structured_interaction(
    kind: ComponentType,
    key: &str,
    replies: Arc<ReplyLog>,
) -> ReceivedInteraction {
    ReceivedInteraction::new(
        Origin::Discord {
            interaction_id: "i1".into(),
            application_id: "a1".into(),
            is_component: kind != ComponentType::Command,
        },
        kind,
        key,
        UserInfo::from_id("u1"),
        replies,
    )
}
