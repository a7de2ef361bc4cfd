//! The Discord application command catalog.
//!
//! Discord is ready for a bulk overwrite once the gateway's `READY` event has
//! told us the application ID. Until then [`DiscordCatalog::is_ready`] is
//! `false` and the synchronizer defers.

use async_trait::async_trait;
use crossbot_core::{BoxError, OptionSchema, OptionType};
use crossbot_framework::{Component, RemoteCatalog};
use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

use crate::http::SharedHttp;
use crate::model::{
    ApplicationCommand, ApplicationCommandOption, COMMAND_CHAT_INPUT, CommandChoice, option_type,
};

/// Fallback for commands and options declared without a description.
pub const DEFAULT_DESCRIPTION: &str = "No description provided";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("application id is not known yet")]
    NotReady,
}

/// Maps an abstract option type to Discord's option type code.
pub fn option_type_code(option_type: OptionType) -> u8 {
    match option_type {
        OptionType::String => option_type::STRING,
        OptionType::Integer => option_type::INTEGER,
        OptionType::Boolean => option_type::BOOLEAN,
        OptionType::Number => option_type::NUMBER,
    }
}

/// Declares one option field by field.
pub fn declare_option(option: &OptionSchema) -> ApplicationCommandOption {
    ApplicationCommandOption {
        kind: option_type_code(option.option_type),
        name: option.name.clone(),
        description: option
            .description
            .clone()
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        required: option.required,
        choices: option.choices.as_ref().map(|choices| {
            choices
                .iter()
                .map(|c| CommandChoice {
                    name: c.name.clone(),
                    value: c.value.clone(),
                })
                .collect()
        }),
        min_value: option.min_value,
        max_value: option.max_value,
        min_length: option.min_length,
        max_length: option.max_length,
    }
}

/// Declares one command component.
pub fn declare_command(component: &dyn Component) -> ApplicationCommand {
    ApplicationCommand {
        kind: COMMAND_CHAT_INPUT,
        name: component.key().to_string(),
        description: component
            .description()
            .unwrap_or(DEFAULT_DESCRIPTION)
            .to_string(),
        options: component.options().iter().map(declare_option).collect(),
    }
}

/// Global application commands of one Discord application.
pub struct DiscordCatalog {
    http: SharedHttp,
    application_id: watch::Sender<Option<String>>,
}

impl DiscordCatalog {
    pub fn new(http: SharedHttp) -> Self {
        Self {
            http,
            application_id: watch::Sender::new(None),
        }
    }

    /// Records the application ID from the gateway `READY` event.
    pub fn mark_ready(&self, application_id: impl Into<String>) {
        let application_id = application_id.into();
        debug!(%application_id, "Discord application ready");
        self.application_id.send_replace(Some(application_id));
    }

    pub fn application_id(&self) -> Option<String> {
        self.application_id.borrow().clone()
    }
}

#[async_trait]
impl RemoteCatalog for DiscordCatalog {
    type Declaration = ApplicationCommand;

    fn platform(&self) -> &str {
        "discord"
    }

    fn is_ready(&self) -> bool {
        self.application_id.borrow().is_some()
    }

    async fn ready(&self) {
        let mut rx = self.application_id.subscribe();
        let _ = rx.wait_for(Option::is_some).await;
    }

    fn declare(&self, component: &dyn Component) -> ApplicationCommand {
        declare_command(component)
    }

    async fn bulk_replace(&self, declarations: Vec<ApplicationCommand>) -> Result<(), BoxError> {
        let application_id = self.application_id().ok_or(CatalogError::NotReady)?;
        self.http
            .bulk_overwrite_global_commands(&application_id, &declarations)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockHttp;
    use crossbot_core::{ComponentType, OptionsHandler, ReceivedInteraction};
    use crossbot_framework::{
        BoxedComponent, CommandSynchronizer, ComponentRegistry, StaticSource, SyncOutcome,
    };
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    struct Declared {
        kind: ComponentType,
        key: &'static str,
        description: Option<&'static str>,
        options: Vec<OptionSchema>,
    }

    #[async_trait]
    impl Component for Declared {
        fn kind(&self) -> ComponentType {
            self.kind
        }

        fn key(&self) -> &str {
            self.key
        }

        fn description(&self) -> Option<&str> {
            self.description
        }

        fn options(&self) -> &[OptionSchema] {
            &self.options
        }

        async fn run(&self, _: &ReceivedInteraction, _: &OptionsHandler) -> Result<(), BoxError> {
            Ok(())
        }
    }

    fn command(key: &'static str) -> Declared {
        Declared {
            kind: ComponentType::Command,
            key,
            description: None,
            options: Vec::new(),
        }
    }

    #[test]
    fn test_declaration_defaults_and_passthrough() {
        let roll = Declared {
            description: Some("Roll a die"),
            options: vec![
                OptionSchema::integer("sides")
                    .required(true)
                    .min_value(2.0)
                    .max_value(100.0),
                OptionSchema::string("label").max_length(32),
                OptionSchema::number("weight"),
                OptionSchema::boolean("secret").choice("yes", true),
            ],
            ..command("roll")
        };

        let declared = declare_command(&roll);
        assert_eq!(declared.description, "Roll a die");
        let value = serde_json::to_value(&declared).unwrap();
        assert_eq!(
            value["options"],
            json!([
                { "type": 4, "name": "sides", "description": DEFAULT_DESCRIPTION, "required": true, "min_value": 2.0, "max_value": 100.0 },
                { "type": 3, "name": "label", "description": DEFAULT_DESCRIPTION, "required": false, "max_length": 32 },
                { "type": 10, "name": "weight", "description": DEFAULT_DESCRIPTION, "required": false },
                { "type": 5, "name": "secret", "description": DEFAULT_DESCRIPTION, "required": false,
                  "choices": [{ "name": "yes", "value": true }] }
            ])
        );

        let bare = declare_command(&command("ping"));
        assert_eq!(bare.description, DEFAULT_DESCRIPTION);
        assert!(bare.options.is_empty());
    }

    #[tokio::test]
    async fn test_sync_waits_for_ready_then_overwrites_commands_only() {
        let registry = Arc::new(ComponentRegistry::new());
        let components: Vec<BoxedComponent> = vec![
            Arc::new(command("ping")),
            Arc::new(command("help")),
            Arc::new(Declared {
                kind: ComponentType::Button,
                ..command("confirm")
            }),
        ];
        registry
            .load(vec![Arc::new(StaticSource::new("core", components))])
            .await;

        let http = Arc::new(MockHttp::default());
        let catalog = Arc::new(DiscordCatalog::new(http.clone()));
        let sync = CommandSynchronizer::new(catalog.clone(), registry);

        assert_eq!(sync.after_load().await, SyncOutcome::Deferred);
        catalog.mark_ready("app");

        tokio::time::timeout(Duration::from_secs(5), async {
            while http.calls.lock().is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        assert_eq!(*http.calls.lock(), vec!["overwrite app 2"]);
        let names: Vec<String> = http.commands.lock().iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["help", "ping"]);

        assert_eq!(sync.after_load().await, SyncOutcome::Synced(2));
    }

    #[tokio::test]
    async fn test_rejected_overwrite_is_reported() {
        let registry = Arc::new(ComponentRegistry::new());
        let http = Arc::new(MockHttp {
            reject_overwrite: true,
            ..Default::default()
        });
        let catalog = Arc::new(DiscordCatalog::new(http));
        catalog.mark_ready("app");

        let sync = CommandSynchronizer::new(catalog, registry);
        assert_eq!(sync.after_load().await, SyncOutcome::Failed);
    }
}
