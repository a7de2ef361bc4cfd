//! Console Bot Example
//!
//! Every line typed on stdin is delivered to the Guilded normalizer as a chat
//! message, and every reply is printed back to stdout.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package console-bot -- --prefix !
//! > !ping
//! Pong!
//! > !add --a 2 --b 40
//! 2 + 40 = 42
//! > !add --a 2 --b x
//! (private) **Invalid Options**
//! ...
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use crossbot::core::{DeliveryResult, Embed, EmbedStyle, Origin};
use crossbot::framework::{StaticSource, UsageTracker};
use crossbot::guilded::model::{Channel, ChatMessage, MessageEvent, Server, User};
use crossbot::guilded::{ChatMessagePayload, GuildedHttp};
use crossbot::prelude::*;
use crossbot::runtime::config::{ConfigLoader, validate_config};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

// ============================================================================
// Components
// ============================================================================

struct Ping;

#[async_trait]
impl Component for Ping {
    fn kind(&self) -> ComponentType {
        ComponentType::Command
    }

    fn key(&self) -> &str {
        "ping"
    }

    fn description(&self) -> Option<&str> {
        Some("Check that the bot is alive")
    }

    async fn run(
        &self,
        interaction: &ReceivedInteraction,
        _: &OptionsHandler,
    ) -> Result<(), BoxError> {
        interaction.reply(&GeneratedMessage::text("Pong!")).await?;
        Ok(())
    }
}

/// Repeats everything after the command name.
struct Echo;

#[async_trait]
impl Component for Echo {
    fn kind(&self) -> ComponentType {
        ComponentType::Command
    }

    fn key(&self) -> &str {
        "echo"
    }

    async fn run(
        &self,
        interaction: &ReceivedInteraction,
        _: &OptionsHandler,
    ) -> Result<(), BoxError> {
        let text = match &interaction.origin {
            Origin::Guilded { args, .. } if !args.is_empty() => args.join(" "),
            _ => {
                let usage = GeneratedMessage::error("Nothing to echo", "Usage: echo <text>");
                interaction.reply(&usage.ephemeral(true)).await?;
                return Ok(());
            }
        };
        interaction.reply(&GeneratedMessage::text(text)).await?;
        Ok(())
    }
}

struct Add {
    options: Vec<OptionSchema>,
}

impl Add {
    fn new() -> Self {
        Self {
            options: vec![
                OptionSchema::integer("a").description("First term").required(true),
                OptionSchema::integer("b").description("Second term").required(true),
            ],
        }
    }
}

#[async_trait]
impl Component for Add {
    fn kind(&self) -> ComponentType {
        ComponentType::Command
    }

    fn key(&self) -> &str {
        "add"
    }

    fn description(&self) -> Option<&str> {
        Some("Add two integers")
    }

    fn options(&self) -> &[OptionSchema] {
        &self.options
    }

    async fn run(
        &self,
        interaction: &ReceivedInteraction,
        options: &OptionsHandler,
    ) -> Result<(), BoxError> {
        let a = options.get_integer("a").unwrap_or_default();
        let b = options.get_integer("b").unwrap_or_default();
        let sum = a.checked_add(b).ok_or("integer overflow")?;
        interaction
            .reply(&GeneratedMessage::text(format!("{a} + {b} = {sum}")))
            .await?;
        Ok(())
    }
}

/// Always fails, to show the generic failure reply.
struct Boom;

#[async_trait]
impl Component for Boom {
    fn kind(&self) -> ComponentType {
        ComponentType::Command
    }

    fn key(&self) -> &str {
        "boom"
    }

    async fn run(&self, _: &ReceivedInteraction, _: &OptionsHandler) -> Result<(), BoxError> {
        Err("the boom command exploded".into())
    }
}

fn general() -> Result<Vec<BoxedComponent>, BoxError> {
    Ok(vec![
        Arc::new(Ping) as BoxedComponent,
        Arc::new(Echo),
        Arc::new(Add::new()),
        Arc::new(Boom),
    ])
}

register_components!(GENERAL, "general", general);

/// Reports how many distinct users the dispatcher has served.
struct Stats {
    usage: Arc<UsageTracker>,
}

#[async_trait]
impl Component for Stats {
    fn kind(&self) -> ComponentType {
        ComponentType::Command
    }

    fn key(&self) -> &str {
        "stats"
    }

    async fn run(
        &self,
        interaction: &ReceivedInteraction,
        _: &OptionsHandler,
    ) -> Result<(), BoxError> {
        let message = GeneratedMessage::embed(
            Embed::new(EmbedStyle::Info)
                .title("Usage")
                .description(format!("{} user(s) have used this bot", self.usage.count())),
        );
        interaction.reply(&message).await?;
        Ok(())
    }
}

// ============================================================================
// Console "platform"
// ============================================================================

const CHANNEL_ID: &str = "console";

/// Prints outgoing messages instead of calling the Guilded API.
struct ConsoleHttp;

#[async_trait]
impl GuildedHttp for ConsoleHttp {
    async fn fetch_channel(&self, channel_id: &str) -> DeliveryResult<Channel> {
        Ok(console_channel(channel_id))
    }

    async fn create_message(
        &self,
        _channel_id: &str,
        payload: &ChatMessagePayload,
    ) -> DeliveryResult<()> {
        let marker = if payload.is_private { "(private) " } else { "" };
        if let Some(content) = &payload.content {
            println!("{marker}{content}");
        }
        for embed in &payload.embeds {
            if let Some(title) = &embed.title {
                println!("{marker}**{title}**");
            }
            if let Some(description) = &embed.description {
                println!("{description}");
            }
            for field in &embed.fields {
                println!("{}: {}", field.name, field.value);
            }
        }
        Ok(())
    }
}

fn console_channel(id: &str) -> Channel {
    Channel {
        id: id.to_string(),
        name: "console".into(),
        parent_id: None,
    }
}

fn console_event(id: u64, args: &Args, content: String) -> MessageEvent {
    let server = (!args.dm).then(|| Server {
        id: "console-server".into(),
        owner_id: args.user.clone(),
        name: "Console".into(),
        avatar: None,
        about: None,
    });
    MessageEvent {
        message: ChatMessage {
            id: id.to_string(),
            server_id: server.as_ref().map(|s| s.id.clone()),
            channel_id: CHANNEL_ID.into(),
            content,
            created_by: args.user.clone(),
        },
        server,
        channel: Some(console_channel(CHANNEL_ID)),
        author: Some(User {
            id: args.user.clone(),
            name: args.user.clone(),
            avatar: None,
        }),
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "console-bot", about = "Drive crossbot components from the terminal")]
struct Args {
    /// Configuration file (defaults to crossbot.toml in the current directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Text-command prefix; repeat for several. Defaults to the configured
    /// prefixes, or `!`.
    #[arg(short, long = "prefix")]
    prefixes: Vec<String>,

    /// ID (and name) of the user typing.
    #[arg(short, long, default_value = "console-user")]
    user: String,

    /// Send messages without server context, like a direct message.
    #[arg(long)]
    dm: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.file(path);
    }
    let mut config = loader.load()?;
    if !args.prefixes.is_empty() {
        config.dispatch.prefixes.clone_from(&args.prefixes);
    } else if config.dispatch.prefixes.is_empty() {
        config.dispatch.prefixes = vec!["!".into()];
    }
    validate_config(&config)?;

    let runtime = CrossbotRuntime::from_config(config);
    runtime.add_source(StaticSource::new(
        "console",
        vec![Arc::new(Stats {
            usage: Arc::clone(runtime.usage()),
        }) as BoxedComponent],
    ));
    let report = runtime.load_components().await;
    info!(
        commands = ?runtime.registry().keys().iter().map(ToString::to_string).collect::<Vec<_>>(),
        "{report}"
    );

    let listener = runtime.guilded_listener(Arc::new(ConsoleHttp));
    info!(prefixes = ?listener.normalizer().parser().prefixes(), "Type a command, Ctrl+D to quit");

    let repl = async {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut next_id = 0u64;
        while let Some(line) = lines.next_line().await? {
            next_id += 1;
            match listener.handle(console_event(next_id, &args, line)).await {
                Some(outcome) => debug!(?outcome, "Dispatched"),
                None => debug!("Not a command"),
            }
        }
        anyhow::Ok(())
    };

    tokio::select! {
        result = runtime.run() => result?,
        result = repl => {
            result?;
            runtime.stop();
        }
    }

    Ok(())
}
