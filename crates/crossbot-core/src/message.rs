//! Platform-neutral outbound message payloads.
//!
//! Components and the dispatcher never talk to a platform directly. They build
//! a [`GeneratedMessage`] and hand it to the reply or channel capability bound
//! on the interaction; each adapter translates it into its own wire shape.
//!
//! ```rust,ignore
//! use crossbot_core::{Embed, EmbedStyle, GeneratedMessage};
//!
//! let msg = GeneratedMessage::embed(
//!     Embed::new(EmbedStyle::Success)
//!         .title("Pong!")
//!         .description("Latency is fine."),
//! );
//! ```

use serde::{Deserialize, Serialize};

// ============================================================================
// Embed
// ============================================================================

/// Visual style of an embed; decides its accent color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedStyle {
    /// Green accent.
    Success,
    /// Red accent.
    Error,
    /// Amber accent.
    Warning,
    /// Blurple accent.
    #[default]
    Info,
}

impl EmbedStyle {
    /// RGB color for this style.
    pub fn color(self) -> u32 {
        match self {
            Self::Success => 0x57_F2_87,
            Self::Error => 0xED_42_45,
            Self::Warning => 0xFE_E7_5C,
            Self::Info => 0x58_65_F2,
        }
    }
}

/// A name/value pair rendered inside an embed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

/// A rich card attached to a message.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
}

impl Embed {
    /// Creates an empty embed with the given style.
    pub fn new(style: EmbedStyle) -> Self {
        Self {
            color: style.color(),
            ..Default::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        inline: bool,
    ) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }
}

// ============================================================================
// Link Button
// ============================================================================

/// A button that opens an external URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkButton {
    pub label: String,
    pub url: String,
}

// ============================================================================
// GeneratedMessage
// ============================================================================

/// An outbound message understood by every adapter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeneratedMessage {
    /// Plain text body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Embeds rendered below the text body.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    /// Link buttons rendered below the embeds.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<LinkButton>,
    /// Only visible to the invoking user, where the platform supports it.
    #[serde(default)]
    pub ephemeral: bool,
}

impl GeneratedMessage {
    /// A plain text message.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// A message carrying a single embed.
    pub fn embed(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            ..Default::default()
        }
    }

    /// An error-styled embed with a title and description.
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::embed(
            Embed::new(EmbedStyle::Error)
                .title(title)
                .description(description),
        )
    }

    /// Appends a link button.
    pub fn with_link(mut self, label: impl Into<String>, url: impl Into<String>) -> Self {
        self.links.push(LinkButton {
            label: label.into(),
            url: url.into(),
        });
        self
    }

    /// Marks the message as ephemeral.
    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }

    /// Best-effort plain text rendering, used by text-only platforms.
    pub fn to_plain_text(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(content) = &self.content {
            parts.push(content.clone());
        }
        for embed in &self.embeds {
            if let Some(title) = &embed.title {
                parts.push(format!("**{title}**"));
            }
            if let Some(description) = &embed.description {
                parts.push(description.clone());
            }
            for field in &embed.fields {
                parts.push(format!("{}: {}", field.name, field.value));
            }
            if let Some(footer) = &embed.footer {
                parts.push(footer.clone());
            }
        }
        for link in &self.links {
            parts.push(format!("{} <{}>", link.label, link.url));
        }
        parts.join("\n")
    }
}
