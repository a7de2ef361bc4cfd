//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use crossbot_framework::DEFAULT_COLLECTOR_PREFIX;
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CrossbotConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Which definition groups to load.
    #[serde(default)]
    pub components: ComponentsConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Link attached to the generic failure message.
    #[serde(default)]
    pub support_url: Option<String>,

    #[serde(default)]
    pub discord: DiscordConfig,
}

// =============================================================================
// Logging
// =============================================================================

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature.
    #[cfg(feature = "json-log")]
    Json,
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Written to `logging.file_path`.
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    #[serde(default)]
    pub file_path: Option<PathBuf>,

    #[serde(default)]
    pub thread_ids: bool,

    /// Include file and line number.
    #[serde(default)]
    pub file_location: bool,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Per-module levels, e.g. `crossbot_framework = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file_path: None,
            thread_ids: false,
            file_location: false,
            span_events: SpanEventConfig::default(),
            filters: HashMap::new(),
        }
    }
}

// =============================================================================
// Components & dispatch
// =============================================================================

/// Definition groups to load, in order. Later groups win on key collisions.
///
/// Empty means every group linked into the binary.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ComponentsConfig {
    #[serde(default)]
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Text-command prefixes. Empty disables text commands.
    #[serde(default)]
    pub prefixes: Vec<String>,

    /// Component keys starting with this are left to collectors.
    #[serde(default = "default_collector_prefix")]
    pub collector_prefix: String,

    /// Reject interactions that fail a precondition check instead of only
    /// logging the failure.
    #[serde(default)]
    pub enforce_preconditions: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            prefixes: Vec::new(),
            collector_prefix: default_collector_prefix(),
            enforce_preconditions: false,
        }
    }
}

fn default_collector_prefix() -> String {
    DEFAULT_COLLECTOR_PREFIX.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Push the command catalog to Discord after each load.
    #[serde(default = "default_true")]
    pub sync_commands: bool,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            sync_commands: default_true(),
        }
    }
}

fn default_true() -> bool {
    true
}
