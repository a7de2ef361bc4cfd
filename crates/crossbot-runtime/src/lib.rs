//! # Crossbot Runtime
//!
//! Process-level glue around the dispatch engine:
//! - Layered configuration (`crossbot.toml`, `CROSSBOT_*` environment variables)
//! - Logging setup on `tracing-subscriber`
//! - [`CrossbotRuntime`], which loads components, triggers command sync,
//!   builds platform listeners and waits for shutdown
//!
//! ## Features
//!
//! - `toml-config` / `yaml-config`: configuration file formats
//! - `json-log`: JSON log output
//! - `discord` / `guilded`: listener and catalog constructors for each platform

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{ConfigError, ConfigLoader, ConfigResult, CrossbotConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{CrossbotRuntime, RuntimeBuilder};

pub use tracing;
pub use tracing_subscriber;

/// Logging macros.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
