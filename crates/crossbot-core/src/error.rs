//! Unified error types for the crossbot core.
//!
//! Framework-level errors (loading, synchronization) live in
//! `crossbot-framework`; this module only covers what the foundation types
//! themselves can produce.

use std::fmt;

use thiserror::Error;

/// Boxed error returned by component hooks and platform capabilities.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// =============================================================================
// Delivery Errors
// =============================================================================

/// Errors raised while delivering a message back to a platform.
#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    /// The channel could not be resolved from its ID.
    #[error("channel '{id}' could not be fetched")]
    ChannelNotFound {
        /// The channel ID that was looked up.
        id: String,
    },

    /// The interaction has no channel to send to.
    #[error("interaction has no channel context")]
    NoChannel,

    /// The platform refused the message.
    #[error("platform rejected message: {0}")]
    Rejected(String),

    /// Transport-level failure.
    #[error("transport error: {0}")]
    Transport(String),
}

impl DeliveryError {
    /// Wraps any error as a transport failure.
    pub fn transport(err: impl fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }
}

// =============================================================================
// Option Errors
// =============================================================================

/// Errors raised when accessing a single option through the options handler.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptionError {
    /// A required option was not supplied.
    #[error("missing required option '{name}'")]
    Missing {
        /// Option name.
        name: String,
    },

    /// The component declares no option with this name.
    #[error("unknown option '{name}'")]
    Unknown {
        /// Option name.
        name: String,
    },

    /// The raw value could not be coerced to the declared type.
    #[error("option '{name}' expected {expected}, got '{raw}'")]
    Malformed {
        /// Option name.
        name: String,
        /// Declared type.
        expected: &'static str,
        /// Raw value as received.
        raw: String,
    },
}

/// A single constraint violated by the supplied options.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionViolation {
    /// Required option absent.
    Missing { name: String },
    /// Value could not be coerced to the declared type.
    Malformed {
        name: String,
        expected: &'static str,
        raw: String,
    },
    /// Numeric value below `min_value`.
    BelowMinimum { name: String, min: f64, value: f64 },
    /// Numeric value above `max_value`.
    AboveMaximum { name: String, max: f64, value: f64 },
    /// String shorter than `min_length`.
    TooShort { name: String, min: usize, len: usize },
    /// String longer than `max_length`.
    TooLong { name: String, max: usize, len: usize },
    /// Value is not one of the declared choices.
    NotAChoice { name: String, raw: String },
}

impl OptionViolation {
    /// Name of the offending option.
    pub fn name(&self) -> &str {
        match self {
            Self::Missing { name }
            | Self::Malformed { name, .. }
            | Self::BelowMinimum { name, .. }
            | Self::AboveMaximum { name, .. }
            | Self::TooShort { name, .. }
            | Self::TooLong { name, .. }
            | Self::NotAChoice { name, .. } => name,
        }
    }
}

impl fmt::Display for OptionViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { name } => write!(f, "`{name}` is required"),
            Self::Malformed {
                name,
                expected,
                raw,
            } => write!(f, "`{name}` must be {expected} (got `{raw}`)"),
            Self::BelowMinimum { name, min, value } => {
                write!(f, "`{name}` must be at least {min} (got {value})")
            }
            Self::AboveMaximum { name, max, value } => {
                write!(f, "`{name}` must be at most {max} (got {value})")
            }
            Self::TooShort { name, min, len } => {
                write!(f, "`{name}` must be at least {min} characters (got {len})")
            }
            Self::TooLong { name, max, len } => {
                write!(f, "`{name}` must be at most {max} characters (got {len})")
            }
            Self::NotAChoice { name, raw } => {
                write!(f, "`{name}` does not accept `{raw}`")
            }
        }
    }
}

/// Aggregated result of validating every option against its schema.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", render_violations(.violations))]
pub struct OptionsValidationError {
    /// Every violated constraint, in schema order.
    pub violations: Vec<OptionViolation>,
}

fn render_violations(violations: &[OptionViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for delivery operations.
pub type DeliveryResult<T> = Result<T, DeliveryError>;

/// Result type for option access.
pub type OptionResult<T> = Result<T, OptionError>;
