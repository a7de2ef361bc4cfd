//! Error types for the crossbot framework.

use crossbot_core::BoxError;
use thiserror::Error;

/// Errors produced while turning a definition source into components.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// A configured group name has no registered group.
    #[error("no component group named '{0}' is registered")]
    GroupNotFound(String),

    /// The group's loader panicked.
    #[error("component group '{0}' panicked while loading")]
    Panicked(String),
}

/// Errors produced while reconciling a remote command catalog.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The bulk replace call failed.
    #[error("bulk replace on {platform} failed: {source}")]
    Catalog {
        /// Platform whose catalog rejected the update.
        platform: String,
        #[source]
        source: BoxError,
    },
}

/// Result type for synchronization.
pub type SyncResult<T> = Result<T, SyncError>;
