// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Stravach rename bot.

use thiserror::Error;

/// The primary error type used across all Stravach adapter traits and core operations.
///
/// The rename-specific variants (`CredentialRefreshFailed`, `GenerationFailed`,
/// `InvalidCallback`, `UpstreamWriteFailed`, `PartialSyncFailure`) are the
/// outcomes the workflow engine reports to the chat. The remaining variants are
/// plumbing errors raised by adapters.
#[derive(Debug, Error)]
pub enum StravachError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Chat transport errors (connection failure, message format, rate limiting).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Upstream fitness provider errors (non-2xx status, transport, decode).
    #[error("upstream error: {message}")]
    Upstream {
        message: String,
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The upstream provider rejected the access credential (HTTP 401).
    #[error("upstream rejected the access credential")]
    Unauthorized,

    /// The upstream refused to refresh the user's credential.
    #[error("credential refresh failed: {message}")]
    CredentialRefreshFailed { message: String },

    /// The language-generation call failed or returned nothing usable.
    #[error("name generation failed: {message}")]
    GenerationFailed { message: String },

    /// A button payload was malformed or referenced state that no longer exists.
    #[error("invalid callback payload: {0}")]
    InvalidCallback(String),

    /// The upstream write-back failed. No local mutation happened.
    #[error("upstream write failed: {message}")]
    UpstreamWriteFailed { message: String },

    /// Upstream accepted the new name but the local mirror could not be updated.
    #[error("updated upstream but local sync failed: {message}")]
    PartialSyncFailure { message: String },

    /// A requested record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl StravachError {
    /// Convenience constructor for boxing any storage-layer error.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage {
            source: Box::new(err),
        }
    }

    /// Convenience constructor for an upstream failure without a status code.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Returns true when pressing "regenerate" is a sensible next step for the user.
    pub fn is_user_retryable(&self) -> bool {
        matches!(
            self,
            Self::GenerationFailed { .. }
                | Self::InvalidCallback(_)
                | Self::UpstreamWriteFailed { .. }
                | Self::Timeout { .. }
        )
    }
}
