//! Error types for memo
//!
//! All modules use `MemoResult<T>` as their return type. Fetch failures are
//! carried separately as [`FetchError`] because they are memoized inside cache
//! entries and handed to every caller of a key, so they must be cheap to clone.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Result type alias for memo operations
pub type MemoResult<T> = Result<T, MemoError>;

/// The memoized outcome of one fetch
pub type Outcome<V> = Result<V, FetchError>;

/// A failed fetch, as recorded in a cache entry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("failed to fetch {key}: {reason}")]
    Failed { key: String, reason: Arc<str> },

    #[error("fetch for {key} was abandoned before it completed")]
    Abandoned { key: String },
}

impl FetchError {
    /// Create a fetch failure for `key`
    pub fn failed(key: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Failed {
            key: key.into(),
            reason: Arc::from(reason.to_string()),
        }
    }

    /// Create an abandoned-fetch error for `key`
    pub fn abandoned(key: impl Into<String>) -> Self {
        Self::Abandoned { key: key.into() }
    }

    /// The key whose fetch failed
    pub fn key(&self) -> &str {
        match self {
            Self::Failed { key, .. } | Self::Abandoned { key } => key,
        }
    }
}

/// All errors that can occur in memo
#[derive(Error, Debug)]
pub enum MemoError {
    // Cache errors
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Cache is shut down and no longer accepts requests")]
    CacheShutDown,

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl MemoError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ConfigInvalid { .. } => Some("Run: memo config init --force"),
            Self::CacheShutDown => Some("Build a new cache; a stopped cache stays stopped"),
            _ => None,
        }
    }
}
