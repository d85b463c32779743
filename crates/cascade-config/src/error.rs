//! # Config Error Types
//!
//! Error types for the scoped configuration service.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Config Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Path / Value   │  │    Storage      │  │     Notifier            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Core(..)       │  │  KeyNotFound    │  │  AlreadyClosed          │ │
//! │  │  EmptyValue     │  │  Storage        │  │  Listener               │ │
//! │  │  InvalidValue   │  │                 │  │  ListenerPanicked       │ │
//! │  │  Arguments      │  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │    Settings     │  │    Internal     │                              │
//! │  │                 │  │                 │                              │
//! │  │  InvalidConfig  │  │  Internal       │                              │
//! │  │  ConfigLoad..   │  │                 │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `KeyNotFound` is the one recoverable storage error: it drives the scope
//! fallback in [`crate::ScopedReader::string`]. Every other error aborts it.

use cascade_core::CoreError;
use thiserror::Error;

/// Result type alias for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Config error type covering all service failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    // =========================================================================
    // Path / Value Errors
    // =========================================================================
    /// Path, key, scope or conversion error from cascade-core.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A write was requested without a value.
    #[error("Cannot write {key}: no value supplied")]
    EmptyValue { key: String },

    /// A value was rejected before writing.
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    /// Several argument options failed; the message joins all of them.
    #[error("{}", join_errors(.0))]
    Arguments(Vec<ConfigError>),

    // =========================================================================
    // Storage Errors
    // =========================================================================
    /// No value is stored under the fully-qualified key.
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// The storage backend failed.
    #[error("Storage error: {0}")]
    Storage(String),

    // =========================================================================
    // Notifier Errors
    // =========================================================================
    /// `close` was called on an already closed notifier.
    #[error("Config service publisher already closed")]
    AlreadyClosed,

    /// A listener reported a failure.
    #[error("Listener failed: {0}")]
    Listener(String),

    /// A listener panicked while handling a change.
    #[error("Listener panicked: {0}")]
    ListenerPanicked(String),

    // =========================================================================
    // Settings Errors
    // =========================================================================
    /// Invalid settings content.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to read or parse the settings file.
    #[error("Failed to load settings: {0}")]
    ConfigLoadFailed(String),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Internal service error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ConfigLoadFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ConfigError {
    /// Creates a listener failure from any displayable error.
    pub fn listener(err: impl std::fmt::Display) -> Self {
        ConfigError::Listener(err.to_string())
    }

    /// Returns true if no value exists for the requested key.
    ///
    /// This is the only condition under which a scoped string read falls
    /// back to the next broader scope.
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, ConfigError::KeyNotFound(_))
    }

    /// Returns true if the error came from path validation.
    pub fn is_path_error(&self) -> bool {
        match self {
            ConfigError::Core(core) => core.is_path_error(),
            ConfigError::Arguments(errors) => errors.iter().all(ConfigError::is_path_error),
            _ => false,
        }
    }

    /// Returns true if a listener error or panic caused this error.
    pub fn is_listener_failure(&self) -> bool {
        matches!(
            self,
            ConfigError::Listener(_) | ConfigError::ListenerPanicked(_)
        )
    }
}
