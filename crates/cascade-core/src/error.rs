//! # Error Types
//!
//! Errors raised while building keys or converting values.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  cascade-core errors (this file)                                       │
//! │  └── CoreError        - Path, key, scope and conversion failures       │
//! │                                                                         │
//! │  cascade-config errors (separate crate)                                │
//! │  └── ConfigError      - Storage, notifier and settings failures        │
//! │                                                                         │
//! │  Flow: CoreError → ConfigError → caller                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Errors produced by the pure configuration types.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// No path was supplied where one is required.
    #[error("Path cannot be empty")]
    EmptyPath,

    /// The supplied path does not resolve to at least three non-empty segments.
    ///
    /// ## When This Occurs
    /// - `["a", "b"]` (two parts)
    /// - `"a//c"` (empty middle segment)
    /// - `["a/b", "c", "d"]` (separator inside a discrete part)
    #[error("Incorrect path {path:?}: want at least 3 non-empty segments, have {have}")]
    InvalidPath { path: String, have: usize },

    /// A fully-qualified key could not be decoded.
    #[error("Invalid fully-qualified key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// A scope name is not one of default, websites, groups or stores.
    #[error("Unknown scope: {0}")]
    UnknownScope(String),

    /// A stored value cannot be read as the requested type.
    #[error("Cannot read {actual} value as {expected}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

impl CoreError {
    /// Creates an InvalidPath error for the given input.
    pub fn invalid_path(path: impl Into<String>, have: usize) -> Self {
        CoreError::InvalidPath {
            path: path.into(),
            have,
        }
    }

    /// Creates an InvalidKey error.
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this error came from path validation.
    pub fn is_path_error(&self) -> bool {
        matches!(self, CoreError::EmptyPath | CoreError::InvalidPath { .. })
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(CoreError::EmptyPath.to_string(), "Path cannot be empty");

        let err = CoreError::invalid_path("a/b", 2);
        assert_eq!(
            err.to_string(),
            "Incorrect path \"a/b\": want at least 3 non-empty segments, have 2"
        );

        let err = CoreError::TypeMismatch {
            expected: "bool",
            actual: "float",
        };
        assert_eq!(err.to_string(), "Cannot read float value as bool");
    }

    #[test]
    fn test_is_path_error() {
        assert!(CoreError::EmptyPath.is_path_error());
        assert!(CoreError::invalid_path("a", 1).is_path_error());
        assert!(!CoreError::UnknownScope("x".into()).is_path_error());
    }
}
