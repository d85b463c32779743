//! # Write Arguments
//!
//! An [`Arg`] is a validated path key plus the value to write. It is also the
//! payload of a change event: once a write lands in storage the same `Arg`
//! is handed to the notifier.
//!
//! ## Building
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Arg::builder()                                                        │
//! │       .path(["general/locale/code"])   ──► errors are recorded,         │
//! │       .store(3)                             not returned, per option    │
//! │       .value("de_CH")                                                   │
//! │       .build()                                                          │
//! │                                                                         │
//! │   0 errors ──► Ok(Arg)                                                  │
//! │   1 error  ──► Err(that error)                                          │
//! │   n errors ──► Err(Arguments([..]))  "msg one; msg two"                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::io::Read;

use cascade_core::path::split_path;
use cascade_core::{ConfigValue, CoreError, PathKey, Scope, ScopeRef};

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Arg
// =============================================================================

/// A path key with an optional value, ready to be written or published.
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub key: PathKey,
    pub value: Option<ConfigValue>,
}

impl Arg {
    /// Starts a new builder.
    pub fn builder() -> ArgBuilder {
        ArgBuilder::default()
    }

    /// Creates an argument from an already built key.
    pub fn new(key: PathKey, value: impl Into<ConfigValue>) -> Self {
        Arg {
            key,
            value: Some(value.into()),
        }
    }

    /// Returns the value or `EmptyValue`.
    pub fn require_value(&self) -> ConfigResult<&ConfigValue> {
        self.value.as_ref().ok_or_else(|| ConfigError::EmptyValue {
            key: self.key.fq(),
        })
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Collects write options and reports every failure at once.
#[derive(Debug, Default)]
pub struct ArgBuilder {
    segments: Option<Vec<String>>,
    scope: ScopeRef,
    value: Option<ConfigValue>,
    errors: Vec<ConfigError>,
}

impl ArgBuilder {
    /// Sets the path, either one joined string or three or more parts.
    pub fn path<S: AsRef<str>>(mut self, parts: impl IntoIterator<Item = S>) -> Self {
        let parts: Vec<S> = parts.into_iter().collect();
        match split_path(&parts) {
            Ok(segments) => self.segments = Some(segments),
            Err(e) => self.errors.push(e.into()),
        }
        self
    }

    /// Sets the scope. Non-positive IDs for non-default scopes fall back to
    /// the default scope.
    pub fn scope(mut self, scope: Scope, id: i64) -> Self {
        self.scope = ScopeRef::new(scope, id);
        self
    }

    pub fn default_scope(self) -> Self {
        self.scope(Scope::Default, 0)
    }

    pub fn website(self, id: i64) -> Self {
        self.scope(Scope::Website, id)
    }

    pub fn group(self, id: i64) -> Self {
        self.scope(Scope::Group, id)
    }

    pub fn store(self, id: i64) -> Self {
        self.scope(Scope::Store, id)
    }

    /// Sets the value to write.
    pub fn value(mut self, value: impl Into<ConfigValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Reads the value from a reader as raw bytes.
    ///
    /// An I/O failure is recorded and reported by [`build`](Self::build).
    pub fn value_reader(mut self, mut reader: impl Read) -> Self {
        let mut buf = Vec::new();
        match reader.read_to_end(&mut buf) {
            Ok(_) => self.value = Some(ConfigValue::Bytes(buf)),
            Err(e) => self
                .errors
                .push(ConfigError::Storage(format!("value reader failed: {e}"))),
        }
        self
    }

    /// Finishes the argument.
    pub fn build(self) -> ConfigResult<Arg> {
        let mut errors = self.errors;
        if self.segments.is_none() && errors.is_empty() {
            errors.push(CoreError::EmptyPath.into());
        }

        match (self.segments, errors.len()) {
            (Some(segments), 0) => {
                let key = PathKey::at(&segments, self.scope)?;
                Ok(Arg {
                    key,
                    value: self.value,
                })
            }
            (_, 1) => Err(errors.remove(0)),
            _ => Err(ConfigError::Arguments(errors)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct BrokenReader;

    impl Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("pipe closed"))
        }
    }

    #[test]
    fn test_build_store_arg() {
        let arg = Arg::builder()
            .path(["general/locale/code"])
            .store(3)
            .value("de_CH")
            .build()
            .unwrap();
        assert_eq!(arg.key.fq(), "stores/3/general/locale/code");
        assert_eq!(arg.value, Some(ConfigValue::from("de_CH")));
    }

    #[test]
    fn test_parts_and_default_scope() {
        let arg = Arg::builder()
            .path(["a", "b", "c"])
            .default_scope()
            .build()
            .unwrap();
        assert_eq!(arg.key.fq(), "default/0/a/b/c");
        assert!(arg.value.is_none());
        assert!(matches!(
            arg.require_value(),
            Err(ConfigError::EmptyValue { .. })
        ));
    }

    #[test]
    fn test_zero_id_degrades_to_default() {
        let arg = Arg::builder().path(["a/b/c"]).website(0).build().unwrap();
        assert_eq!(arg.key.scope_ref(), ScopeRef::default_scope());
    }

    #[test]
    fn test_missing_path_is_empty_path() {
        let err = Arg::builder().value(1i64).build().unwrap_err();
        assert!(matches!(err, ConfigError::Core(CoreError::EmptyPath)));
    }

    #[test]
    fn test_single_error_is_returned_directly() {
        let err = Arg::builder().path(["a/b"]).build().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Core(CoreError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_errors_are_joined() {
        let err = Arg::builder()
            .path(["a/b"])
            .value_reader(BrokenReader)
            .build()
            .unwrap_err();
        match &err {
            ConfigError::Arguments(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error {other:?}"),
        }
        let msg = err.to_string();
        assert!(msg.contains("Incorrect path"), "{msg}");
        assert!(msg.contains("; Storage error: value reader failed: pipe closed"), "{msg}");
    }

    #[test]
    fn test_value_reader() {
        let arg = Arg::builder()
            .path(["a/b/c"])
            .value_reader(&b"payload"[..])
            .build()
            .unwrap();
        assert_eq!(arg.value, Some(ConfigValue::Bytes(b"payload".to_vec())));
    }
}
