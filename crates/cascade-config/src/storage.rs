//! # Flat Storage Seam
//!
//! The service never talks to a database, file or remote store directly. It
//! reads and writes raw values under fully-qualified keys through two small
//! traits, so any backend can be plugged in.
//!
//! ## Storage Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   PathKey ──fq()──► "stores/3/general/locale/code"                      │
//! │                            │                                            │
//! │              ┌─────────────┴─────────────┐                              │
//! │              ▼                           ▼                              │
//! │        Getter::get                 Writer::set                          │
//! │        Ok(value)                   Ok(())                               │
//! │        Err(KeyNotFound) ◄── recoverable, drives fallback                │
//! │        Err(Storage)     ◄── aborts                                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use cascade_core::{ConfigValue, PathKey};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Traits
// =============================================================================

/// Reads raw values by fully-qualified key.
///
/// A missing key must be reported as [`ConfigError::KeyNotFound`] so the
/// scoped reader can tell "keep falling back" from "abort".
pub trait Getter: Send + Sync {
    fn get(&self, key: &str) -> ConfigResult<ConfigValue>;
}

/// Writes raw values by fully-qualified key.
pub trait Writer: Send + Sync {
    fn set(&self, key: &str, value: ConfigValue) -> ConfigResult<()>;
}

/// A backend that can both read and write.
pub trait Storage: Getter + Writer {}

impl<T: Getter + Writer + ?Sized> Storage for T {}

impl<T: Getter + ?Sized> Getter for Arc<T> {
    fn get(&self, key: &str) -> ConfigResult<ConfigValue> {
        (**self).get(key)
    }
}

impl<T: Writer + ?Sized> Writer for Arc<T> {
    fn set(&self, key: &str, value: ConfigValue) -> ConfigResult<()> {
        (**self).set(key, value)
    }
}

/// Typed reads at an explicit [`PathKey`], available on every [`Getter`].
pub trait GetterExt: Getter {
    /// Raw value at the key's fully-qualified form.
    fn value_at(&self, key: &PathKey) -> ConfigResult<ConfigValue> {
        self.get(&key.fq())
    }

    fn string_at(&self, key: &PathKey) -> ConfigResult<String> {
        Ok(self.value_at(key)?.as_string())
    }

    fn bool_at(&self, key: &PathKey) -> ConfigResult<bool> {
        Ok(self.value_at(key)?.as_bool()?)
    }

    fn float64_at(&self, key: &PathKey) -> ConfigResult<f64> {
        Ok(self.value_at(key)?.as_float()?)
    }

    fn int_at(&self, key: &PathKey) -> ConfigResult<i64> {
        Ok(self.value_at(key)?.as_int()?)
    }

    fn date_time_at(&self, key: &PathKey) -> ConfigResult<DateTime<Utc>> {
        Ok(self.value_at(key)?.as_date_time()?)
    }
}

impl<T: Getter + ?Sized> GetterExt for T {}

// =============================================================================
// Memory Store
// =============================================================================

/// In-memory backend, used as the default store and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, ConfigValue>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with `(fully-qualified key, value)` pairs.
    pub fn with_values<K, V>(values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<ConfigValue>,
    {
        let values = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        MemoryStore {
            values: RwLock::new(values),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.values.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// All stored entries, sorted by key.
    pub fn entries(&self) -> Vec<(String, ConfigValue)> {
        let mut entries: Vec<(String, ConfigValue)> = self
            .values
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Removes a key, returning its previous value.
    pub fn remove(&self, key: &str) -> Option<ConfigValue> {
        self.values.write().remove(key)
    }
}

impl Getter for MemoryStore {
    fn get(&self, key: &str) -> ConfigResult<ConfigValue> {
        self.values
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))
    }
}

impl Writer for MemoryStore {
    fn set(&self, key: &str, value: ConfigValue) -> ConfigResult<()> {
        self.values.write().insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_core::Scope;

    #[test]
    fn test_round_trip() {
        let store = MemoryStore::new();
        store.set("default/0/a/b/c", "Gopher".into()).unwrap();
        assert_eq!(
            store.get("default/0/a/b/c").unwrap(),
            ConfigValue::from("Gopher")
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_missing_key_is_key_not_found() {
        let store = MemoryStore::new();
        let err = store.get("stores/1/a/b/c").unwrap_err();
        assert!(err.is_key_not_found());
        assert_eq!(err.to_string(), "Key not found: stores/1/a/b/c");
    }

    #[test]
    fn test_typed_reads_at_key() {
        let store = MemoryStore::with_values([
            ("websites/2/a/b/flag", ConfigValue::from("1")),
            ("websites/2/a/b/rate", ConfigValue::from(0.25)),
            ("websites/2/a/b/count", ConfigValue::from(12i64)),
        ]);
        let at = |path: &str| PathKey::build(&[path], Scope::Website, 2).unwrap();

        assert!(store.bool_at(&at("a/b/flag")).unwrap());
        assert_eq!(store.float64_at(&at("a/b/rate")).unwrap(), 0.25);
        assert_eq!(store.int_at(&at("a/b/count")).unwrap(), 12);
        assert_eq!(store.string_at(&at("a/b/count")).unwrap(), "12");
        assert!(store.int_at(&at("a/b/rate")).is_err());
        assert!(store.date_time_at(&at("a/b/none")).unwrap_err().is_key_not_found());
    }

    #[test]
    fn test_keys_and_remove() {
        let store = MemoryStore::with_values([("b/1/x/y/z", 1i64), ("a/1/x/y/z", 2i64)]);
        assert_eq!(store.keys(), vec!["a/1/x/y/z", "b/1/x/y/z"]);
        assert_eq!(store.entries()[0].1, ConfigValue::Int(2));
        assert_eq!(store.remove("a/1/x/y/z"), Some(ConfigValue::Int(2)));
        assert!(store.remove("a/1/x/y/z").is_none());
        assert!(!store.is_empty());
    }
}
