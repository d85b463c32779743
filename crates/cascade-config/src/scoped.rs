//! # Scoped Reader
//!
//! Typed reads for one website/group/store combination.
//!
//! ## Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ScopedReader { website: 10, group: 12, store: 22 }                    │
//! │                                                                         │
//! │   string("a/b/c")                                                       │
//! │     stores/22/a/b/c    ── KeyNotFound ──┐                               │
//! │     groups/12/a/b/c    ── KeyNotFound ──┤  any other error: return it   │
//! │     websites/10/a/b/c  ── KeyNotFound ──┤  found: return it             │
//! │     default/0/a/b/c    ── found ────────┘                               │
//! │                                                                         │
//! │   bool / int / float64 / date_time("a/b/c")                             │
//! │     stores/22/a/b/c    only, no fallback                                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! **Only `string` falls back.** The other typed getters read exactly at the
//! reader's resolved scope, so a bool set at the default scope is *not*
//! visible from a store-scoped reader. Callers rely on this; keep it.

use std::sync::Arc;

use cascade_core::{ConfigValue, PathKey, Scope, ScopeRef};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::storage::{Getter, GetterExt};

/// Reads configuration for a fixed website, group and store.
#[derive(Clone)]
pub struct ScopedReader {
    root: Arc<dyn Getter>,
    website_id: i64,
    group_id: i64,
    store_id: i64,
}

impl ScopedReader {
    /// Creates a reader. An ID of 0 means "not set" for that level.
    pub fn new(root: Arc<dyn Getter>, website_id: i64, group_id: i64, store_id: i64) -> Self {
        ScopedReader {
            root,
            website_id,
            group_id,
            store_id,
        }
    }

    /// The most specific scope with a positive ID: store, then group, then
    /// website, else `(Default, 0)`.
    pub fn scope(&self) -> (Scope, i64) {
        self.scope_ref().into()
    }

    fn scope_ref(&self) -> ScopeRef {
        if self.store_id > 0 {
            ScopeRef::store(self.store_id)
        } else if self.group_id > 0 {
            ScopeRef::group(self.group_id)
        } else if self.website_id > 0 {
            ScopeRef::website(self.website_id)
        } else {
            ScopeRef::default_scope()
        }
    }

    /// Scopes to try for a cascading read, most specific first.
    fn cascade(&self) -> impl Iterator<Item = ScopeRef> {
        [
            ScopeRef::store(self.store_id),
            ScopeRef::group(self.group_id),
            ScopeRef::website(self.website_id),
        ]
        .into_iter()
        .filter(|r| !r.is_default())
        .chain(std::iter::once(ScopeRef::default_scope()))
    }

    /// Key at the resolved scope.
    fn key<S: AsRef<str>>(&self, parts: &[S]) -> ConfigResult<PathKey> {
        Ok(PathKey::at(parts, self.scope_ref())?)
    }

    /// Reads a string, falling back store → group → website → default.
    ///
    /// Only `KeyNotFound` moves on to the next scope; any other error is
    /// returned immediately.
    pub fn string<S: AsRef<str>>(&self, parts: &[S]) -> ConfigResult<String> {
        let base = self.key(parts)?;
        let mut last = None;

        for scope in self.cascade() {
            let key = base.with_scope(scope);
            match self.root.get(&key.fq()) {
                Ok(value) => return Ok(value.as_string()),
                Err(e) if e.is_key_not_found() => {
                    debug!(key = %key, "Not found, falling back to broader scope");
                    last = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last.unwrap_or_else(|| ConfigError::KeyNotFound(base.fq())))
    }

    /// Reads a bool at the resolved scope only.
    pub fn bool<S: AsRef<str>>(&self, parts: &[S]) -> ConfigResult<bool> {
        self.root.bool_at(&self.key(parts)?)
    }

    /// Reads a float at the resolved scope only.
    pub fn float64<S: AsRef<str>>(&self, parts: &[S]) -> ConfigResult<f64> {
        self.root.float64_at(&self.key(parts)?)
    }

    /// Reads an integer at the resolved scope only.
    pub fn int<S: AsRef<str>>(&self, parts: &[S]) -> ConfigResult<i64> {
        self.root.int_at(&self.key(parts)?)
    }

    /// Reads a timestamp at the resolved scope only.
    pub fn date_time<S: AsRef<str>>(&self, parts: &[S]) -> ConfigResult<DateTime<Utc>> {
        self.root.date_time_at(&self.key(parts)?)
    }

    /// Reads the raw value at the resolved scope only.
    pub fn value<S: AsRef<str>>(&self, parts: &[S]) -> ConfigResult<ConfigValue> {
        self.root.value_at(&self.key(parts)?)
    }
}

impl std::fmt::Debug for ScopedReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedReader")
            .field("website_id", &self.website_id)
            .field("group_id", &self.group_id)
            .field("store_id", &self.store_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn reader(store: MemoryStore, w: i64, g: i64, s: i64) -> ScopedReader {
        ScopedReader::new(Arc::new(store), w, g, s)
    }

    /// Fails for one key, counts every lookup.
    struct Failing {
        broken: &'static str,
        inner: MemoryStore,
        lookups: AtomicUsize,
    }

    impl Getter for Failing {
        fn get(&self, key: &str) -> ConfigResult<ConfigValue> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if key == self.broken {
                return Err(ConfigError::Storage("connection reset".into()));
            }
            self.inner.get(key)
        }
    }

    #[test]
    fn test_scope_precedence() {
        let cases = [
            ((1, 2, 3), (Scope::Store, 3)),
            ((1, 2, 0), (Scope::Group, 2)),
            ((1, 0, 0), (Scope::Website, 1)),
            ((0, 0, 0), (Scope::Default, 0)),
            ((0, 0, 7), (Scope::Store, 7)),
            ((-1, -2, -3), (Scope::Default, 0)),
        ];
        for ((w, g, s), want) in cases {
            assert_eq!(reader(MemoryStore::new(), w, g, s).scope(), want, "{w}/{g}/{s}");
        }
    }

    #[test]
    fn test_string_falls_back_to_default() {
        let store = MemoryStore::with_values([("default/0/a/b/c", "Gopher")]);
        let r = reader(store, 10, 12, 22);
        assert_eq!(r.string(&["a/b/c"]).unwrap(), "Gopher");
    }

    #[test]
    fn test_closer_scope_shadows_default() {
        let store = MemoryStore::with_values([
            ("default/0/a/b/c", "default"),
            ("websites/10/a/b/c", "website"),
        ]);
        assert_eq!(reader(store, 10, 0, 0).string(&["a/b/c"]).unwrap(), "website");
    }

    #[test]
    fn test_store_value_wins() {
        let store = MemoryStore::with_values([
            ("default/0/a/b/c", "default"),
            ("groups/12/a/b/c", "group"),
            ("stores/22/a/b/c", "store"),
        ]);
        let r = reader(store, 10, 12, 22);
        assert_eq!(r.string(&["a", "b", "c"]).unwrap(), "store");
    }

    #[test]
    fn test_string_not_found_anywhere() {
        let r = reader(MemoryStore::new(), 0, 0, 42);
        let err = r.string(&["a/b/c"]).unwrap_err();
        assert!(err.is_key_not_found());
        assert_eq!(err.to_string(), "Key not found: default/0/a/b/c");
    }

    #[test]
    fn test_zero_ids_are_skipped() {
        let failing = Failing {
            broken: "",
            inner: MemoryStore::new(),
            lookups: AtomicUsize::new(0),
        };
        let failing = Arc::new(failing);
        let r = ScopedReader::new(failing.clone(), 0, 0, 5);
        assert!(r.string(&["a/b/c"]).is_err());
        // stores/5 then default/0
        assert_eq!(failing.lookups.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_other_errors_abort_fallback() {
        let failing = Arc::new(Failing {
            broken: "groups/12/a/b/c",
            inner: MemoryStore::with_values([("default/0/a/b/c", "unreachable")]),
            lookups: AtomicUsize::new(0),
        });
        let r = ScopedReader::new(failing.clone(), 10, 12, 22);

        let err = r.string(&["a/b/c"]).unwrap_err();
        assert!(matches!(err, ConfigError::Storage(_)));
        assert_eq!(failing.lookups.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_invalid_path() {
        let r = reader(MemoryStore::new(), 1, 0, 0);
        assert!(r.string(&["a", "b"]).unwrap_err().is_path_error());
        assert!(r.bool(&[""]).unwrap_err().is_path_error());
        assert!(r.int::<&str>(&[]).unwrap_err().is_path_error());
    }

    #[test]
    fn test_typed_getters_do_not_fall_back() {
        let store = MemoryStore::with_values([
            ("default/0/a/b/flag", ConfigValue::from(true)),
            ("default/0/a/b/count", ConfigValue::from(4i64)),
            ("stores/3/a/b/count", ConfigValue::from(9i64)),
        ]);
        let r = reader(store, 1, 2, 3);

        // string cascades to the default value ...
        assert_eq!(r.string(&["a/b/flag"]).unwrap(), "true");
        // ... but bool reads only at stores/3.
        assert!(r.bool(&["a/b/flag"]).unwrap_err().is_key_not_found());
        assert_eq!(r.int(&["a/b/count"]).unwrap(), 9);
    }

    #[test]
    fn test_typed_getters_at_resolved_scope() {
        let store = MemoryStore::with_values([
            ("websites/1/a/b/rate", ConfigValue::from("0.5")),
            ("websites/1/a/b/flag", ConfigValue::from("1")),
            ("websites/1/a/b/when", ConfigValue::from("2016-02-29T12:00:00Z")),
        ]);
        let r = reader(store, 1, 0, 0);
        assert_eq!(r.float64(&["a/b/rate"]).unwrap(), 0.5);
        assert!(r.bool(&["a/b/flag"]).unwrap());
        assert_eq!(r.date_time(&["a/b/when"]).unwrap().timestamp(), 1_456_747_200);
        assert_eq!(r.value(&["a/b/flag"]).unwrap(), ConfigValue::from("1"));
        assert!(r.int(&["a/b/rate"]).is_err());
    }
}
