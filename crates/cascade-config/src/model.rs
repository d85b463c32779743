//! # Typed Config Paths
//!
//! Module code declares its settings once as typed paths and reads them
//! through a [`ScopedReader`]:
//!
//! ```rust
//! use cascade_config::model::StringPath;
//! use cascade_config::ConfigService;
//!
//! let svc = ConfigService::in_memory().unwrap();
//! let locale = StringPath::new("general/locale/code")
//!     .unwrap()
//!     .with_default("en_US");
//!
//! assert_eq!(locale.get(&svc.scoped(1, 0, 3)), "en_US");
//! ```
//!
//! A path with a default never fails to read: lookup errors are logged at
//! debug level and the default is returned.

use cascade_core::{ConfigValue, CoreError, PathKey, Scope, ScopeRef};
use tracing::debug;

use crate::arg::Arg;
use crate::error::{ConfigError, ConfigResult};
use crate::scoped::ScopedReader;
use crate::service::ConfigService;

/// Separator for list values.
pub const CSV_SEPARATOR: char = ',';

/// The validated route shared by every typed path.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Route {
    base: PathKey,
}

impl Route {
    fn new(path: &str) -> ConfigResult<Self> {
        Ok(Route {
            base: PathKey::build(&[path], Scope::Default, 0)?,
        })
    }

    fn segments(&self) -> &[String] {
        self.base.segments()
    }

    fn key(&self, scope: ScopeRef) -> PathKey {
        self.base.with_scope(scope)
    }

    fn write(&self, svc: &ConfigService, value: ConfigValue, scope: ScopeRef) -> ConfigResult<()> {
        svc.write(Arg::new(self.key(scope), value))
    }

    fn or_default<T: Clone>(&self, read: ConfigResult<T>, default: &Option<T>) -> ConfigResult<T> {
        match (read, default) {
            (Ok(v), _) => Ok(v),
            (Err(e), Some(d)) => {
                debug!(path = %self, error = %e, "Using default value");
                Ok(d.clone())
            }
            (Err(e), None) => Err(e),
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.base.level_all())
    }
}

// =============================================================================
// Scalar Paths
// =============================================================================

/// A string setting. Reads cascade through every scope.
#[derive(Debug, Clone)]
pub struct StringPath {
    route: Route,
    default: Option<String>,
}

impl StringPath {
    pub fn new(path: &str) -> ConfigResult<Self> {
        Ok(StringPath {
            route: Route::new(path)?,
            default: None,
        })
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Reads the value, falling back to the default on any error.
    pub fn get(&self, reader: &ScopedReader) -> String {
        self.try_get(reader)
            .unwrap_or_else(|_| self.default.clone().unwrap_or_default())
    }

    /// Reads the value; errors only when there is no default.
    pub fn try_get(&self, reader: &ScopedReader) -> ConfigResult<String> {
        self.route
            .or_default(reader.string(self.route.segments()), &self.default)
    }

    pub fn write(&self, svc: &ConfigService, value: &str, scope: ScopeRef) -> ConfigResult<()> {
        self.route.write(svc, value.into(), scope)
    }

    pub fn key(&self, scope: ScopeRef) -> PathKey {
        self.route.key(scope)
    }
}

/// A flag. Reads only at the reader's resolved scope.
#[derive(Debug, Clone)]
pub struct BoolPath {
    route: Route,
    default: Option<bool>,
}

impl BoolPath {
    pub fn new(path: &str) -> ConfigResult<Self> {
        Ok(BoolPath {
            route: Route::new(path)?,
            default: None,
        })
    }

    pub fn with_default(mut self, default: bool) -> Self {
        self.default = Some(default);
        self
    }

    pub fn get(&self, reader: &ScopedReader) -> ConfigResult<bool> {
        self.route
            .or_default(reader.bool(self.route.segments()), &self.default)
    }

    pub fn write(&self, svc: &ConfigService, value: bool, scope: ScopeRef) -> ConfigResult<()> {
        self.route.write(svc, value.into(), scope)
    }
}

/// An integer. Reads only at the reader's resolved scope.
#[derive(Debug, Clone)]
pub struct IntPath {
    route: Route,
    default: Option<i64>,
}

impl IntPath {
    pub fn new(path: &str) -> ConfigResult<Self> {
        Ok(IntPath {
            route: Route::new(path)?,
            default: None,
        })
    }

    pub fn with_default(mut self, default: i64) -> Self {
        self.default = Some(default);
        self
    }

    pub fn get(&self, reader: &ScopedReader) -> ConfigResult<i64> {
        self.route
            .or_default(reader.int(self.route.segments()), &self.default)
    }

    pub fn write(&self, svc: &ConfigService, value: i64, scope: ScopeRef) -> ConfigResult<()> {
        self.route.write(svc, value.into(), scope)
    }
}

// =============================================================================
// List Paths
// =============================================================================

/// A comma separated list of strings, e.g. allowed country codes.
#[derive(Debug, Clone)]
pub struct StringCsv {
    route: Route,
    default: Option<Vec<String>>,
}

impl StringCsv {
    pub fn new(path: &str) -> ConfigResult<Self> {
        Ok(StringCsv {
            route: Route::new(path)?,
            default: None,
        })
    }

    pub fn with_default<S: Into<String>>(mut self, default: impl IntoIterator<Item = S>) -> Self {
        self.default = Some(default.into_iter().map(Into::into).collect());
        self
    }

    /// Reads the list. Empty items are skipped.
    pub fn get(&self, reader: &ScopedReader) -> ConfigResult<Vec<String>> {
        let read = reader
            .string(self.route.segments())
            .map(|raw| split_csv(&raw).map(str::to_string).collect::<Vec<_>>());
        self.route.or_default(read, &self.default)
    }

    /// Writes the list. Items must not contain the separator.
    pub fn write<S: AsRef<str>>(
        &self,
        svc: &ConfigService,
        items: &[S],
        scope: ScopeRef,
    ) -> ConfigResult<()> {
        let key = self.route.key(scope);
        let mut joined = Vec::with_capacity(items.len());
        for item in items {
            let item = item.as_ref();
            if item.contains(CSV_SEPARATOR) {
                return Err(ConfigError::InvalidValue {
                    key: key.fq(),
                    reason: format!("item {item:?} contains {CSV_SEPARATOR:?}"),
                });
            }
            joined.push(item);
        }
        svc.write(Arg::new(key, joined.join(",")))
    }
}

/// A comma separated list of integers.
#[derive(Debug, Clone)]
pub struct IntCsv {
    route: Route,
    default: Option<Vec<i64>>,
}

impl IntCsv {
    pub fn new(path: &str) -> ConfigResult<Self> {
        Ok(IntCsv {
            route: Route::new(path)?,
            default: None,
        })
    }

    pub fn with_default(mut self, default: impl IntoIterator<Item = i64>) -> Self {
        self.default = Some(default.into_iter().collect());
        self
    }

    /// Reads the list. A non-numeric item fails the whole read.
    pub fn get(&self, reader: &ScopedReader) -> ConfigResult<Vec<i64>> {
        let read = reader.string(self.route.segments()).and_then(|raw| {
            split_csv(&raw)
                .map(|item| {
                    item.parse::<i64>().map_err(|_| {
                        ConfigError::from(CoreError::TypeMismatch {
                            expected: "int",
                            actual: "string",
                        })
                    })
                })
                .collect::<ConfigResult<Vec<i64>>>()
        });
        self.route.or_default(read, &self.default)
    }

    pub fn write(&self, svc: &ConfigService, items: &[i64], scope: ScopeRef) -> ConfigResult<()> {
        let joined = items
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        self.route.write(svc, joined.into(), scope)
    }
}

fn split_csv(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(CSV_SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
}
