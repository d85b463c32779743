//! # Service Settings
//!
//! Initial configuration values and logging options, loaded from TOML.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     CASCADE_LOG=debug                                                  │
//! │     CASCADE_BASE_URL=https://shop.example.com/                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $CASCADE_CONFIG, or                                                │
//! │     ~/.config/cascade/config.toml (Linux)                              │
//! │     ~/Library/Application Support/com.cascade.cascade/config.toml     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     web/cascade/base_url = "http://localhost:9500/"                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [logging]
//! filter = "info,cascade=debug"
//!
//! [defaults]
//! "general/locale/code" = "en_US"
//! "catalog/frontend/list_per_page" = 12
//!
//! [websites.1]
//! "general/locale/code" = "de_DE"
//!
//! [stores.3]
//! "general/locale/code" = "de_CH"
//! "general/country/allow" = ["CH", "DE", "AT"]   # stored as "CH,DE,AT"
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use cascade_core::path::split_path;
use cascade_core::{ConfigValue, PathKey, Scope, ScopeRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::storage::Writer;

/// Path of the built-in base URL default.
pub const BASE_URL_PATH: &str = "web/cascade/base_url";

/// Value of the built-in base URL default.
pub const DEFAULT_BASE_URL: &str = "http://localhost:9500/";

/// Default `tracing` filter directive.
pub const DEFAULT_LOG_FILTER: &str = "info,cascade=debug";

/// `"section/group/field" = value` entries for one scope.
pub type ValueTable = BTreeMap<String, toml::Value>;

// =============================================================================
// Logging Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_log_filter(),
        }
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Everything read from the settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Values at the default scope.
    #[serde(default)]
    pub defaults: ValueTable,

    /// Values per website ID.
    #[serde(default)]
    pub websites: BTreeMap<String, ValueTable>,

    /// Values per group ID.
    #[serde(default)]
    pub groups: BTreeMap<String, ValueTable>,

    /// Values per store ID.
    #[serde(default)]
    pub stores: BTreeMap<String, ValueTable>,
}

impl Default for Settings {
    fn default() -> Self {
        let mut settings = Settings {
            logging: LoggingSettings::default(),
            defaults: ValueTable::new(),
            websites: BTreeMap::new(),
            groups: BTreeMap::new(),
            stores: BTreeMap::new(),
        };
        settings.apply_builtin_defaults();
        settings
    }
}

impl Settings {
    // =========================================================================
    // Loading
    // =========================================================================

    /// Loads settings: defaults, then the TOML file, then the environment.
    ///
    /// A missing file is not an error.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut settings = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading settings from file");
                let contents = std::fs::read_to_string(&path)?;
                settings = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Settings file not found, using defaults");
            }
        }

        settings.apply_env_overrides();
        settings.validate()?;

        Ok(settings)
    }

    /// Loads settings or falls back to the defaults.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load settings: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses settings from TOML text. Built-in defaults the file does not
    /// override are kept.
    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        let mut settings: Settings = toml::from_str(contents)?;
        settings.apply_builtin_defaults();
        Ok(settings)
    }

    fn apply_builtin_defaults(&mut self) {
        self.defaults
            .entry(BASE_URL_PATH.to_string())
            .or_insert_with(|| toml::Value::String(DEFAULT_BASE_URL.to_string()));
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(filter) = std::env::var("CASCADE_LOG") {
            debug!(filter = %filter, "Overriding log filter from environment");
            self.logging.filter = filter;
        }

        if let Ok(url) = std::env::var("CASCADE_BASE_URL") {
            debug!(url = %url, "Overriding base URL from environment");
            self.defaults
                .insert(BASE_URL_PATH.to_string(), toml::Value::String(url));
        }
    }

    /// `$CASCADE_CONFIG`, else `config.toml` in the platform config dir.
    pub fn default_config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("CASCADE_CONFIG") {
            return Some(PathBuf::from(path));
        }
        directories::ProjectDirs::from("com", "cascade", "cascade")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Checks every path, scope ID and value.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "logging.filter must not be empty".into(),
            ));
        }
        self.entries().map(|_| ())
    }

    // =========================================================================
    // Seeding
    // =========================================================================

    /// Every configured value with its key, defaults first, then websites,
    /// groups and stores.
    pub fn entries(&self) -> ConfigResult<Vec<(PathKey, ConfigValue)>> {
        let mut out = Vec::new();
        collect(&mut out, &self.defaults, ScopeRef::default_scope())?;

        for (scope, tables) in [
            (Scope::Website, &self.websites),
            (Scope::Group, &self.groups),
            (Scope::Store, &self.stores),
        ] {
            for (id, table) in tables {
                collect(&mut out, table, parse_scope_id(scope, id)?)?;
            }
        }
        Ok(out)
    }

    /// Writes every configured value through `writer`. Returns the number of
    /// values written.
    pub fn seed(&self, writer: &dyn Writer) -> ConfigResult<usize> {
        let entries = self.entries()?;
        let count = entries.len();
        for (key, value) in entries {
            writer.set(&key.fq(), value)?;
        }
        info!(count, "Seeded configuration values");
        Ok(count)
    }
}

fn parse_scope_id(scope: Scope, raw: &str) -> ConfigResult<ScopeRef> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(ScopeRef::new(scope, id)),
        _ => Err(ConfigError::InvalidConfig(format!(
            "{scope} ID must be a positive integer, got {raw:?}"
        ))),
    }
}

fn collect(
    out: &mut Vec<(PathKey, ConfigValue)>,
    table: &ValueTable,
    scope: ScopeRef,
) -> ConfigResult<()> {
    for (path, value) in table {
        let segments = split_path(&[path])
            .map_err(|e| ConfigError::InvalidConfig(format!("{scope}: {e}")))?;
        let key = PathKey::at(&segments, scope)?;
        let value = to_config_value(value)
            .map_err(|reason| ConfigError::InvalidConfig(format!("{key}: {reason}")))?;
        out.push((key, value));
    }
    Ok(())
}

/// Converts a TOML value. Arrays of scalars become comma separated strings.
fn to_config_value(value: &toml::Value) -> Result<ConfigValue, String> {
    match value {
        toml::Value::String(s) => Ok(ConfigValue::String(s.clone())),
        toml::Value::Integer(i) => Ok(ConfigValue::Int(*i)),
        toml::Value::Float(f) => Ok(ConfigValue::Float(*f)),
        toml::Value::Boolean(b) => Ok(ConfigValue::Bool(*b)),
        toml::Value::Datetime(dt) => {
            let raw = dt.to_string();
            Ok(DateTime::parse_from_rfc3339(&raw)
                .map(|dt| ConfigValue::DateTime(dt.with_timezone(&Utc)))
                .unwrap_or(ConfigValue::String(raw)))
        }
        toml::Value::Array(items) => {
            let parts = items
                .iter()
                .map(|item| match item {
                    toml::Value::Array(_) | toml::Value::Table(_) => {
                        Err("nested arrays and tables are not supported".to_string())
                    }
                    scalar => to_config_value(scalar).map(|v| v.as_string()),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ConfigValue::String(parts.join(",")))
        }
        toml::Value::Table(_) => Err("tables are not supported as values".to_string()),
    }
}
