//! # Scope Levels
//!
//! A configuration value applies at one of four breadths.
//!
//! ## Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Scope Hierarchy                                  │
//! │                                                                         │
//! │   Default (global, id 0)          key prefix: default/0/...            │
//! │      └── Website (id > 0)         key prefix: websites/<id>/...        │
//! │            └── Group (id > 0)     key prefix: groups/<id>/...          │
//! │                  └── Store (id>0) key prefix: stores/<id>/...          │
//! │                                                                         │
//! │   Reads fall back upwards: store → group → website → default           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

// =============================================================================
// Scope
// =============================================================================

/// The breadth at which a configuration value applies.
///
/// Ordered from broadest to most specific.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Scope {
    /// Global scope.
    #[default]
    #[serde(rename = "default")]
    Default,
    /// A website.
    #[serde(rename = "websites", alias = "website")]
    Website,
    /// A store group inside a website.
    #[serde(rename = "groups", alias = "group")]
    Group,
    /// A single store view; the most specific scope.
    #[serde(rename = "stores", alias = "store")]
    Store,
}

impl Scope {
    /// All scopes, broadest first.
    pub const ALL: [Scope; 4] = [Scope::Default, Scope::Website, Scope::Group, Scope::Store];

    /// Returns the string used in fully-qualified keys.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Scope::Default => "default",
            Scope::Website => "websites",
            Scope::Group => "groups",
            Scope::Store => "stores",
        }
    }

    /// Returns the next broader scope, or None for Default.
    pub const fn parent(&self) -> Option<Scope> {
        match self {
            Scope::Default => None,
            Scope::Website => Some(Scope::Default),
            Scope::Group => Some(Scope::Website),
            Scope::Store => Some(Scope::Group),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Scope {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(Scope::Default),
            "websites" | "website" => Ok(Scope::Website),
            "groups" | "group" => Ok(Scope::Group),
            "stores" | "store" => Ok(Scope::Store),
            other => Err(CoreError::UnknownScope(other.to_string())),
        }
    }
}

// =============================================================================
// Scope Reference
// =============================================================================

/// A scope together with the ID of the website, group or store it names.
///
/// ## Normalization
/// Construction never fails. A non-default scope without a positive ID
/// degrades to `(Default, 0)`, and `Default` always carries ID 0:
///
/// ```rust
/// use cascade_core::{Scope, ScopeRef};
///
/// assert_eq!(ScopeRef::new(Scope::Store, 0), ScopeRef::default_scope());
/// assert_eq!(ScopeRef::new(Scope::Website, -4), ScopeRef::default_scope());
/// assert_eq!(ScopeRef::new(Scope::Default, 9).id(), 0);
/// assert_eq!(ScopeRef::store(3).scope(), Scope::Store);
/// ```
///
/// Deserialization goes through the same rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "RawScopeRef")]
pub struct ScopeRef {
    scope: Scope,
    id: i64,
}

/// Wire form of a [`ScopeRef`] before normalization.
#[derive(Deserialize)]
struct RawScopeRef {
    scope: Scope,
    #[serde(default)]
    id: i64,
}

impl From<RawScopeRef> for ScopeRef {
    fn from(raw: RawScopeRef) -> Self {
        ScopeRef::new(raw.scope, raw.id)
    }
}

impl ScopeRef {
    /// Creates a normalized scope reference.
    pub const fn new(scope: Scope, id: i64) -> Self {
        match scope {
            Scope::Default => ScopeRef {
                scope: Scope::Default,
                id: 0,
            },
            _ if id < 1 => ScopeRef {
                scope: Scope::Default,
                id: 0,
            },
            _ => ScopeRef { scope, id },
        }
    }

    /// The global scope.
    pub const fn default_scope() -> Self {
        ScopeRef::new(Scope::Default, 0)
    }

    /// Website scope.
    pub const fn website(id: i64) -> Self {
        ScopeRef::new(Scope::Website, id)
    }

    /// Group scope.
    pub const fn group(id: i64) -> Self {
        ScopeRef::new(Scope::Group, id)
    }

    /// Store scope.
    pub const fn store(id: i64) -> Self {
        ScopeRef::new(Scope::Store, id)
    }

    /// Returns the scope level.
    #[inline]
    pub const fn scope(&self) -> Scope {
        self.scope
    }

    /// Returns the scope ID (0 for default).
    #[inline]
    pub const fn id(&self) -> i64 {
        self.id
    }

    /// Returns true for the global scope.
    #[inline]
    pub const fn is_default(&self) -> bool {
        matches!(self.scope, Scope::Default)
    }
}

impl fmt::Display for ScopeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.scope, self.id)
    }
}

impl From<(Scope, i64)> for ScopeRef {
    fn from((scope, id): (Scope, i64)) -> Self {
        ScopeRef::new(scope, id)
    }
}

impl From<ScopeRef> for (Scope, i64) {
    fn from(r: ScopeRef) -> Self {
        (r.scope, r.id)
    }
}
