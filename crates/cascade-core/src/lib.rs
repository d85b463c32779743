//! # cascade-core: Pure Types for Scoped Configuration
//!
//! This crate holds the value types every other part of Cascade speaks in.
//! It contains no I/O, no threads and no storage.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cascade Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/cascade-cli                             │   │
//! │  │          get ──► set (+ watch) ──► dump                         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    cascade-config                               │   │
//! │  │   ConfigService, ScopedReader, Notifier, Registry, Settings     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ cascade-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌─────────────┐                 │   │
//! │  │   │   scope   │  │   path    │  │    value    │                 │   │
//! │  │   │  Scope    │  │  PathKey  │  │ ConfigValue │                 │   │
//! │  │   │  ScopeRef │  │  fq keys  │  │ conversions │                 │   │
//! │  │   └───────────┘  └───────────┘  └─────────────┘                 │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO STORAGE • NO THREADS • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`scope`] - `Scope` levels and the normalizing `ScopeRef`
//! - [`path`] - `PathKey`, a path of three or more levels plus scope
//! - [`value`] - `ConfigValue` and its typed conversions
//! - [`error`] - Core error types
//!
//! ## Example Usage
//!
//! ```rust
//! use cascade_core::{PathKey, Scope};
//!
//! let key = PathKey::build(&["general/locale/code"], Scope::Store, 3).unwrap();
//! assert_eq!(key.fq(), "stores/3/general/locale/code");
//! assert_eq!(key.level1(), "general");
//! assert_eq!(key.level2(), "general/locale");
//!
//! // A non-default scope without a positive ID degrades to default.
//! let key = PathKey::build(&["general", "locale", "code"], Scope::Website, 0).unwrap();
//! assert_eq!(key.fq(), "default/0/general/locale/code");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod path;
pub mod scope;
pub mod value;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult};
pub use path::PathKey;
pub use scope::{Scope, ScopeRef};
pub use value::ConfigValue;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Minimum number of segments in a configuration path (`section/group/field`).
pub const HIERARCHY_LEVEL: usize = 3;

/// Separator between path segments and between the parts of a
/// fully-qualified key.
pub const PATH_SEPARATOR: char = '/';
