//! # cascade-config: Scoped Configuration Service
//!
//! Hierarchical configuration (default → website → group → store) with
//! scope fallback on reads and change notification on writes.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Settings (TOML) ──seed──► Storage (Getter + Writer)                   │
//! │                                 ▲          ▲                            │
//! │                       set(fq)   │          │ get(fq)                    │
//! │                                 │          │                            │
//! │   ConfigService::write(Arg) ────┘    ScopedReader                       │
//! │            │                          string: store→group→website→def   │
//! │            │ publish                  others: resolved scope only       │
//! │            ▼                                                            │
//! │   Notifier ──worker thread──► Registry["a"], ["a/b"], ["a/b/c"]         │
//! │                                  │                                      │
//! │                                  ▼                                      │
//! │                          ChangeListener::on_change                      │
//! │                          (error or panic ⇒ unsubscribed)                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`storage`] - `Getter`/`Writer` seam and the in-memory store
//! - [`arg`] - Write arguments and their builder
//! - [`scoped`] - Scoped reads with fallback
//! - [`listener`] - Listener trait, closures and channel listeners
//! - [`registry`] - Topic to listener map
//! - [`notifier`] - Background change dispatch
//! - [`service`] - `ConfigService`, the composition root
//! - [`model`] - Typed config paths
//! - [`settings`] - TOML settings and seeding
//! - [`error`] - Error types
//!
//! ## Example Usage
//!
//! ```rust
//! use cascade_config::{Arg, ConfigService, ConfigResult};
//! use cascade_core::Scope;
//!
//! let svc = ConfigService::in_memory().unwrap();
//!
//! svc.subscribe("general/locale", |path: &str, scope: Scope, id: i64| -> ConfigResult<()> {
//!     println!("{path} changed at {scope}/{id}");
//!     Ok(())
//! })
//! .unwrap();
//!
//! svc.write(Arg::builder().path(["general/locale/code"]).value("en_US").build().unwrap())
//!     .unwrap();
//!
//! let reader = svc.scoped(1, 2, 3);
//! assert_eq!(reader.string(&["general/locale/code"]).unwrap(), "en_US");
//!
//! svc.close().unwrap();
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod arg;
pub mod error;
pub mod listener;
pub mod model;
pub mod notifier;
pub mod registry;
pub mod scoped;
pub mod service;
pub mod settings;
pub mod storage;

// =============================================================================
// Re-exports
// =============================================================================

pub use arg::{Arg, ArgBuilder};
pub use error::{ConfigError, ConfigResult};
pub use listener::{ChangeEvent, ChangeListener, ChannelListener};
pub use notifier::Notifier;
pub use registry::{Registry, SubscriptionId};
pub use scoped::ScopedReader;
pub use service::ConfigService;
pub use settings::Settings;
pub use storage::{Getter, GetterExt, MemoryStore, Storage, Writer};
