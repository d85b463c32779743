//! # Config Service
//!
//! The long-lived object applications hold: storage, the change notifier and
//! the read helpers in one place. Create it once at startup and pass it
//! around by reference or `Arc`.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   write(arg)                                                            │
//! │     │                                                                   │
//! │     ├── storage.set(arg.key.fq(), value)   errors returned to caller    │
//! │     │                                                                   │
//! │     └── notifier.publish(arg)              best effort, never fails     │
//! │                                            dropped once closed          │
//! │                                                                         │
//! │   scoped(w, g, s) ──► ScopedReader over the same storage                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use cascade_core::{ConfigValue, PathKey};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::debug;

use crate::arg::Arg;
use crate::error::ConfigResult;
use crate::listener::{ChangeEvent, ChangeListener, ChannelListener};
use crate::notifier::Notifier;
use crate::registry::SubscriptionId;
use crate::scoped::ScopedReader;
use crate::settings::Settings;
use crate::storage::{Getter, GetterExt, MemoryStore, Storage};

/// Scoped configuration with change notification.
pub struct ConfigService {
    storage: Arc<dyn Storage>,
    notifier: Notifier,
}

impl ConfigService {
    /// Creates a service over the given storage and starts the notifier.
    pub fn new(storage: Arc<dyn Storage>) -> ConfigResult<Self> {
        Ok(ConfigService {
            storage,
            notifier: Notifier::new()?,
        })
    }

    /// Creates a service over an empty in-memory store.
    pub fn in_memory() -> ConfigResult<Self> {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Creates an in-memory service seeded from settings.
    ///
    /// Seeding writes straight to storage; no change events are published.
    pub fn with_settings(settings: &Settings) -> ConfigResult<Self> {
        let store = MemoryStore::new();
        settings.seed(&store)?;
        Self::new(Arc::new(store))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Stores the value, then publishes the change.
    ///
    /// An argument without a value fails with `EmptyValue`.
    pub fn write(&self, arg: Arg) -> ConfigResult<()> {
        let value = arg.require_value()?.clone();
        let key = arg.key.fq();
        self.storage.set(&key, value)?;
        debug!(key = %key, "Config value written");
        self.notifier.publish(arg);
        Ok(())
    }

    // =========================================================================
    // Reads at an explicit scope
    // =========================================================================

    pub fn get(&self, key: &PathKey) -> ConfigResult<ConfigValue> {
        self.storage.value_at(key)
    }

    pub fn string(&self, key: &PathKey) -> ConfigResult<String> {
        self.storage.string_at(key)
    }

    pub fn bool(&self, key: &PathKey) -> ConfigResult<bool> {
        self.storage.bool_at(key)
    }

    pub fn float64(&self, key: &PathKey) -> ConfigResult<f64> {
        self.storage.float64_at(key)
    }

    pub fn int(&self, key: &PathKey) -> ConfigResult<i64> {
        self.storage.int_at(key)
    }

    pub fn date_time(&self, key: &PathKey) -> ConfigResult<DateTime<Utc>> {
        self.storage.date_time_at(key)
    }

    /// A reader bound to a website, group and store (0 = not set).
    pub fn scoped(&self, website_id: i64, group_id: i64, store_id: i64) -> ScopedReader {
        let root: Arc<dyn Getter> = Arc::new(Arc::clone(&self.storage));
        ScopedReader::new(root, website_id, group_id, store_id)
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Subscribes a listener to a topic (`a`, `a/b` or `a/b/c`).
    pub fn subscribe(
        &self,
        topic: &str,
        listener: impl ChangeListener + 'static,
    ) -> ConfigResult<SubscriptionId> {
        self.notifier.subscribe(topic, Arc::new(listener))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> ConfigResult<()> {
        self.notifier.unsubscribe(id)
    }

    /// Subscribes a channel to a topic for async consumers.
    ///
    /// Dropping the receiver ends the subscription on the next matching
    /// change.
    pub fn watch(
        &self,
        topic: &str,
        capacity: usize,
    ) -> ConfigResult<(SubscriptionId, mpsc::Receiver<ChangeEvent>)> {
        let (listener, rx) = ChannelListener::channel(capacity);
        let id = self.subscribe(topic, listener)?;
        Ok((id, rx))
    }

    /// Stops change notification. Storage stays usable.
    pub fn close(&self) -> ConfigResult<()> {
        self.notifier.close()
    }

    pub fn is_closed(&self) -> bool {
        self.notifier.is_closed()
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }
}

impl Getter for ConfigService {
    fn get(&self, key: &str) -> ConfigResult<ConfigValue> {
        self.storage.get(key)
    }
}

impl std::fmt::Debug for ConfigService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigService")
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}
