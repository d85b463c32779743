//! # Subscription Registry
//!
//! Maps topics to their listeners. A topic is one of the three prefixes of a
//! path: `a`, `a/b` or `a/b/c`.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   RwLock<Inner>                                                         │
//! │     next_id: 4                                                          │
//! │     topics:                                                             │
//! │       "general"              ──► { 1: listener, 3: listener }           │
//! │       "general/locale"       ──► { 2: listener }                        │
//! │                                                                         │
//! │   IDs start at 1, only grow, and are never reused.                      │
//! │   A topic whose last listener is removed is dropped from the map.       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use cascade_core::CoreError;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::ConfigResult;
use crate::listener::ChangeListener;

/// Identifier returned by [`Registry::subscribe`].
pub type SubscriptionId = u64;

#[derive(Default)]
struct Inner {
    topics: HashMap<String, HashMap<SubscriptionId, Arc<dyn ChangeListener>>>,
    next_id: SubscriptionId,
}

/// Thread-safe topic to listener map.
#[derive(Default)]
pub struct Registry {
    inner: RwLock<Inner>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener for a topic and returns its ID.
    pub fn subscribe(
        &self,
        topic: &str,
        listener: Arc<dyn ChangeListener>,
    ) -> ConfigResult<SubscriptionId> {
        if topic.is_empty() {
            return Err(CoreError::EmptyPath.into());
        }

        let mut inner = self.inner.write();
        inner.next_id += 1;
        let id = inner.next_id;
        inner
            .topics
            .entry(topic.to_string())
            .or_default()
            .insert(id, listener);

        debug!(topic, id, "Listener subscribed");
        Ok(id)
    }

    /// Removes a subscription. Unknown IDs are ignored.
    ///
    /// Returns true if something was removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        let Some(topic) = inner
            .topics
            .iter()
            .find(|(_, subs)| subs.contains_key(&id))
            .map(|(topic, _)| topic.clone())
        else {
            return false;
        };

        if let Some(subs) = inner.topics.get_mut(&topic) {
            subs.remove(&id);
            if subs.is_empty() {
                inner.topics.remove(&topic);
            }
        }
        debug!(topic = %topic, id, "Listener unsubscribed");
        true
    }

    /// Snapshot of the listeners registered for exactly this topic.
    ///
    /// The lock is released before the caller invokes them, so a listener may
    /// subscribe or unsubscribe from inside its callback.
    pub fn listeners_for(&self, topic: &str) -> Vec<(SubscriptionId, Arc<dyn ChangeListener>)> {
        self.inner
            .read()
            .topics
            .get(topic)
            .map(|subs| {
                subs.iter()
                    .map(|(id, listener)| (*id, Arc::clone(listener)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Total number of subscriptions.
    pub fn len(&self) -> usize {
        self.inner.read().topics.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().topics.is_empty()
    }

    /// Number of topics with at least one listener.
    pub fn topic_count(&self) -> usize {
        self.inner.read().topics.len()
    }

    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.inner
            .read()
            .topics
            .values()
            .any(|subs| subs.contains_key(&id))
    }

    /// Drops every subscription. IDs keep counting from where they were.
    pub fn clear(&self) {
        self.inner.write().topics.clear();
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("Registry")
            .field("topics", &inner.topics.len())
            .field("next_id", &inner.next_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_core::Scope;

    fn noop() -> Arc<dyn ChangeListener> {
        Arc::new(|_: &str, _: Scope, _: i64| -> ConfigResult<()> { Ok(()) })
    }

    #[test]
    fn test_ids_start_at_one_and_grow() {
        let registry = Registry::new();
        assert_eq!(registry.subscribe("a", noop()).unwrap(), 1);
        assert_eq!(registry.subscribe("a/b", noop()).unwrap(), 2);
        assert_eq!(registry.subscribe("a", noop()).unwrap(), 3);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.topic_count(), 2);
    }

    #[test]
    fn test_ids_are_never_reused() {
        let registry = Registry::new();
        let first = registry.subscribe("a", noop()).unwrap();
        assert!(registry.unsubscribe(first));
        let second = registry.subscribe("a", noop()).unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_empty_topic_is_rejected() {
        let registry = Registry::new();
        let err = registry.subscribe("", noop()).unwrap_err();
        assert!(err.is_path_error());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_empty_topics_are_removed() {
        let registry = Registry::new();
        let a = registry.subscribe("a/b", noop()).unwrap();
        let b = registry.subscribe("a/b", noop()).unwrap();

        registry.unsubscribe(a);
        assert_eq!(registry.topic_count(), 1);
        assert_eq!(registry.listeners_for("a/b").len(), 1);

        registry.unsubscribe(b);
        assert_eq!(registry.topic_count(), 0);
        assert!(registry.listeners_for("a/b").is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unsubscribe_unknown_is_noop() {
        let registry = Registry::new();
        registry.subscribe("a", noop()).unwrap();
        assert!(!registry.unsubscribe(99));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_listeners_for_exact_topic_only() {
        let registry = Registry::new();
        let id = registry.subscribe("a", noop()).unwrap();
        registry.subscribe("a/b/c", noop()).unwrap();

        let found = registry.listeners_for("a");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, id);
        assert!(registry.listeners_for("a/b").is_empty());
        assert!(registry.contains(id));
    }
}
