//! # Change Listeners
//!
//! A listener is anything that can be told "this path changed at this
//! scope". Plain closures qualify; [`ChannelListener`] forwards changes to an
//! async consumer.
//!
//! Returning an error (or panicking) from [`ChangeListener::on_change`]
//! permanently removes the subscription.

use cascade_core::{PathKey, Scope};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::{ConfigError, ConfigResult};

/// Receives change notifications for a subscribed topic.
pub trait ChangeListener: Send + Sync {
    /// Called on the notifier's worker thread with the full path
    /// (`section/group/field`) and the scope it was written at.
    fn on_change(&self, path: &str, scope: Scope, scope_id: i64) -> ConfigResult<()>;
}

impl<F> ChangeListener for F
where
    F: Fn(&str, Scope, i64) -> ConfigResult<()> + Send + Sync,
{
    fn on_change(&self, path: &str, scope: Scope, scope_id: i64) -> ConfigResult<()> {
        self(path, scope, scope_id)
    }
}

// =============================================================================
// Change Event
// =============================================================================

/// An owned change notification, as delivered to async watchers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub path: String,
    pub scope: Scope,
    pub scope_id: i64,
}

impl ChangeEvent {
    pub fn new(path: impl Into<String>, scope: Scope, scope_id: i64) -> Self {
        ChangeEvent {
            path: path.into(),
            scope,
            scope_id,
        }
    }

    /// Rebuilds the path key the change was written at.
    pub fn key(&self) -> ConfigResult<PathKey> {
        Ok(PathKey::build(&[&self.path], self.scope, self.scope_id)?)
    }
}

// =============================================================================
// Channel Listener
// =============================================================================

/// Forwards changes into a bounded tokio channel.
///
/// Delivery never blocks the worker: when the channel is full the change is
/// dropped with a warning. Once the receiver is gone the listener fails and
/// the notifier evicts it.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: mpsc::Sender<ChangeEvent>,
}

impl ChannelListener {
    /// Creates a listener and the receiver that consumes its events.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ChangeEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (ChannelListener { tx }, rx)
    }
}

impl ChangeListener for ChannelListener {
    fn on_change(&self, path: &str, scope: Scope, scope_id: i64) -> ConfigResult<()> {
        match self.tx.try_send(ChangeEvent::new(path, scope, scope_id)) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!(path = %event.path, scope = %event.scope, "Watcher channel full, dropping change");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                Err(ConfigError::listener("watcher receiver dropped"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_listener() {
        let listener = |path: &str, scope: Scope, id: i64| -> ConfigResult<()> {
            assert_eq!((path, scope, id), ("a/b/c", Scope::Store, 3));
            Ok(())
        };
        listener.on_change("a/b/c", Scope::Store, 3).unwrap();
    }

    #[test]
    fn test_change_event_key() {
        let event = ChangeEvent::new("a/b/c", Scope::Website, 2);
        assert_eq!(event.key().unwrap().fq(), "websites/2/a/b/c");
    }

    #[test]
    fn test_channel_listener_delivers() {
        let (listener, mut rx) = ChannelListener::channel(4);
        listener.on_change("a/b/c", Scope::Default, 0).unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            ChangeEvent::new("a/b/c", Scope::Default, 0)
        );
    }

    #[test]
    fn test_channel_listener_full_drops() {
        let (listener, mut rx) = ChannelListener::channel(1);
        listener.on_change("a/b/c", Scope::Default, 0).unwrap();
        listener.on_change("a/b/d", Scope::Default, 0).unwrap();
        assert_eq!(rx.try_recv().unwrap().path, "a/b/c");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_listener_fails_when_receiver_dropped() {
        let (listener, rx) = ChannelListener::channel(1);
        drop(rx);
        let err = listener.on_change("a/b/c", Scope::Default, 0).unwrap_err();
        assert!(err.is_listener_failure());
    }
}
