//! # Change Notifier
//!
//! Publishes write events to subscribed listeners on one background thread.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   publish(arg) ──► events (rendezvous, bounded(0)) ──┐                 │
//! │                                                       │                 │
//! │   close() ─────► stop ───────────────────────────────┤                 │
//! │                                                       ▼                 │
//! │                                     ┌──────────────────────────────┐    │
//! │                                     │  worker thread (select!)     │    │
//! │                                     │                              │    │
//! │                                     │  for topic in [l1, l2, all]  │    │
//! │                                     │    for listener in registry  │    │
//! │                                     │      catch_unwind(on_change) │    │
//! │                                     │      Err / panic ──► evict   │    │
//! │                                     └──────────────────────────────┘    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lifecycle
//! `Open` → `close()` → `Closed`. Closing is final: a second `close()` fails
//! with [`ConfigError::AlreadyClosed`] and later publishes are **silently
//! dropped**.
//!
//! ## Backpressure
//! The event channel has no buffer, so `publish` blocks until the worker is
//! ready to take the event. A listener that never returns stalls every later
//! notification; there is no per-listener timeout.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, select, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use cascade_core::PathKey;

use crate::arg::Arg;
use crate::error::{ConfigError, ConfigResult};
use crate::listener::ChangeListener;
use crate::registry::{Registry, SubscriptionId};

/// Asynchronous, crash-isolated change broadcaster.
pub struct Notifier {
    registry: Arc<Registry>,
    events: Mutex<Option<Sender<Arg>>>,
    stop: Mutex<Option<Sender<()>>>,
    worker: Mutex<Option<JoinHandle<ConfigResult<()>>>>,
    closed: AtomicBool,
}

impl Notifier {
    /// Creates a notifier and starts its worker thread.
    pub fn new() -> ConfigResult<Self> {
        let registry = Arc::new(Registry::new());
        let (event_tx, event_rx) = bounded::<Arg>(0);
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let worker_registry = Arc::clone(&registry);
        let handle = std::thread::Builder::new()
            .name("cascade-notifier".into())
            .spawn(move || run(worker_registry, event_rx, stop_rx))
            .map_err(|e| ConfigError::Internal(format!("Failed to spawn notifier: {e}")))?;

        info!("Config notifier started");

        Ok(Notifier {
            registry,
            events: Mutex::new(Some(event_tx)),
            stop: Mutex::new(Some(stop_tx)),
            worker: Mutex::new(Some(handle)),
            closed: AtomicBool::new(false),
        })
    }

    /// Registers a listener for a topic (`a`, `a/b` or `a/b/c`).
    ///
    /// Fails with `AlreadyClosed` once [`close`](Self::close) has started.
    pub fn subscribe(
        &self,
        topic: &str,
        listener: Arc<dyn ChangeListener>,
    ) -> ConfigResult<SubscriptionId> {
        if self.is_closed() {
            return Err(ConfigError::AlreadyClosed);
        }
        let id = self.registry.subscribe(topic, listener)?;

        // close() sets the flag before clearing the registry, so an insert
        // that lands after the clear is seen here and rolled back.
        if self.is_closed() {
            self.registry.unsubscribe(id);
            return Err(ConfigError::AlreadyClosed);
        }
        Ok(id)
    }

    /// Removes a subscription. Unknown IDs are not an error.
    pub fn unsubscribe(&self, id: SubscriptionId) -> ConfigResult<()> {
        self.registry.unsubscribe(id);
        Ok(())
    }

    /// Hands an event to the worker.
    ///
    /// Blocks until the worker takes it. After [`close`](Self::close) the
    /// event is dropped without error.
    pub fn publish(&self, arg: Arg) {
        if self.is_closed() {
            debug!(key = %arg.key, "Notifier closed, dropping event");
            return;
        }

        // Clone the sender so close() never waits on a blocked publisher.
        let Some(tx) = self.events.lock().clone() else {
            return;
        };
        if tx.send(arg).is_err() {
            debug!("Notifier worker gone, event dropped");
        }
    }

    /// Stops the worker and waits for it to finish.
    pub fn close(&self) -> ConfigResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(ConfigError::AlreadyClosed);
        }

        if let Some(stop) = self.stop.lock().take() {
            let _ = stop.send(());
        }
        self.events.lock().take();

        let handle = self.worker.lock().take();
        let result = match handle {
            // Closed from inside a listener: the worker exits on its own.
            Some(handle) if handle.thread().id() == std::thread::current().id() => Ok(()),
            Some(handle) => handle.join().map_err(|payload| {
                ConfigError::Internal(format!(
                    "Notifier worker panicked: {}",
                    panic_message(payload.as_ref())
                ))
            })?,
            None => Ok(()),
        };

        self.registry.clear();
        info!("Config notifier closed");
        result
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// The subscription registry shared with the worker.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        if !self.is_closed() {
            if let Err(e) = self.close() {
                warn!(error = %e, "Notifier shutdown failed");
            }
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("registry", &self.registry)
            .field("closed", &self.is_closed())
            .finish()
    }
}

// =============================================================================
// Worker
// =============================================================================

fn run(registry: Arc<Registry>, events: Receiver<Arg>, stop: Receiver<()>) -> ConfigResult<()> {
    debug!("Notifier worker running");
    loop {
        select! {
            recv(events) -> msg => match msg {
                Ok(arg) => dispatch(&registry, &arg.key),
                Err(_) => {
                    debug!("Event channel closed, worker exiting");
                    return Ok(());
                }
            },
            recv(stop) -> _ => {
                debug!("Notifier worker received stop signal");
                return Ok(());
            }
        }
    }
}

/// Invokes every listener on the key's topics, level1 first.
///
/// A listener subscribed to several matching topics is called once per topic.
fn dispatch(registry: &Registry, key: &PathKey) {
    let path = key.level_all();
    let (scope, scope_id) = (key.scope(), key.scope_id());

    for topic in key.topics() {
        for (id, listener) in registry.listeners_for(&topic) {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                listener.on_change(&path, scope, scope_id)
            }));

            let failure = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(payload) => ConfigError::ListenerPanicked(panic_message(payload.as_ref())),
            };

            warn!(
                topic = %topic,
                id,
                error = %failure,
                "Listener failed, unsubscribing"
            );
            registry.unsubscribe(id);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
