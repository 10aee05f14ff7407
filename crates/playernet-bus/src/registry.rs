//! # Notification Registry
//!
//! Per notification kind, a mutation-safe set of locally-registered
//! callbacks. Dispatch always works off a snapshot taken when the message
//! arrived: a listener unregistering mid-dispatch cannot make siblings be
//! skipped or double-invoked. A panicking listener is isolated and logged;
//! it never takes down the dispatch task or its siblings.

use playernet_protocol::{ConnectRequest, LoginNotify, LogoutNotify};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::error;

/// A registered callback for notifications of type `T`.
pub type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Entry<T> {
    id: u64,
    callback: Callback<T>,
}

struct Inner<T> {
    listeners: RwLock<Vec<Entry<T>>>,
    next_id: AtomicU64,
}

/// An ordered, mutation-safe collection of callbacks for one kind.
pub struct ListenerSet<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for ListenerSet<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for ListenerSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ListenerSet<T> {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                listeners: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Append a callback; the returned guard removes exactly this callback.
    pub fn add(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> ListenerGuard
    where
        T: Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut listeners) = self.inner.listeners.write() {
            listeners.push(Entry {
                id,
                callback: Arc::new(callback),
            });
        }

        let inner = Arc::clone(&self.inner);
        ListenerGuard {
            detach: Some(Box::new(move || {
                if let Ok(mut listeners) = inner.listeners.write() {
                    listeners.retain(|entry| entry.id != id);
                }
            })),
        }
    }

    /// Number of currently registered callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.listeners.read().map(|l| l.len()).unwrap_or(0)
    }

    /// Whether the set holds no callbacks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stable snapshot of the current callbacks.
    ///
    /// Taken at message-arrival time; dispatch iterates over this snapshot
    /// regardless of concurrent register/unregister calls.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Callback<T>> {
        self.inner
            .listeners
            .read()
            .map(|listeners| listeners.iter().map(|e| Arc::clone(&e.callback)).collect())
            .unwrap_or_default()
    }

    /// Invoke every callback in `snapshot` with `value`.
    ///
    /// Each callback's failure is isolated: a panic is caught and logged,
    /// and the remaining callbacks in the same dispatch still run.
    pub fn dispatch(snapshot: &[Callback<T>], value: &T) {
        for callback in snapshot {
            if catch_unwind(AssertUnwindSafe(|| callback(value))).is_err() {
                error!("Notification listener panicked during dispatch");
            }
        }
    }
}

/// Handle returned by a registration; removes exactly that callback.
///
/// Dropping the guard without calling [`unsubscribe`](Self::unsubscribe)
/// leaves the callback registered, matching the explicit-teardown contract
/// of the wire API.
pub struct ListenerGuard {
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl ListenerGuard {
    /// Remove the callback this guard was returned for.
    pub fn unsubscribe(mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl std::fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerGuard")
            .field("active", &self.detach.is_some())
            .finish()
    }
}

/// The per-kind listener sets for login and logout notifications.
#[derive(Clone, Default)]
pub struct NotificationRegistry {
    /// Listeners for player logins anywhere on the network.
    pub login: ListenerSet<LoginNotify>,
    /// Listeners for player logouts anywhere on the network.
    pub logout: ListenerSet<LogoutNotify>,
}

impl NotificationRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Single-slot consumer for incoming connect requests.
///
/// Exactly one entity per process (the directory facade) honors connect
/// requests; later sets replace the previous consumer.
#[derive(Clone, Default)]
pub struct RequestConsumerSlot {
    inner: Arc<RwLock<Option<Callback<ConnectRequest>>>>,
}

impl RequestConsumerSlot {
    /// Install the consumer, replacing any previous one.
    pub fn set(&self, callback: impl Fn(&ConnectRequest) + Send + Sync + 'static) {
        if let Ok(mut slot) = self.inner.write() {
            *slot = Some(Arc::new(callback));
        }
    }

    /// Snapshot the current consumer, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<Callback<ConnectRequest>> {
        self.inner.read().ok().and_then(|slot| slot.clone())
    }

    /// Whether a consumer is installed.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.inner.read().map(|slot| slot.is_some()).unwrap_or(false)
    }
}
