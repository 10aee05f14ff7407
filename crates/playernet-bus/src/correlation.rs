//! # Correlation Engine: Pending Request Store
//!
//! Request/response on a broadcast-only bus: every outgoing connect request
//! that wants an answer parks a oneshot here under a random 31-bit key; the
//! response carrying the same key completes it. Removal is the atomic
//! arbiter: whichever of match, timeout, or cancellation removes the entry
//! first wins, and the losers become no-ops.
//!
//! Every process on the bus sees every response, so a response whose key is
//! not pending locally is the normal case, not an error.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use playernet_protocol::ConnectOutcome;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A parked request waiting for its response.
struct PendingConnect {
    /// Completes the caller's await.
    sender: oneshot::Sender<ConnectOutcome>,
    /// When the request was issued.
    created_at: Instant,
    /// Absolute expiry; the awaiting side and the sweeper agree on this.
    deadline: Instant,
}

/// Handle for one in-flight request, returned by
/// [`ConnectionRequests::register`].
///
/// Carries the stored deadline so the awaiting side can arm its timer
/// against the exact instant the sweeper will use. The two reclamation
/// paths agreeing on one instant is what keeps a swept entry reported as a
/// timeout rather than a cancellation.
pub struct RequestTicket {
    /// Correlation key carried by the outgoing request.
    pub key: u32,
    /// Completes with the responder's outcome.
    pub receiver: oneshot::Receiver<ConnectOutcome>,
    /// Absolute expiry recorded in the store.
    pub deadline: Instant,
}

/// Counters over the lifetime of the store.
#[derive(Debug, Default)]
pub struct RequestStats {
    /// Requests registered.
    pub registered: AtomicU64,
    /// Requests completed by a matching response.
    pub completed: AtomicU64,
    /// Requests reclaimed after their deadline.
    pub timeouts: AtomicU64,
    /// Requests cancelled (shutdown, publish failure, caller gone).
    pub cancelled: AtomicU64,
}

/// Pending-request store for the connect request/response protocol.
pub struct ConnectionRequests {
    pending: DashMap<u32, PendingConnect>,
    timeout: Duration,
    stats: Arc<RequestStats>,
}

impl ConnectionRequests {
    /// Create a store whose requests expire after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            pending: DashMap::new(),
            timeout,
            stats: Arc::new(RequestStats::default()),
        }
    }

    /// The deadline applied to every registered request.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Park a new pending request.
    ///
    /// Draws a process-random 31-bit key; if the key is already pending the
    /// draw repeats, so an existing entry is never overwritten.
    pub fn register(&self) -> RequestTicket {
        let (sender, receiver) = oneshot::channel();
        let now = Instant::now();
        let deadline = now + self.timeout;
        let mut pending = Some(PendingConnect {
            sender,
            created_at: now,
            deadline,
        });

        let key = loop {
            let candidate = rand::thread_rng().gen_range(0..=i32::MAX as u32);
            match self.pending.entry(candidate) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    if let Some(request) = pending.take() {
                        slot.insert(request);
                    }
                    break candidate;
                }
            }
        };

        self.stats.registered.fetch_add(1, Ordering::Relaxed);
        debug!(response_key = key, "Registered pending connect request");
        RequestTicket {
            key,
            receiver,
            deadline,
        }
    }

    /// Complete the pending request for `key` with `outcome`.
    ///
    /// Returns false when no entry exists (already matched, expired, or
    /// pending in another process). Expected under normal operation.
    pub fn complete(&self, key: u32, outcome: ConnectOutcome) -> bool {
        let Some((_, pending)) = self.pending.remove(&key) else {
            debug!(response_key = key, "Connect response with no local pending request, dropped");
            return false;
        };

        let waited = pending.created_at.elapsed();
        if pending.sender.send(outcome).is_err() {
            // Awaiting side already gave up (timeout raced us and won).
            self.stats.cancelled.fetch_add(1, Ordering::Relaxed);
            debug!(response_key = key, "Pending request receiver gone, response dropped");
            return false;
        }

        self.stats.completed.fetch_add(1, Ordering::Relaxed);
        debug!(
            response_key = key,
            outcome = ?outcome,
            waited_ms = waited.as_millis() as u64,
            "Completed pending connect request"
        );
        true
    }

    /// Reclaim the entry for `key` after the awaiting side observed its
    /// timeout. A no-op when a response already removed it.
    pub fn expire(&self, key: u32) -> bool {
        if self.pending.remove(&key).is_some() {
            self.stats.timeouts.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Drop the entry for `key` without counting a timeout (publish failed
    /// before anyone could answer).
    pub fn cancel(&self, key: u32) -> bool {
        if self.pending.remove(&key).is_some() {
            self.stats.cancelled.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Remove every entry past its deadline. Returns how many were removed.
    ///
    /// The await path already reclaims its own entry on timeout; the sweep
    /// covers entries whose awaiter disappeared without doing so.
    pub fn remove_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.pending.len();
        self.pending.retain(|key, pending| {
            let keep = pending.deadline > now;
            if !keep {
                warn!(response_key = key, "Sweeping expired pending connect request");
                self.stats.timeouts.fetch_add(1, Ordering::Relaxed);
            }
            keep
        });
        before - self.pending.len()
    }

    /// Fail every outstanding request. Called on shutdown, before the bus
    /// connection closes. Dropping the sender makes the awaiting side
    /// observe cancellation.
    pub fn cancel_all(&self) -> usize {
        let before = self.pending.len();
        self.pending.clear();
        self.stats
            .cancelled
            .fetch_add(before as u64, Ordering::Relaxed);
        before
    }

    /// Number of currently pending requests.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Whether `key` is currently pending.
    #[must_use]
    pub fn is_pending(&self, key: u32) -> bool {
        self.pending.contains_key(&key)
    }

    /// Lifetime counters.
    #[must_use]
    pub fn stats(&self) -> &RequestStats {
        &self.stats
    }
}

/// Background sweep reclaiming abandoned pending requests.
///
/// Guarantees every entry is removed within `timeout + interval` even if its
/// response never arrives and its awaiter is gone.
pub fn spawn_sweeper(store: Arc<ConnectionRequests>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let removed = store.remove_expired();
            if removed > 0 {
                debug!(removed, "Swept expired pending connect requests");
            }
        }
    })
}
