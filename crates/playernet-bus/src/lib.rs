//! # playernet Bus
//!
//! The cross-process coordination layer of the player directory. Each process
//! (game node or proxy node) holds one [`PlayerBus`], which owns:
//!
//! - a lazily-activated **pub/sub transport** with a single underlying bus
//!   connection, created on the first subscribe-worthy call and torn down
//!   exactly once at shutdown;
//! - the **notification registry**: per-kind sets of locally-registered
//!   login/logout listeners, fanned out off the delivery loop;
//! - the **correlation engine**: request/response semantics on top of the
//!   broadcast-only bus, matching each connect response to the pending
//!   request carrying the same key, with timeout-based reclamation.
//!
//! ## Flow
//!
//! ```text
//! caller ── connect(player, "lobby") ──┐
//!                                      ▼
//!                         ┌──────────────────────┐
//!                         │  ConnectionRequests  │ key=K, park oneshot
//!                         └──────────┬───────────┘
//!                                    │ publish connect-request {K}
//!                                    ▼
//!                   bus ══ broadcast to every process ══
//!                                    │
//!                 (only the process owning the player acts)
//!                                    │ publish connect-response {K}
//!                                    ▼
//!                         read loop ── complete(K) ── caller resumes
//! ```
//!
//! The underlying bus client is abstracted behind [`BusConnector`] /
//! [`BusConnection`]; [`InMemoryBroker`] is the in-process implementation
//! used by tests and single-host deployments.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod bus;
pub mod client;
pub mod correlation;
pub mod error;
pub mod registry;
pub mod transport;

pub use bus::PlayerBus;
pub use client::{BusConnection, BusConnector, Frame, InMemoryBroker};
pub use correlation::{ConnectionRequests, RequestStats};
pub use error::{ConnectionError, RequestError, TransportError};
pub use registry::{ListenerGuard, ListenerSet, NotificationRegistry};
pub use transport::PubSubTransport;

use std::time::Duration;

/// How long an awaited connect request waits for its response.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Interval of the background sweep that reclaims abandoned pending requests.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(2);

/// Maximum frames buffered per connection before the consumer lags.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;
