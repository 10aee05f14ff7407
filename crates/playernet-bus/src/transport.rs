//! # Pub/Sub Transport
//!
//! Owns the single lazily-created bus connection of a process. Nothing
//! touches the network until the first subscribe-worthy call; the first
//! successful connect spawns the read loop, which demultiplexes inbound
//! frames by channel, decodes them, and hands the decoded payloads to the
//! notification registry or the correlation engine on spawned tasks. User
//! callbacks never run on the delivery loop.
//!
//! Decode failures are logged and the frame is dropped; they never reach
//! the bus client or a caller.

use crate::client::{BusConnection, BusConnector, Frame};
use crate::correlation::ConnectionRequests;
use crate::error::TransportError;
use crate::registry::{ListenerSet, NotificationRegistry, RequestConsumerSlot};
use playernet_protocol::{
    Channel, ConnectRequest, ConnectResponse, FrameCodec, LoginNotify, LogoutNotify,
};
use serde::Serialize;
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Mutex as AsyncMutex, OnceCell};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Where the read loop delivers decoded payloads.
#[derive(Clone)]
pub(crate) struct DispatchTargets {
    pub(crate) registry: NotificationRegistry,
    pub(crate) requests: Arc<ConnectionRequests>,
    pub(crate) request_consumer: RequestConsumerSlot,
}

/// Process-wide pub/sub transport with one lazy connection.
pub struct PubSubTransport<C: FrameCodec> {
    connector: Box<dyn BusConnector>,
    codec: C,
    connection: OnceCell<Arc<dyn BusConnection>>,
    /// Channels subscribed on the current connection. The lock is held
    /// across the subscribe call so "exactly once per channel" holds under
    /// concurrent first-time registration.
    subscribed: AsyncMutex<HashSet<Channel>>,
    reader: Mutex<Option<JoinHandle<()>>>,
    targets: DispatchTargets,
    /// No new work accepted once set.
    sealed: AtomicBool,
    /// Teardown ran once.
    torn_down: AtomicBool,
}

impl<C> PubSubTransport<C>
where
    C: FrameCodec + Clone + 'static,
{
    pub(crate) fn new(connector: Box<dyn BusConnector>, codec: C, targets: DispatchTargets) -> Self {
        Self {
            connector,
            codec,
            connection: OnceCell::new(),
            subscribed: AsyncMutex::new(HashSet::new()),
            reader: Mutex::new(None),
            targets,
            sealed: AtomicBool::new(false),
            torn_down: AtomicBool::new(false),
        }
    }

    /// Idempotent lazy connect; exactly one connection is created even under
    /// concurrent callers. A failed attempt leaves the transport
    /// unconnected, so the next call retries.
    pub async fn ensure_connected(&self) -> Result<(), TransportError> {
        if self.sealed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        self.connection
            .get_or_try_init(|| async {
                // Re-checked under the init lock: a close that completed
                // after the fast-path check must not be followed by a fresh
                // connection it can never tear down.
                if self.sealed.load(Ordering::Acquire) {
                    return Err(TransportError::Closed);
                }
                let (connection, frames) = self
                    .connector
                    .connect()
                    .await
                    .map_err(TransportError::from)?;
                let handle = tokio::spawn(read_loop(
                    frames,
                    self.codec.clone(),
                    self.targets.clone(),
                ));
                if let Ok(mut reader) = self.reader.lock() {
                    *reader = Some(handle);
                }
                info!("Opened bus connection");
                Ok::<_, TransportError>(connection)
            })
            .await?;
        // A seal that landed while the connect was in flight missed the
        // connection; release it here instead of handing it out.
        if self.sealed.load(Ordering::Acquire) {
            self.teardown().await;
            return Err(TransportError::Closed);
        }
        Ok(())
    }

    /// Subscribe to `channel`, connecting first if necessary. Issues the
    /// subscribe command exactly once per channel per connection lifetime.
    pub async fn subscribe(&self, channel: Channel) -> Result<(), TransportError> {
        self.ensure_connected().await?;
        let mut subscribed = self.subscribed.lock().await;
        if subscribed.contains(&channel) {
            return Ok(());
        }
        self.current()?.subscribe(channel.name()).await?;
        subscribed.insert(channel);
        info!(channel = %channel, "Subscribed to bus channel");
        Ok(())
    }

    /// Fire-and-forget publish of an encoded payload.
    pub async fn publish<T: Serialize>(
        &self,
        channel: Channel,
        payload: &T,
    ) -> Result<(), TransportError> {
        self.ensure_connected().await?;
        let bytes = self.codec.encode(channel, payload)?;
        self.current()?.publish(channel.name(), bytes).await?;
        Ok(())
    }

    /// Stop accepting new publishes and subscribes. Does not tear down.
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    /// Release the connection and stop the read loop. Idempotent; safe to
    /// call even if the transport never connected.
    pub async fn close(&self) {
        self.seal();
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.teardown().await;
        info!("Closed bus transport");
    }

    /// Release the connection (if any) and stop the read loop. Both halves
    /// are idempotent, so running this from close and from a raced
    /// ensure_connected is safe.
    async fn teardown(&self) {
        if let Some(connection) = self.connection.get() {
            connection.close().await;
        }
        let reader = self.reader.lock().ok().and_then(|mut slot| slot.take());
        if let Some(handle) = reader {
            handle.abort();
        }
    }

    fn current(&self) -> Result<&Arc<dyn BusConnection>, TransportError> {
        self.connection.get().ok_or(TransportError::Closed)
    }

    /// Whether a connection has been established.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.initialized()
    }
}

/// Demultiplexes inbound frames. Runs on its own task; user callbacks are
/// pushed onto further spawned tasks so a slow consumer cannot stall the
/// delivery of unrelated channels.
async fn read_loop<C: FrameCodec>(
    mut frames: mpsc::Receiver<Frame>,
    codec: C,
    targets: DispatchTargets,
) {
    while let Some(frame) = frames.recv().await {
        let Some(channel) = Channel::from_name(&frame.channel) else {
            debug!(channel = %frame.channel, "Frame on unknown channel, dropped");
            continue;
        };
        match channel {
            Channel::LoginNotify => match codec.decode::<LoginNotify>(channel, &frame.payload) {
                Ok(notify) => {
                    // Interest snapshot at arrival time; listeners that
                    // unregister after this point still receive the event.
                    let snapshot = targets.registry.login.snapshot();
                    if snapshot.is_empty() {
                        debug!("Login notify with no registered listeners, discarded");
                    } else {
                        tokio::spawn(async move {
                            ListenerSet::dispatch(&snapshot, &notify);
                        });
                    }
                }
                Err(e) => warn!(error = %e, "Dropped undecodable frame"),
            },
            Channel::LogoutNotify => match codec.decode::<LogoutNotify>(channel, &frame.payload) {
                Ok(notify) => {
                    let snapshot = targets.registry.logout.snapshot();
                    if snapshot.is_empty() {
                        debug!("Logout notify with no registered listeners, discarded");
                    } else {
                        tokio::spawn(async move {
                            ListenerSet::dispatch(&snapshot, &notify);
                        });
                    }
                }
                Err(e) => warn!(error = %e, "Dropped undecodable frame"),
            },
            Channel::ConnectRequest => {
                match codec.decode::<ConnectRequest>(channel, &frame.payload) {
                    Ok(request) => {
                        let Some(consumer) = targets.request_consumer.snapshot() else {
                            debug!("Connect request with no local consumer, discarded");
                            continue;
                        };
                        tokio::spawn(async move {
                            if catch_unwind(AssertUnwindSafe(|| consumer(&request))).is_err() {
                                error!("Connect request consumer panicked");
                            }
                        });
                    }
                    Err(e) => warn!(error = %e, "Dropped undecodable frame"),
                }
            }
            Channel::ConnectResponse => {
                match codec.decode::<ConnectResponse>(channel, &frame.payload) {
                    // Completing a parked oneshot is non-blocking; the
                    // awaiting caller resumes on its own task.
                    Ok(response) => {
                        targets.requests.complete(response.response_key, response.outcome);
                    }
                    Err(e) => warn!(error = %e, "Dropped undecodable frame"),
                }
            }
        }
    }
    debug!("Bus frame stream ended, read loop stopped");
}
