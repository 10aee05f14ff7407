//! # Bus Client Abstraction
//!
//! The transport does not care what carries its frames. [`BusConnector`]
//! produces a live [`BusConnection`] plus the inbound frame stream; the
//! production deployment plugs a real broker client in here, while
//! [`InMemoryBroker`] serves tests and single-host setups.
//!
//! Delivery semantics are broadcast, at-most-once, with no ordering
//! guarantee across connections: a lagging consumer drops frames rather
//! than stalling the broker.

use crate::error::ConnectionError;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::debug;

/// A raw message on a named channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Wire name of the channel the frame was published on.
    pub channel: String,
    /// Encoded payload bytes.
    pub payload: Vec<u8>,
}

/// Factory for bus connections.
#[async_trait]
pub trait BusConnector: Send + Sync {
    /// Establish one connection to the bus.
    ///
    /// Returns the command half and the stream of inbound frames. Only
    /// frames on channels the connection has subscribed to are delivered.
    async fn connect(&self)
        -> Result<(Arc<dyn BusConnection>, mpsc::Receiver<Frame>), ConnectionError>;
}

/// One live connection to the bus.
#[async_trait]
pub trait BusConnection: Send + Sync {
    /// Start receiving frames published on `channel`.
    async fn subscribe(&self, channel: &str) -> Result<(), ConnectionError>;

    /// Fire-and-forget publish. No delivery acknowledgment.
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<(), ConnectionError>;

    /// Release the connection. Idempotent.
    async fn close(&self);
}

/// In-process broker built on `tokio::sync::broadcast`.
///
/// Every connection sees every frame published by any connection (its own
/// included), filtered down to its subscribed channels. Cloning the broker
/// shares the underlying channel, so several [`PlayerBus`](crate::PlayerBus)
/// instances connected to clones behave like independent processes sharing
/// one bus, which is exactly how the integration tests use it.
#[derive(Clone)]
pub struct InMemoryBroker {
    sender: broadcast::Sender<Frame>,
}

impl InMemoryBroker {
    /// Create a broker with the default per-connection buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a broker with a specific per-connection buffer.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Number of currently open connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BusConnector for InMemoryBroker {
    async fn connect(
        &self,
    ) -> Result<(Arc<dyn BusConnection>, mpsc::Receiver<Frame>), ConnectionError> {
        let mut broadcast_rx = self.sender.subscribe();
        let (frame_tx, frame_rx) = mpsc::channel(DEFAULT_CHANNEL_CAPACITY);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let subscribed: Arc<RwLock<HashSet<String>>> = Arc::new(RwLock::new(HashSet::new()));

        // Forwarder: filters the broker firehose down to subscribed channels.
        // Interest is checked at arrival time; a consumer that unsubscribes
        // between arrival and delivery still gets the already-queued frame.
        let interest = Arc::clone(&subscribed);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    received = broadcast_rx.recv() => match received {
                        Ok(frame) => {
                            let wanted = interest
                                .read()
                                .map(|set| set.contains(&frame.channel))
                                .unwrap_or(false);
                            if wanted && frame_tx.send(frame).await.is_err() {
                                // Consumer side dropped; connection is done.
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(count)) => {
                            debug!(lagged = count, "Bus connection lagged, frames dropped");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });

        let connection = InMemoryConnection {
            sender: self.sender.clone(),
            subscribed,
            shutdown: shutdown_tx,
        };
        Ok((Arc::new(connection), frame_rx))
    }
}

struct InMemoryConnection {
    sender: broadcast::Sender<Frame>,
    subscribed: Arc<RwLock<HashSet<String>>>,
    shutdown: watch::Sender<bool>,
}

#[async_trait]
impl BusConnection for InMemoryConnection {
    async fn subscribe(&self, channel: &str) -> Result<(), ConnectionError> {
        self.subscribed
            .write()
            .map_err(|_| ConnectionError::new("subscription set poisoned"))?
            .insert(channel.to_string());
        Ok(())
    }

    async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<(), ConnectionError> {
        let frame = Frame {
            channel: channel.to_string(),
            payload,
        };
        // A send error only means no connection is listening right now;
        // broadcast delivery is fire-and-forget either way.
        if self.sender.send(frame).is_err() {
            debug!(channel, "Published frame with no connected receivers");
        }
        Ok(())
    }

    async fn close(&self) {
        let _ = self.shutdown.send(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_subscribed_channel_delivers() {
        let broker = InMemoryBroker::new();
        let (conn, mut frames) = broker.connect().await.unwrap();
        conn.subscribe("login-notify").await.unwrap();

        conn.publish("login-notify", b"hello".to_vec()).await.unwrap();

        let frame = timeout(Duration::from_millis(200), frames.recv())
            .await
            .expect("timeout")
            .expect("frame");
        assert_eq!(frame.channel, "login-notify");
        assert_eq!(frame.payload, b"hello");
    }

    #[tokio::test]
    async fn test_unsubscribed_channel_is_filtered() {
        let broker = InMemoryBroker::new();
        let (conn, mut frames) = broker.connect().await.unwrap();
        conn.subscribe("login-notify").await.unwrap();

        conn.publish("logout-notify", b"ignored".to_vec()).await.unwrap();
        conn.publish("login-notify", b"wanted".to_vec()).await.unwrap();

        // Only the subscribed frame comes through.
        let frame = timeout(Duration::from_millis(200), frames.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(frame.payload, b"wanted");
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_connections_including_publisher() {
        let broker = InMemoryBroker::new();
        let (conn_a, mut frames_a) = broker.connect().await.unwrap();
        let (conn_b, mut frames_b) = broker.connect().await.unwrap();
        conn_a.subscribe("connect-request").await.unwrap();
        conn_b.subscribe("connect-request").await.unwrap();

        conn_a.publish("connect-request", b"x".to_vec()).await.unwrap();

        for frames in [&mut frames_a, &mut frames_b] {
            let frame = timeout(Duration::from_millis(200), frames.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(frame.channel, "connect-request");
        }
    }

    #[tokio::test]
    async fn test_close_ends_frame_stream() {
        let broker = InMemoryBroker::new();
        let (conn, mut frames) = broker.connect().await.unwrap();
        conn.subscribe("login-notify").await.unwrap();

        conn.close().await;

        let ended = timeout(Duration::from_millis(200), frames.recv()).await;
        assert_eq!(ended.expect("forwarder should stop"), None);
    }

    #[tokio::test]
    async fn test_publish_without_receivers_is_ok() {
        let broker = InMemoryBroker::new();
        let (conn, frames) = broker.connect().await.unwrap();
        drop(frames);
        // No one listens; publish still succeeds.
        conn.publish("login-notify", b"void".to_vec()).await.unwrap();
    }
}
