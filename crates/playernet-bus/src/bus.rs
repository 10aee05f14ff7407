//! # Player Bus
//!
//! Process-level entry point that wires the transport, the notification
//! registry, and the correlation engine together. One `PlayerBus` per
//! process; everything behind it is created lazily on first use except the
//! expiry sweeper, which starts immediately.

use crate::client::BusConnector;
use crate::correlation::{spawn_sweeper, ConnectionRequests};
use crate::error::{RequestError, TransportError};
use crate::registry::{ListenerGuard, NotificationRegistry, RequestConsumerSlot};
use crate::transport::{DispatchTargets, PubSubTransport};
use crate::{REQUEST_TIMEOUT, SWEEP_INTERVAL};
use playernet_protocol::{
    Channel, ConnectOutcome, ConnectRequest, ConnectResponse, JsonCodec, LoginNotify, LogoutNotify,
    OnlinePlayer, PlayerId, PlayerRecord,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::info;

/// Cross-process event and request/response hub.
///
/// Must be created inside a Tokio runtime; the expiry sweeper is spawned at
/// construction time.
pub struct PlayerBus {
    transport: Arc<PubSubTransport<JsonCodec>>,
    registry: NotificationRegistry,
    requests: Arc<ConnectionRequests>,
    request_consumer: RequestConsumerSlot,
    sweeper: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl PlayerBus {
    /// Build a bus over `connector` with the default request timeout.
    pub fn new(connector: impl BusConnector + 'static) -> Self {
        Self::with_timeout(connector, REQUEST_TIMEOUT)
    }

    /// Build a bus whose connect requests expire after `timeout`.
    pub fn with_timeout(connector: impl BusConnector + 'static, timeout: Duration) -> Self {
        let registry = NotificationRegistry::new();
        let requests = Arc::new(ConnectionRequests::new(timeout));
        let request_consumer = RequestConsumerSlot::default();
        let targets = DispatchTargets {
            registry: registry.clone(),
            requests: Arc::clone(&requests),
            request_consumer: request_consumer.clone(),
        };
        let transport = Arc::new(PubSubTransport::new(
            Box::new(connector),
            JsonCodec,
            targets,
        ));
        let sweeper = spawn_sweeper(Arc::clone(&requests), SWEEP_INTERVAL);
        Self {
            transport,
            registry,
            requests,
            request_consumer,
            sweeper: Mutex::new(Some(sweeper)),
            closed: AtomicBool::new(false),
        }
    }

    /// Register a login listener, subscribing the process to the login
    /// channel on first use. The listener stays registered until the
    /// returned guard is dropped or unsubscribed.
    pub async fn subscribe_login(
        &self,
        listener: impl Fn(&LoginNotify) + Send + Sync + 'static,
    ) -> Result<ListenerGuard, TransportError> {
        self.transport.subscribe(Channel::LoginNotify).await?;
        Ok(self.registry.login.add(listener))
    }

    /// Register a logout listener. See [`Self::subscribe_login`].
    pub async fn subscribe_logout(
        &self,
        listener: impl Fn(&LogoutNotify) + Send + Sync + 'static,
    ) -> Result<ListenerGuard, TransportError> {
        self.transport.subscribe(Channel::LogoutNotify).await?;
        Ok(self.registry.logout.add(listener))
    }

    /// Install the process-wide connect request consumer and subscribe to
    /// the request channel. A later call replaces the previous consumer.
    pub async fn serve_connect_requests(
        &self,
        consumer: impl Fn(&ConnectRequest) + Send + Sync + 'static,
    ) -> Result<(), TransportError> {
        self.transport.subscribe(Channel::ConnectRequest).await?;
        self.request_consumer.set(consumer);
        Ok(())
    }

    /// Announce a login to every process on the bus, this one included.
    pub async fn publish_login(&self, player: OnlinePlayer) -> Result<(), TransportError> {
        self.transport
            .publish(Channel::LoginNotify, &LoginNotify { player })
            .await
    }

    /// Announce a logout to every process on the bus, this one included.
    pub async fn publish_logout(&self, player: PlayerRecord) -> Result<(), TransportError> {
        self.transport
            .publish(Channel::LogoutNotify, &LogoutNotify { player })
            .await
    }

    /// Answer a connect request that carried a response key.
    pub async fn publish_connect_response(
        &self,
        response: ConnectResponse,
    ) -> Result<(), TransportError> {
        self.transport
            .publish(Channel::ConnectResponse, &response)
            .await
    }

    /// Ask the network to move `player_id` to `server_name` and wait for
    /// the outcome.
    ///
    /// Parks a correlated pending request before publishing, so a response
    /// racing the publish cannot be lost. Resolves exactly once: with the
    /// responder's outcome, with [`RequestError::Timeout`] after the store
    /// timeout, or with [`RequestError::Cancelled`] on shutdown.
    pub async fn connect(
        &self,
        player_id: PlayerId,
        server_name: impl Into<String>,
    ) -> Result<ConnectOutcome, RequestError> {
        self.transport.subscribe(Channel::ConnectResponse).await?;
        let ticket = self.requests.register();
        let request = ConnectRequest {
            player_id,
            server_name: server_name.into(),
            response_key: Some(ticket.key),
        };
        if let Err(err) = self.transport.publish(Channel::ConnectRequest, &request).await {
            self.requests.cancel(ticket.key);
            return Err(err.into());
        }
        // Arm the timer against the ticket's deadline, not a fresh window
        // starting after publish: the sweeper uses the stored deadline, and
        // the two sides must agree on it.
        let deadline = tokio::time::Instant::from_std(ticket.deadline);
        match tokio::time::timeout_at(deadline, ticket.receiver).await {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(_)) => {
                if Instant::now() >= ticket.deadline {
                    // The sweeper reclaimed the entry at the shared deadline
                    // before our timer fired. That is a timeout, not a
                    // cancellation.
                    Err(RequestError::Timeout {
                        after: self.requests.timeout(),
                    })
                } else {
                    // Sender dropped early: cancelled out from under us.
                    Err(RequestError::Cancelled)
                }
            }
            Err(_) => {
                self.requests.expire(ticket.key);
                Err(RequestError::Timeout {
                    after: self.requests.timeout(),
                })
            }
        }
    }

    /// Publish a connect request without a response key. No pending state
    /// is created and no answer will ever arrive.
    pub async fn connect_fire_and_forget(
        &self,
        player_id: PlayerId,
        server_name: impl Into<String>,
    ) -> Result<(), TransportError> {
        let request = ConnectRequest {
            player_id,
            server_name: server_name.into(),
            response_key: None,
        };
        self.transport.publish(Channel::ConnectRequest, &request).await
    }

    /// Pending-request store, exposed for observability.
    #[must_use]
    pub fn requests(&self) -> &ConnectionRequests {
        &self.requests
    }

    /// Orderly shutdown: stop accepting work, fail every pending request
    /// with [`RequestError::Cancelled`], then release the connection and
    /// the sweeper. Idempotent.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.transport.seal();
        let cancelled = self.requests.cancel_all();
        if cancelled > 0 {
            info!(cancelled, "Cancelled pending connect requests at shutdown");
        }
        self.transport.close().await;
        let sweeper = self.sweeper.lock().ok().and_then(|mut slot| slot.take());
        if let Some(handle) = sweeper {
            handle.abort();
        }
        info!("Player bus closed");
    }
}
