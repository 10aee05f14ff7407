//! The directory facade.

use crate::handler;
use crate::ports::{
    DirectoryError, DirectoryService, LocalPlayerAccessor, PlayerConnector, ServerDirectory,
};
use playernet_bus::{ListenerGuard, PlayerBus, RequestError, TransportError};
use playernet_protocol::{
    ConnectOutcome, LoginNotify, LogoutNotify, OnlinePlayer, PlayerId, PlayerRecord,
};
use std::sync::Arc;
use tracing::{debug, error};

/// Terminal result of an awaited connect request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectResult {
    Success,
    PlayerNotFound,
    ServerNotFound,
    /// The hosting process tried and failed.
    Error,
    /// No process answered before the deadline.
    Timeout,
}

impl From<ConnectOutcome> for ConnectResult {
    fn from(outcome: ConnectOutcome) -> Self {
        match outcome {
            ConnectOutcome::Success => Self::Success,
            ConnectOutcome::PlayerNotFound => Self::PlayerNotFound,
            ConnectOutcome::ServerNotFound => Self::ServerNotFound,
            ConnectOutcome::Error => Self::Error,
        }
    }
}

/// Network-wide player directory for one process.
///
/// Combines the bus with the platform ports. Presence queries answer from
/// the local accessor before falling back to the directory service, so a
/// player on this very process never costs a backend round trip.
pub struct PlayerDirectory {
    bus: Arc<PlayerBus>,
    service: Arc<dyn DirectoryService>,
    local: Arc<dyn LocalPlayerAccessor>,
    servers: Arc<dyn ServerDirectory>,
    connector: Arc<dyn PlayerConnector>,
}

impl PlayerDirectory {
    pub fn new(
        bus: Arc<PlayerBus>,
        service: Arc<dyn DirectoryService>,
        local: Arc<dyn LocalPlayerAccessor>,
        servers: Arc<dyn ServerDirectory>,
        connector: Arc<dyn PlayerConnector>,
    ) -> Self {
        Self {
            bus,
            service,
            local,
            servers,
            connector,
        }
    }

    /// Whether the player is online anywhere on the network.
    pub async fn is_player_online(&self, id: PlayerId) -> Result<bool, DirectoryError> {
        if self.local.is_online_id(id).await {
            return Ok(true);
        }
        Ok(self
            .service
            .online_player_by_id(id)
            .await?
            .is_some_and(|player| player.record.online))
    }

    /// Whether a player with this name is online anywhere on the network.
    pub async fn is_player_online_by_name(&self, name: &str) -> Result<bool, DirectoryError> {
        if self.local.is_online_name(name).await {
            return Ok(true);
        }
        Ok(self
            .service
            .online_player_by_name(name)
            .await?
            .is_some_and(|player| player.record.online))
    }

    pub async fn offline_player(
        &self,
        id: PlayerId,
    ) -> Result<Option<PlayerRecord>, DirectoryError> {
        self.service.offline_player_by_id(id).await
    }

    pub async fn offline_player_by_name(
        &self,
        name: &str,
    ) -> Result<Option<PlayerRecord>, DirectoryError> {
        self.service.offline_player_by_name(name).await
    }

    pub async fn online_player(
        &self,
        id: PlayerId,
    ) -> Result<Option<OnlinePlayer>, DirectoryError> {
        self.service.online_player_by_id(id).await
    }

    pub async fn online_player_by_name(
        &self,
        name: &str,
    ) -> Result<Option<OnlinePlayer>, DirectoryError> {
        self.service.online_player_by_name(name).await
    }

    pub async fn unique_id(&self, name: &str) -> Result<Option<PlayerId>, DirectoryError> {
        self.service.unique_id_by_name(name).await
    }

    /// Register a network-wide login listener.
    pub async fn subscribe_login(
        &self,
        listener: impl Fn(&LoginNotify) + Send + Sync + 'static,
    ) -> Result<ListenerGuard, TransportError> {
        self.bus.subscribe_login(listener).await
    }

    /// Register a network-wide logout listener.
    pub async fn subscribe_logout(
        &self,
        listener: impl Fn(&LogoutNotify) + Send + Sync + 'static,
    ) -> Result<ListenerGuard, TransportError> {
        self.bus.subscribe_logout(listener).await
    }

    /// Ask the network to move a player and wait for the outcome.
    ///
    /// Always resolves to a [`ConnectResult`]; bus faults surface as
    /// [`ConnectResult::Error`] after being logged, never as a panic or an
    /// unhandled error.
    pub async fn connect_player(
        &self,
        id: PlayerId,
        target: impl Into<String>,
    ) -> ConnectResult {
        match self.bus.connect(id, target).await {
            Ok(outcome) => outcome.into(),
            Err(RequestError::Timeout { after }) => {
                debug!(player = %id, ?after, "Connect request timed out");
                ConnectResult::Timeout
            }
            Err(err) => {
                error!(player = %id, error = %err, "Connect request failed");
                ConnectResult::Error
            }
        }
    }

    /// Ask the network to move a player without waiting for an outcome.
    pub async fn connect_player_fire_and_forget(
        &self,
        id: PlayerId,
        target: impl Into<String>,
    ) -> Result<(), TransportError> {
        self.bus.connect_fire_and_forget(id, target).await
    }

    /// Record a login with the directory service and announce it on the bus.
    pub async fn publish_login(&self, player: OnlinePlayer) -> Result<(), DirectoryError> {
        self.service.login(&player).await?;
        if let Err(err) = self.bus.publish_login(player).await {
            error!(error = %err, "Failed to publish login notification");
        }
        Ok(())
    }

    /// Record a logout with the directory service and announce it on the bus.
    pub async fn publish_logout(&self, player: PlayerRecord) -> Result<(), DirectoryError> {
        self.service.logout(&player).await?;
        if let Err(err) = self.bus.publish_logout(player).await {
            error!(error = %err, "Failed to publish logout notification");
        }
        Ok(())
    }

    /// Record a server change with the directory service.
    pub async fn update_connection(
        &self,
        id: PlayerId,
        server: &str,
    ) -> Result<(), DirectoryError> {
        self.service.update_connection(id, server).await
    }

    /// Start honoring connect requests arriving over the bus.
    ///
    /// Requests for players hosted elsewhere are skipped; requests hosted
    /// here run the platform connector and answer iff a response key was
    /// carried.
    pub async fn serve_connect_requests(self: &Arc<Self>) -> Result<(), TransportError> {
        let directory = Arc::clone(self);
        self.bus
            .serve_connect_requests(move |request| {
                let directory = Arc::clone(&directory);
                let request = request.clone();
                tokio::spawn(handler::handle(directory, request));
            })
            .await
    }

    /// Tear the process down: cancel pending requests, close the bus.
    pub async fn close(&self) {
        self.bus.close().await;
    }

    pub(crate) fn bus(&self) -> &PlayerBus {
        &self.bus
    }

    pub(crate) fn local(&self) -> &dyn LocalPlayerAccessor {
        self.local.as_ref()
    }

    pub(crate) fn servers(&self) -> &dyn ServerDirectory {
        self.servers.as_ref()
    }

    pub(crate) fn connector(&self) -> &dyn PlayerConnector {
        self.connector.as_ref()
    }
}
