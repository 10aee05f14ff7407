//! Platform ports the facade is assembled from.
//!
//! Each port is an async trait implemented by the hosting process: the
//! directory service by whatever record backend the deployment runs, the
//! rest by the proxy or game-server platform. In-memory implementations
//! live in [`crate::memory`].

use async_trait::async_trait;
use playernet_protocol::{ConnectOutcome, OnlinePlayer, PlayerId, PlayerRecord};
use thiserror::Error;

/// Failure talking to the player-record backend.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The backend is unreachable or refused the call.
    #[error("directory service unavailable: {reason}")]
    Unavailable { reason: String },
    /// The backend answered with something the caller cannot use.
    #[error("directory service returned an invalid record: {detail}")]
    InvalidRecord { detail: String },
}

impl DirectoryError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}

/// The authoritative player-record store.
///
/// Lookup misses are `Ok(None)`; `Err` means the backend itself failed.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    async fn offline_player_by_id(
        &self,
        id: PlayerId,
    ) -> Result<Option<PlayerRecord>, DirectoryError>;

    async fn offline_player_by_name(
        &self,
        name: &str,
    ) -> Result<Option<PlayerRecord>, DirectoryError>;

    async fn online_player_by_id(
        &self,
        id: PlayerId,
    ) -> Result<Option<OnlinePlayer>, DirectoryError>;

    async fn online_player_by_name(
        &self,
        name: &str,
    ) -> Result<Option<OnlinePlayer>, DirectoryError>;

    async fn unique_id_by_name(&self, name: &str) -> Result<Option<PlayerId>, DirectoryError>;

    /// Record a login on this process.
    async fn login(&self, player: &OnlinePlayer) -> Result<(), DirectoryError>;

    /// Record a logout on this process.
    async fn logout(&self, player: &PlayerRecord) -> Result<(), DirectoryError>;

    /// Record a server change for an already-online player.
    async fn update_connection(&self, id: PlayerId, server: &str) -> Result<(), DirectoryError>;
}

/// Players currently hosted by this process.
#[async_trait]
pub trait LocalPlayerAccessor: Send + Sync {
    async fn is_online_id(&self, id: PlayerId) -> bool;

    async fn is_online_name(&self, name: &str) -> bool;

    async fn player_names(&self) -> Vec<String>;
}

/// Names of the backend servers registered with this process.
#[async_trait]
pub trait ServerDirectory: Send + Sync {
    async fn server_names(&self) -> Vec<String>;
}

/// The platform call that moves a locally-hosted player to a server.
#[async_trait]
pub trait PlayerConnector: Send + Sync {
    async fn connect(&self, player_id: PlayerId, server_name: &str) -> ConnectOutcome;
}
