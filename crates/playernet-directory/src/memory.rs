//! In-memory implementations of the platform ports.
//!
//! Good enough for a single-host deployment and for tests; production
//! processes plug in their own backends.

use crate::ports::{
    DirectoryError, DirectoryService, LocalPlayerAccessor, PlayerConnector, ServerDirectory,
};
use async_trait::async_trait;
use playernet_protocol::{now_ms, ConnectOutcome, OnlinePlayer, PlayerId, PlayerRecord};
use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

/// Map-backed directory service.
#[derive(Default)]
pub struct InMemoryDirectoryService {
    records: RwLock<HashMap<PlayerId, PlayerRecord>>,
    online: RwLock<HashMap<PlayerId, OnlinePlayer>>,
}

impl InMemoryDirectoryService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DirectoryService for InMemoryDirectoryService {
    async fn offline_player_by_id(
        &self,
        id: PlayerId,
    ) -> Result<Option<PlayerRecord>, DirectoryError> {
        let records = self
            .records
            .read()
            .map_err(|_| DirectoryError::unavailable("record store lock poisoned"))?;
        Ok(records.get(&id).cloned())
    }

    async fn offline_player_by_name(
        &self,
        name: &str,
    ) -> Result<Option<PlayerRecord>, DirectoryError> {
        let records = self
            .records
            .read()
            .map_err(|_| DirectoryError::unavailable("record store lock poisoned"))?;
        Ok(records
            .values()
            .find(|record| record.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn online_player_by_id(
        &self,
        id: PlayerId,
    ) -> Result<Option<OnlinePlayer>, DirectoryError> {
        let online = self
            .online
            .read()
            .map_err(|_| DirectoryError::unavailable("online store lock poisoned"))?;
        Ok(online.get(&id).cloned())
    }

    async fn online_player_by_name(
        &self,
        name: &str,
    ) -> Result<Option<OnlinePlayer>, DirectoryError> {
        let online = self
            .online
            .read()
            .map_err(|_| DirectoryError::unavailable("online store lock poisoned"))?;
        Ok(online
            .values()
            .find(|player| player.record.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn unique_id_by_name(&self, name: &str) -> Result<Option<PlayerId>, DirectoryError> {
        Ok(self
            .offline_player_by_name(name)
            .await?
            .map(|record| record.id))
    }

    async fn login(&self, player: &OnlinePlayer) -> Result<(), DirectoryError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| DirectoryError::unavailable("record store lock poisoned"))?;
        let mut record = player.record.clone();
        record.online = true;
        record.last_played_ms = now_ms();
        if record.first_played_ms == 0 {
            record.first_played_ms = record.last_played_ms;
        }
        records.insert(record.id, record.clone());
        drop(records);

        // The online copy carries the stamped record so session time is
        // measured from this login.
        let mut session = player.clone();
        session.record = record;
        let mut online = self
            .online
            .write()
            .map_err(|_| DirectoryError::unavailable("online store lock poisoned"))?;
        online.insert(session.record.id, session);
        Ok(())
    }

    async fn logout(&self, player: &PlayerRecord) -> Result<(), DirectoryError> {
        let mut online = self
            .online
            .write()
            .map_err(|_| DirectoryError::unavailable("online store lock poisoned"))?;
        let session = online.remove(&player.id);
        drop(online);

        let mut records = self
            .records
            .write()
            .map_err(|_| DirectoryError::unavailable("record store lock poisoned"))?;
        let mut record = player.clone();
        record.online = false;
        record.last_played_ms = now_ms();
        if let Some(session) = session {
            record.playtime_ms = record.playtime_ms.saturating_add(session.session_time_ms());
        }
        records.insert(record.id, record);
        Ok(())
    }

    async fn update_connection(&self, id: PlayerId, server: &str) -> Result<(), DirectoryError> {
        let mut online = self
            .online
            .write()
            .map_err(|_| DirectoryError::unavailable("online store lock poisoned"))?;
        let Some(player) = online.get_mut(&id) else {
            return Err(DirectoryError::InvalidRecord {
                detail: format!("server change for a player not online: {id}"),
            });
        };
        player.connected_server = Some(server.to_string());
        Ok(())
    }
}

/// Set of players hosted by this process.
#[derive(Default)]
pub struct LocalPlayerSet {
    players: RwLock<HashMap<PlayerId, String>>,
}

impl LocalPlayerSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, id: PlayerId, name: impl Into<String>) {
        if let Ok(mut players) = self.players.write() {
            players.insert(id, name.into());
        }
    }

    pub fn remove(&self, id: PlayerId) {
        if let Ok(mut players) = self.players.write() {
            players.remove(&id);
        }
    }
}

#[async_trait]
impl LocalPlayerAccessor for LocalPlayerSet {
    async fn is_online_id(&self, id: PlayerId) -> bool {
        self.players
            .read()
            .map(|players| players.contains_key(&id))
            .unwrap_or(false)
    }

    async fn is_online_name(&self, name: &str) -> bool {
        self.players
            .read()
            .map(|players| players.values().any(|n| n.eq_ignore_ascii_case(name)))
            .unwrap_or(false)
    }

    async fn player_names(&self) -> Vec<String> {
        self.players
            .read()
            .map(|players| players.values().cloned().collect())
            .unwrap_or_default()
    }
}

/// Fixed list of registered server names.
pub struct StaticServerDirectory {
    names: Vec<String>,
}

impl StaticServerDirectory {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl ServerDirectory for StaticServerDirectory {
    async fn server_names(&self) -> Vec<String> {
        self.names.clone()
    }
}

/// Connector that returns a fixed outcome and records every call.
pub struct ScriptedConnector {
    outcome: ConnectOutcome,
    calls: Mutex<Vec<(PlayerId, String)>>,
}

impl ScriptedConnector {
    #[must_use]
    pub fn new(outcome: ConnectOutcome) -> Self {
        Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every `(player, server)` pair the connector was asked to move.
    #[must_use]
    pub fn calls(&self) -> Vec<(PlayerId, String)> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PlayerConnector for ScriptedConnector {
    async fn connect(&self, player_id: PlayerId, server_name: &str) -> ConnectOutcome {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((player_id, server_name.to_string()));
        }
        self.outcome
    }
}
