//! # Player Entities
//!
//! The directory speaks about players in two shapes: a [`PlayerRecord`] is
//! everything the directory service remembers about a player who has
//! connected at least once, and an [`OnlinePlayer`] is a record enriched
//! with live session data (where the player currently is).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable unique identifier of a player across the whole network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(Uuid);

impl PlayerId {
    /// Generate a fresh random id.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse from the canonical hyphenated form.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }

    /// Get the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for PlayerId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<PlayerId> for Uuid {
    fn from(id: PlayerId) -> Self {
        id.0
    }
}

/// A player known to the directory service.
///
/// Timestamps are milliseconds since the Unix epoch; `playtime_ms` is the
/// accumulated playtime across all sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Stable unique id.
    pub id: PlayerId,
    /// Last known display name.
    pub name: String,
    /// First connection timestamp (ms since epoch).
    pub first_played_ms: u64,
    /// Most recent connection timestamp (ms since epoch).
    pub last_played_ms: u64,
    /// Accumulated playtime in milliseconds.
    pub playtime_ms: u64,
    /// Whether the directory currently considers the player online.
    pub online: bool,
}

/// A player with a live session somewhere on the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlinePlayer {
    /// The underlying directory record (`online` is true by construction).
    pub record: PlayerRecord,
    /// Name of the game server the player is connected to, if any.
    /// Empty right after proxy login, before the first server transfer.
    #[serde(default)]
    pub connected_server: Option<String>,
    /// Name of the proxy that owns the player's connection.
    pub connected_proxy: String,
    /// Identifier of the current session, assigned at login.
    pub session_id: u64,
}

impl OnlinePlayer {
    /// Milliseconds since this session started.
    #[must_use]
    pub fn session_time_ms(&self) -> u64 {
        now_ms().saturating_sub(self.record.last_played_ms)
    }

    /// Convenience accessor for the player's id.
    #[must_use]
    pub const fn id(&self) -> PlayerId {
        self.record.id
    }

    /// Convenience accessor for the player's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.record.name
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> PlayerRecord {
        PlayerRecord {
            id: PlayerId::random(),
            name: name.to_string(),
            first_played_ms: 1_000,
            last_played_ms: 2_000,
            playtime_ms: 500,
            online: true,
        }
    }

    #[test]
    fn test_player_id_roundtrip() {
        let id = PlayerId::random();
        let parsed = PlayerId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_player_id_serde_transparent() {
        let id = PlayerId::random();
        let json = serde_json::to_string(&id).unwrap();
        // Serializes as a bare UUID string, not a wrapper object.
        assert!(json.starts_with('"'));
        let back: PlayerId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn test_session_time_counts_from_last_played() {
        let mut rec = record("joni");
        rec.last_played_ms = now_ms();
        let player = OnlinePlayer {
            record: rec,
            connected_server: Some("lobby-01".to_string()),
            connected_proxy: "proxy-01".to_string(),
            session_id: 7,
        };
        // Fresh session: elapsed time is tiny.
        assert!(player.session_time_ms() < 5_000);
    }

    #[test]
    fn test_online_player_accessors() {
        let rec = record("joni");
        let id = rec.id;
        let player = OnlinePlayer {
            record: rec,
            connected_server: None,
            connected_proxy: "proxy-01".to_string(),
            session_id: 1,
        };
        assert_eq!(player.id(), id);
        assert_eq!(player.name(), "joni");
    }
}
