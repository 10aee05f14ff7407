//! # Wire Messages
//!
//! The four payloads exchanged on the bus, plus the channel names they
//! travel on. Login/logout notifications are broadcast fan-out events;
//! the connect request/response pair implements request/response semantics
//! on top of the broadcast-only transport (see `playernet-bus`).

use crate::player::{OnlinePlayer, PlayerId, PlayerRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of bus channels.
///
/// Names are a stable wire contract shared by every deployed process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    /// A player logged in somewhere on the network.
    LoginNotify,
    /// A player logged out somewhere on the network.
    LogoutNotify,
    /// Ask whichever process owns a player to transfer them to a server.
    ConnectRequest,
    /// Outcome of a connect request, correlated by response key.
    ConnectResponse,
}

impl Channel {
    /// All channels, in subscription order.
    pub const ALL: [Channel; 4] = [
        Channel::LoginNotify,
        Channel::LogoutNotify,
        Channel::ConnectRequest,
        Channel::ConnectResponse,
    ];

    /// The wire name of this channel.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Channel::LoginNotify => "login-notify",
            Channel::LogoutNotify => "logout-notify",
            Channel::ConnectRequest => "connect-request",
            Channel::ConnectResponse => "connect-response",
        }
    }

    /// Look up a channel by its wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Published once by the process where a player logged in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginNotify {
    /// The player, with live session data.
    pub player: OnlinePlayer,
}

/// Published once by the process where a player logged out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutNotify {
    /// The player's record as of logout (`online` is false).
    pub player: PlayerRecord,
}

/// Ask the process that owns `player_id`'s connection to move the player.
///
/// Every subscribed process receives the request; only the owner acts.
/// A present `response_key` means the caller is waiting for a
/// [`ConnectResponse`]; absence means fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectRequest {
    /// The player to transfer.
    pub player_id: PlayerId,
    /// Exact server name, or a group prefix when the name contains no `-`.
    pub server_name: String,
    /// Correlation key echoed back in the response, if one is wanted.
    #[serde(default)]
    pub response_key: Option<u32>,
}

impl ConnectRequest {
    /// Whether the sender expects a response.
    #[must_use]
    pub const fn wants_response(&self) -> bool {
        self.response_key.is_some()
    }
}

/// Outcome of honoring a [`ConnectRequest`], published by the owning process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectResponse {
    /// The correlation key from the triggering request.
    pub response_key: u32,
    /// What happened.
    pub outcome: ConnectOutcome,
}

/// The fixed outcome enumeration for a connect attempt.
///
/// These are expected business outcomes, not errors; a caller always
/// receives one of these (or a timeout), never an unhandled fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectOutcome {
    /// The player was transferred (or already connected to the target).
    Success,
    /// The player is not connected to the responding process.
    PlayerNotFound,
    /// No registered server matched the requested name or prefix.
    ServerNotFound,
    /// The transfer was attempted and failed.
    Error,
}
