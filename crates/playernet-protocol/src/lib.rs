//! # playernet Protocol
//!
//! Wire contract shared by every process participating in the player
//! directory: game nodes, proxy nodes, and anything else that wants to know
//! who is online and where.
//!
//! ## Contents
//!
//! - **Entities**: `PlayerRecord` (a player who has connected at least once)
//!   and `OnlinePlayer` (a record plus live session data).
//! - **Messages**: the four payloads exchanged on the bus, the login/logout
//!   notifications and the connect request/response pair.
//! - **Codec**: symmetric encode/decode of payloads to frame bytes. Unknown
//!   fields are ignored on decode so processes on different protocol
//!   revisions can coexist.
//!
//! ## Channels
//!
//! Channel names are a fixed wire contract (see [`Channel`]); changing them
//! breaks interoperability with every deployed process.

pub mod codec;
pub mod messages;
pub mod player;

pub use codec::{DecodeError, EncodeError, FrameCodec, JsonCodec};
pub use messages::{Channel, ConnectOutcome, ConnectRequest, ConnectResponse, LoginNotify, LogoutNotify};
pub use player::{now_ms, OnlinePlayer, PlayerId, PlayerRecord};
