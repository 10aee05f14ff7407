//! # playernet Directory
//!
//! The process-facing surface of the player directory. A [`PlayerDirectory`]
//! wraps the bus together with four platform ports:
//!
//! - [`DirectoryService`]: the authoritative player-record store (an RPC
//!   backend in production, in-memory here);
//! - [`LocalPlayerAccessor`]: which players this process currently hosts;
//! - [`ServerDirectory`]: the names of registered backend servers;
//! - [`PlayerConnector`]: the platform call that actually moves a player.
//!
//! Queries go local-first, then to the directory service. Connect requests
//! arriving over the bus are honored only by the process that hosts the
//! player, with the target resolved by exact name or group prefix.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod facade;
pub mod handler;
pub mod memory;
pub mod ports;

pub use config::{BusConfig, ConfigError, DirectoryConfig, ServiceConfig};
pub use facade::{ConnectResult, PlayerDirectory};
pub use handler::resolve_server;
pub use memory::{InMemoryDirectoryService, LocalPlayerSet, ScriptedConnector, StaticServerDirectory};
pub use ports::{
    DirectoryError, DirectoryService, LocalPlayerAccessor, PlayerConnector, ServerDirectory,
};
