//! Receiving side of the connect protocol.
//!
//! Every process sees every connect request; only the one hosting the named
//! player acts. The handler resolves the target server, runs the platform
//! connector, and answers with exactly one response iff the request carried
//! a response key.

use crate::facade::PlayerDirectory;
use playernet_protocol::{ConnectOutcome, ConnectRequest, ConnectResponse};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Resolve a connect target against the registered server names.
///
/// A target containing `-` names one server exactly. A bare target is a
/// group prefix: the first server named `"{target}-…"` wins, falling back
/// to the first server whose name merely starts with the target.
#[must_use]
pub fn resolve_server<'a>(target: &str, servers: &'a [String]) -> Option<&'a str> {
    if target.contains('-') {
        return servers
            .iter()
            .find(|server| server.as_str() == target)
            .map(String::as_str);
    }
    let grouped = format!("{target}-");
    servers
        .iter()
        .find(|server| server.starts_with(&grouped))
        .or_else(|| servers.iter().find(|server| server.starts_with(target)))
        .map(String::as_str)
}

/// Handle one inbound connect request.
///
/// Not hosting the player is the common case on a multi-process network and
/// is silently skipped; the hosting process answers.
pub(crate) async fn handle(directory: Arc<PlayerDirectory>, request: ConnectRequest) {
    if !directory.local().is_online_id(request.player_id).await {
        debug!(
            player = %request.player_id,
            "Connect request for a player not hosted here, ignored"
        );
        return;
    }

    let servers = directory.servers().server_names().await;
    let outcome = match resolve_server(&request.server_name, &servers) {
        Some(server) => {
            let outcome = directory
                .connector()
                .connect(request.player_id, server)
                .await;
            info!(
                player = %request.player_id,
                server,
                outcome = ?outcome,
                "Handled connect request"
            );
            outcome
        }
        None => {
            debug!(
                target = %request.server_name,
                "Connect request for an unknown server"
            );
            ConnectOutcome::ServerNotFound
        }
    };

    let Some(response_key) = request.response_key else {
        return;
    };
    let response = ConnectResponse {
        response_key,
        outcome,
    };
    if let Err(err) = directory.bus().publish_connect_response(response).await {
        error!(error = %err, response_key, "Failed to publish connect response");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn servers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_bare_target_resolves_group_prefix() {
        let servers = servers(&["survival-01", "lobby-01", "lobby-02"]);
        assert_eq!(resolve_server("lobby", &servers), Some("lobby-01"));
    }

    #[test]
    fn test_target_with_separator_is_exact() {
        let servers = servers(&["lobby-01", "lobby-02", "lobby-03"]);
        assert_eq!(resolve_server("lobby-03", &servers), Some("lobby-03"));
        assert_eq!(resolve_server("lobby-99", &servers), None);
    }

    #[test]
    fn test_bare_target_falls_back_to_plain_prefix() {
        let servers = servers(&["lobbymain", "survival-01"]);
        assert_eq!(resolve_server("lobby", &servers), Some("lobbymain"));
    }

    #[test]
    fn test_unknown_target_resolves_to_none() {
        let servers = servers(&["lobby-01"]);
        assert_eq!(resolve_server("skyblock", &servers), None);
    }

    #[test]
    fn test_empty_directory_resolves_to_none() {
        assert_eq!(resolve_server("lobby", &[]), None);
        assert_eq!(resolve_server("lobby-01", &[]), None);
    }
}
