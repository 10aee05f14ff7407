//! # Connect Flow
//!
//! The full request/response round trip across simulated processes sharing
//! one bus: correlation, group-prefix server resolution, hosting-process
//! arbitration, timeouts, and fire-and-forget.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{online_player, process, wait_until};
    use playernet_bus::InMemoryBroker;
    use playernet_directory::ConnectResult;
    use playernet_protocol::ConnectOutcome;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(2);

    #[tokio::test]
    async fn test_connect_round_trip_with_group_prefix() {
        let broker = InMemoryBroker::new();
        let requester = process(&broker, &[], ConnectOutcome::Success, TIMEOUT);
        let host = process(
            &broker,
            &["survival-01", "lobby-01", "lobby-02"],
            ConnectOutcome::Success,
            TIMEOUT,
        );

        let player = online_player("steve");
        host.local.add(player.record.id, "steve");
        host.directory.serve_connect_requests().await.unwrap();

        let result = requester
            .directory
            .connect_player(player.record.id, "lobby")
            .await;

        assert_eq!(result, ConnectResult::Success);
        // The bare group name resolved to the first lobby instance.
        let calls = host.connector.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, player.record.id);
        assert_eq!(calls[0].1, "lobby-01");
    }

    #[tokio::test]
    async fn test_connect_with_exact_server_name() {
        let broker = InMemoryBroker::new();
        let requester = process(&broker, &[], ConnectOutcome::Success, TIMEOUT);
        let host = process(
            &broker,
            &["lobby-01", "lobby-02", "lobby-03"],
            ConnectOutcome::Success,
            TIMEOUT,
        );

        let player = online_player("alex");
        host.local.add(player.record.id, "alex");
        host.directory.serve_connect_requests().await.unwrap();

        let result = requester
            .directory
            .connect_player(player.record.id, "lobby-03")
            .await;

        assert_eq!(result, ConnectResult::Success);
        assert_eq!(host.connector.calls()[0].1, "lobby-03");
    }

    #[tokio::test]
    async fn test_unknown_server_answers_server_not_found() {
        let broker = InMemoryBroker::new();
        let requester = process(&broker, &[], ConnectOutcome::Success, TIMEOUT);
        let host = process(&broker, &["lobby-01"], ConnectOutcome::Success, TIMEOUT);

        let player = online_player("steve");
        host.local.add(player.record.id, "steve");
        host.directory.serve_connect_requests().await.unwrap();

        let result = requester
            .directory
            .connect_player(player.record.id, "skyblock")
            .await;

        assert_eq!(result, ConnectResult::ServerNotFound);
        assert!(host.connector.calls().is_empty());
    }

    #[tokio::test]
    async fn test_only_the_hosting_process_answers() {
        let broker = InMemoryBroker::new();
        let requester = process(&broker, &[], ConnectOutcome::Success, TIMEOUT);
        let bystander = process(&broker, &["lobby-01"], ConnectOutcome::Error, TIMEOUT);
        let host = process(&broker, &["lobby-01"], ConnectOutcome::Success, TIMEOUT);

        let player = online_player("steve");
        host.local.add(player.record.id, "steve");
        bystander.directory.serve_connect_requests().await.unwrap();
        host.directory.serve_connect_requests().await.unwrap();

        let result = requester
            .directory
            .connect_player(player.record.id, "lobby")
            .await;

        // The bystander saw the request but never ran its connector.
        assert_eq!(result, ConnectResult::Success);
        assert!(bystander.connector.calls().is_empty());
        assert_eq!(host.connector.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_unanswered_request_times_out() {
        let broker = InMemoryBroker::new();
        let requester = process(
            &broker,
            &[],
            ConnectOutcome::Success,
            Duration::from_millis(100),
        );
        // A listening process that hosts nobody.
        let idle = process(&broker, &["lobby-01"], ConnectOutcome::Success, TIMEOUT);
        idle.directory.serve_connect_requests().await.unwrap();

        let player = online_player("ghost");
        let result = requester
            .directory
            .connect_player(player.record.id, "lobby")
            .await;

        assert_eq!(result, ConnectResult::Timeout);
        assert!(idle.connector.calls().is_empty());
    }

    #[tokio::test]
    async fn test_fire_and_forget_connects_without_response() {
        let broker = InMemoryBroker::new();
        let requester = process(&broker, &[], ConnectOutcome::Success, TIMEOUT);
        let host = process(&broker, &["lobby-01"], ConnectOutcome::Success, TIMEOUT);

        let player = online_player("steve");
        host.local.add(player.record.id, "steve");
        host.directory.serve_connect_requests().await.unwrap();

        requester
            .directory
            .connect_player_fire_and_forget(player.record.id, "lobby")
            .await
            .unwrap();

        assert!(wait_until(|| host.connector.calls().len() == 1).await);
    }

    #[tokio::test]
    async fn test_error_outcome_propagates_to_requester() {
        let broker = InMemoryBroker::new();
        let requester = process(&broker, &[], ConnectOutcome::Success, TIMEOUT);
        let host = process(&broker, &["lobby-01"], ConnectOutcome::Error, TIMEOUT);

        let player = online_player("steve");
        host.local.add(player.record.id, "steve");
        host.directory.serve_connect_requests().await.unwrap();

        let result = requester
            .directory
            .connect_player(player.record.id, "lobby")
            .await;

        assert_eq!(result, ConnectResult::Error);
    }
}
