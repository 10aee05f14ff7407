//! # Notification Fan-Out
//!
//! Login and logout notifications reaching every process on the bus,
//! including the originator, with per-process unsubscribe.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{online_player, process, wait_until};
    use playernet_bus::InMemoryBroker;
    use playernet_protocol::ConnectOutcome;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(2);

    #[tokio::test]
    async fn test_login_reaches_every_process() {
        let broker = InMemoryBroker::new();
        let nodes: Vec<_> = (0..3)
            .map(|_| process(&broker, &[], ConnectOutcome::Success, TIMEOUT))
            .collect();

        let seen = Arc::new(AtomicUsize::new(0));
        let mut guards = Vec::new();
        for node in &nodes {
            let counter = Arc::clone(&seen);
            let guard = node
                .directory
                .subscribe_login(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .await
                .unwrap();
            guards.push(guard);
        }

        nodes[0]
            .directory
            .publish_login(online_player("steve"))
            .await
            .unwrap();

        // All three processes observe the login, the originator included.
        assert!(wait_until(|| seen.load(Ordering::SeqCst) == 3).await);
    }

    #[tokio::test]
    async fn test_logout_carries_the_player_record() {
        let broker = InMemoryBroker::new();
        let origin = process(&broker, &[], ConnectOutcome::Success, TIMEOUT);
        let observer = process(&broker, &[], ConnectOutcome::Success, TIMEOUT);

        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _guard = observer
            .directory
            .subscribe_logout(move |notify| {
                if let Ok(mut names) = sink.lock() {
                    names.push(notify.player.name.clone());
                }
            })
            .await
            .unwrap();

        let player = online_player("alex");
        origin
            .directory
            .publish_logout(player.record.clone())
            .await
            .unwrap();

        assert!(
            wait_until(|| {
                seen.lock()
                    .map(|names| names.as_slice() == ["alex".to_string()])
                    .unwrap_or(false)
            })
            .await
        );
    }

    #[tokio::test]
    async fn test_unsubscribed_process_stops_receiving() {
        let broker = InMemoryBroker::new();
        let origin = process(&broker, &[], ConnectOutcome::Success, TIMEOUT);
        let observer = process(&broker, &[], ConnectOutcome::Success, TIMEOUT);

        let origin_seen = Arc::new(AtomicUsize::new(0));
        let observer_seen = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&origin_seen);
        let _origin_guard = origin
            .directory
            .subscribe_login(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        let counter = Arc::clone(&observer_seen);
        let observer_guard = observer
            .directory
            .subscribe_login(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();

        origin
            .directory
            .publish_login(online_player("steve"))
            .await
            .unwrap();
        assert!(wait_until(|| observer_seen.load(Ordering::SeqCst) == 1).await);

        observer_guard.unsubscribe();
        origin
            .directory
            .publish_login(online_player("steve"))
            .await
            .unwrap();

        // The origin keeps receiving; the unsubscribed observer does not.
        assert!(wait_until(|| origin_seen.load(Ordering::SeqCst) == 2).await);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(observer_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_publish_login_records_with_the_directory_service() {
        let broker = InMemoryBroker::new();
        let node = process(&broker, &[], ConnectOutcome::Success, TIMEOUT);

        let player = online_player("steve");
        let id = player.record.id;
        node.directory.publish_login(player).await.unwrap();

        let found = node.directory.online_player(id).await.unwrap();
        assert!(found.is_some());
        assert!(node.directory.is_player_online(id).await.unwrap());
    }
}
