//! Cross-process integration scenarios.

pub mod connect_flow;
pub mod notifications;

#[cfg(test)]
pub(crate) mod fixtures {
    use playernet_bus::{InMemoryBroker, PlayerBus};
    use playernet_directory::{
        InMemoryDirectoryService, LocalPlayerAccessor, LocalPlayerSet, PlayerConnector,
        PlayerDirectory, ScriptedConnector, StaticServerDirectory,
    };
    use playernet_protocol::{ConnectOutcome, OnlinePlayer, PlayerId, PlayerRecord};
    use std::sync::Arc;
    use std::time::Duration;

    /// Route crate logs through the test harness so `RUST_LOG` works when a
    /// scenario needs inspecting. Safe to call from every test.
    pub fn init_tracing() {
        static INIT: std::sync::Once = std::sync::Once::new();
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .with_test_writer()
                .try_init();
        });
    }

    /// One simulated directory process: a facade plus handles to the port
    /// implementations behind it.
    pub struct Process {
        pub directory: Arc<PlayerDirectory>,
        pub local: Arc<LocalPlayerSet>,
        pub connector: Arc<ScriptedConnector>,
    }

    /// Spin up a process on `broker` with the given registered servers and
    /// a connector that always reports `outcome`.
    pub fn process(
        broker: &InMemoryBroker,
        servers: &[&str],
        outcome: ConnectOutcome,
        timeout: Duration,
    ) -> Process {
        init_tracing();
        let bus = Arc::new(PlayerBus::with_timeout(broker.clone(), timeout));
        let local = Arc::new(LocalPlayerSet::new());
        let connector = Arc::new(ScriptedConnector::new(outcome));
        let directory = Arc::new(PlayerDirectory::new(
            bus,
            Arc::new(InMemoryDirectoryService::new()),
            Arc::clone(&local) as Arc<dyn LocalPlayerAccessor>,
            Arc::new(StaticServerDirectory::new(servers.iter().copied())),
            Arc::clone(&connector) as Arc<dyn PlayerConnector>,
        ));
        Process {
            directory,
            local,
            connector,
        }
    }

    pub fn online_player(name: &str) -> OnlinePlayer {
        OnlinePlayer {
            record: PlayerRecord {
                id: PlayerId::random(),
                name: name.to_string(),
                first_played_ms: 0,
                last_played_ms: 0,
                playtime_ms: 0,
                online: false,
            },
            connected_server: None,
            connected_proxy: "proxy-01".to_string(),
            session_id: 1,
        }
    }

    /// Poll `check` for up to one second.
    pub async fn wait_until(check: impl Fn() -> bool) -> bool {
        for _ in 0..100 {
            if check() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        check()
    }
}
