//! Wallet bridge binary.
//!
//! Wires the in-memory stores, services, background sweeps, and the
//! callback API together.

use seamless_wallet::api::ApiServer;
use seamless_wallet::broadcast::ChannelBroadcaster;
use seamless_wallet::config::ConfigLoader;
use seamless_wallet::manager::SessionManager;
use seamless_wallet::rounds::RoundService;
use seamless_wallet::sessions::SessionService;
use seamless_wallet::store::{
    InMemoryBalanceStore, InMemoryGameSessionStore, InMemoryRoundStore, InMemorySessionStore,
    InMemoryTransactionStore,
};
use seamless_wallet::sweeps::SweepTask;
use seamless_wallet::wallet::TransactionHandler;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seamless_wallet=info,tower_http=info".into()),
        )
        .init();

    let mut loader = ConfigLoader::new();
    if let Ok(path) = std::env::var("WALLET_CONFIG") {
        loader = loader.with_path(path);
    }
    let config = loader.load()?;
    info!(agent_id = %config.provider.agent_id, "configuration loaded");

    let balances = Arc::new(InMemoryBalanceStore::new());
    let transactions = Arc::new(InMemoryTransactionStore::new());
    let rounds = Arc::new(RoundService::new(
        Arc::new(InMemoryRoundStore::new()),
        &config.rounds,
    ));
    let sessions = Arc::new(SessionService::new(
        Arc::new(InMemorySessionStore::new()),
        balances.clone(),
        &config.sessions,
    ));
    let handler = Arc::new(TransactionHandler::new(
        &config.provider,
        balances.clone(),
        transactions,
        rounds.clone(),
        sessions.clone(),
    ));

    let broadcaster = Arc::new(ChannelBroadcaster::default());
    let manager = Arc::new(SessionManager::new(
        Arc::new(InMemoryGameSessionStore::new()),
        broadcaster,
        &config.sessions,
    ));

    let mut sweep_tasks = manager.start_sweeps(&config.sessions);
    sweep_tasks.push({
        let sessions = sessions.clone();
        SweepTask::spawn(
            "provider-session-expiry",
            Duration::from_secs(config.sessions.expiry_sweep_secs),
            move || {
                let sessions = sessions.clone();
                async move {
                    sessions.cleanup_expired_sessions().await;
                }
            },
        )
    });
    sweep_tasks.push({
        let rounds = rounds.clone();
        SweepTask::spawn(
            "round-retention",
            Duration::from_secs(config.rounds.cleanup_sweep_secs),
            move || {
                let rounds = rounds.clone();
                async move {
                    rounds.cleanup_old_rounds().await;
                }
            },
        )
    });

    let server = ApiServer::new(config.api.clone(), handler);
    let result = server.run().await;

    // Teardown: stop timers and leave a recovery snapshot behind.
    for task in &sweep_tasks {
        task.stop();
    }
    manager.snapshot().await;

    result
}
