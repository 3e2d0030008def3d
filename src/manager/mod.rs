//! Session Manager (fleet-facing)
//!
//! Coordinates live game sessions across connections: pause/resume,
//! connection migration, heartbeat timeout detection, and reconnection
//! recovery. The in-memory map is the authoritative live view; the durable
//! store is a recovery fallback, and the two may transiently disagree.
//!
//! Session bookkeeping never fails a gameplay-adjacent caller: storage
//! errors are logged and swallowed. A failed write is a lost audit record,
//! not a broken session.

use crate::broadcast::StatusBroadcaster;
use crate::config::SessionConfig;
use crate::store::GameSessionStore;
use crate::sweeps::SweepTask;
use crate::types::{
    ActivityData, GameSession, GameSessionStatus, MigrationPayload, PresenceStatus,
};
use chrono::{DateTime, Duration, Utc};
use dashmap::{DashMap, DashSet};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Fleet session coordinator.
pub struct SessionManager {
    store: Arc<dyn GameSessionStore>,
    broadcaster: Arc<dyn StatusBroadcaster>,
    live: DashMap<String, GameSession>,
    /// Session ids with a migration in flight. Checked synchronously before
    /// any async work so concurrent migrations of one session are rejected
    /// immediately rather than queued.
    migrating: DashSet<String>,
    /// Last durable write-through per session, for activity throttling.
    last_flush: DashMap<String, DateTime<Utc>>,
    heartbeat_timeout: Duration,
    activity_flush: Duration,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn GameSessionStore>,
        broadcaster: Arc<dyn StatusBroadcaster>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            store,
            broadcaster,
            live: DashMap::new(),
            migrating: DashSet::new(),
            last_flush: DashMap::new(),
            heartbeat_timeout: Duration::seconds(config.heartbeat_timeout_secs),
            activity_flush: Duration::seconds(config.activity_flush_secs),
        }
    }

    /// Start a new game session: durable record, live record, "playing"
    /// presence broadcast.
    pub async fn create_game_session(
        &self,
        user_id: &str,
        game_id: &str,
        provider_id: &str,
        connection_id: Option<&str>,
    ) -> GameSession {
        let now = Utc::now();
        let session = GameSession {
            session_id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            game_id: game_id.to_string(),
            provider_id: provider_id.to_string(),
            session_token: Uuid::new_v4().simple().to_string(),
            started_at: now,
            last_activity: now,
            status: GameSessionStatus::Active,
            connection_id: connection_id.map(String::from),
            migration_payload: None,
            last_reported: None,
            pause_reason: None,
            ended_at: None,
            end_reason: None,
        };

        if let Err(e) = self.store.put(session.clone()).await {
            warn!(session_id = %session.session_id, error = %e, "failed to persist new game session");
        }
        self.live.insert(session.session_id.clone(), session.clone());
        self.last_flush.insert(session.session_id.clone(), now);

        self.broadcaster.publish(
            user_id,
            PresenceStatus::Playing,
            json!({
                "session_id": session.session_id,
                "game_id": game_id,
                "provider_id": provider_id,
            }),
        );
        info!(session_id = %session.session_id, user_id, game_id, "game session created");
        session
    }

    /// Refresh the live last-activity timestamp; write through to durable
    /// storage only on a throttled cadence to bound write amplification
    /// under frequent heartbeats.
    pub async fn update_session_activity(&self, session_id: &str, activity: Option<ActivityData>) {
        let now = Utc::now();
        let snapshot = match self.live.get_mut(session_id) {
            Some(mut session) => {
                session.last_activity = now;
                if let Some(data) = activity {
                    session.last_reported = Some(data);
                }
                session.clone()
            }
            None => {
                debug!(session_id, "activity for unknown live session");
                return;
            }
        };

        let flush_due = self
            .last_flush
            .get(session_id)
            .map(|t| now - *t >= self.activity_flush)
            .unwrap_or(true);
        if flush_due {
            self.last_flush.insert(session_id.to_string(), now);
            if let Err(e) = self.store.put(snapshot).await {
                warn!(session_id, error = %e, "activity write-through failed");
            }
        }
    }

    /// Pause an active session, recording the reason.
    pub async fn pause_session(&self, session_id: &str, reason: &str) {
        let snapshot = match self.live.get_mut(session_id) {
            Some(mut session) if session.status == GameSessionStatus::Active => {
                session.status = GameSessionStatus::Paused;
                session.pause_reason = Some(reason.to_string());
                session.last_activity = Utc::now();
                session.clone()
            }
            Some(session) => {
                debug!(session_id, status = ?session.status, "pause ignored");
                return;
            }
            None => {
                debug!(session_id, "pause for unknown live session");
                return;
            }
        };
        if let Err(e) = self.store.put(snapshot).await {
            warn!(session_id, error = %e, "failed to persist pause");
        }
        info!(session_id, reason, "game session paused");
    }

    /// Resume a paused session.
    pub async fn resume_session(&self, session_id: &str) -> bool {
        let snapshot = match self.live.get_mut(session_id) {
            Some(mut session) if session.status == GameSessionStatus::Paused => {
                session.status = GameSessionStatus::Active;
                session.pause_reason = None;
                session.last_activity = Utc::now();
                session.clone()
            }
            _ => return false,
        };
        if let Err(e) = self.store.put(snapshot).await {
            warn!(session_id, error = %e, "failed to persist resume");
        }
        info!(session_id, "game session resumed");
        true
    }

    /// Move a live session to a new connection.
    ///
    /// Atomic from the caller's perspective: the status round-trips
    /// `Active -> Migrating -> Active` inside one critical section, so no
    /// other task ever observes `Migrating`. The in-flight guard is
    /// released unconditionally, even when the durable write fails.
    pub async fn migrate_session(&self, session_id: &str, new_connection_id: &str) -> bool {
        if !self.migrating.insert(session_id.to_string()) {
            warn!(session_id, "concurrent migration rejected");
            return false;
        }
        let migrated = self.do_migrate(session_id, new_connection_id).await;
        self.migrating.remove(session_id);
        migrated
    }

    async fn do_migrate(&self, session_id: &str, new_connection_id: &str) -> bool {
        let snapshot = match self.live.get_mut(session_id) {
            Some(mut session) if session.status == GameSessionStatus::Active => {
                session.status = GameSessionStatus::Migrating;
                session.migration_payload = Some(Self::capture_payload(&session));
                session.connection_id = Some(new_connection_id.to_string());
                session.last_activity = Utc::now();
                session.status = GameSessionStatus::Active;
                session.clone()
            }
            Some(session) => {
                debug!(session_id, status = ?session.status, "migration refused, session not active");
                return false;
            }
            None => {
                debug!(session_id, "migration for unknown live session");
                return false;
            }
        };

        if let Err(e) = self.store.put(snapshot).await {
            // Live state already carries the new connection; only the
            // durable record is stale.
            warn!(session_id, error = %e, "failed to persist migration");
        }
        info!(session_id, new_connection_id, "game session migrated");
        true
    }

    /// Rehydration snapshot for the receiving connection, seeded from the
    /// most recent reported activity.
    fn capture_payload(session: &GameSession) -> MigrationPayload {
        let reported = session.last_reported.clone().unwrap_or_default();
        MigrationPayload {
            game_state: reported.game_state.unwrap_or(serde_json::Value::Null),
            balance: reported.balance.unwrap_or(0.0),
            current_bet: reported.current_bet.unwrap_or(0.0),
            round_in_progress: reported.round_in_progress.unwrap_or(false),
            metadata: Some(json!({
                "previous_connection": session.connection_id,
                "captured_at": Utc::now(),
            })),
        }
    }

    /// End a session: final durable write, "online but not playing"
    /// presence broadcast.
    pub async fn end_session(&self, session_id: &str, reason: &str) {
        let Some((_, mut session)) = self.live.remove(session_id) else {
            debug!(session_id, "end for unknown live session");
            return;
        };
        self.last_flush.remove(session_id);

        let now = Utc::now();
        let duration_secs = (now - session.started_at).num_seconds();
        session.status = GameSessionStatus::Ended;
        session.ended_at = Some(now);
        session.end_reason = Some(reason.to_string());
        session.last_activity = now;

        if let Err(e) = self.store.put(session.clone()).await {
            warn!(session_id, error = %e, "failed to persist session end");
        }

        self.broadcaster.publish(
            &session.user_id,
            PresenceStatus::Online,
            json!({
                "session_id": session_id,
                "reason": reason,
                "duration_secs": duration_secs,
            }),
        );
        info!(session_id, reason, duration_secs, "game session ended");
    }

    /// Find a resumable session after a reconnect. Prefers the live map
    /// (fresher); falls back to durable storage within the timeout window;
    /// returns `None` when nothing is resumable and the caller must create
    /// a fresh session.
    pub async fn handle_reconnection(
        &self,
        user_id: &str,
        game_id: &str,
        provider_id: &str,
    ) -> Option<GameSession> {
        let cutoff = Utc::now() - self.heartbeat_timeout;

        let live_id = self
            .live
            .iter()
            .find(|s| {
                s.user_id == user_id
                    && s.game_id == game_id
                    && s.provider_id == provider_id
                    && s.status == GameSessionStatus::Active
                    && s.last_activity >= cutoff
            })
            .map(|s| s.session_id.clone());
        if let Some(session_id) = live_id {
            self.update_session_activity(&session_id, None).await;
            debug!(session_id = %session_id, user_id, "reconnected to live session");
            return self.live.get(&session_id).map(|s| s.clone());
        }

        match self
            .store
            .find_resumable(user_id, game_id, provider_id, cutoff)
            .await
        {
            Ok(Some(mut session)) => {
                session.status = GameSessionStatus::Active;
                session.last_activity = Utc::now();
                session.connection_id = None;
                self.live.insert(session.session_id.clone(), session.clone());
                self.last_flush.insert(session.session_id.clone(), Utc::now());
                if let Err(e) = self.store.put(session.clone()).await {
                    warn!(session_id = %session.session_id, error = %e, "failed to persist rehydrated session");
                }
                info!(session_id = %session.session_id, user_id, "session rehydrated from durable storage");
                Some(session)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(user_id, error = %e, "resumable session lookup failed");
                None
            }
        }
    }

    /// Heartbeat sweep: end any live active session idle past the timeout.
    pub async fn sweep_heartbeats(&self) {
        let cutoff = Utc::now() - self.heartbeat_timeout;
        let expired: Vec<String> = self
            .live
            .iter()
            .filter(|s| s.status == GameSessionStatus::Active && s.last_activity < cutoff)
            .map(|s| s.session_id.clone())
            .collect();
        for session_id in expired {
            self.end_session(&session_id, "heartbeat timeout").await;
        }
    }

    /// Durable cleanup sweep: close stale persisted records directly,
    /// independent of the live map, to catch sessions whose owning process
    /// no longer exists.
    pub async fn sweep_durable(&self) {
        let cutoff = Utc::now() - self.heartbeat_timeout;
        let stale = match self.store.stale_active(cutoff).await {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!(error = %e, "stale durable session query failed");
                return;
            }
        };

        let mut closed = 0;
        for mut session in stale {
            if self.live.contains_key(&session.session_id) {
                // The heartbeat sweep owns locally live sessions.
                continue;
            }
            session.status = GameSessionStatus::Ended;
            session.ended_at = Some(Utc::now());
            session.end_reason = Some("stale record cleanup".to_string());
            match self.store.put(session).await {
                Ok(()) => closed += 1,
                Err(e) => warn!(error = %e, "failed to close stale durable session"),
            }
        }
        if closed > 0 {
            info!(closed, "stale durable game sessions closed");
        }
    }

    /// Connectivity returned: re-touch activity on all locally known
    /// active sessions so they are not reaped for an outage they survived.
    pub fn handle_network_restored(&self) {
        let now = Utc::now();
        let mut touched = 0;
        for mut session in self.live.iter_mut() {
            if session.status == GameSessionStatus::Active {
                session.last_activity = now;
                touched += 1;
            }
        }
        if touched > 0 {
            info!(touched, "live sessions touched after network restore");
        }
    }

    /// Best-effort persistence of the live map, for process teardown.
    pub async fn snapshot(&self) {
        let sessions: Vec<GameSession> = self.live.iter().map(|s| s.clone()).collect();
        let count = sessions.len();
        for session in sessions {
            if let Err(e) = self.store.put(session).await {
                warn!(error = %e, "snapshot write failed");
            }
        }
        if count > 0 {
            info!(count, "live session snapshot written");
        }
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Spawn the manager's periodic sweeps. Dropping the returned handles
    /// cancels them.
    pub fn start_sweeps(self: &Arc<Self>, config: &SessionConfig) -> Vec<SweepTask> {
        let heartbeat = {
            let manager = Arc::clone(self);
            SweepTask::spawn(
                "game-session-heartbeat",
                StdDuration::from_secs(config.heartbeat_sweep_secs),
                move || {
                    let manager = Arc::clone(&manager);
                    async move { manager.sweep_heartbeats().await }
                },
            )
        };
        let durable = {
            let manager = Arc::clone(self);
            SweepTask::spawn(
                "game-session-durable-cleanup",
                StdDuration::from_secs(config.durable_cleanup_secs),
                move || {
                    let manager = Arc::clone(&manager);
                    async move { manager.sweep_durable().await }
                },
            )
        };
        vec![heartbeat, durable]
    }

    #[cfg(test)]
    fn force_last_activity(&self, session_id: &str, at: DateTime<Utc>) {
        if let Some(mut session) = self.live.get_mut(session_id) {
            session.last_activity = at;
        }
    }

    #[cfg(test)]
    fn force_last_flush(&self, session_id: &str, at: DateTime<Utc>) {
        self.last_flush.insert(session_id.to_string(), at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::ChannelBroadcaster;
    use crate::errors::BridgeResult;
    use crate::store::InMemoryGameSessionStore;
    use async_trait::async_trait;

    /// Store double that parks every write long enough for a second caller
    /// to hit the migration guard.
    struct SlowStore {
        inner: InMemoryGameSessionStore,
        write_delay: StdDuration,
    }

    impl SlowStore {
        fn new(write_delay: StdDuration) -> Self {
            Self {
                inner: InMemoryGameSessionStore::new(),
                write_delay,
            }
        }
    }

    #[async_trait]
    impl GameSessionStore for SlowStore {
        async fn put(&self, session: GameSession) -> BridgeResult<()> {
            tokio::time::sleep(self.write_delay).await;
            self.inner.put(session).await
        }

        async fn get(&self, session_id: &str) -> BridgeResult<Option<GameSession>> {
            self.inner.get(session_id).await
        }

        async fn find_resumable(
            &self,
            user_id: &str,
            game_id: &str,
            provider_id: &str,
            active_since: DateTime<Utc>,
        ) -> BridgeResult<Option<GameSession>> {
            self.inner
                .find_resumable(user_id, game_id, provider_id, active_since)
                .await
        }

        async fn stale_active(&self, cutoff: DateTime<Utc>) -> BridgeResult<Vec<GameSession>> {
            self.inner.stale_active(cutoff).await
        }
    }

    /// Store double that counts durable writes.
    struct CountingStore {
        inner: InMemoryGameSessionStore,
        puts: std::sync::atomic::AtomicUsize,
    }

    impl CountingStore {
        fn new() -> Self {
            Self {
                inner: InMemoryGameSessionStore::new(),
                puts: std::sync::atomic::AtomicUsize::new(0),
            }
        }

        fn puts(&self) -> usize {
            self.puts.load(std::sync::atomic::Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GameSessionStore for CountingStore {
        async fn put(&self, session: GameSession) -> BridgeResult<()> {
            self.puts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.inner.put(session).await
        }

        async fn get(&self, session_id: &str) -> BridgeResult<Option<GameSession>> {
            self.inner.get(session_id).await
        }

        async fn find_resumable(
            &self,
            user_id: &str,
            game_id: &str,
            provider_id: &str,
            active_since: DateTime<Utc>,
        ) -> BridgeResult<Option<GameSession>> {
            self.inner
                .find_resumable(user_id, game_id, provider_id, active_since)
                .await
        }

        async fn stale_active(&self, cutoff: DateTime<Utc>) -> BridgeResult<Vec<GameSession>> {
            self.inner.stale_active(cutoff).await
        }
    }

    fn manager() -> (Arc<SessionManager>, Arc<InMemoryGameSessionStore>, Arc<ChannelBroadcaster>) {
        let store = Arc::new(InMemoryGameSessionStore::new());
        let broadcaster = Arc::new(ChannelBroadcaster::new(16));
        let manager = Arc::new(SessionManager::new(
            store.clone(),
            broadcaster.clone(),
            &SessionConfig::default(),
        ));
        (manager, store, broadcaster)
    }

    #[tokio::test]
    async fn test_create_broadcasts_playing() {
        let (manager, store, broadcaster) = manager();
        let mut rx = broadcaster.subscribe();

        let session = manager.create_game_session("u1", "g1", "provider-a", Some("conn-1")).await;
        assert_eq!(session.status, GameSessionStatus::Active);
        assert_eq!(manager.live_count(), 1);
        assert!(store.get(&session.session_id).await.unwrap().is_some());

        let event = rx.recv().await.unwrap();
        assert_eq!(event.player_id, "u1");
        assert_eq!(event.status, PresenceStatus::Playing);
        assert_eq!(event.context["game_id"], "g1");
    }

    #[tokio::test]
    async fn test_pause_and_resume() {
        let (manager, _, _) = manager();
        let session = manager.create_game_session("u1", "g1", "provider-a", None).await;

        manager.pause_session(&session.session_id, "user request").await;
        assert!(!manager.resume_session("ghost").await);
        assert!(manager.resume_session(&session.session_id).await);
        // Resuming an already-active session is a no-op failure.
        assert!(!manager.resume_session(&session.session_id).await);
    }

    #[tokio::test]
    async fn test_activity_write_through_is_throttled() {
        let store = Arc::new(CountingStore::new());
        let broadcaster = Arc::new(ChannelBroadcaster::new(16));
        let manager = Arc::new(SessionManager::new(
            store.clone(),
            broadcaster,
            &SessionConfig::default(),
        ));
        let session = manager.create_game_session("u1", "g1", "provider-a", None).await;
        assert_eq!(store.puts(), 1);

        // Rapid heartbeats inside the flush window only touch the live map.
        manager.update_session_activity(&session.session_id, None).await;
        manager.update_session_activity(&session.session_id, None).await;
        assert_eq!(store.puts(), 1);
        let live = manager.handle_reconnection("u1", "g1", "provider-a").await.unwrap();
        assert!(live.last_activity >= session.last_activity);

        // Once the window elapses, the next update writes through.
        manager.force_last_flush(&session.session_id, Utc::now() - Duration::seconds(61));
        manager.update_session_activity(&session.session_id, None).await;
        assert_eq!(store.puts(), 2);
    }

    #[tokio::test]
    async fn test_migration_captures_payload() {
        let (manager, store, _) = manager();
        let session = manager.create_game_session("u1", "g1", "provider-a", Some("conn-1")).await;

        manager
            .update_session_activity(
                &session.session_id,
                Some(ActivityData {
                    game_state: Some(json!({"reel": 3})),
                    balance: Some(42.0),
                    current_bet: Some(2.0),
                    round_in_progress: Some(true),
                }),
            )
            .await;

        assert!(manager.migrate_session(&session.session_id, "conn-2").await);

        let migrated = store.get(&session.session_id).await.unwrap().unwrap();
        assert_eq!(migrated.status, GameSessionStatus::Active);
        assert_eq!(migrated.connection_id.as_deref(), Some("conn-2"));
        let payload = migrated.migration_payload.unwrap();
        assert_eq!(payload.balance, 42.0);
        assert_eq!(payload.current_bet, 2.0);
        assert!(payload.round_in_progress);
        assert_eq!(payload.game_state["reel"], 3);
    }

    #[tokio::test]
    async fn test_concurrent_migrations_exactly_one_wins() {
        let store = Arc::new(SlowStore::new(StdDuration::from_millis(50)));
        let broadcaster = Arc::new(ChannelBroadcaster::new(16));
        let manager = Arc::new(SessionManager::new(
            store,
            broadcaster,
            &SessionConfig::default(),
        ));
        let session = manager.create_game_session("u1", "g1", "provider-a", Some("conn-0")).await;

        let (a, b) = tokio::join!(
            manager.migrate_session(&session.session_id, "conn-a"),
            manager.migrate_session(&session.session_id, "conn-b"),
        );
        assert_ne!(a, b, "exactly one migration must win");

        let live = manager.handle_reconnection("u1", "g1", "provider-a").await.unwrap();
        assert_eq!(live.status, GameSessionStatus::Active);
        let conn = live.connection_id.as_deref().unwrap();
        assert!(conn == "conn-a" || conn == "conn-b");
    }

    #[tokio::test]
    async fn test_end_session_broadcasts_online() {
        let (manager, store, broadcaster) = manager();
        let session = manager.create_game_session("u1", "g1", "provider-a", None).await;
        let mut rx = broadcaster.subscribe();

        manager.end_session(&session.session_id, "logout").await;
        assert_eq!(manager.live_count(), 0);

        let record = store.get(&session.session_id).await.unwrap().unwrap();
        assert_eq!(record.status, GameSessionStatus::Ended);
        assert_eq!(record.end_reason.as_deref(), Some("logout"));
        assert!(record.ended_at.is_some());

        let event = rx.recv().await.unwrap();
        assert_eq!(event.status, PresenceStatus::Online);
        assert_eq!(event.context["reason"], "logout");
    }

    #[tokio::test]
    async fn test_reconnection_prefers_live_session() {
        let (manager, _, _) = manager();
        let session = manager.create_game_session("u1", "g1", "provider-a", None).await;

        let found = manager.handle_reconnection("u1", "g1", "provider-a").await.unwrap();
        assert_eq!(found.session_id, session.session_id);

        assert!(manager.handle_reconnection("u1", "other-game", "provider-a").await.is_none());
    }

    #[tokio::test]
    async fn test_reconnection_rehydrates_within_window() {
        let (manager, store, _) = manager();
        // Durable-only record, as if another process owned it until recently.
        let mut session = manager.create_game_session("u1", "g1", "provider-a", None).await;
        manager.end_session(&session.session_id, "teardown").await;
        session.status = GameSessionStatus::Active;
        session.last_activity = Utc::now() - Duration::seconds(100);
        store.put(session.clone()).await.unwrap();

        let found = manager.handle_reconnection("u1", "g1", "provider-a").await.unwrap();
        assert_eq!(found.session_id, session.session_id);
        assert_eq!(found.status, GameSessionStatus::Active);
        assert_eq!(manager.live_count(), 1);
    }

    #[tokio::test]
    async fn test_reconnection_outside_window_returns_none() {
        let (manager, store, _) = manager();
        let mut session = manager.create_game_session("u1", "g1", "provider-a", None).await;
        manager.end_session(&session.session_id, "teardown").await;
        session.status = GameSessionStatus::Active;
        session.last_activity = Utc::now() - Duration::seconds(400);
        store.put(session).await.unwrap();

        assert!(manager.handle_reconnection("u1", "g1", "provider-a").await.is_none());
    }

    #[tokio::test]
    async fn test_heartbeat_sweep_ends_idle_sessions() {
        let (manager, store, _) = manager();
        let idle = manager.create_game_session("u1", "g1", "provider-a", None).await;
        let fresh = manager.create_game_session("u2", "g1", "provider-a", None).await;
        manager.force_last_activity(&idle.session_id, Utc::now() - Duration::seconds(301));

        manager.sweep_heartbeats().await;

        assert_eq!(manager.live_count(), 1);
        let ended = store.get(&idle.session_id).await.unwrap().unwrap();
        assert_eq!(ended.status, GameSessionStatus::Ended);
        assert_eq!(ended.end_reason.as_deref(), Some("heartbeat timeout"));
        let kept = store.get(&fresh.session_id).await.unwrap().unwrap();
        assert_eq!(kept.status, GameSessionStatus::Active);
    }

    #[tokio::test]
    async fn test_durable_sweep_closes_orphaned_records() {
        let (manager, store, _) = manager();
        // Orphan: durable record with no live counterpart.
        store
            .put(GameSession {
                session_id: "orphan".to_string(),
                user_id: "u9".to_string(),
                game_id: "g9".to_string(),
                provider_id: "provider-a".to_string(),
                session_token: "tok".to_string(),
                started_at: Utc::now() - Duration::seconds(900),
                last_activity: Utc::now() - Duration::seconds(600),
                status: GameSessionStatus::Active,
                connection_id: None,
                migration_payload: None,
                last_reported: None,
                pause_reason: None,
                ended_at: None,
                end_reason: None,
            })
            .await
            .unwrap();
        // Live-but-idle session stays the heartbeat sweep's business.
        let live = manager.create_game_session("u1", "g1", "provider-a", None).await;
        manager.force_last_activity(&live.session_id, Utc::now() - Duration::seconds(600));
        let mut stale_live = store.get(&live.session_id).await.unwrap().unwrap();
        stale_live.last_activity = Utc::now() - Duration::seconds(600);
        store.put(stale_live).await.unwrap();

        manager.sweep_durable().await;

        let orphan = store.get("orphan").await.unwrap().unwrap();
        assert_eq!(orphan.status, GameSessionStatus::Ended);
        let kept = store.get(&live.session_id).await.unwrap().unwrap();
        assert_eq!(kept.status, GameSessionStatus::Active);
    }

    #[tokio::test]
    async fn test_network_restore_touches_live_sessions() {
        let (manager, _, _) = manager();
        let session = manager.create_game_session("u1", "g1", "provider-a", None).await;
        manager.force_last_activity(&session.session_id, Utc::now() - Duration::seconds(290));

        manager.handle_network_restored();
        manager.sweep_heartbeats().await;
        assert_eq!(manager.live_count(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_persists_live_state() {
        let (manager, store, _) = manager();
        let session = manager.create_game_session("u1", "g1", "provider-a", None).await;
        manager
            .update_session_activity(
                &session.session_id,
                Some(ActivityData {
                    balance: Some(10.0),
                    ..Default::default()
                }),
            )
            .await;

        manager.snapshot().await;

        let persisted = store.get(&session.session_id).await.unwrap().unwrap();
        assert_eq!(persisted.last_reported.unwrap().balance, Some(10.0));
    }
}
