//! Session Service (provider-facing)
//!
//! Creates, retrieves, and expires per-player, per-game remote-play
//! sessions, and supplies the tokens game-launch URLs carry.
//!
//! The "one active session per (player, game)" invariant is intentionally
//! not enforced atomically; two concurrent launches can briefly produce two
//! active sessions. Callers must query for an active session rather than
//! assume a single canonical record.

use crate::config::SessionConfig;
use crate::errors::BridgeResult;
use crate::store::{BalanceStore, SessionStore};
use crate::types::Session;
use chrono::{Duration, Utc};
use rand::RngCore;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Provider session lifecycle and token issuance.
pub struct SessionService {
    store: Arc<dyn SessionStore>,
    balances: Arc<dyn BalanceStore>,
    expiry: Duration,
}

impl SessionService {
    pub fn new(
        store: Arc<dyn SessionStore>,
        balances: Arc<dyn BalanceStore>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            store,
            balances,
            expiry: Duration::hours(config.expiry_hours),
        }
    }

    /// Create an active session with a fresh token. The balance is cached
    /// opportunistically for launch-URL construction; it is not kept in
    /// sync afterwards.
    pub async fn create_session(
        &self,
        player_id: &str,
        game_code: Option<&str>,
        currency: &str,
    ) -> BridgeResult<Session> {
        let now = Utc::now();
        let balance = match self.balances.get_balance(player_id, currency).await {
            Ok(balance) => Some(balance),
            Err(e) => {
                warn!(player_id, error = %e, "balance lookup at launch failed");
                None
            }
        };

        let session = Session {
            session_id: Uuid::new_v4().to_string(),
            player_id: player_id.to_string(),
            game_code: game_code.map(String::from),
            currency: currency.to_string(),
            start_time: now,
            last_activity: now,
            active: true,
            token: generate_token(),
            balance,
        };
        self.store.put(session.clone()).await?;
        debug!(player_id, session_id = %session.session_id, "session created");
        Ok(session)
    }

    pub async fn get_session(&self, session_id: &str) -> Option<Session> {
        match self.store.get(session_id).await {
            Ok(session) => session,
            Err(e) => {
                warn!(session_id, error = %e, "session lookup failed");
                None
            }
        }
    }

    /// First active session for the player and game, if any.
    pub async fn get_session_by_player_and_game(
        &self,
        player_id: &str,
        game_code: Option<&str>,
    ) -> Option<Session> {
        match self
            .store
            .active_for_player_and_game(player_id, game_code)
            .await
        {
            Ok(session) => session,
            Err(e) => {
                warn!(player_id, error = %e, "active session query failed");
                None
            }
        }
    }

    /// Bump the session's last-activity timestamp.
    pub async fn update_session_activity(&self, session_id: &str) -> bool {
        let mut session = match self.store.get(session_id).await {
            Ok(Some(session)) => session,
            Ok(None) => return false,
            Err(e) => {
                warn!(session_id, error = %e, "session lookup failed");
                return false;
            }
        };
        session.last_activity = Utc::now();
        match self.store.put(session).await {
            Ok(()) => true,
            Err(e) => {
                warn!(session_id, error = %e, "failed to store activity update");
                false
            }
        }
    }

    /// Deactivate the session. The record is kept for audit.
    pub async fn end_session(&self, session_id: &str) -> bool {
        let mut session = match self.store.get(session_id).await {
            Ok(Some(session)) => session,
            Ok(None) => return false,
            Err(e) => {
                warn!(session_id, error = %e, "session lookup failed");
                return false;
            }
        };
        session.active = false;
        match self.store.put(session).await {
            Ok(()) => true,
            Err(e) => {
                warn!(session_id, error = %e, "failed to store session end");
                false
            }
        }
    }

    /// Periodic sweep: remove sessions idle past the expiry window.
    /// Expiry is reclamation by sweep, not automatic on read.
    pub async fn cleanup_expired_sessions(&self) -> usize {
        let cutoff = Utc::now() - self.expiry;
        let expired = match self.store.last_active_before(cutoff).await {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!(error = %e, "session expiry query failed");
                return 0;
            }
        };

        let mut removed = 0;
        for session in expired {
            match self.store.delete(&session.session_id).await {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(session_id = %session.session_id, error = %e, "failed to remove expired session")
                }
            }
        }
        if removed > 0 {
            info!(removed, "expired provider sessions removed");
        }
        removed
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
