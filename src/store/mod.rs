//! Storage abstractions.
//!
//! Every component takes its store as an injected trait object so a
//! single-process map can be swapped for a shared external store without
//! touching calling code, and so the idempotency and migration guards can
//! be exercised against fakes in tests.

mod memory;

pub use memory::{
    InMemoryBalanceStore, InMemoryGameSessionStore, InMemoryRoundStore, InMemorySessionStore,
    InMemoryTransactionStore,
};

use crate::errors::BridgeResult;
use crate::types::{GameSession, Round, Session, TransactionRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Player balance store, the one resource requiring strict mutual exclusion
/// per mutation. `debit` must check and subtract as a single atomic step.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Subtract `amount` from the player's balance. Fails with
    /// [`crate::errors::BridgeError::InsufficientFunds`] when the balance
    /// does not cover it.
    async fn debit(&self, player_id: &str, amount: f64, currency: &str) -> BridgeResult<f64>;

    /// Add `amount` to the player's balance and return the new balance.
    async fn credit(&self, player_id: &str, amount: f64, currency: &str) -> BridgeResult<f64>;

    async fn get_balance(&self, player_id: &str, currency: &str) -> BridgeResult<f64>;
}

/// Write-once store of processed transaction outcomes, keyed by the
/// provider transaction id.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Insert a record. An existing record for the same id wins; the store
    /// never overwrites a recorded outcome.
    async fn insert(&self, record: TransactionRecord) -> BridgeResult<()>;

    async fn get(&self, trx_id: &str) -> BridgeResult<Option<TransactionRecord>>;
}

/// Round records keyed by provider round id, queryable by player and by
/// staleness threshold.
#[async_trait]
pub trait RoundStore: Send + Sync {
    async fn put(&self, round: Round) -> BridgeResult<()>;

    async fn get(&self, round_id: &str) -> BridgeResult<Option<Round>>;

    async fn delete(&self, round_id: &str) -> BridgeResult<bool>;

    /// All rounds for a player, unordered.
    async fn rounds_for_player(&self, player_id: &str) -> BridgeResult<Vec<Round>>;

    /// Rounds whose start time is strictly before `cutoff`.
    async fn started_before(&self, cutoff: DateTime<Utc>) -> BridgeResult<Vec<Round>>;
}

/// Provider-facing session records.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn put(&self, session: Session) -> BridgeResult<()>;

    async fn get(&self, session_id: &str) -> BridgeResult<Option<Session>>;

    /// First active session matching the player and (optional) game code.
    /// The store does not enforce uniqueness; callers must not assume
    /// exactly one exists.
    async fn active_for_player_and_game(
        &self,
        player_id: &str,
        game_code: Option<&str>,
    ) -> BridgeResult<Option<Session>>;

    /// Sessions whose last activity is strictly before `cutoff`.
    async fn last_active_before(&self, cutoff: DateTime<Utc>) -> BridgeResult<Vec<Session>>;

    async fn delete(&self, session_id: &str) -> BridgeResult<bool>;
}

/// Durable fleet game-session records. The session manager's live map is
/// the authoritative view; this store is a recovery fallback.
#[async_trait]
pub trait GameSessionStore: Send + Sync {
    async fn put(&self, session: GameSession) -> BridgeResult<()>;

    async fn get(&self, session_id: &str) -> BridgeResult<Option<GameSession>>;

    /// Most recently active non-ended session for the (user, game, provider)
    /// triple with activity at or after `active_since`.
    async fn find_resumable(
        &self,
        user_id: &str,
        game_id: &str,
        provider_id: &str,
        active_since: DateTime<Utc>,
    ) -> BridgeResult<Option<GameSession>>;

    /// Active records whose last activity is strictly before `cutoff`,
    /// regardless of any in-memory view.
    async fn stale_active(&self, cutoff: DateTime<Utc>) -> BridgeResult<Vec<GameSession>>;
}
