//! In-memory store implementations backed by `DashMap`.
//!
//! Production deployments would put a shared database behind the same
//! traits; these implementations carry the full contract, including the
//! atomic debit, so the services and their tests run against real behavior.

use super::{BalanceStore, GameSessionStore, RoundStore, SessionStore, TransactionStore};
use crate::errors::{BridgeError, BridgeResult};
use crate::types::{GameSession, GameSessionStatus, Round, Session, TransactionRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

fn balance_key(player_id: &str, currency: &str) -> String {
    format!("{}:{}", player_id, currency)
}

/// Balance ledger keyed by `player:currency`.
#[derive(Default)]
pub struct InMemoryBalanceStore {
    balances: DashMap<String, f64>,
}

impl InMemoryBalanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or overwrite a balance. Operator-side funding; not part of the
    /// wallet callback path.
    pub fn set_balance(&self, player_id: &str, currency: &str, amount: f64) {
        self.balances.insert(balance_key(player_id, currency), amount);
    }
}

#[async_trait]
impl BalanceStore for InMemoryBalanceStore {
    async fn debit(&self, player_id: &str, amount: f64, currency: &str) -> BridgeResult<f64> {
        // The entry holds the shard lock, so check-then-subtract is one step.
        match self.balances.entry(balance_key(player_id, currency)) {
            Entry::Occupied(mut entry) => {
                let balance = *entry.get();
                if balance < amount {
                    return Err(BridgeError::InsufficientFunds {
                        player_id: player_id.to_string(),
                        balance,
                        requested: amount,
                    });
                }
                let new_balance = balance - amount;
                *entry.get_mut() = new_balance;
                Ok(new_balance)
            }
            Entry::Vacant(_) => Err(BridgeError::InsufficientFunds {
                player_id: player_id.to_string(),
                balance: 0.0,
                requested: amount,
            }),
        }
    }

    async fn credit(&self, player_id: &str, amount: f64, currency: &str) -> BridgeResult<f64> {
        let mut entry = self
            .balances
            .entry(balance_key(player_id, currency))
            .or_insert(0.0);
        *entry += amount;
        Ok(*entry)
    }

    async fn get_balance(&self, player_id: &str, currency: &str) -> BridgeResult<f64> {
        Ok(self
            .balances
            .get(&balance_key(player_id, currency))
            .map(|b| *b)
            .unwrap_or(0.0))
    }
}

/// Write-once transaction outcome store.
#[derive(Default)]
pub struct InMemoryTransactionStore {
    records: DashMap<String, TransactionRecord>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn insert(&self, record: TransactionRecord) -> BridgeResult<()> {
        // First write wins; a recorded outcome is immutable.
        self.records.entry(record.trx_id.clone()).or_insert(record);
        Ok(())
    }

    async fn get(&self, trx_id: &str) -> BridgeResult<Option<TransactionRecord>> {
        Ok(self.records.get(trx_id).map(|r| r.clone()))
    }
}

/// Round records keyed by provider round id.
#[derive(Default)]
pub struct InMemoryRoundStore {
    rounds: DashMap<String, Round>,
}

impl InMemoryRoundStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoundStore for InMemoryRoundStore {
    async fn put(&self, round: Round) -> BridgeResult<()> {
        self.rounds.insert(round.round_id.clone(), round);
        Ok(())
    }

    async fn get(&self, round_id: &str) -> BridgeResult<Option<Round>> {
        Ok(self.rounds.get(round_id).map(|r| r.clone()))
    }

    async fn delete(&self, round_id: &str) -> BridgeResult<bool> {
        Ok(self.rounds.remove(round_id).is_some())
    }

    async fn rounds_for_player(&self, player_id: &str) -> BridgeResult<Vec<Round>> {
        Ok(self
            .rounds
            .iter()
            .filter(|r| r.player_id == player_id)
            .map(|r| r.clone())
            .collect())
    }

    async fn started_before(&self, cutoff: DateTime<Utc>) -> BridgeResult<Vec<Round>> {
        Ok(self
            .rounds
            .iter()
            .filter(|r| r.start_time < cutoff)
            .map(|r| r.clone())
            .collect())
    }
}

/// Provider-facing session records.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, Session>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put(&self, session: Session) -> BridgeResult<()> {
        self.sessions.insert(session.session_id.clone(), session);
        Ok(())
    }

    async fn get(&self, session_id: &str) -> BridgeResult<Option<Session>> {
        Ok(self.sessions.get(session_id).map(|s| s.clone()))
    }

    async fn active_for_player_and_game(
        &self,
        player_id: &str,
        game_code: Option<&str>,
    ) -> BridgeResult<Option<Session>> {
        Ok(self
            .sessions
            .iter()
            .find(|s| {
                s.active
                    && s.player_id == player_id
                    && s.game_code.as_deref() == game_code
            })
            .map(|s| s.clone()))
    }

    async fn last_active_before(&self, cutoff: DateTime<Utc>) -> BridgeResult<Vec<Session>> {
        Ok(self
            .sessions
            .iter()
            .filter(|s| s.last_activity < cutoff)
            .map(|s| s.clone())
            .collect())
    }

    async fn delete(&self, session_id: &str) -> BridgeResult<bool> {
        Ok(self.sessions.remove(session_id).is_some())
    }
}

/// Durable fleet game-session records.
#[derive(Default)]
pub struct InMemoryGameSessionStore {
    sessions: DashMap<String, GameSession>,
}

impl InMemoryGameSessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameSessionStore for InMemoryGameSessionStore {
    async fn put(&self, session: GameSession) -> BridgeResult<()> {
        self.sessions.insert(session.session_id.clone(), session);
        Ok(())
    }

    async fn get(&self, session_id: &str) -> BridgeResult<Option<GameSession>> {
        Ok(self.sessions.get(session_id).map(|s| s.clone()))
    }

    async fn find_resumable(
        &self,
        user_id: &str,
        game_id: &str,
        provider_id: &str,
        active_since: DateTime<Utc>,
    ) -> BridgeResult<Option<GameSession>> {
        let mut best: Option<GameSession> = None;
        for entry in self.sessions.iter() {
            let s = entry.value();
            if s.user_id == user_id
                && s.game_id == game_id
                && s.provider_id == provider_id
                && s.status != GameSessionStatus::Ended
                && s.last_activity >= active_since
            {
                match &best {
                    Some(b) if b.last_activity >= s.last_activity => {}
                    _ => best = Some(s.clone()),
                }
            }
        }
        Ok(best)
    }

    async fn stale_active(&self, cutoff: DateTime<Utc>) -> BridgeResult<Vec<GameSession>> {
        Ok(self
            .sessions
            .iter()
            .filter(|s| s.status == GameSessionStatus::Active && s.last_activity < cutoff)
            .map(|s| s.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RoundStatus, TxDirection, WalletErrorCode};
    use chrono::Duration;

    #[tokio::test]
    async fn test_debit_checks_funds() {
        let store = InMemoryBalanceStore::new();
        store.set_balance("p1", "USD", 10.0);

        let balance = store.debit("p1", 4.0, "USD").await.unwrap();
        assert_eq!(balance, 6.0);

        let err = store.debit("p1", 100.0, "USD").await.unwrap_err();
        match err {
            BridgeError::InsufficientFunds { balance, requested, .. } => {
                assert_eq!(balance, 6.0);
                assert_eq!(requested, 100.0);
            }
            other => panic!("expected InsufficientFunds, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_debit_unknown_player() {
        let store = InMemoryBalanceStore::new();
        assert!(store.debit("ghost", 1.0, "USD").await.is_err());
        assert_eq!(store.get_balance("ghost", "USD").await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_credit_creates_balance() {
        let store = InMemoryBalanceStore::new();
        assert_eq!(store.credit("p1", 7.5, "USD").await.unwrap(), 7.5);
        assert_eq!(store.credit("p1", 2.5, "USD").await.unwrap(), 10.0);
        // Currencies are independent ledger entries.
        assert_eq!(store.get_balance("p1", "EUR").await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_transaction_store_first_write_wins() {
        let store = InMemoryTransactionStore::new();
        let mut record = TransactionRecord {
            trx_id: "t1".to_string(),
            player_id: "p1".to_string(),
            direction: TxDirection::Debit,
            amount: 5.0,
            currency: "USD".to_string(),
            game_code: None,
            round_id: None,
            errorcode: WalletErrorCode::Success,
            balance: 95.0,
            created_at: Utc::now(),
        };
        store.insert(record.clone()).await.unwrap();

        record.balance = 0.0;
        record.errorcode = WalletErrorCode::GeneralError;
        store.insert(record).await.unwrap();

        let stored = store.get("t1").await.unwrap().unwrap();
        assert_eq!(stored.errorcode, WalletErrorCode::Success);
        assert_eq!(stored.balance, 95.0);
    }

    #[tokio::test]
    async fn test_round_store_staleness_query() {
        let store = InMemoryRoundStore::new();
        let now = Utc::now();
        for (id, age_mins) in [("r-old", 45), ("r-new", 5)] {
            store
                .put(Round {
                    round_id: id.to_string(),
                    player_id: "p1".to_string(),
                    game_code: None,
                    currency: "USD".to_string(),
                    bet_amount: 1.0,
                    win_amount: None,
                    total_win: 0.0,
                    jackpot_win: None,
                    status: RoundStatus::InProgress,
                    start_time: now - Duration::minutes(age_mins),
                    end_time: None,
                    session_id: None,
                })
                .await
                .unwrap();
        }

        let stale = store.started_before(now - Duration::minutes(30)).await.unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].round_id, "r-old");
    }
}
