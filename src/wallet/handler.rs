//! Transaction Handler
//!
//! Validates and applies a single debit/credit instruction against the
//! balance store exactly once, no matter how many times the provider
//! retries delivery.
//!
//! Idempotency is an atomic check-and-set on the transaction id: the first
//! arrival reserves an in-flight slot before any I/O, applies the balance
//! change, and settles the slot with the outcome. Concurrent arrivals for
//! the same id find the slot and await the winner's outcome instead of
//! re-applying the mutation.

use crate::config::ProviderConfig;
use crate::errors::BridgeError;
use crate::rounds::RoundService;
use crate::sessions::SessionService;
use crate::store::{BalanceStore, TransactionStore};
use crate::types::{RoundStatus, TransactionRecord, TxDirection, WalletErrorCode};
use crate::wallet::hash::verify_hash;
use crate::wallet::types::{WalletCallback, WalletResponse};
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Per-transaction-id slot. `Pending` carries the channel the winner will
/// settle; `Done` is the immutable recorded outcome.
enum TxSlot {
    Pending(watch::Receiver<Option<WalletResponse>>),
    Done(WalletResponse),
}

/// Applies provider wallet callbacks with at-most-once economic effect.
pub struct TransactionHandler {
    agent_id: String,
    secret_key: String,
    default_currency: String,
    balances: Arc<dyn BalanceStore>,
    transactions: Arc<dyn TransactionStore>,
    rounds: Arc<RoundService>,
    sessions: Arc<SessionService>,
    in_flight: DashMap<String, TxSlot>,
}

impl TransactionHandler {
    pub fn new(
        provider: &ProviderConfig,
        balances: Arc<dyn BalanceStore>,
        transactions: Arc<dyn TransactionStore>,
        rounds: Arc<RoundService>,
        sessions: Arc<SessionService>,
    ) -> Self {
        Self {
            agent_id: provider.agent_id.clone(),
            secret_key: provider.secret_key.clone(),
            default_currency: provider.currency.clone(),
            balances,
            transactions,
            rounds,
            sessions,
            in_flight: DashMap::new(),
        }
    }

    /// Process one wallet callback. Never fails toward the caller: every
    /// outcome, including internal faults, is a `WalletResponse`.
    pub async fn process_transaction(&self, tx: &WalletCallback) -> WalletResponse {
        let (direction, amount) = match self.validate(tx) {
            Ok(parsed) => parsed,
            Err(resp) => {
                debug!(trx_id = %tx.trx_id, "rejected malformed wallet callback");
                return resp;
            }
        };

        // Reserve the transaction id before any await. Exactly one caller
        // gets the vacant entry; everyone else observes Pending or Done.
        let (notify, slot_rx) = watch::channel(None::<WalletResponse>);
        let waiter = match self.in_flight.entry(tx.trx_id.clone()) {
            Entry::Occupied(slot) => match slot.get() {
                TxSlot::Done(resp) => {
                    debug!(trx_id = %tx.trx_id, "replayed transaction, returning recorded outcome");
                    return resp.clone();
                }
                TxSlot::Pending(rx) => Some(rx.clone()),
            },
            Entry::Vacant(slot) => {
                slot.insert(TxSlot::Pending(slot_rx));
                None
            }
        };

        if let Some(rx) = waiter {
            debug!(trx_id = %tx.trx_id, "duplicate in flight, awaiting first arrival");
            return Self::await_outcome(rx).await;
        }

        // Replay across restarts: the durable store may already hold the
        // outcome even though the in-flight map does not.
        match self.transactions.get(&tx.trx_id).await {
            Ok(Some(record)) => {
                let resp = WalletResponse::new(record.errorcode, record.balance);
                return self.settle(&tx.trx_id, notify, resp);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(trx_id = %tx.trx_id, error = %e, "transaction lookup failed");
                return self.abandon(&tx.trx_id, notify);
            }
        }

        let currency = tx
            .currency
            .clone()
            .unwrap_or_else(|| self.default_currency.clone());

        let applied = match direction {
            TxDirection::Debit => self.balances.debit(&tx.player_id, amount, &currency).await,
            TxDirection::Credit => self.balances.credit(&tx.player_id, amount, &currency).await,
        };

        let resp = match applied {
            Ok(balance) => WalletResponse::new(WalletErrorCode::Success, balance),
            Err(BridgeError::InsufficientFunds { balance, .. }) => {
                WalletResponse::new(WalletErrorCode::InsufficientFunds, balance)
            }
            Err(e) => {
                // The balance store decided nothing; leave the id free so a
                // provider retry can succeed once storage recovers.
                warn!(trx_id = %tx.trx_id, error = %e, "balance mutation failed");
                return self.abandon(&tx.trx_id, notify);
            }
        };

        if resp.errorcode == WalletErrorCode::Success {
            self.apply_side_effects(tx, direction, amount, &currency).await;
        }

        let record = TransactionRecord {
            trx_id: tx.trx_id.clone(),
            player_id: tx.player_id.clone(),
            direction,
            amount,
            currency,
            game_code: tx.game_code.clone(),
            round_id: tx.round_id.clone(),
            errorcode: resp.errorcode,
            balance: resp.balance,
            created_at: Utc::now(),
        };
        if let Err(e) = self.transactions.insert(record).await {
            // The in-flight slot still answers replays for this process
            // lifetime; the lost record only weakens replay-after-restart.
            warn!(trx_id = %tx.trx_id, error = %e, "failed to persist transaction record");
        }

        self.settle(&tx.trx_id, notify, resp)
    }

    /// Round and session bookkeeping after a successful balance mutation.
    /// Failures here are logged and non-fatal: the money already moved.
    async fn apply_side_effects(
        &self,
        tx: &WalletCallback,
        direction: TxDirection,
        amount: f64,
        currency: &str,
    ) {
        let session_id = match self
            .sessions
            .get_session_by_player_and_game(&tx.player_id, tx.game_code.as_deref())
            .await
        {
            Some(session) => {
                self.sessions.update_session_activity(&session.session_id).await;
                Some(session.session_id)
            }
            None => None,
        };

        let Some(round_id) = tx.round_id.as_deref() else {
            return;
        };

        match direction {
            TxDirection::Debit => {
                if self.rounds.get_round(round_id).await.is_none() {
                    if let Err(e) = self
                        .rounds
                        .track_round(
                            round_id,
                            &tx.player_id,
                            tx.game_code.as_deref(),
                            amount,
                            RoundStatus::InProgress,
                            session_id.as_deref(),
                            currency,
                        )
                        .await
                    {
                        warn!(round_id, error = %e, "failed to track round for debit");
                    }
                }
            }
            TxDirection::Credit => {
                if !self.rounds.update_round_with_win(round_id, amount, None, None).await {
                    debug!(round_id, "win credit for unknown or closed round");
                }
            }
        }
    }

    /// Record the outcome in the slot and wake any waiters.
    fn settle(
        &self,
        trx_id: &str,
        notify: watch::Sender<Option<WalletResponse>>,
        resp: WalletResponse,
    ) -> WalletResponse {
        self.in_flight
            .insert(trx_id.to_string(), TxSlot::Done(resp.clone()));
        let _ = notify.send(Some(resp.clone()));
        resp
    }

    /// Release an undecided reservation: waiters get a general error and
    /// the id stays free for a later retry.
    fn abandon(
        &self,
        trx_id: &str,
        notify: watch::Sender<Option<WalletResponse>>,
    ) -> WalletResponse {
        let resp = WalletResponse::general_error();
        let _ = notify.send(Some(resp.clone()));
        self.in_flight.remove(trx_id);
        resp
    }

    async fn await_outcome(mut rx: watch::Receiver<Option<WalletResponse>>) -> WalletResponse {
        loop {
            let settled = rx.borrow().clone();
            if let Some(resp) = settled {
                return resp;
            }
            if rx.changed().await.is_err() {
                // Winner dropped without settling.
                return WalletResponse::general_error();
            }
        }
    }

    fn validate(&self, tx: &WalletCallback) -> Result<(TxDirection, f64), WalletResponse> {
        if tx.player_id.is_empty() || tx.trx_id.is_empty() {
            return Err(WalletResponse::invalid_request());
        }
        let amount = tx.amount.ok_or_else(WalletResponse::invalid_request)?;
        if !amount.is_finite() || amount < 0.0 {
            return Err(WalletResponse::invalid_request());
        }
        if tx.agent_id != self.agent_id {
            return Err(WalletResponse::invalid_request());
        }
        let direction =
            TxDirection::parse(&tx.direction).ok_or_else(WalletResponse::invalid_request)?;
        if let Some(supplied) = tx.hash.as_deref() {
            if !verify_hash(supplied, &tx.trx_id, amount, &self.secret_key) {
                return Err(WalletResponse::invalid_request());
            }
        }
        Ok((direction, amount))
    }
}
