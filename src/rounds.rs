//! Round Service
//!
//! Tracks the lifecycle of one wagering round: bet placed, win settled,
//! round closed. Rounds are keyed by the provider's round id, which is
//! unrelated to the transaction id the idempotency table uses; the two
//! identifiers must never be conflated.

use crate::config::RoundConfig;
use crate::errors::BridgeResult;
use crate::store::RoundStore;
use crate::types::{Round, RoundStatus};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Round lifecycle tracking with timeout-based recovery.
pub struct RoundService {
    store: Arc<dyn RoundStore>,
    stale_after: Duration,
    retention: Duration,
}

impl RoundService {
    pub fn new(store: Arc<dyn RoundStore>, config: &RoundConfig) -> Self {
        Self {
            store,
            stale_after: Duration::minutes(config.stale_after_mins),
            retention: Duration::days(config.retention_days),
        }
    }

    /// Create or overwrite the round record; called when a bet is placed.
    #[allow(clippy::too_many_arguments)]
    pub async fn track_round(
        &self,
        round_id: &str,
        player_id: &str,
        game_code: Option<&str>,
        bet_amount: f64,
        status: RoundStatus,
        session_id: Option<&str>,
        currency: &str,
    ) -> BridgeResult<Round> {
        let round = Round {
            round_id: round_id.to_string(),
            player_id: player_id.to_string(),
            game_code: game_code.map(String::from),
            currency: currency.to_string(),
            bet_amount,
            win_amount: None,
            total_win: 0.0,
            jackpot_win: None,
            status,
            start_time: Utc::now(),
            end_time: None,
            session_id: session_id.map(String::from),
        };
        self.store.put(round.clone()).await?;
        debug!(round_id, player_id, bet_amount, "round tracked");
        Ok(round)
    }

    /// Record win fields on an open round without changing its status.
    /// `total_win` defaults to `win_amount`, `jackpot_win` to zero.
    /// Safe to apply twice with the same values. Win fields attach only
    /// while the round is in progress; a closed round is left untouched.
    pub async fn update_round_with_win(
        &self,
        round_id: &str,
        win_amount: f64,
        total_win: Option<f64>,
        jackpot_win: Option<f64>,
    ) -> bool {
        let mut round = match self.store.get(round_id).await {
            Ok(Some(round)) => round,
            Ok(None) => {
                debug!(round_id, "win update for unknown round");
                return false;
            }
            Err(e) => {
                warn!(round_id, error = %e, "round lookup failed");
                return false;
            }
        };

        if round.status.is_closed() {
            debug!(round_id, status = ?round.status, "win update for closed round ignored");
            return false;
        }

        round.win_amount = Some(win_amount);
        round.total_win = total_win.unwrap_or(win_amount);
        round.jackpot_win = Some(jackpot_win.unwrap_or(0.0));

        match self.store.put(round).await {
            Ok(()) => true,
            Err(e) => {
                warn!(round_id, error = %e, "failed to store win update");
                false
            }
        }
    }

    /// Close a round. Status only advances forward: a closed round is never
    /// moved back to `InProgress`, and closing an already-closed round is a
    /// no-op returning `false`.
    pub async fn complete_round(&self, round_id: &str, status: RoundStatus) -> bool {
        if !status.is_closed() {
            warn!(round_id, "refusing to complete round with an open status");
            return false;
        }

        let mut round = match self.store.get(round_id).await {
            Ok(Some(round)) => round,
            Ok(None) => {
                debug!(round_id, "complete for unknown round");
                return false;
            }
            Err(e) => {
                warn!(round_id, error = %e, "round lookup failed");
                return false;
            }
        };

        if round.status.is_closed() {
            debug!(round_id, status = ?round.status, "round already closed");
            return false;
        }

        round.status = status;
        round.end_time = Some(Utc::now());

        match self.store.put(round).await {
            Ok(()) => true,
            Err(e) => {
                warn!(round_id, error = %e, "failed to store round completion");
                false
            }
        }
    }

    pub async fn get_round(&self, round_id: &str) -> Option<Round> {
        match self.store.get(round_id).await {
            Ok(round) => round,
            Err(e) => {
                warn!(round_id, error = %e, "round lookup failed");
                None
            }
        }
    }

    /// A player's rounds, most recent start time first.
    pub async fn get_player_rounds(&self, player_id: &str, limit: usize) -> Vec<Round> {
        let mut rounds = match self.store.rounds_for_player(player_id).await {
            Ok(rounds) => rounds,
            Err(e) => {
                warn!(player_id, error = %e, "player round query failed");
                return Vec::new();
            }
        };
        rounds.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        rounds.truncate(limit);
        rounds
    }

    /// Recovery candidates: rounds still `InProgress` whose start time is
    /// older than the staleness threshold.
    pub async fn get_incomplete_rounds(&self, player_id: &str) -> Vec<Round> {
        let cutoff = Utc::now() - self.stale_after;
        match self.store.rounds_for_player(player_id).await {
            Ok(rounds) => rounds
                .into_iter()
                .filter(|r| r.status == RoundStatus::InProgress && r.start_time < cutoff)
                .collect(),
            Err(e) => {
                warn!(player_id, error = %e, "incomplete round query failed");
                Vec::new()
            }
        }
    }

    /// Mark every recovery candidate `Recovered`. The true outcome is not
    /// confirmed with the provider; the distinct status leaves these rounds
    /// findable by a later reconciliation job.
    pub async fn recover_incomplete_rounds(&self, player_id: &str) -> usize {
        let candidates = self.get_incomplete_rounds(player_id).await;
        let mut recovered = 0;
        for round in candidates {
            if self.complete_round(&round.round_id, RoundStatus::Recovered).await {
                recovered += 1;
            }
        }
        if recovered > 0 {
            info!(player_id, recovered, "recovered stale rounds");
        }
        recovered
    }

    /// Purge rounds older than the retention window. Returns the count
    /// removed.
    pub async fn cleanup_old_rounds(&self) -> usize {
        let cutoff = Utc::now() - self.retention;
        let expired = match self.store.started_before(cutoff).await {
            Ok(rounds) => rounds,
            Err(e) => {
                warn!(error = %e, "round retention query failed");
                return 0;
            }
        };

        let mut removed = 0;
        for round in expired {
            match self.store.delete(&round.round_id).await {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => warn!(round_id = %round.round_id, error = %e, "failed to purge round"),
            }
        }
        if removed > 0 {
            info!(removed, "purged expired rounds");
        }
        removed
    }
}
