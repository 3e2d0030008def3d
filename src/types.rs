//! Domain Types
//!
//! Entities and enums shared across the wallet bridge: transaction records,
//! rounds, provider sessions, and fleet game sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of a wallet instruction, as named on the provider wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxDirection {
    Debit,
    Credit,
}

impl TxDirection {
    /// Parse the wire form (`"debit"` / `"credit"`). Anything else is a
    /// validation failure, not a deserialization failure, so the callback
    /// can still answer with a wallet error code.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "debit" => Some(TxDirection::Debit),
            "credit" => Some(TxDirection::Credit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TxDirection::Debit => "debit",
            TxDirection::Credit => "credit",
        }
    }
}

/// Provider wallet error codes, serialized as the digit strings the
/// provider protocol expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletErrorCode {
    #[serde(rename = "0")]
    Success,
    #[serde(rename = "1")]
    GeneralError,
    #[serde(rename = "2")]
    InvalidRequest,
    #[serde(rename = "3")]
    InsufficientFunds,
    #[serde(rename = "4")]
    SessionExpired,
    #[serde(rename = "5")]
    InvalidGame,
    #[serde(rename = "6")]
    SystemError,
}

impl WalletErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletErrorCode::Success => "0",
            WalletErrorCode::GeneralError => "1",
            WalletErrorCode::InvalidRequest => "2",
            WalletErrorCode::InsufficientFunds => "3",
            WalletErrorCode::SessionExpired => "4",
            WalletErrorCode::InvalidGame => "5",
            WalletErrorCode::SystemError => "6",
        }
    }
}

/// Write-once record of a processed wallet transaction.
///
/// The outcome (`errorcode` + `balance`) is immutable once computed; a
/// replayed transaction id returns it verbatim without touching balances.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub trx_id: String,
    pub player_id: String,
    pub direction: TxDirection,
    pub amount: f64,
    pub currency: String,
    pub game_code: Option<String>,
    pub round_id: Option<String>,
    pub errorcode: WalletErrorCode,
    pub balance: f64,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle status of a wagering round. Status only advances forward out
/// of `InProgress`; a closed round is never reopened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    InProgress,
    Completed,
    Voided,
    Recovered,
}

impl RoundStatus {
    pub fn is_closed(&self) -> bool {
        !matches!(self, RoundStatus::InProgress)
    }
}

/// One wagering cycle: bet placed, optional win, close.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Round {
    pub round_id: String,
    pub player_id: String,
    pub game_code: Option<String>,
    pub currency: String,
    pub bet_amount: f64,
    pub win_amount: Option<f64>,
    pub total_win: f64,
    pub jackpot_win: Option<f64>,
    pub status: RoundStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub session_id: Option<String>,
}

/// Provider-facing play session, issued at game launch.
///
/// `balance` is cached opportunistically at launch time and is not kept in
/// sync; consumers needing a fresh figure must query the balance store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub player_id: String,
    pub game_code: Option<String>,
    pub currency: String,
    pub start_time: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub active: bool,
    pub token: String,
    pub balance: Option<f64>,
}

/// Fleet-facing game session status.
///
/// `Migrating` is transient: it must resolve back to `Active` within the
/// migration call itself and is never observable across a scheduling
/// boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameSessionStatus {
    Active,
    Paused,
    Ended,
    Migrating,
}

/// Gameplay context reported by the client on activity heartbeats, used to
/// seed a migration payload when the underlying connection changes.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ActivityData {
    pub game_state: Option<serde_json::Value>,
    pub balance: Option<f64>,
    pub current_bet: Option<f64>,
    pub round_in_progress: Option<bool>,
}

/// Snapshot handed to the receiving connection during migration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MigrationPayload {
    pub game_state: serde_json::Value,
    pub balance: f64,
    pub current_bet: f64,
    pub round_in_progress: bool,
    pub metadata: Option<serde_json::Value>,
}

/// Fleet-facing game session managed by the session manager.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameSession {
    pub session_id: String,
    pub user_id: String,
    pub game_id: String,
    pub provider_id: String,
    pub session_token: String,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub status: GameSessionStatus,
    pub connection_id: Option<String>,
    pub migration_payload: Option<MigrationPayload>,
    pub last_reported: Option<ActivityData>,
    pub pause_reason: Option<String>,
    pub ended_at: Option<DateTime<Utc>>,
    pub end_reason: Option<String>,
}

/// Player presence as published to the real-time broadcaster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Playing,
    Offline,
}
