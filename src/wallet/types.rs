//! Wallet callback wire types.
//!
//! Field names follow the provider protocol. Required fields deserialize
//! leniently (missing → empty/none) so the handler can answer malformed
//! payloads with `errorcode "2"` instead of an HTTP-level rejection.

use crate::types::WalletErrorCode;
use serde::{Deserialize, Serialize};

/// Inbound wallet callback body.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WalletCallback {
    #[serde(rename = "agentid", default)]
    pub agent_id: String,
    #[serde(rename = "playerid", default)]
    pub player_id: String,
    #[serde(rename = "trxid", default)]
    pub trx_id: String,
    /// `"debit"` or `"credit"`; validated, not deserialized, as an enum.
    #[serde(rename = "type", default)]
    pub direction: String,
    pub amount: Option<f64>,
    #[serde(rename = "gamecode")]
    pub game_code: Option<String>,
    pub hash: Option<String>,
    pub currency: Option<String>,
    #[serde(rename = "roundid")]
    pub round_id: Option<String>,
}

/// Callback response: an error code string and the player balance.
///
/// Safe to return verbatim for a retried transaction id; the pair is the
/// recorded outcome of the first processing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WalletResponse {
    pub errorcode: WalletErrorCode,
    pub balance: f64,
}

impl WalletResponse {
    pub fn new(errorcode: WalletErrorCode, balance: f64) -> Self {
        Self { errorcode, balance }
    }

    pub fn invalid_request() -> Self {
        Self::new(WalletErrorCode::InvalidRequest, 0.0)
    }

    pub fn general_error() -> Self {
        Self::new(WalletErrorCode::GeneralError, 0.0)
    }
}
