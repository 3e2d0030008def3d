//! Error types for the wallet bridge.
//!
//! Public entry points never surface these to the provider; expected
//! failure modes become structured results (wallet error codes, `false`,
//! `None`). `BridgeError` covers the storage and configuration boundary.

use thiserror::Error;

/// Root error type for bridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("insufficient funds for player {player_id}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        player_id: String,
        balance: f64,
        requested: f64,
    },
}

/// Convenience alias used throughout the crate.
pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_funds_display() {
        let err = BridgeError::InsufficientFunds {
            player_id: "p1".to_string(),
            balance: 3.0,
            requested: 5.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("p1"));
        assert!(msg.contains("balance 3"));
        assert!(msg.contains("requested 5"));
    }

    #[test]
    fn test_storage_display() {
        let err = BridgeError::Storage("write failed".to_string());
        assert_eq!(err.to_string(), "storage error: write failed");
    }
}
