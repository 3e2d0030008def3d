//! Keyed request digest shared between the provider and the operator.
//!
//! Both sides hash `"{trxid}|{amount}|{secret}"` with SHA-256 and compare
//! the hex encodings. The amount is rendered with Rust's default float
//! formatting; the provider integration is configured to match.

use sha2::{Digest, Sha256};

/// Compute the keyed digest for a transaction.
pub fn transaction_hash(trx_id: &str, amount: f64, secret_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}|{}|{}", trx_id, amount, secret_key).as_bytes());
    hex::encode(hasher.finalize())
}

/// Verify a caller-supplied hash against the expected digest.
pub fn verify_hash(supplied: &str, trx_id: &str, amount: f64, secret_key: &str) -> bool {
    supplied == transaction_hash(trx_id, amount, secret_key)
}
