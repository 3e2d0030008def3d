//! Seamless wallet integration.
//!
//! Inbound debit/credit callbacks from the game provider enter through
//! [`handler::TransactionHandler`], which guarantees at-most-once economic
//! effect per provider transaction id.

pub mod handler;
pub mod hash;
pub mod types;

pub use handler::TransactionHandler;
pub use types::{WalletCallback, WalletResponse};
