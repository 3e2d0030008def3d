//! Seamless wallet bridge for a third-party slot provider.
//!
//! The provider calls back into the operator in real time to debit and
//! credit a player's single balance. This crate carries the transactional
//! core of that integration:
//!
//! - [`wallet::TransactionHandler`] applies each provider transaction
//!   exactly once under retried delivery,
//! - [`rounds::RoundService`] tracks the bet → win → close lifecycle of a
//!   wagering round, with recovery of rounds abandoned mid-flight,
//! - [`sessions::SessionService`] issues and expires provider play
//!   sessions,
//! - [`manager::SessionManager`] coordinates fleet game sessions around
//!   the wallet traffic: pause/resume, connection migration, heartbeat
//!   timeouts, and reconnection recovery.
//!
//! Storage is injected through the traits in [`store`]; the HTTP callback
//! surface lives in [`api`].

pub mod api;
pub mod broadcast;
pub mod config;
pub mod errors;
pub mod launch;
pub mod manager;
pub mod rounds;
pub mod sessions;
pub mod store;
pub mod sweeps;
pub mod types;
pub mod wallet;

pub use config::{BridgeConfig, ConfigLoader};
pub use errors::{BridgeError, BridgeResult};
