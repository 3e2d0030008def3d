//! HTTP surface for the wallet bridge.
//!
//! One inbound endpoint matters: the provider's wallet callback. The
//! contract is HTTP 200 with a wallet error code for every parseable
//! request, including malformed ones.

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use server::ApiServer;
