//! Route Definitions

use super::handlers::*;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// Build the API router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/wallet/callback", post(wallet_callback_handler))
        .with_state(state)
}
