//! Request Handlers
//!
//! The wallet callback answers HTTP 200 for everything it can read off the
//! wire; protocol-level failures are expressed as wallet error codes, not
//! HTTP status codes, so the provider's retry logic sees a stable contract.

use super::{middleware::RequestId, models::HealthResponse};
use crate::wallet::types::{WalletCallback, WalletResponse};
use crate::wallet::TransactionHandler;
use axum::body::Bytes;
use axum::extract::State;
use axum::{Extension, Json};
use std::sync::Arc;
use tracing::{debug, info};

/// Shared application state
pub struct AppState {
    pub transactions: Arc<TransactionHandler>,
    pub version: String,
}

/// Health check handler
/// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Running".to_string(),
        version: state.version.clone(),
    })
}

/// Inbound wallet callback handler
/// POST /wallet/callback
///
/// The body is parsed manually so a malformed payload still yields the
/// protocol's `errorcode "2"` response instead of an HTTP 4xx.
pub async fn wallet_callback_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Json<WalletResponse> {
    let callback: WalletCallback = match serde_json::from_slice(&body) {
        Ok(callback) => callback,
        Err(e) => {
            debug!(request_id = %request_id.0, error = %e, "unparseable wallet callback body");
            return Json(WalletResponse::invalid_request());
        }
    };

    let response = state.transactions.process_transaction(&callback).await;
    info!(
        request_id = %request_id.0,
        trx_id = %callback.trx_id,
        direction = %callback.direction,
        errorcode = response.errorcode.as_str(),
        "wallet callback processed"
    );
    Json(response)
}
