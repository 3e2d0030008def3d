//! API Response Models
//!
//! The wallet wire types live in [`crate::wallet::types`]; this module
//! carries the surface's own responses.

use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
