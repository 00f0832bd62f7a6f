use serde::{Deserialize, Serialize};
use crate::models::domain::{CycleStage, MatchingResult};

/// Response for the cycle run and lookup endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleResponse {
    pub cycle: String,
    #[serde(rename = "runId")]
    pub run_id: String,
    pub stage: CycleStage,
    pub replayed: bool,
    pub result: MatchingResult,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
