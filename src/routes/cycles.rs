use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use tokio::sync::Mutex;
use validator::Validate;

use crate::core::{CycleError, PairingEngine};
use crate::models::{CycleId, CycleResponse, CycleStage, ErrorResponse, HealthResponse, RunCycleRequest};
use crate::services::{HistoryStore, PostgresStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: PairingEngine,
    pub history: Arc<dyn HistoryStore>,
    /// Present when running against PostgreSQL; used by the health check
    pub database: Option<Arc<PostgresStore>>,
    /// Serialises cycle runs between the scheduler and this API
    pub run_lock: Arc<Mutex<()>>,
}

/// Configure all cycle-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/cycles/run", web::post().to(run_cycle))
        .route("/cycles/{year}/{week}", web::get().to(get_cycle));
}

fn error_response(status: u16, error: &str, message: String) -> HttpResponse {
    let body = ErrorResponse {
        error: error.to_string(),
        message,
        status_code: status,
    };
    match status {
        400 => HttpResponse::BadRequest().json(body),
        404 => HttpResponse::NotFound().json(body),
        409 => HttpResponse::Conflict().json(body),
        _ => HttpResponse::InternalServerError().json(body),
    }
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let healthy = match &state.database {
        Some(db) => db.health_check().await.unwrap_or(false),
        None => true,
    };

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Run a pairing cycle
///
/// POST /api/v1/cycles/run
///
/// Request body (both fields optional, default to the current ISO week):
/// ```json
/// { "year": 2025, "week": 33 }
/// ```
///
/// Re-running a committed cycle replays its stored result.
async fn run_cycle(
    state: web::Data<AppState>,
    req: web::Json<RunCycleRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for run_cycle request: {:?}", errors);
        return error_response(400, "Validation failed", errors.to_string());
    }

    let current = CycleId::current();
    let year = req.year.unwrap_or(current.year);
    let week = req.week.unwrap_or(current.week);
    let Some(cycle) = CycleId::new(year, week) else {
        return error_response(400, "Invalid cycle", format!("{} has no ISO week {}", year, week));
    };

    let _guard = state.run_lock.lock().await;
    match state.engine.run_cycle(cycle).await {
        Ok(report) => HttpResponse::Ok().json(CycleResponse {
            cycle: report.cycle.to_string(),
            run_id: report.run_id.to_string(),
            stage: report.stage,
            replayed: report.replayed,
            result: report.result,
        }),
        Err(e @ CycleError::Precondition { .. }) => {
            error_response(409, "Precondition failed", e.to_string())
        }
        Err(e) => error_response(500, &format!("Cycle aborted at {}", e.stage()), e.to_string()),
    }
}

/// Fetch a committed cycle
///
/// GET /api/v1/cycles/{year}/{week}
async fn get_cycle(state: web::Data<AppState>, path: web::Path<(i32, u32)>) -> impl Responder {
    let (year, week) = path.into_inner();
    let Some(cycle) = CycleId::new(year, week) else {
        return error_response(400, "Invalid cycle", format!("{} has no ISO week {}", year, week));
    };

    match state.history.committed_cycle(cycle).await {
        Ok(Some(record)) => HttpResponse::Ok().json(CycleResponse {
            cycle: cycle.to_string(),
            run_id: record.run_id.to_string(),
            stage: CycleStage::HistoryCommitted,
            replayed: false,
            result: record.result,
        }),
        Ok(None) => error_response(404, "Not found", format!("cycle {} has not been run", cycle)),
        Err(e) => {
            tracing::error!("Failed to fetch cycle {}: {}", cycle, e);
            error_response(500, "Failed to fetch cycle", e.to_string())
        }
    }
}
