//! HTTP server for the duty board.
//!
//! # Routes
//!
//! - `GET /` - duty board view: today's duty plus the two-week grid
//! - `GET /api/data` - same payload, kept for the board front-end
//! - `GET /health` - freshness/availability report (503 when unhealthy)
//! - `GET /version` - static version string
//!
//! Handlers only read cache snapshots; no request ever waits on the
//! Sheets API.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::cache::{FetchStatus, RosterCache};
use crate::health::HealthReporter;
use crate::query::{DayCell, RosterQuery};
use crate::roster::DutyEntry;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Bind error: {0}")]
    Bind(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared server state
pub struct AppState {
    query: RosterQuery,
    health: HealthReporter,
    cache: Arc<RosterCache>,
}

impl AppState {
    pub fn new(query: RosterQuery, health: HealthReporter, cache: Arc<RosterCache>) -> Self {
        Self {
            query,
            health,
            cache,
        }
    }
}

/// The duty board view model served on `/` and `/api/data`.
#[derive(Debug, Serialize)]
pub struct BoardResponse {
    pub today: NaiveDate,
    pub today_duty: Option<DutyEntry>,
    pub weeks: Vec<Vec<DayCell>>,
    pub last_fetch_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub status: Option<FetchStatus>,
    pub error: Option<String>,
    pub version: &'static str,
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(board))
        .route("/api/data", get(board))
        .route("/health", get(health))
        .route("/version", get(version))
        .with_state(state)
}

/// Run the server on the given address until the process exits.
pub async fn run(addr: &str, state: Arc<AppState>) -> Result<(), ServerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("{}: {}", addr, e)))?;

    tracing::info!(addr = addr, "Duty board server listening");

    axum::serve(listener, router(state))
        .await
        .map_err(ServerError::Io)
}

async fn board(State(state): State<Arc<AppState>>) -> Json<BoardResponse> {
    Json(board_response(&state))
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let report = state.health.report();
    let code = if report.ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(report))
}

async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

fn board_response(state: &AppState) -> BoardResponse {
    let snapshot = state.cache.snapshot();
    let today = state.query.today_date();

    BoardResponse {
        today,
        today_duty: state.query.today().into_iter().next(),
        weeks: state.query.upcoming_weeks(),
        last_fetch_at: snapshot.as_ref().map(|s| s.fetched_at),
        last_success_at: snapshot.as_ref().and_then(|s| s.last_success_at),
        status: snapshot.as_ref().map(|s| s.status),
        error: snapshot.as_ref().and_then(|s| s.error_detail.clone()),
        version: env!("CARGO_PKG_VERSION"),
    }
}

// ============================================================================
// Tests
// ============================================================================
