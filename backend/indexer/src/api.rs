//! Axum REST API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::error;

use crate::db;
use crate::errors::Result;
use crate::events::EventRecord;

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ProjectEventsResponse {
    pub project_id: String,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct OrderEventsResponse {
    pub order_id: String,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct AccountEventsResponse {
    pub address: String,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct AllEventsResponse {
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// 200 with the body built from `events`, or 500 with the error message.
fn respond<T, F>(result: Result<Vec<EventRecord>>, build: F) -> Response
where
    T: Serialize,
    F: FnOnce(Vec<EventRecord>) -> T,
{
    match result {
        Ok(events) => (StatusCode::OK, Json(build(events))).into_response(),
        Err(e) => {
            error!("API query failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /projects/:id/events`
///
/// Registry, ledger and order events for the given project.
pub async fn get_project_events(
    State(state): State<Arc<ApiState>>,
    Path(project_id): Path<String>,
) -> Response {
    let result = db::get_events_for_project(&state.pool, &project_id).await;
    respond(result, |events| ProjectEventsResponse {
        project_id,
        count: events.len(),
        events,
    })
}

/// `GET /orders/:id/events`
pub async fn get_order_events(
    State(state): State<Arc<ApiState>>,
    Path(order_id): Path<String>,
) -> Response {
    let result = db::get_events_for_order(&state.pool, &order_id).await;
    respond(result, |events| OrderEventsResponse {
        order_id,
        count: events.len(),
        events,
    })
}

/// `GET /accounts/:address/events`
///
/// Events whose primary actor is `address`: its mints, retirements,
/// listings, purchases, withdrawals and role changes.
pub async fn get_account_events(
    State(state): State<Arc<ApiState>>,
    Path(address): Path<String>,
) -> Response {
    let result = db::get_events_for_account(&state.pool, &address).await;
    respond(result, |events| AccountEventsResponse {
        address,
        count: events.len(),
        events,
    })
}

/// `GET /events`
pub async fn get_all_events(State(state): State<Arc<ApiState>>) -> Response {
    let result = db::get_all_events(&state.pool).await;
    respond(result, |events| AllEventsResponse {
        count: events.len(),
        events,
    })
}
