use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::controller::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    timestamp: chrono::DateTime<chrono::Utc>,
    uptime_secs: i64,
    checks: HealthChecks,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    simulation: ComponentHealth,
    scheduler: ComponentHealth,
    feed: ComponentHealth,
}

#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl ComponentHealth {
    fn healthy(detail: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            detail: Some(detail.into()),
        }
    }

    fn unhealthy(detail: impl Into<String>) -> Self {
        Self {
            status: "unhealthy".to_string(),
            detail: Some(detail.into()),
        }
    }

    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let rooms = state.controller.rooms().await.len();
    let simulation = ComponentHealth::healthy(format!("{rooms} rooms"));

    let scheduler = if state.scheduler.is_running() {
        ComponentHealth::healthy("timers running")
    } else {
        ComponentHealth::unhealthy("timers not started")
    };

    let feed = if state.feed.is_connected() {
        ComponentHealth::healthy(state.feed.name())
    } else {
        ComponentHealth::unhealthy(format!("{} feed disconnected", state.feed.name()))
    };

    let all_healthy = simulation.is_healthy() && scheduler.is_healthy() && feed.is_healthy();
    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        timestamp: chrono::Utc::now(),
        uptime_secs: (chrono::Utc::now() - state.started_at).num_seconds(),
        checks: HealthChecks {
            simulation,
            scheduler,
            feed,
        },
    };

    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    tracing::debug!(healthy = all_healthy, "Health check completed");
    (status_code, Json(response))
}

/// GET /health/ready - ready once the timers are running
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    if state.scheduler.is_running() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health/live
pub async fn liveness_check() -> impl IntoResponse {
    StatusCode::OK
}
