use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    api::{error::ApiError, response::ApiResponse},
    controller::AppState,
    domain::Alert,
};

#[derive(Debug, Deserialize, Validate)]
pub struct AlertIntervalRequest {
    #[validate(range(min = 0.1, max = 24.0))]
    pub hours: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertInterval {
    pub alert_interval_hours: f64,
}

/// GET /api/v1/alerts - newest first
pub async fn list_alerts(
    State(st): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Alert>>>, ApiError> {
    let alerts = st.controller.alerts().await;
    let count = alerts.len();
    Ok(Json(ApiResponse::success(alerts).with_count(count)))
}

/// DELETE /api/v1/alerts
pub async fn clear_alerts(
    State(st): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Alert>>>, ApiError> {
    st.controller.clear_alerts().await;
    Ok(Json(ApiResponse::success(Vec::new()).with_count(0)))
}

/// GET /api/v1/alerts/interval
pub async fn get_alert_interval(
    State(st): State<AppState>,
) -> Result<Json<ApiResponse<AlertInterval>>, ApiError> {
    Ok(Json(ApiResponse::success(AlertInterval {
        alert_interval_hours: st.controller.alert_interval_hours().await,
    })))
}

/// PUT /api/v1/alerts/interval
pub async fn set_alert_interval(
    State(st): State<AppState>,
    Json(req): Json<AlertIntervalRequest>,
) -> Result<Json<ApiResponse<AlertInterval>>, ApiError> {
    req.validate()?;
    let alert_interval_hours = st.scheduler.set_alert_interval(req.hours).await;
    Ok(Json(ApiResponse::success(AlertInterval {
        alert_interval_hours,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_bounds() {
        assert!(AlertIntervalRequest { hours: 0.1 }.validate().is_ok());
        assert!(AlertIntervalRequest { hours: 24.0 }.validate().is_ok());
        assert!(AlertIntervalRequest { hours: 0.05 }.validate().is_err());
        assert!(AlertIntervalRequest { hours: 25.0 }.validate().is_err());
    }
}
