use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::info;

use crate::{
    api::{error::ApiError, response::ApiResponse},
    controller::AppState,
};

/// GET /api/v1/devices/telemetry - latest cached payload per device
pub async fn list_telemetry(
    State(st): State<AppState>,
) -> Result<Json<ApiResponse<BTreeMap<String, Value>>>, ApiError> {
    let telemetry = st.telemetry.all();
    let count = telemetry.len();
    Ok(Json(ApiResponse::success(telemetry).with_count(count)))
}

/// GET /api/v1/devices/:id/status - refresh from the feed, falling back to the cache
pub async fn get_device_status(
    State(st): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let telemetry = st
        .telemetry
        .subscribe_device(&id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("No telemetry for device {id}")))?;
    Ok(Json(ApiResponse::success(telemetry)))
}

/// POST /api/v1/devices/:id/cmd
pub async fn post_device_command(
    State(st): State<AppState>,
    Path(id): Path<String>,
    Json(command): Json<Value>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    info!(device_id = %id, %command, "device command");
    let result = st.devices.post_command(&id, &command).await?;
    Ok(Json(ApiResponse::success(result)))
}
