use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    api::{error::ApiError, response::ApiResponse},
    controller::AppState,
    domain::{ComfortLevel, DashboardSnapshot, LightSample, Room, Summary, TargetStatus},
};

/// Room card: raw state plus derived indicators
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    #[serde(flatten)]
    pub room: Room,
    pub target_status: TargetStatus,
    pub comfort: ComfortLevel,
}

impl From<Room> for RoomView {
    fn from(room: Room) -> Self {
        Self {
            target_status: room.target_status(),
            comfort: room.comfort(),
            room,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct TargetTempRequest {
    #[serde(alias = "targetTemp")]
    #[validate(range(min = 16.0, max = 30.0))]
    pub target_temp: f64,
}

/// Absent `enabled` flips the current mode
#[derive(Debug, Default, Deserialize)]
pub struct AutoModeRequest {
    pub enabled: Option<bool>,
}

impl AutoModeRequest {
    /// An empty body is a toggle; anything else must be well-formed JSON.
    fn from_body(headers: &HeaderMap, body: &Bytes) -> Result<Self, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let is_json = headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|ct| ct.trim_start().starts_with("application/json"));
        if !is_json {
            return Err(ApiError::UnsupportedMediaType(
                "expected Content-Type: application/json".to_string(),
            ));
        }
        let Json(req) =
            Json::<Self>::from_bytes(body).map_err(|e| ApiError::BadRequest(e.body_text()))?;
        Ok(req)
    }
}

/// GET /api/v1/snapshot
pub async fn get_snapshot(
    State(st): State<AppState>,
) -> Result<Json<ApiResponse<DashboardSnapshot>>, ApiError> {
    Ok(Json(ApiResponse::success(st.controller.snapshot().await)))
}

/// GET /api/v1/summary
pub async fn get_summary(State(st): State<AppState>) -> Result<Json<ApiResponse<Summary>>, ApiError> {
    Ok(Json(ApiResponse::success(st.controller.summary().await)))
}

/// GET /api/v1/rooms
pub async fn list_rooms(
    State(st): State<AppState>,
) -> Result<Json<ApiResponse<Vec<RoomView>>>, ApiError> {
    let rooms: Vec<RoomView> = st
        .controller
        .rooms()
        .await
        .into_iter()
        .map(RoomView::from)
        .collect();
    let count = rooms.len();
    Ok(Json(ApiResponse::success(rooms).with_count(count)))
}

/// GET /api/v1/rooms/:id
pub async fn get_room(
    State(st): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<RoomView>>, ApiError> {
    let room = find_room(&st, &id).await?;
    Ok(Json(ApiResponse::success(room.into())))
}

/// PUT /api/v1/rooms/:id/target
pub async fn set_target_temp(
    State(st): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TargetTempRequest>,
) -> Result<Json<ApiResponse<RoomView>>, ApiError> {
    req.validate()?;
    if !st.controller.set_target_temp(&id, req.target_temp).await {
        return Err(room_not_found(&id));
    }
    let room = find_room(&st, &id).await?;
    Ok(Json(ApiResponse::success(room.into())))
}

/// PUT /api/v1/rooms/:id/auto
pub async fn set_auto_mode(
    State(st): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<RoomView>>, ApiError> {
    let req = AutoModeRequest::from_body(&headers, &body)?;
    let found = match req.enabled {
        Some(enabled) => st.controller.set_auto_mode(&id, enabled).await,
        None => st.controller.toggle_auto_mode(&id).await.is_some(),
    };
    if !found {
        return Err(room_not_found(&id));
    }
    let room = find_room(&st, &id).await?;
    Ok(Json(ApiResponse::success(room.into())))
}

/// GET /api/v1/light/history
pub async fn get_light_history(
    State(st): State<AppState>,
) -> Result<Json<ApiResponse<Vec<LightSample>>>, ApiError> {
    let samples = st.controller.light_history().await;
    let count = samples.len();
    Ok(Json(ApiResponse::success(samples).with_count(count)))
}

async fn find_room(st: &AppState, id: &str) -> Result<Room, ApiError> {
    st.controller
        .room(id)
        .await
        .ok_or_else(|| room_not_found(id))
}

fn room_not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("Room with ID {id} not found"))
}
