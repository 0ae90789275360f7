use axum::{extract::State, Json};

use crate::{
    api::{error::ApiError, response::ApiResponse},
    controller::{AppState, ScheduleInfo},
};

/// GET /api/v1/schedule - timer periods and run statistics
pub async fn get_schedule(
    State(st): State<AppState>,
) -> Result<Json<ApiResponse<ScheduleInfo>>, ApiError> {
    let info = st.scheduler.schedule().await;
    let count = info.timers.len();
    Ok(Json(ApiResponse::success(info).with_count(count)))
}
