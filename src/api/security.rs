use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{
    api::{error::ApiError, response::ApiResponse},
    controller::AppState,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct SecurityState {
    pub armed: bool,
}

/// GET /api/v1/security
pub async fn get_security(
    State(st): State<AppState>,
) -> Result<Json<ApiResponse<SecurityState>>, ApiError> {
    Ok(Json(ApiResponse::success(SecurityState {
        armed: st.controller.security_armed().await,
    })))
}

/// PUT /api/v1/security - arming (re)starts the security timer, disarming stops it
pub async fn set_security(
    State(st): State<AppState>,
    Json(req): Json<SecurityState>,
) -> Result<Json<ApiResponse<SecurityState>>, ApiError> {
    st.scheduler.set_security_armed(req.armed).await;
    Ok(Json(ApiResponse::success(SecurityState {
        armed: st.controller.security_armed().await,
    })))
}
