use axum::{
    routing::{get, post, put},
    Router,
};

use super::{alerts, devices, events, rooms, schedule, security};
use crate::controller::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/snapshot", get(rooms::get_snapshot))
        .route("/summary", get(rooms::get_summary))
        .route("/rooms", get(rooms::list_rooms))
        .route("/rooms/:id", get(rooms::get_room))
        .route("/rooms/:id/target", put(rooms::set_target_temp))
        .route("/rooms/:id/auto", put(rooms::set_auto_mode))
        .route("/light/history", get(rooms::get_light_history))
        .route(
            "/alerts",
            get(alerts::list_alerts).delete(alerts::clear_alerts),
        )
        .route(
            "/alerts/interval",
            get(alerts::get_alert_interval).put(alerts::set_alert_interval),
        )
        .route(
            "/security",
            get(security::get_security).put(security::set_security),
        )
        .route("/schedule", get(schedule::get_schedule))
        .route("/devices/telemetry", get(devices::list_telemetry))
        .route("/devices/:id/status", get(devices::get_device_status))
        .route("/devices/:id/cmd", post(devices::post_device_command))
        .route("/events", get(events::sse_handler))
        .with_state(state)
}
