//! Applies events from a remote device feed to the simulator.

use serde::Deserialize;
use std::sync::Arc;
use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};
use tracing::{debug, info, warn};

use super::SimulationController;
use crate::domain::{Alert, AlertKind, RoomReading, Severity};
use crate::hardware::{FeedEvent, TelemetryFeed};

#[derive(Debug, Deserialize)]
struct RemoteAlert {
    #[serde(rename = "type")]
    kind: AlertKind,
    message: String,
    severity: Severity,
}

/// Returns whether the event changed the simulator.
pub async fn apply_feed_event(controller: &SimulationController, event: &FeedEvent) -> bool {
    match event {
        FeedEvent::Telemetry(msg) => {
            let reading = match serde_json::from_value::<RoomReading>(msg.payload.clone()) {
                Ok(reading) if !reading.is_empty() => reading,
                Ok(_) => return false,
                Err(e) => {
                    debug!(device_id = %msg.device_id, error = %e, "telemetry is not a room reading");
                    return false;
                }
            };
            controller.apply_reading(&msg.device_id, &reading).await
        }
        FeedEvent::Alert(value) => match serde_json::from_value::<RemoteAlert>(value.clone()) {
            Ok(remote) => {
                controller
                    .record_alert(Alert::new(remote.kind, remote.message, remote.severity))
                    .await;
                true
            }
            Err(e) => {
                debug!(error = %e, "ignoring unrecognised alert");
                false
            }
        },
    }
}

pub fn spawn_feed_bridge(
    feed: Arc<dyn TelemetryFeed>,
    controller: Arc<SimulationController>,
) -> JoinHandle<()> {
    let mut rx = feed.subscribe();
    info!(feed = feed.name(), "feed bridge started");
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    apply_feed_event(&controller, &event).await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "feed bridge lagged behind");
                }
                Err(RecvError::Closed) => {
                    info!("device feed closed, bridge stopping");
                    break;
                }
            }
        }
    })
}
