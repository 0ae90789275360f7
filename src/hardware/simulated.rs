use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};
use tracing::{debug, warn};

use super::{DeviceControl, DeviceError, FeedEvent, TelemetryFeed, TelemetryMessage};
use crate::controller::{DashboardEvent, SimulationController};
use crate::domain::{MAX_TARGET_TEMP_C, MIN_TARGET_TEMP_C};

/// Commands accepted by simulated rooms
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoomCommand {
    #[serde(default, alias = "target_temp")]
    target_temp: Option<f64>,
    #[serde(default, alias = "auto_mode")]
    auto_mode: Option<bool>,
}

/// Exposes the simulator's rooms as devices; the device id is the room id.
pub struct SimulatedFeed {
    controller: Arc<SimulationController>,
    events: broadcast::Sender<FeedEvent>,
    forwarder: Mutex<Option<JoinHandle<()>>>,
}

impl SimulatedFeed {
    pub fn new(controller: Arc<SimulationController>, event_buffer: usize) -> Self {
        let (events, _) = broadcast::channel(event_buffer.max(1));
        Self {
            controller,
            events,
            forwarder: Mutex::new(None),
        }
    }

    /// Re-publish simulator changes as device telemetry. Idempotent.
    pub fn start(&self) {
        let mut forwarder = self.forwarder.lock();
        if forwarder.is_some() {
            return;
        }
        let mut rx = self.controller.subscribe();
        let events = self.events.clone();
        *forwarder = Some(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => forward(&events, event),
                    Err(RecvError::Lagged(skipped)) => debug!(skipped, "simulated feed lagged"),
                    Err(RecvError::Closed) => break,
                }
            }
        }));
    }
}

impl Drop for SimulatedFeed {
    fn drop(&mut self) {
        if let Some(handle) = self.forwarder.lock().take() {
            handle.abort();
        }
    }
}

fn forward(events: &broadcast::Sender<FeedEvent>, event: DashboardEvent) {
    match event {
        DashboardEvent::Snapshot(snapshot) => {
            for room in &snapshot.rooms {
                match serde_json::to_value(room) {
                    Ok(payload) => {
                        let _ = events.send(FeedEvent::Telemetry(TelemetryMessage {
                            device_id: room.id.clone(),
                            payload,
                        }));
                    }
                    Err(e) => warn!(room_id = %room.id, error = %e, "failed to encode room"),
                }
            }
        }
        DashboardEvent::Alert(alert) => match serde_json::to_value(&alert) {
            Ok(value) => {
                let _ = events.send(FeedEvent::Alert(value));
            }
            Err(e) => warn!(error = %e, "failed to encode alert"),
        },
    }
}

#[async_trait]
impl TelemetryFeed for SimulatedFeed {
    async fn fetch_status(&self, device_id: &str) -> Result<Option<Value>, DeviceError> {
        let Some(room) = self.controller.room(device_id).await else {
            return Ok(None);
        };
        let payload = serde_json::to_value(room)?;
        Ok(Some(json!({ "deviceId": device_id, "payload": payload })))
    }

    async fn join(&self, device_id: &str) -> Result<(), DeviceError> {
        debug!(device_id, "simulated feed publishes every room");
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.events.subscribe()
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

#[async_trait]
impl DeviceControl for SimulatedFeed {
    async fn post_command(&self, device_id: &str, command: &Value) -> Result<Value, DeviceError> {
        let cmd: RoomCommand = serde_json::from_value(command.clone())
            .map_err(|e| DeviceError::InvalidCommand(e.to_string()))?;
        if cmd.target_temp.is_none() && cmd.auto_mode.is_none() {
            return Err(DeviceError::InvalidCommand(
                "expected targetTemp or autoMode".to_string(),
            ));
        }
        if let Some(target) = cmd.target_temp {
            if !(MIN_TARGET_TEMP_C..=MAX_TARGET_TEMP_C).contains(&target) {
                return Err(DeviceError::InvalidCommand(format!(
                    "targetTemp must be within [{MIN_TARGET_TEMP_C}, {MAX_TARGET_TEMP_C}]"
                )));
            }
        }
        if self.controller.room(device_id).await.is_none() {
            return Err(DeviceError::UnknownDevice(device_id.to_string()));
        }

        if let Some(target) = cmd.target_temp {
            self.controller.set_target_temp(device_id, target).await;
        }
        if let Some(enabled) = cmd.auto_mode {
            self.controller.set_auto_mode(device_id, enabled).await;
        }

        let room = self
            .controller
            .room(device_id)
            .await
            .ok_or_else(|| DeviceError::UnknownDevice(device_id.to_string()))?;
        Ok(serde_json::to_value(room)?)
    }
}
