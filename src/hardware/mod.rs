//! Device-control boundary.
//!
//! A [`TelemetryFeed`] supplies device state (one-shot status fetch plus a live
//! event subscription); a [`DeviceControl`] accepts commands. The built-in
//! simulator and a real backend both implement them, so consumers do not care
//! which one is wired in.

pub mod factory;
pub mod http;
pub mod provider;
pub mod remote;
pub mod simulated;
#[cfg(feature = "socket")]
pub mod socket;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;

pub use factory::{DeviceFactory, DeviceHandles, FeedMode};
pub use http::HttpDeviceClient;
pub use provider::TelemetryProvider;
pub use remote::RemoteFeed;
pub use simulated::SimulatedFeed;

/// Device-boundary errors
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("device backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid device payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("socket error: {0}")]
    Socket(String),
    #[error("unknown device: {0}")]
    UnknownDevice(String),
    #[error("invalid command: {0}")]
    InvalidCommand(String),
}

/// Telemetry pushed for one device
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryMessage {
    pub device_id: String,
    pub payload: Value,
}

/// Live events delivered by a feed, framed as `{"event": ..., "data": ...}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum FeedEvent {
    Telemetry(TelemetryMessage),
    /// Out-of-band alert, shape defined by the backend
    Alert(Value),
}

#[async_trait]
pub trait TelemetryFeed: Send + Sync {
    /// Current status of a device; `None` when the backend has nothing for it.
    async fn fetch_status(&self, device_id: &str) -> Result<Option<Value>, DeviceError>;
    /// Ask for live telemetry of a device.
    async fn join(&self, device_id: &str) -> Result<(), DeviceError>;
    fn subscribe(&self) -> broadcast::Receiver<FeedEvent>;
    /// Whether live events can currently arrive.
    fn is_connected(&self) -> bool;
    fn name(&self) -> &str;
}

#[async_trait]
pub trait DeviceControl: Send + Sync {
    async fn post_command(&self, device_id: &str, command: &Value) -> Result<Value, DeviceError>;
}
