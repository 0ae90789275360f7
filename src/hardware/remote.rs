use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::broadcast;

use super::{DeviceControl, DeviceError, FeedEvent, HttpDeviceClient, TelemetryFeed};
use crate::config::FeedConfig;

/// Real device-control backend: HTTP for status and commands, socket for live events
pub struct RemoteFeed {
    http: HttpDeviceClient,
    events: broadcast::Sender<FeedEvent>,
    #[cfg(feature = "socket")]
    socket: super::socket::SocketFeed,
}

impl RemoteFeed {
    /// Connects in the background; must be called inside a tokio runtime.
    pub fn connect(config: &FeedConfig, event_buffer: usize) -> Result<Self, DeviceError> {
        let http = HttpDeviceClient::new(
            config.base_url.clone(),
            Duration::from_secs(config.http_timeout_seconds),
        )?;
        let (events, _) = broadcast::channel(event_buffer.max(1));

        #[cfg(feature = "socket")]
        let socket = super::socket::SocketFeed::spawn(
            config.socket_url.clone(),
            Duration::from_secs(config.reconnect_delay_secs),
            events.clone(),
        );
        #[cfg(not(feature = "socket"))]
        tracing::warn!("built without socket support, live telemetry disabled");

        Ok(Self {
            http,
            events,
            #[cfg(feature = "socket")]
            socket,
        })
    }
}

#[async_trait]
impl TelemetryFeed for RemoteFeed {
    async fn fetch_status(&self, device_id: &str) -> Result<Option<Value>, DeviceError> {
        self.http.fetch_status(device_id).await
    }

    async fn join(&self, device_id: &str) -> Result<(), DeviceError> {
        #[cfg(feature = "socket")]
        {
            self.socket.join(device_id)
        }
        #[cfg(not(feature = "socket"))]
        {
            tracing::debug!(device_id, "socket support disabled, join skipped");
            Ok(())
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.events.subscribe()
    }

    fn is_connected(&self) -> bool {
        #[cfg(feature = "socket")]
        {
            self.socket.is_connected()
        }
        #[cfg(not(feature = "socket"))]
        {
            false
        }
    }

    fn name(&self) -> &str {
        "remote"
    }
}

#[async_trait]
impl DeviceControl for RemoteFeed {
    async fn post_command(&self, device_id: &str, command: &Value) -> Result<Value, DeviceError> {
        self.http.post_command(device_id, command).await
    }
}
