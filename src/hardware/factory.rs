use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::Display;
use tracing::info;

use super::{DeviceControl, RemoteFeed, SimulatedFeed, TelemetryFeed};
use crate::config::FeedConfig;
use crate::controller::SimulationController;

/// Where device state comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FeedMode {
    /// Rooms of the built-in simulator act as devices
    #[default]
    Simulated,
    /// External device-control backend over HTTP and WebSocket
    Remote,
}

/// Feed and command sink for one mode; both may be the same object
#[derive(Clone)]
pub struct DeviceHandles {
    pub feed: Arc<dyn TelemetryFeed>,
    pub control: Arc<dyn DeviceControl>,
}

/// Factory for the device boundary
pub struct DeviceFactory {
    config: FeedConfig,
    event_buffer: usize,
}

impl DeviceFactory {
    pub fn new(config: FeedConfig, event_buffer: usize) -> Self {
        Self {
            config,
            event_buffer,
        }
    }

    pub fn mode(&self) -> FeedMode {
        self.config.mode
    }

    /// Must be called inside a tokio runtime; background tasks start immediately.
    pub fn create(&self, controller: &Arc<SimulationController>) -> Result<DeviceHandles> {
        match self.config.mode {
            FeedMode::Simulated => {
                let feed = Arc::new(SimulatedFeed::new(Arc::clone(controller), self.event_buffer));
                feed.start();
                info!("using simulated device feed");
                Ok(DeviceHandles {
                    feed: Arc::clone(&feed) as Arc<dyn TelemetryFeed>,
                    control: feed,
                })
            }
            FeedMode::Remote => {
                let feed = Arc::new(RemoteFeed::connect(&self.config, self.event_buffer)?);
                info!(
                    base_url = %self.config.base_url,
                    socket_url = %self.config.socket_url,
                    "using remote device feed"
                );
                Ok(DeviceHandles {
                    feed: Arc::clone(&feed) as Arc<dyn TelemetryFeed>,
                    control: feed,
                })
            }
        }
    }
}
