use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::{collections::BTreeMap, sync::Arc};
use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};
use tracing::{debug, warn};

use super::{FeedEvent, TelemetryFeed};

/// Latest telemetry payload per device
pub struct TelemetryProvider {
    feed: Arc<dyn TelemetryFeed>,
    cache: Arc<RwLock<BTreeMap<String, Value>>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl TelemetryProvider {
    pub fn new(feed: Arc<dyn TelemetryFeed>) -> Self {
        Self {
            feed,
            cache: Arc::new(RwLock::new(BTreeMap::new())),
            listener: Mutex::new(None),
        }
    }

    /// Keep the cache fed from the live subscription. Idempotent.
    pub fn start(&self) {
        let mut listener = self.listener.lock();
        if listener.is_some() {
            return;
        }
        let mut rx = self.feed.subscribe();
        let cache = Arc::clone(&self.cache);
        *listener = Some(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => store(&cache, &event),
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "telemetry listener lagged")
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }));
    }

    /// Join the device's telemetry and seed the cache from its current status.
    /// Failures are logged and leave prior telemetry in place.
    pub async fn subscribe_device(&self, device_id: &str) -> Option<Value> {
        if let Err(e) = self.feed.join(device_id).await {
            warn!(device_id, error = %e, "failed to join device telemetry");
        }

        match self.feed.fetch_status(device_id).await {
            Ok(Some(status)) => {
                let payload = status
                    .get("payload")
                    .filter(|p| !p.is_null())
                    .cloned()
                    .unwrap_or(status);
                self.cache.write().insert(device_id.to_string(), payload);
            }
            Ok(None) => debug!(device_id, "device reported no status"),
            Err(e) => warn!(device_id, error = %e, "failed to fetch device status"),
        }

        self.telemetry(device_id)
    }

    pub fn telemetry(&self, device_id: &str) -> Option<Value> {
        self.cache.read().get(device_id).cloned()
    }

    pub fn all(&self) -> BTreeMap<String, Value> {
        self.cache.read().clone()
    }
}

impl Drop for TelemetryProvider {
    fn drop(&mut self) {
        if let Some(handle) = self.listener.lock().take() {
            handle.abort();
        }
    }
}

fn store(cache: &RwLock<BTreeMap<String, Value>>, event: &FeedEvent) {
    if let FeedEvent::Telemetry(msg) = event {
        cache
            .write()
            .insert(msg.device_id.clone(), msg.payload.clone());
    }
}
