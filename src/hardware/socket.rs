//! Publish/subscribe link to the device-control backend over WebSocket.
//!
//! Frames are JSON envelopes `{"event": ..., "data": ...}`. Incoming
//! `telemetry` and `alert` frames are re-published as [`FeedEvent`]s; outgoing
//! `join` frames request telemetry for a device. Joined devices are re-joined
//! after every reconnect.

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde::Serialize;
use std::{
    collections::BTreeSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use super::{DeviceError, FeedEvent};

#[derive(Debug, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
enum ClientFrame<'a> {
    Join(&'a str),
}

fn join_frame(device_id: &str) -> Result<String, DeviceError> {
    Ok(serde_json::to_string(&ClientFrame::Join(device_id))?)
}

/// Decode one text frame; unknown or malformed frames yield `None`.
pub fn parse_frame(text: &str) -> Option<FeedEvent> {
    match serde_json::from_str::<FeedEvent>(text) {
        Ok(event) => Some(event),
        Err(e) => {
            debug!(error = %e, "ignoring socket frame");
            None
        }
    }
}

pub struct SocketFeed {
    outgoing: mpsc::UnboundedSender<String>,
    joined: Arc<Mutex<BTreeSet<String>>>,
    connected: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl SocketFeed {
    /// Spawn the connection task. Must be called inside a tokio runtime.
    pub fn spawn(url: String, reconnect_delay: Duration, events: broadcast::Sender<FeedEvent>) -> Self {
        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        let joined = Arc::new(Mutex::new(BTreeSet::new()));
        let connected = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(run(
            url,
            reconnect_delay,
            events,
            outgoing_rx,
            Arc::clone(&joined),
            Arc::clone(&connected),
        ));
        Self {
            outgoing,
            joined,
            connected,
            task,
        }
    }

    pub fn join(&self, device_id: &str) -> Result<(), DeviceError> {
        let newly_joined = self.joined.lock().insert(device_id.to_string());
        if !newly_joined {
            return Ok(());
        }
        self.outgoing
            .send(join_frame(device_id)?)
            .map_err(|_| DeviceError::Socket("socket task stopped".to_string()))
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn joined(&self) -> Vec<String> {
        self.joined.lock().iter().cloned().collect()
    }
}

impl Drop for SocketFeed {
    fn drop(&mut self) {
        self.task.abort();
    }
}

enum SessionEnd {
    Disconnected,
    FeedDropped,
}

async fn run(
    url: String,
    reconnect_delay: Duration,
    events: broadcast::Sender<FeedEvent>,
    mut outgoing: mpsc::UnboundedReceiver<String>,
    joined: Arc<Mutex<BTreeSet<String>>>,
    connected: Arc<AtomicBool>,
) {
    loop {
        match connect_async(url.as_str()).await {
            Ok((stream, _)) => {
                info!(%url, "device socket connected");
                connected.store(true, Ordering::SeqCst);
                let rejoin: Vec<String> = joined.lock().iter().cloned().collect();
                let end = session(stream, &rejoin, &mut outgoing, &events).await;
                connected.store(false, Ordering::SeqCst);
                match end {
                    SessionEnd::FeedDropped => return,
                    SessionEnd::Disconnected => warn!(%url, "device socket disconnected"),
                }
            }
            Err(e) => warn!(error = %e, %url, "device socket connect failed"),
        }
        tokio::time::sleep(reconnect_delay).await;
    }
}

async fn session<S>(
    stream: S,
    rejoin: &[String],
    outgoing: &mut mpsc::UnboundedReceiver<String>,
    events: &broadcast::Sender<FeedEvent>,
) -> SessionEnd
where
    S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
        + futures_util::Sink<Message, Error = tokio_tungstenite::tungstenite::Error>
        + Unpin,
{
    let (mut sink, mut source) = stream.split();

    for device_id in rejoin {
        let Ok(frame) = join_frame(device_id) else {
            continue;
        };
        if let Err(e) = sink.send(Message::Text(frame)).await {
            warn!(error = %e, "failed to re-join device");
            return SessionEnd::Disconnected;
        }
    }

    loop {
        tokio::select! {
            frame = outgoing.recv() => match frame {
                Some(frame) => {
                    if let Err(e) = sink.send(Message::Text(frame)).await {
                        warn!(error = %e, "socket send failed");
                        return SessionEnd::Disconnected;
                    }
                }
                None => return SessionEnd::FeedDropped,
            },
            message = source.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    if let Some(event) = parse_frame(&text) {
                        // no subscribers is fine
                        let _ = events.send(event);
                    }
                }
                Some(Ok(Message::Close(_))) | None => return SessionEnd::Disconnected,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "socket read failed");
                    return SessionEnd::Disconnected;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::TelemetryMessage;
    use serde_json::json;

    #[test]
    fn test_join_frame_shape() {
        let frame = join_frame("kitchen").unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value, json!({ "event": "join", "data": "kitchen" }));
    }

    #[test]
    fn test_parse_frames() {
        let telemetry =
            parse_frame(r#"{"event":"telemetry","data":{"deviceId":"1","payload":{"temp":20}}}"#);
        assert_eq!(
            telemetry,
            Some(FeedEvent::Telemetry(TelemetryMessage {
                device_id: "1".to_string(),
                payload: json!({ "temp": 20 }),
            }))
        );

        assert!(parse_frame(r#"{"event":"pong"}"#).is_none());
        assert!(parse_frame("not json").is_none());
    }

    #[tokio::test]
    async fn test_join_is_recorded_once() {
        let (events, _) = broadcast::channel(4);
        // nothing listens on port 9; the task just keeps retrying
        let feed = SocketFeed::spawn(
            "ws://127.0.0.1:9/ws".to_string(),
            Duration::from_secs(60),
            events,
        );
        feed.join("1").unwrap();
        feed.join("1").unwrap();
        feed.join("2").unwrap();
        assert_eq!(feed.joined(), vec!["1".to_string(), "2".to_string()]);
        assert!(!feed.is_connected());
    }
}
