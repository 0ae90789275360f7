pub mod bridge;
pub mod scheduler;

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::domain::{Alert, DashboardSnapshot, LightSample, Room, RoomReading, Severity, Summary};
use crate::hardware::{DeviceControl, DeviceFactory, FeedMode, TelemetryFeed, TelemetryProvider};
use crate::simulation::{EnvironmentConfig, EnvironmentSimulator, LightHistory, LIGHT_HISTORY_LEN};

pub use bridge::{apply_feed_event, spawn_feed_bridge};
pub use scheduler::{ScheduleInfo, TaskScheduler, TaskStatus, TickKind, TickPeriods, TimerEntry};

/// Shared application state handed to the API layer
#[derive(Clone)]
pub struct AppState {
    pub cfg: Config,
    pub controller: Arc<SimulationController>,
    pub scheduler: Arc<TaskScheduler>,
    pub feed: Arc<dyn TelemetryFeed>,
    pub devices: Arc<dyn DeviceControl>,
    pub telemetry: Arc<TelemetryProvider>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub async fn new(cfg: Config) -> Result<Self> {
        let controller = Arc::new(SimulationController::new(
            cfg.environment(),
            cfg.simulation.event_buffer,
        ));

        let handles = DeviceFactory::new(cfg.feed.clone(), cfg.simulation.event_buffer)
            .create(&controller)?;
        let telemetry = Arc::new(TelemetryProvider::new(Arc::clone(&handles.feed)));

        let scheduler = Arc::new(TaskScheduler::new(
            Arc::clone(&controller),
            TickPeriods::from_config(&cfg),
        ));

        info!(
            feed = handles.feed.name(),
            rooms = cfg.seed_rooms().len(),
            "application state initialised"
        );

        Ok(Self {
            cfg,
            controller,
            scheduler,
            feed: handles.feed,
            devices: handles.control,
            telemetry,
            started_at: Utc::now(),
        })
    }
}

/// Start timers, the telemetry cache and, for a remote backend, the feed bridge.
pub async fn spawn_controller_tasks(state: &AppState) {
    state.scheduler.start().await;
    state.telemetry.start();

    if state.cfg.feed.mode == FeedMode::Remote {
        spawn_feed_bridge(Arc::clone(&state.feed), Arc::clone(&state.controller));
    }

    for room in state.controller.rooms().await {
        state.telemetry.subscribe_device(&room.id).await;
    }
}

/// Change notifications for the presentation layer
#[derive(Debug, Clone)]
pub enum DashboardEvent {
    Snapshot(Arc<DashboardSnapshot>),
    Alert(Alert),
}

impl DashboardEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DashboardEvent::Snapshot(_) => "snapshot",
            DashboardEvent::Alert(_) => "alert",
        }
    }
}

/// Owns the simulator. Every mutation holds the write lock for its whole
/// duration and publishes a fresh snapshot before releasing it.
pub struct SimulationController {
    sim: RwLock<EnvironmentSimulator>,
    light_history: RwLock<LightHistory>,
    events: broadcast::Sender<DashboardEvent>,
}

impl SimulationController {
    pub fn new(config: EnvironmentConfig, event_buffer: usize) -> Self {
        let (events, _) = broadcast::channel(event_buffer.max(1));
        Self {
            sim: RwLock::new(EnvironmentSimulator::new(config)),
            light_history: RwLock::new(LightHistory::new(LIGHT_HISTORY_LEN)),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        self.sim.read().await.snapshot()
    }

    pub async fn summary(&self) -> Summary {
        self.sim.read().await.summary()
    }

    pub async fn rooms(&self) -> Vec<Room> {
        self.sim.read().await.rooms().to_vec()
    }

    pub async fn room(&self, room_id: &str) -> Option<Room> {
        self.sim.read().await.room(room_id).cloned()
    }

    pub async fn alerts(&self) -> Vec<Alert> {
        self.sim.read().await.alerts().to_vec()
    }

    pub async fn alert_interval_hours(&self) -> f64 {
        self.sim.read().await.alert_interval_hours()
    }

    pub async fn security_armed(&self) -> bool {
        self.sim.read().await.security_armed()
    }

    pub async fn light_history(&self) -> Vec<LightSample> {
        self.light_history.read().await.samples()
    }

    pub async fn tick_temperature(&self) {
        let mut sim = self.sim.write().await;
        sim.tick_temperature();
        self.publish(&sim, Vec::new());
    }

    pub async fn tick_light(&self) {
        let mut sim = self.sim.write().await;
        sim.tick_light();
        self.publish(&sim, Vec::new());
    }

    /// Returns the number of reports raised
    pub async fn tick_alerts(&self) -> usize {
        let mut sim = self.sim.write().await;
        let reports = sim.tick_alerts();
        let count = reports.len();
        self.publish(&sim, reports);
        count
    }

    pub async fn tick_security(&self) -> Option<Alert> {
        let mut sim = self.sim.write().await;
        let alert = sim.tick_security()?;
        self.publish(&sim, vec![alert.clone()]);
        Some(alert)
    }

    pub async fn record_light_sample(&self) {
        let sim = self.sim.read().await;
        self.light_history.write().await.record(sim.rooms(), Utc::now());
    }

    pub async fn set_target_temp(&self, room_id: &str, value: f64) -> bool {
        let mut sim = self.sim.write().await;
        let found = sim.set_target_temp(room_id, value);
        if found {
            info!(room_id, target_temp = value, "target temperature changed");
            self.publish(&sim, Vec::new());
        }
        found
    }

    pub async fn set_auto_mode(&self, room_id: &str, enabled: bool) -> bool {
        let mut sim = self.sim.write().await;
        let found = sim.set_auto_mode(room_id, enabled);
        if found {
            info!(room_id, auto_mode = enabled, "auto mode changed");
            self.publish(&sim, Vec::new());
        }
        found
    }

    pub async fn toggle_auto_mode(&self, room_id: &str) -> Option<bool> {
        let mut sim = self.sim.write().await;
        let enabled = sim.toggle_auto_mode(room_id)?;
        info!(room_id, auto_mode = enabled, "auto mode toggled");
        self.publish(&sim, Vec::new());
        Some(enabled)
    }

    /// Returns the interval actually in effect
    pub async fn set_alert_interval(&self, hours: f64) -> f64 {
        let mut sim = self.sim.write().await;
        sim.set_alert_interval(hours);
        let effective = sim.alert_interval_hours();
        info!(requested = hours, alert_interval_hours = effective, "alert interval changed");
        self.publish(&sim, Vec::new());
        effective
    }

    pub async fn set_security_armed(&self, armed: bool) {
        let mut sim = self.sim.write().await;
        sim.set_security_armed(armed);
        info!(armed, "security state changed");
        self.publish(&sim, Vec::new());
    }

    pub async fn record_alert(&self, alert: Alert) {
        let mut sim = self.sim.write().await;
        sim.record_alert(alert.clone());
        self.publish(&sim, vec![alert]);
    }

    pub async fn clear_alerts(&self) {
        let mut sim = self.sim.write().await;
        sim.clear_alerts();
        info!("alert log cleared");
        self.publish(&sim, Vec::new());
    }

    pub async fn apply_reading(&self, room_id: &str, reading: &RoomReading) -> bool {
        let mut sim = self.sim.write().await;
        let applied = sim.apply_reading(room_id, reading);
        if applied {
            self.publish(&sim, Vec::new());
        } else {
            debug!(room_id, "reading for unknown room ignored");
        }
        applied
    }

    fn publish(&self, sim: &EnvironmentSimulator, new_alerts: Vec<Alert>) {
        for alert in new_alerts {
            announce(&alert);
            let _ = self.events.send(DashboardEvent::Alert(alert));
        }
        // Err only means nobody is listening
        let _ = self
            .events
            .send(DashboardEvent::Snapshot(Arc::new(sim.snapshot())));
    }
}

fn announce(alert: &Alert) {
    if alert.severity == Severity::High {
        warn!(kind = %alert.kind, severity = %alert.severity, message = %alert.message, "alert raised");
    } else {
        info!(kind = %alert.kind, severity = %alert.severity, message = %alert.message, "alert raised");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AlertKind, ALERT_LOG_CAPACITY};

    fn controller() -> SimulationController {
        SimulationController::new(EnvironmentConfig::default().with_random_seed(7), 64)
    }

    #[tokio::test]
    async fn test_tick_publishes_snapshot() {
        let controller = controller();
        let mut rx = controller.subscribe();

        controller.tick_temperature().await;

        match rx.recv().await.unwrap() {
            DashboardEvent::Snapshot(snapshot) => assert_eq!(snapshot.rooms.len(), 1),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_alert_tick_publishes_alert_before_snapshot() {
        let controller = controller();
        let mut rx = controller.subscribe();

        assert_eq!(controller.tick_alerts().await, 1);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.name(), "alert");
        let second = rx.recv().await.unwrap();
        match second {
            DashboardEvent::Snapshot(snapshot) => assert_eq!(snapshot.alerts.len(), 1),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_room_changes_nothing() {
        let controller = controller();
        let mut rx = controller.subscribe();

        assert!(!controller.set_target_temp("missing", 22.0).await);
        assert!(!controller.set_auto_mode("missing", true).await);
        assert!(controller.toggle_auto_mode("missing").await.is_none());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_auto_mode_is_idempotent() {
        let controller = controller();
        controller.set_auto_mode("1", true).await;
        let once = controller.room("1").await.unwrap();
        controller.set_auto_mode("1", true).await;
        let twice = controller.room("1").await.unwrap();
        assert_eq!(once.auto_mode, twice.auto_mode);
        assert!(twice.auto_mode);
    }

    #[tokio::test]
    async fn test_security_disarmed_never_records() {
        let controller = controller();
        controller.set_security_armed(false).await;
        for _ in 0..500 {
            assert!(controller.tick_security().await.is_none());
        }
        assert!(controller.alerts().await.is_empty());
    }

    #[tokio::test]
    async fn test_alert_log_stays_bounded() {
        let controller = controller();
        for i in 0..ALERT_LOG_CAPACITY + 5 {
            controller
                .record_alert(Alert::new(AlertKind::Light, format!("alert {i}"), Severity::Low))
                .await;
        }
        let alerts = controller.alerts().await;
        assert_eq!(alerts.len(), ALERT_LOG_CAPACITY);
        assert_eq!(alerts[0].message, format!("alert {}", ALERT_LOG_CAPACITY + 4));
    }

    #[tokio::test]
    async fn test_clear_alerts() {
        let controller = controller();
        controller.tick_alerts().await;
        controller.clear_alerts().await;
        assert!(controller.alerts().await.is_empty());
        assert_eq!(controller.summary().await.alert_count, 0);
    }

    #[tokio::test]
    async fn test_light_samples_recorded() {
        let controller = controller();
        for _ in 0..12 {
            controller.record_light_sample().await;
        }
        let samples = controller.light_history().await;
        assert_eq!(samples.len(), LIGHT_HISTORY_LEN);
        assert_eq!(samples[0].levels.get("1"), Some(&65));
    }

    #[tokio::test]
    async fn test_alert_interval_clamped() {
        let controller = controller();
        assert_eq!(controller.set_alert_interval(100.0).await, 24.0);
        assert_eq!(controller.set_alert_interval(f64::NAN).await, 24.0);
        assert_eq!(controller.set_alert_interval(2.0).await, 2.0);
    }
}
