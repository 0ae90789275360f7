use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use strum::{Display, EnumIter, IntoEnumIterator};
use tokio::{
    sync::Mutex as AsyncMutex,
    task::JoinHandle,
    time::{interval_at, Duration, Instant, MissedTickBehavior},
};
use tracing::{debug, info};

use super::SimulationController;
use crate::config::Config;
use crate::hardware::FeedMode;

/// Periodic jobs driven by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TickKind {
    Temperature,
    Light,
    Alerts,
    Security,
    LightHistory,
}

/// Task status tracking
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    pub last_run: Option<DateTime<Utc>>,
    pub run_count: u64,
    /// Bumped every time the timer is (re)spawned
    pub generation: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerEntry {
    pub kind: TickKind,
    pub period_secs: f64,
    pub active: bool,
    #[serde(flatten)]
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInfo {
    pub timers: Vec<TimerEntry>,
    pub alert_interval_hours: f64,
    pub security_armed: bool,
}

impl ScheduleInfo {
    pub fn timer(&self, kind: TickKind) -> Option<&TimerEntry> {
        self.timers.iter().find(|t| t.kind == kind)
    }
}

/// Fixed periods; the alert period lives in the simulator
#[derive(Debug, Clone)]
pub struct TickPeriods {
    pub temperature: Duration,
    pub light: Duration,
    pub security: Duration,
    pub light_history: Duration,
    /// Whether the simulator produces temperature/light readings itself
    pub sensor_ticks: bool,
}

impl Default for TickPeriods {
    fn default() -> Self {
        Self {
            temperature: Duration::from_secs(2),
            light: Duration::from_secs(4),
            security: Duration::from_secs(20),
            light_history: Duration::from_secs(5),
            sensor_ticks: true,
        }
    }
}

impl TickPeriods {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            temperature: cfg.simulation.temperature_period(),
            light: cfg.simulation.light_period(),
            security: cfg.simulation.security_period(),
            light_history: cfg.simulation.light_history_period(),
            sensor_ticks: cfg.feed.mode == FeedMode::Simulated,
        }
    }
}

fn alert_period(hours: f64) -> Duration {
    Duration::from_secs_f64(hours * 3600.0)
}

struct RunningTimer {
    handle: JoinHandle<()>,
    period: Duration,
}

/// Periodic task scheduler. One tokio task per timer, each rescheduled on its own.
pub struct TaskScheduler {
    controller: Arc<SimulationController>,
    periods: TickPeriods,
    running: AtomicBool,
    /// Held across a simulator update and the matching respawn
    reschedule: AsyncMutex<()>,
    handles: Mutex<HashMap<TickKind, RunningTimer>>,
    statuses: Arc<Mutex<HashMap<TickKind, TaskStatus>>>,
}

impl TaskScheduler {
    pub fn new(controller: Arc<SimulationController>, periods: TickPeriods) -> Self {
        Self {
            controller,
            periods,
            running: AtomicBool::new(false),
            reschedule: AsyncMutex::new(()),
            handles: Mutex::new(HashMap::new()),
            statuses: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Start all periodic tasks
    pub async fn start(&self) {
        let _guard = self.reschedule.lock().await;
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        if self.periods.sensor_ticks {
            self.spawn_timer(TickKind::Temperature, self.periods.temperature);
            self.spawn_timer(TickKind::Light, self.periods.light);
        } else {
            info!("sensor ticks disabled, readings come from the device feed");
        }

        let hours = self.controller.alert_interval_hours().await;
        self.spawn_timer(TickKind::Alerts, alert_period(hours));

        if self.controller.security_armed().await {
            self.spawn_timer(TickKind::Security, self.periods.security);
        }

        self.spawn_timer(TickKind::LightHistory, self.periods.light_history);
        info!("all periodic tasks started");
    }

    /// Update the interval and restart only the alert timer
    pub async fn set_alert_interval(&self, hours: f64) -> f64 {
        let _guard = self.reschedule.lock().await;
        let effective = self.controller.set_alert_interval(hours).await;
        if self.running.load(Ordering::SeqCst) {
            self.spawn_timer(TickKind::Alerts, alert_period(effective));
        }
        effective
    }

    pub async fn set_security_armed(&self, armed: bool) {
        let _guard = self.reschedule.lock().await;
        self.controller.set_security_armed(armed).await;
        if !self.running.load(Ordering::SeqCst) {
            return;
        }
        if armed {
            if !self.is_active(TickKind::Security) {
                self.spawn_timer(TickKind::Security, self.periods.security);
            }
        } else {
            self.stop_timer(TickKind::Security);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub async fn schedule(&self) -> ScheduleInfo {
        let alert_interval_hours = self.controller.alert_interval_hours().await;
        let security_armed = self.controller.security_armed().await;
        let statuses = self.statuses.lock().clone();
        let live: HashMap<TickKind, Duration> = self
            .handles
            .lock()
            .iter()
            .filter(|(_, timer)| !timer.handle.is_finished())
            .map(|(kind, timer)| (*kind, timer.period))
            .collect();

        let timers = TickKind::iter()
            .map(|kind| {
                let period = live.get(&kind).copied();
                TimerEntry {
                    kind,
                    period_secs: period
                        .unwrap_or_else(|| self.period_for(kind, alert_interval_hours))
                        .as_secs_f64(),
                    active: period.is_some(),
                    status: statuses.get(&kind).cloned().unwrap_or_default(),
                }
            })
            .collect();

        ScheduleInfo {
            timers,
            alert_interval_hours,
            security_armed,
        }
    }

    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        for (kind, timer) in self.handles.lock().drain() {
            debug!(%kind, "stopping timer");
            timer.handle.abort();
        }
        info!("periodic tasks stopped");
    }

    fn period_for(&self, kind: TickKind, alert_interval_hours: f64) -> Duration {
        match kind {
            TickKind::Temperature => self.periods.temperature,
            TickKind::Light => self.periods.light,
            TickKind::Alerts => alert_period(alert_interval_hours),
            TickKind::Security => self.periods.security,
            TickKind::LightHistory => self.periods.light_history,
        }
    }

    fn is_active(&self, kind: TickKind) -> bool {
        self.handles
            .lock()
            .get(&kind)
            .is_some_and(|timer| !timer.handle.is_finished())
    }

    fn stop_timer(&self, kind: TickKind) {
        if let Some(timer) = self.handles.lock().remove(&kind) {
            timer.handle.abort();
            debug!(%kind, "timer stopped");
        }
    }

    fn spawn_timer(&self, kind: TickKind, period: Duration) {
        let generation = {
            let mut statuses = self.statuses.lock();
            let status = statuses.entry(kind).or_default();
            status.generation += 1;
            status.generation
        };

        let controller = Arc::clone(&self.controller);
        let statuses = Arc::clone(&self.statuses);
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                run_tick(&controller, kind).await;
                if let Some(status) = statuses.lock().get_mut(&kind) {
                    status.last_run = Some(Utc::now());
                    status.run_count += 1;
                }
            }
        });

        if let Some(previous) = self.handles.lock().insert(kind, RunningTimer { handle, period }) {
            previous.handle.abort();
        }
        debug!(%kind, period_secs = period.as_secs_f64(), generation, "timer scheduled");
    }
}

impl Drop for TaskScheduler {
    fn drop(&mut self) {
        for (_, timer) in self.handles.lock().drain() {
            timer.handle.abort();
        }
    }
}

async fn run_tick(controller: &SimulationController, kind: TickKind) {
    match kind {
        TickKind::Temperature => controller.tick_temperature().await,
        TickKind::Light => controller.tick_light().await,
        TickKind::Alerts => {
            let reports = controller.tick_alerts().await;
            debug!(reports, "temperature reports raised");
        }
        TickKind::Security => {
            controller.tick_security().await;
        }
        TickKind::LightHistory => controller.record_light_sample().await,
    }
}
