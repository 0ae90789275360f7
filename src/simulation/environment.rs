//! # Environment Simulator
//!
//! Owns the room collection and the alert log, advances simulated sensor
//! readings on explicit ticks and evaluates alert rules. Scheduling is left to
//! the host (see `controller::scheduler`); every operation here is synchronous
//! and infallible.

use chrono::Utc;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Alert, AlertLog, DashboardSnapshot, Room, RoomReading, Summary, ALERT_LOG_CAPACITY,
};

/// Shortest accepted alert interval (hours)
pub const MIN_ALERT_INTERVAL_HOURS: f64 = 0.1;
/// Longest accepted alert interval (hours)
pub const MAX_ALERT_INTERVAL_HOURS: f64 = 24.0;

/// Sensor noise added on every temperature tick is drawn from [-0.3, 0.3)
const TEMPERATURE_NOISE_C: f64 = 0.3;

/// Simulator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Rooms created at startup
    pub rooms: Vec<Room>,
    /// Period of the temperature report (hours)
    pub alert_interval_hours: f64,
    /// Security monitoring enabled at startup
    pub security_armed: bool,
    /// Random seed for reproducibility (None = random)
    pub random_seed: Option<u64>,
    /// Number of alerts kept in the log
    pub alert_capacity: usize,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            rooms: vec![default_room()],
            alert_interval_hours: 1.0,
            security_armed: true,
            random_seed: None,
            alert_capacity: ALERT_LOG_CAPACITY,
        }
    }
}

/// The single room the dashboard starts with
pub fn default_room() -> Room {
    Room::new("1", "Home", 24.5, 21.0, 65)
        .occupied(true)
        .with_auto_mode(true)
}

impl EnvironmentConfig {
    pub fn with_rooms(mut self, rooms: Vec<Room>) -> Self {
        self.rooms = rooms;
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn with_security_armed(mut self, armed: bool) -> Self {
        self.security_armed = armed;
        self
    }

    pub fn with_alert_interval(mut self, hours: f64) -> Self {
        self.alert_interval_hours = hours;
        self
    }
}

pub struct EnvironmentSimulator {
    rooms: Vec<Room>,
    alerts: AlertLog,
    alert_interval_hours: f64,
    security_armed: bool,
    rng: StdRng,
}

impl EnvironmentSimulator {
    pub fn new(config: EnvironmentConfig) -> Self {
        let rng = match config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut simulator = Self {
            rooms: config.rooms,
            alerts: AlertLog::with_capacity(config.alert_capacity),
            alert_interval_hours: 1.0,
            security_armed: config.security_armed,
            rng,
        };
        simulator.set_alert_interval(config.alert_interval_hours);
        simulator
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == room_id)
    }

    fn room_mut(&mut self, room_id: &str) -> Option<&mut Room> {
        self.rooms.iter_mut().find(|r| r.id == room_id)
    }

    pub fn alerts(&self) -> &AlertLog {
        &self.alerts
    }

    pub fn alert_interval_hours(&self) -> f64 {
        self.alert_interval_hours
    }

    pub fn security_armed(&self) -> bool {
        self.security_armed
    }

    /// Noise, auto-mode correction, clamp, round and fan speed for every room.
    pub fn tick_temperature(&mut self) {
        for room in &mut self.rooms {
            let noise = self.rng.gen_range(-TEMPERATURE_NOISE_C..TEMPERATURE_NOISE_C);
            room.apply_temperature_step(noise);
        }
    }

    pub fn tick_light(&mut self) {
        for room in &mut self.rooms {
            let delta = self.rng.gen_range(-4..=3);
            room.apply_light_step(delta);
        }
    }

    /// One temperature report per room, every time.
    pub fn tick_alerts(&mut self) -> Vec<Alert> {
        let reports: Vec<Alert> = self.rooms.iter().map(Alert::temperature_report).collect();
        for alert in &reports {
            self.alerts.record(alert.clone());
        }
        reports
    }

    /// Draw once and maybe raise a security alert. Never fires while disarmed.
    pub fn tick_security(&mut self) -> Option<Alert> {
        if !self.security_armed {
            return None;
        }
        let draw: f64 = self.rng.gen();
        self.tick_security_with_draw(draw)
    }

    pub fn tick_security_with_draw(&mut self, draw: f64) -> Option<Alert> {
        if !self.security_armed {
            return None;
        }
        let alert = Alert::from_security_draw(draw)?;
        self.alerts.record(alert.clone());
        Some(alert)
    }

    /// Unknown rooms are ignored. Range checks belong to the caller.
    pub fn set_target_temp(&mut self, room_id: &str, value: f64) -> bool {
        match self.room_mut(room_id) {
            Some(room) => {
                room.target_temp = value;
                true
            }
            None => false,
        }
    }

    pub fn set_auto_mode(&mut self, room_id: &str, enabled: bool) -> bool {
        match self.room_mut(room_id) {
            Some(room) => {
                room.auto_mode = enabled;
                true
            }
            None => false,
        }
    }

    /// Flip auto mode, returning the new value
    pub fn toggle_auto_mode(&mut self, room_id: &str) -> Option<bool> {
        let room = self.room_mut(room_id)?;
        room.auto_mode = !room.auto_mode;
        Some(room.auto_mode)
    }

    /// Non-finite values are ignored; finite ones are clamped to [0.1, 24].
    pub fn set_alert_interval(&mut self, hours: f64) {
        if hours.is_finite() {
            self.alert_interval_hours =
                hours.clamp(MIN_ALERT_INTERVAL_HOURS, MAX_ALERT_INTERVAL_HOURS);
        }
    }

    pub fn set_security_armed(&mut self, armed: bool) {
        self.security_armed = armed;
    }

    pub fn record_alert(&mut self, alert: Alert) {
        self.alerts.record(alert);
    }

    pub fn clear_alerts(&mut self) {
        self.alerts.clear();
    }

    /// Overwrite sensor values with device-reported ones
    pub fn apply_reading(&mut self, room_id: &str, reading: &RoomReading) -> bool {
        let Some(room) = self.room_mut(room_id) else {
            return false;
        };
        if let Some(temperature) = reading.temperature.filter(|t| t.is_finite()) {
            room.set_temperature(temperature);
        }
        if let Some(level) = reading.light_level.filter(|l| l.is_finite()) {
            room.set_light_level(level.round() as i32);
        }
        if let Some(occupied) = reading.is_occupied {
            room.is_occupied = occupied;
        }
        true
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            rooms: self.rooms.clone(),
            alerts: self.alerts.to_vec(),
            alert_interval_hours: self.alert_interval_hours,
            security_armed: self.security_armed,
            generated_at: Utc::now(),
        }
    }

    pub fn summary(&self) -> Summary {
        Summary::from_rooms(&self.rooms, self.alerts.iter(), self.security_armed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{fan_speed_for, AlertKind, Severity, ALERT_LOG_CAPACITY};

    fn seeded() -> EnvironmentSimulator {
        EnvironmentSimulator::new(EnvironmentConfig::default().with_random_seed(42))
    }

    fn three_rooms() -> Vec<Room> {
        vec![
            Room::new("1", "Living room", 24.5, 21.0, 65).with_auto_mode(true),
            Room::new("2", "Bedroom", 34.9, 30.0, 99),
            Room::new("3", "Cellar", 16.1, 16.0, 1),
        ]
    }

    #[test]
    fn test_default_seed_room() {
        let sim = seeded();
        assert_eq!(sim.rooms().len(), 1);
        let room = sim.room("1").unwrap();
        assert_eq!(room.name, "Home");
        assert_eq!(room.fan_speed, 45);
        assert!(sim.security_armed());
        assert_eq!(sim.alert_interval_hours(), 1.0);
    }

    #[test]
    fn test_temperature_ticks_keep_invariants() {
        let config = EnvironmentConfig::default()
            .with_rooms(three_rooms())
            .with_random_seed(7);
        let mut sim = EnvironmentSimulator::new(config);

        for _ in 0..500 {
            sim.tick_temperature();
            for room in sim.rooms() {
                assert!((16.0..=35.0).contains(&room.temperature));
                assert_eq!(room.fan_speed, fan_speed_for(room.temperature));
                let tenths = room.temperature * 10.0;
                assert!((tenths - tenths.round()).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_auto_mode_approaches_setpoint() {
        let mut sim = seeded();
        for _ in 0..200 {
            sim.tick_temperature();
        }
        // noise is bounded, the proportional term keeps the room near 21°C
        let room = sim.room("1").unwrap();
        assert!(room.temperature_deviation() < 2.5, "temperature {}", room.temperature);
    }

    #[test]
    fn test_light_ticks_stay_in_range() {
        let config = EnvironmentConfig::default()
            .with_rooms(three_rooms())
            .with_random_seed(3);
        let mut sim = EnvironmentSimulator::new(config);
        let before: Vec<u8> = sim.rooms().iter().map(|r| r.light_level).collect();

        sim.tick_light();
        for (room, old) in sim.rooms().iter().zip(before) {
            let delta = i32::from(room.light_level) - i32::from(old);
            assert!((-4..=3).contains(&delta));
        }

        for _ in 0..1000 {
            sim.tick_light();
            assert!(sim.rooms().iter().all(|r| r.light_level <= 100));
        }
    }

    #[test]
    fn test_alert_tick_reports_every_room() {
        let config = EnvironmentConfig::default().with_rooms(three_rooms());
        let mut sim = EnvironmentSimulator::new(config);

        let reports = sim.tick_alerts();
        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(|a| a.kind == AlertKind::Temperature));
        assert_eq!(reports[0].severity, Severity::Medium);
        assert_eq!(reports[1].severity, Severity::Medium);
        assert_eq!(reports[2].severity, Severity::Low);

        // fires again without any state change
        sim.tick_alerts();
        assert_eq!(sim.alerts().len(), 6);
    }

    #[test]
    fn test_alert_severity_thresholds() {
        let mut sim = seeded();
        let cases = [(24.5, Severity::Medium), (27.0, Severity::High), (21.5, Severity::Low)];
        for (temperature, expected) in cases {
            sim.apply_reading(
                "1",
                &RoomReading {
                    temperature: Some(temperature),
                    ..Default::default()
                },
            );
            let reports = sim.tick_alerts();
            assert_eq!(reports[0].severity, expected, "temperature {temperature}");
        }
    }

    #[test]
    fn test_security_disarmed_never_alerts() {
        let mut sim = EnvironmentSimulator::new(
            EnvironmentConfig::default().with_security_armed(false),
        );
        assert!(sim.tick_security_with_draw(0.99).is_none());
        for _ in 0..1000 {
            assert!(sim.tick_security().is_none());
        }
        assert!(sim.alerts().is_empty());
    }

    #[test]
    fn test_security_armed_draws() {
        let mut sim = seeded();
        let high = sim.tick_security_with_draw(0.97).unwrap();
        assert_eq!(high.severity, Severity::High);
        let medium = sim.tick_security_with_draw(0.93).unwrap();
        assert_eq!(medium.severity, Severity::Medium);
        assert!(sim.tick_security_with_draw(0.5).is_none());
        assert_eq!(sim.alerts().len(), 2);
    }

    #[test]
    fn test_disarming_keeps_past_alerts() {
        let mut sim = seeded();
        sim.tick_security_with_draw(0.99);
        sim.set_security_armed(false);
        assert!(sim.tick_security_with_draw(0.99).is_none());
        assert_eq!(sim.alerts().len(), 1);
    }

    #[test]
    fn test_set_target_temp() {
        let mut sim = seeded();
        assert!(sim.set_target_temp("1", 23.5));
        assert_eq!(sim.room("1").unwrap().target_temp, 23.5);

        // out of the UI range is accepted here
        assert!(sim.set_target_temp("1", 40.0));
        assert_eq!(sim.room("1").unwrap().target_temp, 40.0);

        let before = sim.snapshot().rooms;
        assert!(!sim.set_target_temp("missing", 22.0));
        assert_eq!(sim.snapshot().rooms, before);
    }

    #[test]
    fn test_set_auto_mode_is_idempotent() {
        let mut sim = seeded();
        sim.set_auto_mode("1", false);
        sim.set_auto_mode("1", true);
        let once = sim.snapshot().rooms;
        sim.set_auto_mode("1", true);
        assert_eq!(sim.snapshot().rooms, once);
    }

    #[test]
    fn test_toggle_auto_mode() {
        let mut sim = seeded();
        assert_eq!(sim.toggle_auto_mode("1"), Some(false));
        assert_eq!(sim.toggle_auto_mode("1"), Some(true));
        assert_eq!(sim.toggle_auto_mode("nope"), None);
    }

    #[test]
    fn test_alert_interval_bounds() {
        let mut sim = seeded();
        sim.set_alert_interval(2.0);
        assert_eq!(sim.alert_interval_hours(), 2.0);
        sim.set_alert_interval(0.0);
        assert_eq!(sim.alert_interval_hours(), MIN_ALERT_INTERVAL_HOURS);
        sim.set_alert_interval(100.0);
        assert_eq!(sim.alert_interval_hours(), MAX_ALERT_INTERVAL_HOURS);
        sim.set_alert_interval(f64::NAN);
        assert_eq!(sim.alert_interval_hours(), MAX_ALERT_INTERVAL_HOURS);
    }

    #[test]
    fn test_record_and_clear_alerts() {
        let mut sim = seeded();
        for i in 0..(ALERT_LOG_CAPACITY + 5) {
            sim.record_alert(Alert::new(AlertKind::Light, format!("alert {i}"), Severity::Low));
        }
        assert_eq!(sim.alerts().len(), ALERT_LOG_CAPACITY);
        assert_eq!(
            sim.snapshot().alerts[0].message,
            format!("alert {}", ALERT_LOG_CAPACITY + 4)
        );

        sim.clear_alerts();
        assert!(sim.snapshot().alerts.is_empty());
    }

    #[test]
    fn test_apply_reading_recomputes_fan_speed() {
        let mut sim = seeded();
        let reading = RoomReading {
            temperature: Some(40.2),
            light_level: Some(129.6),
            is_occupied: Some(false),
        };
        assert!(sim.apply_reading("1", &reading));

        let room = sim.room("1").unwrap();
        assert_eq!(room.temperature, 35.0);
        assert_eq!(room.fan_speed, 100);
        assert_eq!(room.light_level, 100);
        assert!(!room.is_occupied);

        assert!(!sim.apply_reading("unknown", &reading));
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let mut a = seeded();
        let mut b = seeded();
        for _ in 0..20 {
            a.tick_temperature();
            a.tick_light();
            b.tick_temperature();
            b.tick_light();
        }
        assert_eq!(a.snapshot().rooms, b.snapshot().rooms);
    }

    #[test]
    fn test_summary_reflects_state() {
        let mut sim = seeded();
        sim.tick_alerts();
        let summary = sim.summary();
        assert_eq!(summary.room_count, 1);
        assert_eq!(summary.occupied_rooms, 1);
        assert_eq!(summary.alert_count, 1);
        assert!(summary.security_armed);
    }
}
