use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use strum::Display;
use uuid::Uuid;

use super::room::Room;

/// Number of alerts the log retains
pub const ALERT_LOG_CAPACITY: usize = 50;

pub const MOTION_DETECTED: &str = "Motion detected in secured area";
pub const DOOR_SENSOR_TRIGGERED: &str = "Door sensor triggered";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AlertKind {
    Temperature,
    Security,
    Light,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Severity of a periodic temperature report for a given setpoint deviation
    pub fn for_temperature_deviation(deviation_c: f64) -> Self {
        if deviation_c > 5.0 {
            Severity::High
        } else if deviation_c > 3.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    pub fn new(kind: AlertKind, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            message: message.into(),
            severity,
            timestamp: Utc::now(),
        }
    }

    /// Heartbeat-style status report for one room
    pub fn temperature_report(room: &Room) -> Self {
        let message = format!(
            "{}: Temperature {:.1}°C ({} target {}°C) - Fan speed {}%",
            room.name,
            room.temperature,
            room.target_status(),
            room.target_temp,
            room.fan_speed,
        );
        Self::new(
            AlertKind::Temperature,
            message,
            Severity::for_temperature_deviation(room.temperature_deviation()),
        )
    }

    /// Map one uniform draw in [0, 1) to a security event, if any
    pub fn from_security_draw(draw: f64) -> Option<Self> {
        if draw > 0.95 {
            Some(Self::new(AlertKind::Security, MOTION_DETECTED, Severity::High))
        } else if draw > 0.92 {
            Some(Self::new(AlertKind::Security, DOOR_SENSOR_TRIGGERED, Severity::Medium))
        } else {
            None
        }
    }
}

/// Bounded, newest-first alert log
#[derive(Debug, Clone)]
pub struct AlertLog {
    entries: VecDeque<Alert>,
    capacity: usize,
}

impl Default for AlertLog {
    fn default() -> Self {
        Self::with_capacity(ALERT_LOG_CAPACITY)
    }
}

impl AlertLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, alert: Alert) {
        self.entries.push_front(alert);
        self.entries.truncate(self.capacity);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<Alert> {
        self.entries.iter().cloned().collect()
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.entries.iter().filter(|a| a.severity == severity).count()
    }
}
