use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::alert::{Alert, Severity};
use super::room::Room;

/// Immutable view of the simulation handed to the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub rooms: Vec<Room>,
    /// Newest first
    pub alerts: Vec<Alert>,
    pub alert_interval_hours: f64,
    pub security_armed: bool,
    pub generated_at: DateTime<Utc>,
}

/// Overview figures shown above the room cards
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub room_count: usize,
    pub average_temperature: f64,
    pub average_light_level: f64,
    pub average_fan_speed: f64,
    pub occupied_rooms: usize,
    pub security_armed: bool,
    pub alert_count: usize,
    pub alerts_by_severity: BTreeMap<Severity, usize>,
}

impl Summary {
    pub fn from_rooms<'a>(
        rooms: &[Room],
        alerts: impl Iterator<Item = &'a Alert>,
        security_armed: bool,
    ) -> Self {
        let room_count = rooms.len();
        let average = |f: fn(&Room) -> f64| {
            if room_count == 0 {
                0.0
            } else {
                rooms.iter().map(f).sum::<f64>() / room_count as f64
            }
        };

        let mut alerts_by_severity = BTreeMap::new();
        let mut alert_count = 0;
        for alert in alerts {
            *alerts_by_severity.entry(alert.severity).or_insert(0) += 1;
            alert_count += 1;
        }

        Self {
            room_count,
            average_temperature: average(|r| r.temperature),
            average_light_level: average(|r| f64::from(r.light_level)),
            average_fan_speed: average(|r| f64::from(r.fan_speed)),
            occupied_rooms: rooms.iter().filter(|r| r.is_occupied).count(),
            security_armed,
            alert_count,
            alerts_by_severity,
        }
    }
}

/// Light levels of every room at one instant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LightSample {
    pub timestamp: DateTime<Utc>,
    /// Room id to light level (%)
    pub levels: BTreeMap<String, u8>,
}
