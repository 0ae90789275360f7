use serde::{Deserialize, Serialize};
use strum::Display;

/// Lowest temperature a room sensor can report (°C)
pub const MIN_TEMPERATURE_C: f64 = 16.0;
/// Highest temperature a room sensor can report (°C)
pub const MAX_TEMPERATURE_C: f64 = 35.0;
/// Lowest accepted setpoint (°C)
pub const MIN_TARGET_TEMP_C: f64 = 16.0;
/// Highest accepted setpoint (°C)
pub const MAX_TARGET_TEMP_C: f64 = 30.0;

/// Fan speed as a linear function of temperature.
///
/// 0% at 16°C, 100% at 35°C, clamped outside that band.
pub fn fan_speed_for(temperature_c: f64) -> u8 {
    let span = MAX_TEMPERATURE_C - MIN_TEMPERATURE_C;
    let percent = ((temperature_c - MIN_TEMPERATURE_C) / span * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}

/// Clamp to the sensor range and round to one decimal place.
pub fn normalize_temperature(temperature_c: f64) -> f64 {
    let clamped = temperature_c.clamp(MIN_TEMPERATURE_C, MAX_TEMPERATURE_C);
    (clamped * 10.0).round() / 10.0
}

/// Where the current reading sits relative to the setpoint
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TargetStatus {
    Above,
    Below,
    At,
}

/// How close a room is to its setpoint
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ComfortLevel {
    /// Within 1°C of target
    Optimal,
    /// Within 2°C of target
    Near,
    /// Further than 2°C from target
    Off,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub name: String,
    /// Current sensor reading (°C), always within [16, 35]
    pub temperature: f64,
    /// User setpoint (°C)
    pub target_temp: f64,
    /// Ambient light (%)
    pub light_level: u8,
    pub is_occupied: bool,
    /// Converge toward `target_temp` on every temperature tick
    pub auto_mode: bool,
    /// Derived from `temperature`, see [`fan_speed_for`]
    pub fan_speed: u8,
}

impl Room {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        temperature: f64,
        target_temp: f64,
        light_level: u8,
    ) -> Self {
        let temperature = normalize_temperature(temperature);
        Self {
            id: id.into(),
            name: name.into(),
            temperature,
            target_temp,
            light_level: light_level.min(100),
            is_occupied: false,
            auto_mode: false,
            fan_speed: fan_speed_for(temperature),
        }
    }

    pub fn occupied(mut self, occupied: bool) -> Self {
        self.is_occupied = occupied;
        self
    }

    pub fn with_auto_mode(mut self, enabled: bool) -> Self {
        self.auto_mode = enabled;
        self
    }

    /// Store a new temperature reading and recompute the fan speed from it.
    pub fn set_temperature(&mut self, temperature_c: f64) {
        self.temperature = normalize_temperature(temperature_c);
        self.fan_speed = fan_speed_for(self.temperature);
    }

    /// One simulated sensor step: noise, optional proportional correction
    /// toward the setpoint, clamp, round, fan speed.
    pub fn apply_temperature_step(&mut self, noise_c: f64) {
        let mut reading = self.temperature + noise_c;

        if self.auto_mode {
            let diff = self.target_temp - reading;
            if diff.abs() > 0.1 {
                reading += diff * 0.15;
            }
        }

        self.set_temperature(reading);
    }

    pub fn apply_light_step(&mut self, delta: i32) {
        self.set_light_level(i32::from(self.light_level) + delta);
    }

    pub fn set_light_level(&mut self, level: i32) {
        self.light_level = level.clamp(0, 100) as u8;
    }

    pub fn temperature_deviation(&self) -> f64 {
        (self.temperature - self.target_temp).abs()
    }

    pub fn target_status(&self) -> TargetStatus {
        if self.temperature > self.target_temp {
            TargetStatus::Above
        } else if self.temperature < self.target_temp {
            TargetStatus::Below
        } else {
            TargetStatus::At
        }
    }

    pub fn comfort(&self) -> ComfortLevel {
        let deviation = self.temperature_deviation();
        if deviation < 1.0 {
            ComfortLevel::Optimal
        } else if deviation < 2.0 {
            ComfortLevel::Near
        } else {
            ComfortLevel::Off
        }
    }
}

/// Partial sensor values delivered by a device feed
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomReading {
    #[serde(default, alias = "temp")]
    pub temperature: Option<f64>,
    #[serde(default, alias = "light", alias = "lght")]
    pub light_level: Option<f64>,
    #[serde(default, alias = "occupied")]
    pub is_occupied: Option<bool>,
}

impl RoomReading {
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.light_level.is_none() && self.is_occupied.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn home() -> Room {
        Room::new("1", "Home", 24.5, 21.0, 65)
            .occupied(true)
            .with_auto_mode(true)
    }

    #[rstest]
    #[case(16.0, 0)]
    #[case(35.0, 100)]
    #[case(25.5, 50)]
    #[case(10.0, 0)]
    #[case(40.0, 100)]
    #[case(24.5, 45)]
    fn test_fan_speed_mapping(#[case] temperature: f64, #[case] expected: u8) {
        assert_eq!(fan_speed_for(temperature), expected);
    }

    #[test]
    fn test_new_room_derives_fan_speed() {
        let room = home();
        assert_eq!(room.fan_speed, 45);
        assert_eq!(room.temperature, 24.5);
    }

    #[test]
    fn test_temperature_step_without_auto_mode_only_adds_noise() {
        let mut room = home().with_auto_mode(false);
        room.apply_temperature_step(0.2);
        assert_eq!(room.temperature, 24.7);
        assert_eq!(room.fan_speed, fan_speed_for(24.7));
    }

    #[test]
    fn test_temperature_step_converges_toward_target() {
        let mut room = Room::new("1", "Home", 25.0, 21.0, 65).with_auto_mode(true);
        room.apply_temperature_step(0.0);
        // 25.0 + (21 - 25) * 0.15
        assert_eq!(room.temperature, 24.4);
        assert_eq!(room.fan_speed, fan_speed_for(24.4));
    }

    #[test]
    fn test_temperature_step_heats_toward_target() {
        let mut room = Room::new("1", "Home", 17.0, 21.0, 65).with_auto_mode(true);
        room.apply_temperature_step(0.0);
        assert_eq!(room.temperature, 17.6);
    }

    #[test]
    fn test_temperature_step_clamps_to_sensor_range() {
        let mut room = Room::new("1", "Home", 35.0, 30.0, 50);
        room.apply_temperature_step(0.3);
        assert_eq!(room.temperature, MAX_TEMPERATURE_C);
        assert_eq!(room.fan_speed, 100);

        let mut cold = Room::new("2", "Cellar", 16.0, 16.0, 50);
        cold.apply_temperature_step(-0.3);
        assert_eq!(cold.temperature, MIN_TEMPERATURE_C);
        assert_eq!(cold.fan_speed, 0);
    }

    #[test]
    fn test_light_step_clamps() {
        let mut room = Room::new("1", "Home", 20.0, 21.0, 2);
        room.apply_light_step(-4);
        assert_eq!(room.light_level, 0);

        room.set_light_level(99);
        room.apply_light_step(3);
        assert_eq!(room.light_level, 100);
    }

    #[test]
    fn test_target_status_and_comfort() {
        let mut room = home();
        assert_eq!(room.target_status(), TargetStatus::Above);
        assert_eq!(room.comfort(), ComfortLevel::Off);

        room.set_temperature(22.5);
        assert_eq!(room.comfort(), ComfortLevel::Near);

        room.set_temperature(21.0);
        assert_eq!(room.target_status(), TargetStatus::At);
        assert_eq!(room.comfort(), ComfortLevel::Optimal);

        room.set_temperature(20.0);
        assert_eq!(room.target_status(), TargetStatus::Below);
    }

    #[test]
    fn test_room_serializes_camel_case() {
        let json = serde_json::to_value(home()).unwrap();
        assert_eq!(json["targetTemp"], 21.0);
        assert_eq!(json["fanSpeed"], 45);
        assert_eq!(json["isOccupied"], true);
    }

    #[test]
    fn test_reading_accepts_short_field_names() {
        let reading: RoomReading =
            serde_json::from_value(serde_json::json!({ "temp": 22.4, "lght": 40 })).unwrap();
        assert_eq!(reading.temperature, Some(22.4));
        assert_eq!(reading.light_level, Some(40.0));
        assert!(reading.is_occupied.is_none());
        assert!(!reading.is_empty());
    }

    #[test]
    fn test_reading_accepts_fractional_light_level() {
        let reading: RoomReading = serde_json::from_value(
            serde_json::json!({ "temperature": 30.0, "lightLevel": 55.5 }),
        )
        .unwrap();
        assert_eq!(reading.temperature, Some(30.0));
        assert_eq!(reading.light_level, Some(55.5));
    }

    proptest! {
        #[test]
        fn prop_fan_speed_within_bounds(t in -50.0f64..100.0) {
            let speed = fan_speed_for(t);
            prop_assert!(speed <= 100);
        }

        #[test]
        fn prop_temperature_step_keeps_invariants(
            start in 16.0f64..=35.0,
            target in 16.0f64..=30.0,
            noise in -0.3f64..0.3,
            auto in any::<bool>(),
        ) {
            let mut room = Room::new("p", "Prop", start, target, 50).with_auto_mode(auto);
            room.apply_temperature_step(noise);
            prop_assert!(room.temperature >= MIN_TEMPERATURE_C);
            prop_assert!(room.temperature <= MAX_TEMPERATURE_C);
            prop_assert_eq!(room.fan_speed, fan_speed_for(room.temperature));
        }
    }
}
