use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, time::Duration};

use crate::domain::Room;
use crate::hardware::FeedMode;
use crate::simulation::{default_room, EnvironmentConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub rooms: Vec<RoomSeed>,
    pub feed: FeedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub enable_cors: bool,
    pub cors_origin: String,
}
impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub temperature_tick_ms: u64,
    pub light_tick_ms: u64,
    pub security_tick_ms: u64,
    pub light_history_tick_ms: u64,
    pub alert_interval_hours: f64,
    pub security_armed: bool,
    pub random_seed: Option<u64>,
    /// Capacity of the dashboard event channel
    pub event_buffer: usize,
}

impl SimulationConfig {
    pub fn temperature_period(&self) -> Duration {
        Duration::from_millis(self.temperature_tick_ms.max(1))
    }
    pub fn light_period(&self) -> Duration {
        Duration::from_millis(self.light_tick_ms.max(1))
    }
    pub fn security_period(&self) -> Duration {
        Duration::from_millis(self.security_tick_ms.max(1))
    }
    pub fn light_history_period(&self) -> Duration {
        Duration::from_millis(self.light_history_tick_ms.max(1))
    }
}

/// One room created at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSeed {
    pub id: String,
    pub name: String,
    pub temperature: f64,
    pub target_temp: f64,
    pub light_level: u8,
    #[serde(default)]
    pub is_occupied: bool,
    #[serde(default)]
    pub auto_mode: bool,
}

impl From<&RoomSeed> for Room {
    fn from(seed: &RoomSeed) -> Self {
        Room::new(
            seed.id.clone(),
            seed.name.clone(),
            seed.temperature,
            seed.target_temp,
            seed.light_level,
        )
        .occupied(seed.is_occupied)
        .with_auto_mode(seed.auto_mode)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub mode: FeedMode,
    pub base_url: String,
    pub socket_url: String,
    pub http_timeout_seconds: u64,
    pub reconnect_delay_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                request_timeout_secs: 30,
                enable_cors: true,
                cors_origin: "http://localhost:5173".to_string(),
            },
            simulation: SimulationConfig {
                temperature_tick_ms: 2_000,
                light_tick_ms: 4_000,
                security_tick_ms: 20_000,
                light_history_tick_ms: 5_000,
                alert_interval_hours: 1.0,
                security_armed: true,
                random_seed: None,
                event_buffer: 64,
            },
            rooms: Vec::new(),
            feed: FeedConfig {
                mode: FeedMode::Simulated,
                base_url: "http://localhost:3000".to_string(),
                socket_url: "ws://localhost:3000/ws".to_string(),
                http_timeout_seconds: 10,
                reconnect_delay_secs: 5,
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_figment(
            Figment::from(Serialized::defaults(Config::default()))
                .merge(Toml::file("config/default.toml"))
                .merge(Env::prefixed("HOMEPILOT__").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        Ok(figment.extract()?)
    }

    /// Seed rooms, falling back to the single default room
    pub fn seed_rooms(&self) -> Vec<Room> {
        if self.rooms.is_empty() {
            vec![default_room()]
        } else {
            self.rooms.iter().map(Room::from).collect()
        }
    }

    pub fn environment(&self) -> EnvironmentConfig {
        let mut env = EnvironmentConfig::default()
            .with_rooms(self.seed_rooms())
            .with_alert_interval(self.simulation.alert_interval_hours)
            .with_security_armed(self.simulation.security_armed);
        env.random_seed = self.simulation.random_seed;
        env
    }
}
