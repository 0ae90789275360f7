//! # Room Environment Simulation
//!
//! Simulated telemetry for the dashboard.
//!
//! ## Components
//!
//! - **Environment**: rooms, alert log, sensor ticks and alert rules
//! - **History**: rolling light-level samples for charting
//!
//! ## Usage
//!
//! ```rust
//! use homepilot::simulation::{EnvironmentConfig, EnvironmentSimulator};
//!
//! let mut env = EnvironmentSimulator::new(EnvironmentConfig::default().with_random_seed(42));
//!
//! env.tick_temperature();
//! env.tick_light();
//! let reports = env.tick_alerts();
//!
//! assert_eq!(reports.len(), env.rooms().len());
//! ```

pub mod environment;
pub mod history;

pub use environment::{
    default_room, EnvironmentConfig, EnvironmentSimulator, MAX_ALERT_INTERVAL_HOURS,
    MIN_ALERT_INTERVAL_HOURS,
};
pub use history::{LightHistory, LIGHT_HISTORY_LEN};
