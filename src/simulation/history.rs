use chrono::{DateTime, Utc};
use std::collections::VecDeque;

use crate::domain::{LightSample, Room};

/// Samples kept for the light chart
pub const LIGHT_HISTORY_LEN: usize = 10;

/// Rolling window of light readings, oldest first
#[derive(Debug, Clone)]
pub struct LightHistory {
    samples: VecDeque<LightSample>,
    capacity: usize,
}

impl Default for LightHistory {
    fn default() -> Self {
        Self::new(LIGHT_HISTORY_LEN)
    }
}

impl LightHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, rooms: &[Room], at: DateTime<Utc>) {
        let levels = rooms
            .iter()
            .map(|r| (r.id.clone(), r.light_level))
            .collect();
        self.samples.push_back(LightSample {
            timestamp: at,
            levels,
        });
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn samples(&self) -> Vec<LightSample> {
        self.samples.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
