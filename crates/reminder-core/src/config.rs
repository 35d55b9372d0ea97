//! Scheduler configuration.
//!
//! Defaults can be overridden with `REMINDER_`-prefixed environment
//! variables, e.g. `REMINDER_TICK_INTERVAL_SECS=5`.

use std::time::Duration;

use config::{Config, Environment};
use serde::{Deserialize, Serialize};

use crate::domain::ConfigError;

pub const ENV_PREFIX: &str = "REMINDER";

/// Longest accepted tick interval (one week).
pub const MAX_TICK_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between two drains of the queue.
    pub tick_interval_secs: u64,

    /// Queue capacity hint at startup.
    pub initial_capacity: usize,

    /// Upper bound on deliveries running at the same time.
    pub max_concurrent_deliveries: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 60,
            initial_capacity: 10,
            max_concurrent_deliveries: 64,
        }
    }
}

impl SchedulerConfig {
    /// Defaults layered with the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_environment(Environment::with_prefix(ENV_PREFIX))
    }

    fn from_environment(env: Environment) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(env.try_parsing(true))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }
}
