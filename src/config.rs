use std::time::Duration;

use serde::Deserialize;

/// Run settings consumed by the probing core.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub threads: usize,
    pub timeout_secs: u64,
    pub max_connections: usize,
    /// 0 means one slot per worker.
    pub queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { threads: 10, timeout_secs: 10, max_connections: 100, queue_capacity: 0 }
    }
}

impl Config {
    pub fn workers(&self) -> usize {
        self.threads.max(1)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn queue_capacity(&self) -> usize {
        if self.queue_capacity == 0 { self.workers() } else { self.queue_capacity }
    }
}
