//! Publisher configuration.
//!
//! Defaults come from `price_common::defaults`; a JSON file may override any
//! subset of fields, e.g. `{"workers": 4, "drain_timeout_ms": 250}`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use price_common::defaults::{DEFAULT_DRAIN_TIMEOUT_MS, DEFAULT_QUEUE_CAPACITY, default_workers};
use price_common::{DispatchError, Result};
use serde::{Deserialize, Serialize};

/// Tunables for `PricePublisher`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// Number of pool workers executing dispatch tasks.
    pub workers: usize,
    /// Dispatch tasks that may wait in the pool queue before submissions are rejected.
    pub queue_capacity: usize,
    /// How long `shutdown` waits for in-flight tasks, in milliseconds.
    pub drain_timeout_ms: u64,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            drain_timeout_ms: DEFAULT_DRAIN_TIMEOUT_MS,
        }
    }
}

impl PublisherConfig {
    /// Load a configuration from a JSON file; missing fields keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the pool cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(DispatchError::Format("workers must be at least 1".to_string()));
        }
        if self.queue_capacity == 0 {
            return Err(DispatchError::Format(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Drain timeout as a `Duration`.
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}
