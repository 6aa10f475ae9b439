//! Endpoint tuning knobs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Pause before retrying after a transient accept error, in milliseconds.
    #[serde(default = "default_accept_retry_delay_ms")]
    pub accept_retry_delay_ms: u64,

    /// Number of decoded events the queue holds before producers block.
    /// Values below 1 are treated as 1.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_accept_retry_delay_ms() -> u64 {
    crate::DEFAULT_ACCEPT_RETRY_DELAY.as_millis() as u64
}

fn default_queue_capacity() -> usize {
    crate::DEFAULT_QUEUE_CAPACITY
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            accept_retry_delay_ms: default_accept_retry_delay_ms(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl EndpointConfig {
    pub fn accept_retry_delay(&self) -> Duration {
        Duration::from_millis(self.accept_retry_delay_ms)
    }
}
