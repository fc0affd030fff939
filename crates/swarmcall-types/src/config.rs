//! Node configuration.
//!
//! Every field has a default so a missing or partial `config.toml` still
//! yields a usable node.

use crate::error::{SwarmError, SwarmResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration shared by a node and the CLI that hosts it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Identity on the shared channel. `None` picks a random name.
    pub node_id: Option<String>,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// How long inbound packets stay in the buffer.
    pub retention_secs: u64,
    /// Interval between reply scans while a call is pending.
    pub poll_interval_ms: u64,
    /// Default time a call waits for replies.
    pub call_timeout_ms: u64,
    /// Reply target for broadcast and any-responder calls.
    pub fanout_min_replies: usize,
    /// Capacity of the in-process loopback bus.
    pub bus_capacity: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: None,
            log_level: "info".to_string(),
            retention_secs: 60,
            poll_interval_ms: 100,
            call_timeout_ms: 5_000,
            fanout_min_replies: 100,
            bus_capacity: 1024,
        }
    }
}

impl NodeConfig {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// Reject settings that would break reply collection.
    ///
    /// The retention window must outlast the call timeout, or replies can be
    /// evicted before the correlator gets to scan them.
    pub fn validate(&self) -> SwarmResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(SwarmError::Config("poll_interval_ms must be > 0".into()));
        }
        if self.call_timeout_ms == 0 {
            return Err(SwarmError::Config("call_timeout_ms must be > 0".into()));
        }
        if self.bus_capacity == 0 {
            return Err(SwarmError::Config("bus_capacity must be > 0".into()));
        }
        if self.fanout_min_replies == 0 {
            return Err(SwarmError::Config("fanout_min_replies must be > 0".into()));
        }
        if self.retention() <= self.call_timeout() {
            return Err(SwarmError::Config(format!(
                "retention_secs ({}s) must exceed call_timeout_ms ({}ms)",
                self.retention_secs, self.call_timeout_ms
            )));
        }
        if let Some(id) = &self.node_id {
            if id.trim().is_empty() {
                return Err(SwarmError::Config("node_id must not be blank".into()));
            }
            if id.starts_with('#') {
                return Err(SwarmError::Config(format!(
                    "node_id '{id}' collides with the wildcard namespace"
                )));
            }
        }
        Ok(())
    }
}
