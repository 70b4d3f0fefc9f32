//! Connection-pool configuration
//!
//! Mirrors the pool knobs the caller hands to the bootstrap. The pool itself
//! is owned by the generic engine; these values are translated onto it when
//! the engine opens.

use serde::{Deserialize, Serialize};

/// Connection-pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum open connections
    #[serde(default = "default_max_open")]
    pub max_open: usize,

    /// Maximum idle connections kept around. Advisory: the underlying pool
    /// retires idle connections through recycling rather than a hard cap.
    #[serde(default = "default_max_idle")]
    pub max_idle: usize,

    /// Maximum connection lifetime in seconds; 0 disables recycling by age.
    /// Advisory: the underlying pool recycles on checkout rather than by
    /// wall-clock age.
    #[serde(default)]
    pub max_lifetime_secs: u64,
}

fn default_max_open() -> usize {
    5
}

fn default_max_idle() -> usize {
    2
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_open: default_max_open(),
            max_idle: default_max_idle(),
            max_lifetime_secs: 0,
        }
    }
}
