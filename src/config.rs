//! Core configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Housekeeping tick period in milliseconds.
pub const DEFAULT_TICK_MS: u64 = 1000;

/// Static configuration for the control core, filled from command-line
/// arguments by the flight binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Spacecraft device identifier, stamped into telemetry by handlers.
    pub device_id: u32,
    /// Housekeeping tick period in milliseconds.
    pub tick_ms: u64,
    /// Depth of each dispatch queue.
    pub queue_depth: usize,
    /// Directory for repository snapshots; `None` keeps stores in memory.
    pub data_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            device_id: 0,
            tick_ms: DEFAULT_TICK_MS,
            queue_depth: crate::pipeline::DEFAULT_QUEUE_DEPTH,
            data_dir: None,
        }
    }
}
