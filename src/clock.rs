//! Time source seam.
//!
//! Repository writes and housekeeping actions stamp satellite state with the
//! current time. The source of that time is a collaborator: the real-time
//! clock in flight, or a simulated clock in ground-test builds (advanced
//! under the [`crate::sim::SimGate`]).

use std::time::{SystemTime, UNIX_EPOCH};

/// Supplies the current time, in seconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_epoch_s(&self) -> u64;
}

/// Flight clock backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_s(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}
