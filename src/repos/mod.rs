//! State repositories.
//!
//! Three independently guarded stores hold shared satellite state: system
//! variables, the flight plan, and command history. Every read and write
//! goes through the owning store's mutex; reads copy values out so no live
//! reference to guarded state ever escapes. The guards are per-store, so
//! unrelated repositories never contend.
//!
//! Each store may be backed by a JSON snapshot file, loaded at open and
//! flushed by `close()`. In-memory stores skip persistence entirely.

pub mod flight_plan;
pub mod history;
pub mod vars;

pub use flight_plan::{FlightPlanEntry, FlightPlanRepo};
pub use history::{CommandHistoryRepo, HistoryRecord};
pub use vars::{SystemVarRepo, VarValue};

use std::path::Path;
use thiserror::Error;
use tracing::error;

/// Well-known system-variable keys.
pub mod var_keys {
    /// Current real-time-clock reading, stamped by housekeeping every tick.
    pub const RTC_DATE_TIME: &str = "rtc_date_time";
    /// Hours-alive counter, incremented by the hourly housekeeping rule.
    pub const OBC_HRS_ALIVE: &str = "obc_hrs_alive";
    /// Current operating mode.
    pub const OBC_OP_MODE: &str = "obc_op_mode";
}

#[derive(Debug, Error)]
pub enum RepoError {
    /// The store's backing resource could not be opened or flushed.
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepoError {
    pub(crate) fn io(context: &str, err: std::io::Error) -> Self {
        RepoError::Unavailable(format!("{context}: {err}"))
    }
}

/// The three stores, created once at startup and shared behind `Arc`.
pub struct Repositories {
    pub vars: SystemVarRepo,
    pub flight_plan: FlightPlanRepo,
    pub history: CommandHistoryRepo,
}

impl Repositories {
    /// Opens all stores without persistence.
    pub fn in_memory() -> Self {
        Self {
            vars: SystemVarRepo::in_memory(),
            flight_plan: FlightPlanRepo::in_memory(),
            history: CommandHistoryRepo::in_memory(),
        }
    }

    /// Opens all stores backed by snapshot files under `data_dir`.
    ///
    /// Missing snapshots start empty; an unreadable snapshot is fatal here,
    /// at process start.
    pub fn open(data_dir: &Path) -> Result<Self, RepoError> {
        Ok(Self {
            vars: SystemVarRepo::open(data_dir.join("vars.json"))?,
            flight_plan: FlightPlanRepo::open(data_dir.join("flight_plan.json"))?,
            history: CommandHistoryRepo::open(data_dir.join("history.json"))?,
        })
    }

    /// Flushes every store, logging (not propagating) individual failures so
    /// one bad flush never prevents the others. Idempotent.
    pub fn close_all(&self) {
        if let Err(e) = self.vars.close() {
            error!("system variable store flush failed: {}", e);
        }
        if let Err(e) = self.flight_plan.close() {
            error!("flight plan store flush failed: {}", e);
        }
        if let Err(e) = self.history.close() {
            error!("command history store flush failed: {}", e);
        }
    }
}
