//! Flight-plan store.
//!
//! Time-tagged commands loaded from the ground. Housekeeping drains due
//! entries every tick and feeds them into the dispatch pipeline; periodical
//! entries are rescheduled, counted entries decremented until exhausted.

use super::RepoError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

/// One time-tagged flight-plan command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightPlanEntry {
    /// Epoch seconds at which the command becomes due.
    pub executes_at: u64,
    pub command: String,
    pub args: Option<String>,
    /// Remaining executions for counted entries (1 = run once).
    pub executions: u32,
    /// Re-execution period in seconds; 0 means not periodical.
    pub periodical: u64,
}

/// Append/lookup store for flight-plan entries, one exclusive guard.
pub struct FlightPlanRepo {
    inner: Mutex<Vec<FlightPlanEntry>>,
    path: Option<PathBuf>,
}

impl FlightPlanRepo {
    pub fn in_memory() -> Self {
        Self {
            inner: Mutex::new(Vec::new()),
            path: None,
        }
    }

    pub fn open(path: PathBuf) -> Result<Self, RepoError> {
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| RepoError::Unavailable(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(RepoError::io(&path.display().to_string(), e)),
        };
        Ok(Self {
            inner: Mutex::new(entries),
            path: Some(path),
        })
    }

    /// Inserts an entry, keeping the plan sorted by execution time.
    pub fn set(&self, entry: FlightPlanEntry) {
        let mut plan = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let at = plan
            .iter()
            .position(|e| e.executes_at > entry.executes_at)
            .unwrap_or(plan.len());
        plan.insert(at, entry);
    }

    /// Copies out the entry scheduled at exactly `executes_at`, if any.
    pub fn get(&self, executes_at: u64) -> Option<FlightPlanEntry> {
        let plan = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        plan.iter().find(|e| e.executes_at == executes_at).cloned()
    }

    /// Removes every entry scheduled at `executes_at`; returns how many.
    pub fn erase(&self, executes_at: u64) -> usize {
        let mut plan = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let before = plan.len();
        plan.retain(|e| e.executes_at != executes_at);
        before - plan.len()
    }

    /// Removes and returns all entries due at or before `now`, in time
    /// order. Periodical entries are reinserted one period later; counted
    /// entries with executions remaining are reinserted due immediately on
    /// the next drain.
    pub fn take_due(&self, now: u64) -> Vec<FlightPlanEntry> {
        let mut plan = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let mut due = Vec::new();
        let mut keep = Vec::with_capacity(plan.len());

        for entry in plan.drain(..) {
            if entry.executes_at > now {
                keep.push(entry);
                continue;
            }
            if entry.periodical > 0 {
                let mut next = entry.clone();
                next.executes_at = entry.executes_at + entry.periodical;
                keep.push(next);
            } else if entry.executions > 1 {
                let mut next = entry.clone();
                next.executions = entry.executions - 1;
                keep.push(next);
            }
            due.push(entry);
        }

        keep.sort_by_key(|e| e.executes_at);
        *plan = keep;
        due
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flushes the snapshot if the store is file-backed. Idempotent.
    pub fn close(&self) -> Result<(), RepoError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let snapshot = {
            let plan = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            serde_json::to_string_pretty(&*plan)
                .map_err(|e| RepoError::Unavailable(format!("{}: {e}", path.display())))?
        };
        fs::write(path, snapshot).map_err(|e| RepoError::io(&path.display().to_string(), e))
    }
}
