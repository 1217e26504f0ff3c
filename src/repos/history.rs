//! Command-history store.

use super::RepoError;
use crate::command::CmdResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

/// One executed command, as recorded by the executer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub name: String,
    pub params: Option<String>,
    pub result: CmdResult,
    pub executed_at: u64,
}

/// Append-only record of executed commands, one exclusive guard.
pub struct CommandHistoryRepo {
    inner: Mutex<Vec<HistoryRecord>>,
    path: Option<PathBuf>,
}

impl CommandHistoryRepo {
    pub fn in_memory() -> Self {
        Self {
            inner: Mutex::new(Vec::new()),
            path: None,
        }
    }

    pub fn open(path: PathBuf) -> Result<Self, RepoError> {
        let records = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| RepoError::Unavailable(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(RepoError::io(&path.display().to_string(), e)),
        };
        Ok(Self {
            inner: Mutex::new(records),
            path: Some(path),
        })
    }

    pub fn append(&self, record: HistoryRecord) {
        let mut records = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        records.push(record);
    }

    /// Copies out the `n` most recent records, oldest first.
    pub fn recent(&self, n: usize) -> Vec<HistoryRecord> {
        let records = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let start = records.len().saturating_sub(n);
        records[start..].to_vec()
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
            let records = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            serde_json::to_string_pretty(&*records)
                .map_err(|e| RepoError::Unavailable(format!("{}: {e}", path.display())))?
        };
        fs::write(path, snapshot).map_err(|e| RepoError::io(&path.display().to_string(), e))
    }
}
