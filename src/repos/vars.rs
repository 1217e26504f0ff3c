//! System-variable store.

use super::RepoError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

/// Typed scalar stored under a variable key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VarValue {
    Int(i64),
    Float(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarEntry {
    pub value: VarValue,
    pub updated_at: u64,
}

/// Key-value store for telemetry and status variables, serialized by a
/// single exclusive guard.
pub struct SystemVarRepo {
    inner: Mutex<HashMap<String, VarEntry>>,
    path: Option<PathBuf>,
}

impl SystemVarRepo {
    pub fn in_memory() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            path: None,
        }
    }

    /// Opens the store, loading a snapshot if one exists at `path`.
    pub fn open(path: PathBuf) -> Result<Self, RepoError> {
        let map = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| RepoError::Unavailable(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(RepoError::io(&path.display().to_string(), e)),
        };
        Ok(Self {
            inner: Mutex::new(map),
            path: Some(path),
        })
    }

    /// Copies out the value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<VarValue> {
        let map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.get(key).map(|entry| entry.value.clone())
    }

    /// Copies out the full entry (value and write timestamp) under `key`.
    pub fn get_entry(&self, key: &str) -> Option<VarEntry> {
        let map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.get(key).cloned()
    }

    /// Stores `value` under `key`, stamped with `now` (epoch seconds).
    pub fn set(&self, key: &str, value: VarValue, now: u64) {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.insert(
            key.to_string(),
            VarEntry {
                value,
                updated_at: now,
            },
        );
    }

    /// Adds `delta` to the integer variable under `key`, creating it at
    /// `delta` if absent, and returns the new value. Non-integer values are
    /// replaced.
    pub fn add_int(&self, key: &str, delta: i64, now: u64) -> i64 {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let current = match map.get(key) {
            Some(VarEntry {
                value: VarValue::Int(v),
                ..
            }) => *v,
            _ => 0,
        };
        let next = current.saturating_add(delta);
        map.insert(
            key.to_string(),
            VarEntry {
                value: VarValue::Int(next),
                updated_at: now,
            },
        );
        next
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
            let map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            serde_json::to_string_pretty(&*map)
                .map_err(|e| RepoError::Unavailable(format!("{}: {e}", path.display())))?
        };
        fs::write(path, snapshot).map_err(|e| RepoError::io(&path.display().to_string(), e))
    }
}
