//! Command registry.
//!
//! Maps a command name to its declared parameter format and handler. The
//! catalog itself is populated by the surrounding subsystems at startup
//! (telemetry, data repository, payload drivers); this core only defines the
//! lookup contract the pipeline depends on.

use crate::command::CmdResult;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::warn;

/// Handler signature inherited from the flight heritage:
/// `(format, raw parameter string, parameter count) -> verdict`.
/// Parameter parsing is the handler's business, not the pipeline's.
pub type CommandHandler = Arc<dyn Fn(&str, Option<&str>, usize) -> CmdResult + Send + Sync>;

/// Format half of a registry entry, copied out to command builders.
#[derive(Debug, Clone)]
pub struct CommandTemplate {
    pub fmt: String,
    pub nparams: usize,
}

#[derive(Clone)]
struct CommandEntry {
    fmt: String,
    nparams: usize,
    handler: CommandHandler,
}

/// Name -> entry table. Read-mostly after startup registration.
#[derive(Default)]
pub struct CommandRegistry {
    entries: RwLock<HashMap<String, CommandEntry>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command, replacing (with a warning) any previous entry
    /// under the same name.
    pub fn register<F>(&self, name: &str, fmt: &str, nparams: usize, handler: F)
    where
        F: Fn(&str, Option<&str>, usize) -> CmdResult + Send + Sync + 'static,
    {
        let entry = CommandEntry {
            fmt: fmt.to_string(),
            nparams,
            handler: Arc::new(handler),
        };
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if entries.insert(name.to_string(), entry).is_some() {
            warn!(command = name, "replacing registered command");
        }
    }

    /// Resolves a name to its declared format, or `None` if unregistered.
    pub fn lookup(&self, name: &str) -> Option<CommandTemplate> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(name).map(|e| CommandTemplate {
            fmt: e.fmt.clone(),
            nparams: e.nparams,
        })
    }

    /// Resolves a name to its handler, for the executer.
    pub fn handler(&self, name: &str) -> Option<CommandHandler> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(name).map(|e| Arc::clone(&e.handler))
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_lookup_returns_registered_format() {
        let registry = CommandRegistry::new();
        registry.register("drp_add_hrs_alive", "%d", 1, |_, _, _| CmdResult::Ok);

        let template = registry.lookup("drp_add_hrs_alive").unwrap();
        assert_eq!(template.fmt, "%d");
        assert_eq!(template.nparams, 1);
        assert!(registry.lookup("missing").is_none());
    }

    #[test]
    fn test_handler_receives_declared_arguments() {
        let registry = CommandRegistry::new();
        let calls = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&calls);
        registry.register("tm_send_status", "%d", 1, move |fmt, params, n| {
            assert_eq!(fmt, "%d");
            assert_eq!(params, Some("0"));
            assert_eq!(n, 1);
            seen.fetch_add(1, Ordering::SeqCst);
            CmdResult::Ok
        });

        let handler = registry.handler("tm_send_status").unwrap();
        assert_eq!(handler("%d", Some("0"), 1), CmdResult::Ok);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_register_replaces_duplicate() {
        let registry = CommandRegistry::new();
        registry.register("obc_reset", "", 0, |_, _, _| CmdResult::Fail);
        registry.register("obc_reset", "", 0, |_, _, _| CmdResult::Ok);

        assert_eq!(registry.len(), 1);
        let handler = registry.handler("obc_reset").unwrap();
        assert_eq!(handler("", None, 0), CmdResult::Ok);
    }
}
