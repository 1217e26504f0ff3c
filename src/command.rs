//! Command value objects.
//!
//! A [`Command`] is one unit of work flowing through the dispatch pipeline:
//! a registered name, the parameter format declared at registration, an
//! optional owned parameter buffer, and a repeat count. Commands are built
//! against the [`CommandRegistry`](crate::registry::CommandRegistry) so an
//! unknown name is rejected at construction, not at execution.

use crate::registry::CommandRegistry;
use arrayvec::ArrayString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest accepted command name.
pub const MAX_NAME_LEN: usize = 32;

/// Short fixed-capacity command-name buffer.
pub type CommandName = ArrayString<MAX_NAME_LEN>;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("invalid parameters for {name}: expected {expected} token(s), got {got}")]
    InvalidFormat {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("command name too long: {0}")]
    NameTooLong(String),
}

/// One unit of work for the dispatch pipeline.
///
/// The parameter buffer is exclusively owned: cloning deep-copies it and
/// moving the command into a queue transfers it whole, so no two owners ever
/// share the buffer across task boundaries.
#[derive(Debug, Clone)]
pub struct Command {
    name: CommandName,
    fmt: String,
    nparams: usize,
    params: Option<String>,
    repeat: u32,
}

impl Command {
    /// Builds a command by resolving `name` against the registry.
    ///
    /// The registry supplies the declared parameter format; the handler
    /// itself is resolved later, by the executer.
    pub fn build(registry: &CommandRegistry, name: &str) -> Result<Self, CommandError> {
        let template = registry
            .lookup(name)
            .ok_or_else(|| CommandError::UnknownCommand(name.to_string()))?;
        let name =
            CommandName::from(name).map_err(|_| CommandError::NameTooLong(name.to_string()))?;
        Ok(Self {
            name,
            fmt: template.fmt,
            nparams: template.nparams,
            params: None,
            repeat: 0,
        })
    }

    /// Attaches a parameter string, replacing any previous one.
    ///
    /// `data` is deep-copied into the command. The whitespace-separated token
    /// count must match the registered format's parameter count.
    pub fn add_params(&mut self, data: &str) -> Result<(), CommandError> {
        let got = data.split_whitespace().count();
        if got != self.nparams {
            return Err(CommandError::InvalidFormat {
                name: self.name.to_string(),
                expected: self.nparams,
                got,
            });
        }
        self.params = Some(data.to_string());
        Ok(())
    }

    /// Sets the number of additional scheduled repetitions.
    pub fn set_repeat(&mut self, repeat: u32) {
        self.repeat = repeat;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owned copy of the name buffer, for outcome records.
    pub fn name_buf(&self) -> CommandName {
        self.name
    }

    pub fn fmt(&self) -> &str {
        &self.fmt
    }

    pub fn nparams(&self) -> usize {
        self.nparams
    }

    pub fn params(&self) -> Option<&str> {
        self.params.as_deref()
    }

    pub fn repeat(&self) -> u32 {
        self.repeat
    }

    /// Copy of this command with one fewer repetition remaining.
    pub(crate) fn next_repetition(&self) -> Option<Command> {
        if self.repeat == 0 {
            return None;
        }
        let mut next = self.clone();
        next.repeat -= 1;
        Some(next)
    }
}

/// Handler verdict, mirroring the flight heritage CMD_OK / CMD_FAIL /
/// CMD_SYNTAX_ERROR codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmdResult {
    Ok,
    Fail,
    SyntaxError,
}

/// Execution outcome returned to callers through the result queue.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub name: CommandName,
    pub result: CmdResult,
    pub finished_at: u64,
}
