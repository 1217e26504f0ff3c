//! Process-wide context.
//!
//! One explicitly constructed object holds the three dispatch queues, the
//! three repository stores, the command registry, the simulation gate, and
//! the clock. It is cloned into every task at startup; there are no ambient
//! globals and no direct task-to-task calls.

use crate::clock::{Clock, SystemClock};
use crate::command::Command;
use crate::config::CoreConfig;
use crate::pipeline::{DispatchPipeline, PipelineError};
use crate::registry::CommandRegistry;
use crate::repos::{RepoError, Repositories};
use crate::sim::SimGate;
use std::sync::Arc;

#[derive(Clone)]
pub struct CoreContext {
    pub pipeline: DispatchPipeline,
    pub repos: Arc<Repositories>,
    pub registry: Arc<CommandRegistry>,
    pub gate: SimGate,
    pub clock: Arc<dyn Clock>,
}

impl CoreContext {
    /// Builds the context from configuration, opening file-backed stores
    /// when a data directory is configured. Failure here is fatal to
    /// startup.
    pub fn new(config: &CoreConfig) -> Result<Self, RepoError> {
        let repos = match &config.data_dir {
            Some(dir) => Repositories::open(dir)?,
            None => Repositories::in_memory(),
        };
        Ok(Self {
            pipeline: DispatchPipeline::new(config.queue_depth),
            repos: Arc::new(repos),
            registry: Arc::new(CommandRegistry::new()),
            gate: SimGate::new(),
            clock: Arc::new(SystemClock),
        })
    }

    /// Context with a caller-supplied clock (simulated time in tests and
    /// ground-support builds).
    pub fn with_clock(config: &CoreConfig, clock: Arc<dyn Clock>) -> Result<Self, RepoError> {
        let mut ctx = Self::new(config)?;
        ctx.clock = clock;
        Ok(ctx)
    }

    /// Fire-and-forget submission into the pipeline.
    pub async fn send(&self, command: Command) -> Result<(), PipelineError> {
        self.pipeline.submit(command).await
    }

    /// Orderly teardown: close the queues so every loop exits at its next
    /// checkpoint, then flush the repositories.
    pub async fn shutdown(&self) {
        self.pipeline.shutdown().await;
        self.repos.close_all();
    }
}
