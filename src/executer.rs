//! Dispatcher and executer tasks.
//!
//! The dispatcher pulls new commands off the submission queue, checks them
//! against the registry, and forwards valid ones to the execution queue. The
//! executer pulls from the execution queue, invokes the handler, pushes the
//! outcome onto the result queue, and records the execution in the command
//! history store. Both loops run for the life of the process and exit only
//! when their queues are closed during shutdown.

use crate::command::{CmdResult, Command, CommandOutcome};
use crate::context::CoreContext;
use crate::pipeline::PipelineError;
use crate::repos::HistoryRecord;
use tracing::{debug, info, warn};

/// Submission-to-execution dispatch loop.
pub async fn run_dispatcher(ctx: CoreContext) {
    info!("dispatcher started");
    loop {
        let command = match ctx.pipeline.submission.dequeue().await {
            Ok(command) => command,
            Err(PipelineError::QueueClosed) => break,
        };

        if ctx.registry.lookup(command.name()).is_none() {
            warn!(command = command.name(), "discarding unknown command");
            let outcome = CommandOutcome {
                name: command.name_buf(),
                result: CmdResult::Fail,
                finished_at: ctx.clock.now_epoch_s(),
            };
            if ctx.pipeline.results.enqueue(outcome).await.is_err() {
                break;
            }
            continue;
        }

        debug!(command = command.name(), "dispatching");
        if ctx.pipeline.execution.enqueue(command).await.is_err() {
            break;
        }
    }
    info!("dispatcher stopped");
}

/// Execution loop: run handlers, report outcomes, keep history.
pub async fn run_executer(ctx: CoreContext) {
    info!("executer started");
    loop {
        let command = match ctx.pipeline.execution.dequeue().await {
            Ok(command) => command,
            Err(PipelineError::QueueClosed) => break,
        };

        let result = execute(&ctx, &command);
        let finished_at = ctx.clock.now_epoch_s();

        ctx.repos.history.append(HistoryRecord {
            name: command.name().to_string(),
            params: command.params().map(str::to_string),
            result,
            executed_at: finished_at,
        });

        let outcome = CommandOutcome {
            name: command.name_buf(),
            result,
            finished_at,
        };
        if ctx.pipeline.results.enqueue(outcome).await.is_err() {
            break;
        }

        // repeat counts additional repetitions. The resubmission is handed
        // to a detached task: the executer sits downstream of the
        // submission queue and must never block on it, or a full pipeline
        // wedges the executer/dispatcher pair for good.
        if let Some(next) = command.next_repetition() {
            let pipeline = ctx.pipeline.clone();
            let name = next.name().to_string();
            tokio::spawn(async move {
                if pipeline.submit(next).await.is_err() {
                    debug!(command = %name, "dropping repetition, pipeline closed");
                }
            });
        }
    }
    info!("executer stopped");
}

/// Result-queue consumer: logs every execution outcome so the bounded
/// results queue never backs up into the executer. Flight builds that relay
/// outcomes to the ground replace this with their own consumer.
pub async fn run_results_monitor(ctx: CoreContext) {
    info!("results monitor started");
    loop {
        match ctx.pipeline.results.dequeue().await {
            Ok(outcome) => {
                debug!(
                    command = outcome.name.as_str(),
                    result = ?outcome.result,
                    finished_at = outcome.finished_at,
                    "command outcome"
                );
            }
            Err(PipelineError::QueueClosed) => break,
        }
    }
    info!("results monitor stopped");
}

fn execute(ctx: &CoreContext, command: &Command) -> CmdResult {
    let Some(handler) = ctx.registry.handler(command.name()) else {
        // Registered at dispatch, unregistered since. Treated like any
        // other failed execution.
        warn!(command = command.name(), "handler no longer registered");
        return CmdResult::Fail;
    };

    let result = handler(command.fmt(), command.params(), command.nparams());
    match result {
        CmdResult::Ok => debug!(command = command.name(), "executed"),
        CmdResult::Fail => warn!(command = command.name(), "execution failed"),
        CmdResult::SyntaxError => {
            warn!(command = command.name(), params = ?command.params(), "bad parameters")
        }
    }
    result
}
