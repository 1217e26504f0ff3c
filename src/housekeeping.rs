//! Periodic housekeeping scheduler.
//!
//! A single always-on task wakes at a fixed tick period, stamps the current
//! time into the system-variable store, evaluates the periodic rule table,
//! and drains due flight-plan entries into the dispatch pipeline. The wake
//! schedule is measured from the original start (`last_wake + P`), so
//! per-iteration jitter never accumulates into drift.
//!
//! The elapsed counter starts at zero and is advanced *before* rule
//! evaluation: with 1000 ms ticks a rule of period `p` seconds first fires
//! on tick `p`, then at every exact multiple of `p` after that. The counter
//! accumulates milliseconds, so sub-second and non-multiple tick periods
//! keep full accuracy; rules fire at whole-second resolution.

use crate::command::Command;
use crate::context::CoreContext;
use crate::pipeline::PipelineError;
use heapless::Vec as BoundedVec;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Upper bound on the periodic rule table.
pub const MAX_RULES: usize = 16;

/// One periodic housekeeping action: every `period_s` seconds, build
/// `command` with `params` and submit it.
#[derive(Debug, Clone)]
pub struct PeriodicRule {
    pub period_s: u64,
    pub command: &'static str,
    pub params: Option<&'static str>,
}

/// The housekeeping task. Construct, add rules, then `run()` forever.
pub struct HousekeepingTask {
    ctx: CoreContext,
    tick_ms: u64,
    elapsed_ms: u64,
    elapsed_s: u64,
    rules: BoundedVec<PeriodicRule, MAX_RULES>,
}

impl HousekeepingTask {
    pub fn new(ctx: CoreContext, tick_ms: u64) -> Self {
        Self {
            ctx,
            tick_ms: tick_ms.max(1),
            elapsed_ms: 0,
            elapsed_s: 0,
            rules: BoundedVec::new(),
        }
    }

    /// Appends a rule; firing order follows insertion order. Fails when the
    /// bounded table is full.
    pub fn add_rule(&mut self, rule: PeriodicRule) -> Result<(), PeriodicRule> {
        self.rules.push(rule)
    }

    /// The stock flight rule set: propagate the orbit every second, send a
    /// telemetry status every 10 seconds, bump the alive-hours counter every
    /// hour.
    pub fn with_default_rules(ctx: CoreContext, tick_ms: u64) -> Self {
        let mut task = Self::new(ctx, tick_ms);
        for rule in [
            PeriodicRule {
                period_s: 1,
                command: "obc_prop_tle",
                params: Some("0"),
            },
            PeriodicRule {
                period_s: 10,
                command: "tm_send_status",
                params: Some("0"),
            },
            PeriodicRule {
                period_s: 3600,
                command: "drp_add_hrs_alive",
                params: Some("1"),
            },
        ] {
            let _ = task.add_rule(rule);
        }
        task
    }

    pub fn elapsed_s(&self) -> u64 {
        self.elapsed_s
    }

    /// Runs forever on the drift-corrected schedule. Returns only when the
    /// pipeline is closed, the loop's one shutdown checkpoint.
    pub async fn run(mut self) {
        info!(tick_ms = self.tick_ms, "housekeeping started");
        let period = Duration::from_millis(self.tick_ms);
        let mut interval = time::interval_at(time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);

        loop {
            interval.tick().await;
            if let Err(PipelineError::QueueClosed) = self.tick().await {
                break;
            }
        }
        info!("housekeeping stopped");
    }

    /// One tick: advance the elapsed counter, stamp the clock variable,
    /// evaluate the rule table, drain due flight-plan entries.
    ///
    /// Elapsed time accumulates in milliseconds; rules have whole-second
    /// resolution and are evaluated only on ticks where the whole-second
    /// value advances, so a sub-second tick period never fires a rule more
    /// than once per elapsed second.
    ///
    /// Per-action failures are logged and skipped; only a closed pipeline
    /// propagates, to stop the loop.
    pub async fn tick(&mut self) -> Result<(), PipelineError> {
        self.elapsed_ms += self.tick_ms;
        let elapsed_s = self.elapsed_ms / 1000;
        let advanced = elapsed_s != self.elapsed_s;
        self.elapsed_s = elapsed_s;

        let now = self.ctx.clock.now_epoch_s();
        self.ctx.repos.vars.set(
            crate::repos::var_keys::RTC_DATE_TIME,
            crate::repos::VarValue::Int(now as i64),
            now,
        );

        if advanced {
            for rule in self.rules.iter() {
                if self.elapsed_s % rule.period_s != 0 {
                    continue;
                }
                debug!(command = rule.command, period_s = rule.period_s, "rule fired");
                match build_rule_command(&self.ctx, rule) {
                    Ok(command) => self.ctx.send(command).await?,
                    Err(e) => warn!(command = rule.command, "skipping rule: {}", e),
                }
            }
        }

        self.drain_flight_plan(now).await
    }

    async fn drain_flight_plan(&self, now: u64) -> Result<(), PipelineError> {
        for entry in self.ctx.repos.flight_plan.take_due(now) {
            let mut command = match Command::build(&self.ctx.registry, &entry.command) {
                Ok(command) => command,
                Err(e) => {
                    warn!(command = %entry.command, "skipping flight plan entry: {}", e);
                    continue;
                }
            };
            if let Some(args) = &entry.args {
                if let Err(e) = command.add_params(args) {
                    warn!(command = %entry.command, "skipping flight plan entry: {}", e);
                    continue;
                }
            }
            self.ctx.send(command).await?;
        }
        Ok(())
    }
}

fn build_rule_command(
    ctx: &CoreContext,
    rule: &PeriodicRule,
) -> Result<Command, crate::command::CommandError> {
    let mut command = Command::build(&ctx.registry, rule.command)?;
    if let Some(params) = rule.params {
        command.add_params(params)?;
    }
    Ok(command)
}
