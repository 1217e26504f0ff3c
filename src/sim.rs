//! Simulation gate.
//!
//! Ground-test builds drive the flight software from a simulated clock. The
//! gate is a single STOPPED/RUNNING state the time source blocks on until
//! the software explicitly starts or stops simulated execution, via the
//! `sim_start`/`sim_stop` commands issued like any other command.
//!
//! Waiters block on a condition variable and re-check the state after every
//! wakeup, so spurious or stale wakeups never release them early.

use crate::command::CmdResult;
use crate::registry::CommandRegistry;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimState {
    Stopped,
    Running,
}

struct GateInner {
    state: Mutex<SimState>,
    cond: Condvar,
}

/// Start/stop barrier for the simulated time source.
#[derive(Clone)]
pub struct SimGate {
    inner: Arc<GateInner>,
}

impl SimGate {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(GateInner {
                state: Mutex::new(SimState::Stopped),
                cond: Condvar::new(),
            }),
        }
    }

    /// Sets RUNNING and wakes every waiter.
    pub fn set_running(&self) {
        self.set(SimState::Running);
    }

    /// Sets STOPPED and wakes every waiter.
    pub fn set_stopped(&self) {
        self.set(SimState::Stopped);
    }

    fn set(&self, state: SimState) {
        let mut current = self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *current = state;
        self.inner.cond.notify_all();
    }

    /// Blocks the calling thread until the gate reaches `state`.
    pub fn wait_for(&self, state: SimState) {
        let guard = self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let _guard = self
            .inner
            .cond
            .wait_while(guard, |current| *current != state)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Current value, without blocking.
    pub fn state(&self) -> SimState {
        *self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SimGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Registers the `sim_start`/`sim_stop` commands against `gate`.
/// Both take no parameters and always succeed.
pub fn register_commands(registry: &CommandRegistry, gate: &SimGate) {
    let start_gate = gate.clone();
    registry.register("sim_start", "", 0, move |_, _, _| {
        start_gate.set_running();
        info!("simulation started");
        CmdResult::Ok
    });

    let stop_gate = gate.clone();
    registry.register("sim_stop", "", 0, move |_, _, _| {
        stop_gate.set_stopped();
        info!("simulation stopped");
        CmdResult::Ok
    });
}
