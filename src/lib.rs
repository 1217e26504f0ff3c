//! # Nanosatellite Onboard Control Core
//!
//! The always-on control core of a nanosatellite flight-software stack:
//! periodic housekeeping, inter-task command dispatch, and serialized access
//! to shared satellite state.
//!
//! ## Features
//!
//! - **Periodic housekeeping**: drift-corrected 1 Hz scheduler evaluating a
//!   fixed rule table (telemetry status, orbit propagation, alive counters)
//! - **Command dispatch pipeline**: bounded submission/execution/result
//!   queues decoupling command producers from executers
//! - **State repositories**: independently guarded stores for system
//!   variables, the flight plan, and command history
//! - **Simulation gate**: start/stop barrier lock-stepping a simulated clock
//!   in ground-test builds
//!
//! ## Quick Start
//!
//! ```rust
//! use satcore::{CoreConfig, CoreContext};
//! use satcore::command::Command;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = CoreContext::new(&CoreConfig::default())?;
//! ctx.registry
//!     .register("tm_send_status", "%d", 1, |_fmt, _params, _n| {
//!         satcore::command::CmdResult::Ok
//!     });
//!
//! let mut cmd = Command::build(&ctx.registry, "tm_send_status")?;
//! cmd.add_params("0")?;
//! ctx.send(cmd).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`command`] - Command value objects and execution outcomes
//! - [`registry`] - Command name/format/handler registry
//! - [`pipeline`] - Bounded FIFO dispatch queues
//! - [`executer`] - Dispatcher and executer task loops
//! - [`housekeeping`] - Periodic housekeeping scheduler
//! - [`repos`] - Guarded state repositories
//! - [`sim`] - Simulation start/stop gate
//! - [`context`] - Process-wide context object wiring the above together

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod clock;
pub mod command;
pub mod config;
pub mod context;
pub mod executer;
pub mod housekeeping;
pub mod pipeline;
pub mod registry;
pub mod repos;
pub mod sim;

// Re-export main public types for convenience
pub use command::{CmdResult, Command, CommandOutcome};
pub use config::CoreConfig;
pub use context::CoreContext;
pub use pipeline::DispatchPipeline;
pub use registry::CommandRegistry;
pub use sim::{SimGate, SimState};
