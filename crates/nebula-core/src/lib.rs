//! Automaton state, tick cycle, and orchestration for the Nebula simulation.
//!
//! This crate owns the 7-phase tick cycle that drives the automaton:
//! Age, Density, Movement, Commit, Clustering, Merge, and Lifecycle.
//!
//! # Modules
//!
//! - [`audit`] -- Structural invariant checks over the whole automaton.
//! - [`automaton`] -- The [`Automaton`]: double-buffered grid, agent pool,
//!   group table, registry, and random source.
//! - [`config`] -- Configuration loading from `nebula-config.yaml` into
//!   strongly-typed structs.
//! - [`runner`] -- The bounded tick loop with per-tick callbacks.
//! - [`sweep`] -- Proto-star and star frequencies across a range of gas densities.
//! - [`tick`] -- The 7-phase tick cycle.

pub mod audit;
pub mod automaton;
pub mod config;
pub mod runner;
pub mod sweep;
pub mod tick;

pub use audit::InvariantViolation;
pub use automaton::{Automaton, AutomatonError};
pub use config::{ConfigError, SimulationConfig};
pub use runner::{
    NoOpCallback, RunnerError, SimulationEndReason, SimulationResult, TickCallback,
    log_simulation_end, run_simulation,
};
pub use sweep::{SweepError, SweepPoint, SweepReport, run_sweep};
pub use tick::{TickSummary, run_tick};
