//! Simulation loop runner.
//!
//! This module provides [`run_simulation`], which drives the tick loop
//! until one of the configured bounds is hit:
//!
//! - **Tick limit**: stop after `max_ticks` ticks
//! - **Wall-clock limit**: stop once `max_real_time_seconds` have elapsed
//! - **First star**: stop on the first tick that shows a star, when
//!   `stop_on_star` is set
//!
//! The runner wraps the single-tick [`run_tick`] function and reports each
//! tick to a [`TickCallback`].
//!
//! [`run_tick`]: crate::tick::run_tick

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use nebula_types::CellState;

use crate::automaton::Automaton;
use crate::config::SimulationBoundsConfig;
use crate::tick::TickSummary;

/// Errors that can occur before or during the simulation run.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RunnerError {
    /// No bound would ever end the run.
    #[error("simulation is unbounded: set max_ticks, max_real_time_seconds, or stop_on_star")]
    Unbounded,
}

/// Reason why the simulation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationEndReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// Reached the configured `max_real_time_seconds` limit.
    MaxRealTimeReached,
    /// A star appeared and `stop_on_star` was set.
    StarFormed,
}

/// Result of the simulation run.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// Total number of ticks executed.
    pub total_ticks: u64,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Groups formed over the whole run.
    pub groups_formed_total: u64,
}

/// Callback invoked after each tick completes.
///
/// Implementations can log progress, render the grid, or collect
/// statistics. The callback receives the tick summary and the automaton.
pub trait TickCallback {
    /// Called after a tick completes.
    fn on_tick(&mut self, summary: &TickSummary, automaton: &Automaton);
}

/// A no-op tick callback for testing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _automaton: &Automaton) {}
}

/// Run ticks until a termination condition is met.
///
/// The wall-clock limit is checked before each tick; the tick limit and
/// the star condition after it. A zero `max_ticks` or
/// `max_real_time_seconds` disables that bound.
///
/// # Errors
///
/// Returns [`RunnerError::Unbounded`] if every bound is disabled.
pub fn run_simulation(
    automaton: &mut Automaton,
    bounds: &SimulationBoundsConfig,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    if bounds.max_ticks == 0 && bounds.max_real_time_seconds == 0 && !bounds.stop_on_star {
        return Err(RunnerError::Unbounded);
    }

    let started = Utc::now();
    let formed_before = automaton.groups_formed_total();
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        max_ticks = bounds.max_ticks,
        max_real_time_seconds = bounds.max_real_time_seconds,
        stop_on_star = bounds.stop_on_star,
        "Simulation starting"
    );

    let end_reason = loop {
        // --- Check time limit (before tick) ---
        if bounds.max_real_time_seconds > 0 {
            let elapsed = Utc::now().signed_duration_since(started).num_seconds();
            let elapsed = u64::try_from(elapsed).unwrap_or(0);
            if elapsed >= bounds.max_real_time_seconds {
                info!(
                    max_seconds = bounds.max_real_time_seconds,
                    elapsed, "Real-time limit reached"
                );
                break SimulationEndReason::MaxRealTimeReached;
            }
        }

        // --- Execute tick ---
        let summary = automaton.step();
        total_ticks = total_ticks.saturating_add(1);
        callback.on_tick(&summary, automaton);

        let star_formed = summary.snapshot.contains(CellState::Star);
        last_summary = Some(summary);

        // --- Check star condition (after tick) ---
        if bounds.stop_on_star && star_formed {
            info!(tick = automaton.tick(), "First star formed");
            break SimulationEndReason::StarFormed;
        }

        // --- Check tick limit (after tick) ---
        if bounds.max_ticks > 0 && total_ticks >= bounds.max_ticks {
            info!(
                tick = automaton.tick(),
                max_ticks = bounds.max_ticks,
                "Tick limit reached"
            );
            break SimulationEndReason::MaxTicksReached;
        }
    };

    Ok(SimulationResult {
        end_reason,
        total_ticks,
        final_summary: last_summary,
        groups_formed_total: automaton
            .groups_formed_total()
            .saturating_sub(formed_before),
    })
}

/// Log the simulation end.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        groups_formed = result.groups_formed_total,
        final_stars = result.final_summary.as_ref().map(|s| s.counts.star),
        final_active_groups = result.final_summary.as_ref().map(|s| s.active_groups.len()),
        "Simulation ended"
    );
}
