//! Gas-density sweep: how often do proto-stars and stars emerge?
//!
//! For each gas probability the sweep runs several independent automata,
//! each until its first star or its tick limit, and records the fraction
//! of runs in which a forming group appeared and the fraction in which a
//! star appeared. Plotted against the gas probability the two fractions
//! show the phase transition of the model.
//!
//! Seeds are derived from the base seed, the probability's index, and the
//! run's index, so a sweep is reproducible from its configuration alone.

use serde::{Deserialize, Serialize};
use tracing::info;

use nebula_types::CellState;

use crate::automaton::{Automaton, AutomatonError};
use crate::config::{ConfigError, SimulationBoundsConfig, SimulationConfig, SweepConfig};
use crate::runner::{RunnerError, SimulationEndReason, TickCallback, run_simulation};
use crate::tick::TickSummary;

/// Multiplier spreading derived seeds across the `u64` range.
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Errors that can occur during a sweep.
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    /// The sweep parameters are invalid.
    #[error("invalid sweep: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },

    /// An automaton could not be built for one of the sample points.
    #[error("failed to build automaton for p_gas = {p_gas}: {source}")]
    Automaton {
        /// The gas probability being sampled.
        p_gas: f64,
        /// The underlying error.
        source: AutomatonError,
    },

    /// A run could not be started.
    #[error("run failed: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: RunnerError,
    },
}

/// Formation frequencies at one gas probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    /// Gas probability of the initial grid.
    pub gas_probability: f64,
    /// Number of runs sampled.
    pub runs: u32,
    /// Fraction of runs in which a forming group appeared.
    pub proto_fraction: f64,
    /// Fraction of runs in which a star appeared.
    pub star_fraction: f64,
    /// Mean tick of the first star over the runs that produced one.
    pub mean_ticks_to_star: Option<f64>,
}

/// Output of a complete sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Unique identifier of this sweep.
    pub run_id: String,
    /// Grid side length used by every run.
    pub grid_size: usize,
    /// Base seed the run seeds were derived from.
    pub base_seed: u64,
    /// One point per gas probability, in configuration order.
    pub points: Vec<SweepPoint>,
}

/// Outcome of a single run within a sweep.
struct RunOutcome {
    /// A forming group appeared at some tick.
    proto: bool,
    /// Tick of the first star, if any.
    star_tick: Option<u64>,
}

/// Watches every tick for forming agents.
struct ProtoWatcher {
    /// Whether a forming agent has been seen.
    seen: bool,
}

impl TickCallback for ProtoWatcher {
    fn on_tick(&mut self, summary: &TickSummary, _automaton: &Automaton) {
        if summary.counts.forming > 0 {
            self.seen = true;
        }
    }
}

/// Seed of run `run` at probability index `point`.
pub fn derive_seed(base: u64, point: usize, run: u32) -> u64 {
    let point = u64::try_from(point).unwrap_or(u64::MAX);
    base.wrapping_add(
        point
            .wrapping_mul(SEED_STRIDE)
            .wrapping_add(u64::from(run).wrapping_mul(SEED_STRIDE.rotate_left(17))),
    )
}

/// Run the sweep described by `sweep` on top of `base`.
///
/// Every run uses `base` with its occupancy vector replaced by
/// `[1 - p, p]` and its seed replaced by a derived seed.
///
/// # Errors
///
/// Returns [`SweepError::Config`] if `base` or `sweep` is invalid, and
/// [`SweepError::Automaton`] if a sample point cannot be built.
pub fn run_sweep(base: &SimulationConfig, sweep: &SweepConfig) -> Result<SweepReport, SweepError> {
    sweep.validate()?;
    base.validate()?;

    let run_id = uuid::Uuid::now_v7().to_string();
    info!(
        run_id = %run_id,
        points = sweep.gas_probabilities.len(),
        runs_per_density = sweep.runs_per_density,
        "Sweep starting"
    );

    let bounds = SimulationBoundsConfig {
        max_ticks: sweep.max_ticks,
        max_real_time_seconds: 0,
        stop_on_star: true,
    };

    let mut points = Vec::with_capacity(sweep.gas_probabilities.len());
    for (index, &p_gas) in sweep.gas_probabilities.iter().enumerate() {
        let mut protos: u32 = 0;
        let mut stars: u32 = 0;
        let mut star_ticks: u64 = 0;

        for run in 0..sweep.runs_per_density {
            let config = base.with_gas_probability(p_gas, derive_seed(base.world.seed, index, run));
            let outcome = sample(config, &bounds).map_err(|source| match source {
                SweepError::Automaton { source, .. } => SweepError::Automaton { p_gas, source },
                other => other,
            })?;
            if outcome.proto {
                protos = protos.saturating_add(1);
            }
            if let Some(tick) = outcome.star_tick {
                stars = stars.saturating_add(1);
                star_ticks = star_ticks.saturating_add(tick);
            }
        }

        let runs = f64::from(sweep.runs_per_density);
        let point = SweepPoint {
            gas_probability: p_gas,
            runs: sweep.runs_per_density,
            proto_fraction: f64::from(protos) / runs,
            star_fraction: f64::from(stars) / runs,
            mean_ticks_to_star: mean(star_ticks, stars),
        };
        info!(
            p_gas,
            proto_fraction = point.proto_fraction,
            star_fraction = point.star_fraction,
            "Sweep point complete"
        );
        points.push(point);
    }

    Ok(SweepReport {
        run_id,
        grid_size: base.world.size,
        base_seed: base.world.seed,
        points,
    })
}

fn sample(config: SimulationConfig, bounds: &SimulationBoundsConfig) -> Result<RunOutcome, SweepError> {
    let p_gas = config.gas_probability();
    let mut automaton = Automaton::new(config)
        .map_err(|source| SweepError::Automaton { p_gas, source })?;
    let mut watcher = ProtoWatcher { seen: false };
    let result = run_simulation(&mut automaton, bounds, &mut watcher)?;
    let star_tick = (result.end_reason == SimulationEndReason::StarFormed)
        .then_some(result.total_ticks);
    // A group that ignites on the tick it is first seen never shows as
    // forming in a summary.
    let proto = watcher.seen || star_tick.is_some();
    debug_assert!(
        star_tick.is_none()
            || result
                .final_summary
                .as_ref()
                .is_some_and(|s| s.snapshot.contains(CellState::Star))
    );
    Ok(RunOutcome { proto, star_tick })
}

/// `total / count` as a float, `None` for zero runs.
fn mean(total: u64, count: u32) -> Option<f64> {
    if count == 0 {
        return None;
    }
    let total = u32::try_from(total).map_or(f64::from(u32::MAX), f64::from);
    Some(total / f64::from(count))
}
