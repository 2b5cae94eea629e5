//! Engine binary for the Nebula simulation.
//!
//! This is the main entry point. It loads configuration, initializes
//! logging, and then either runs a single bounded simulation or, when the
//! configuration carries a `sweep` section, the gas-density sweep.
//!
//! # Startup Sequence
//!
//! 1. Load configuration (`NEBULA_CONFIG`, else `nebula-config.yaml`,
//!    else defaults)
//! 2. Initialize structured logging (tracing)
//! 3. Run the sweep and print its report as JSON, or
//! 4. Seed the automaton, run the simulation loop, and log the result

mod error;
mod report_callback;

use std::path::{Path, PathBuf};

use nebula_core::automaton::Automaton;
use nebula_core::config::{LoggingConfig, SimulationConfig};
use nebula_core::runner;
use nebula_core::sweep;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::report_callback::ReportCallback;

/// Environment variable naming the configuration file.
const CONFIG_ENV: &str = "NEBULA_CONFIG";

/// Configuration file looked up in the working directory.
const DEFAULT_CONFIG_FILE: &str = "nebula-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration loading, automaton construction, the
/// run, or the sweep fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, source) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("nebula-engine starting");
    let origin = source
        .as_ref()
        .map_or_else(|| String::from("defaults"), |path| path.display().to_string());
    info!(
        source = %origin,
        size = config.world.size,
        seed = config.world.seed,
        p_gas = config.gas_probability(),
        density_mode = ?config.density.mode,
        "Configuration loaded"
    );

    // 3. Sweep mode.
    if let Some(sweep_config) = &config.sweep {
        let report = sweep::run_sweep(&config, sweep_config).map_err(EngineError::from)?;
        let json = serde_json::to_string_pretty(&report).map_err(EngineError::from)?;
        println!("{json}");
        info!(run_id = %report.run_id, points = report.points.len(), "nebula-engine sweep complete");
        return Ok(());
    }

    // 4. Single run.
    run_once(config)?;
    Ok(())
}

/// Seed an automaton from `config` and run it within the configured bounds.
fn run_once(config: SimulationConfig) -> Result<(), EngineError> {
    let bounds = config.simulation;
    let mut callback = ReportCallback::new(config.logging.report_interval_ticks);
    let mut automaton = Automaton::new(config)?;
    info!(
        gas = automaton.counts().gas,
        max_ticks = bounds.max_ticks,
        "Automaton seeded, entering tick loop"
    );

    let result = runner::run_simulation(&mut automaton, &bounds, &mut callback)?;
    runner::log_simulation_end(&result);

    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        first_star = ?callback.first_star(),
        peak_active_groups = callback.peak_groups(),
        "nebula-engine shutdown complete"
    );
    Ok(())
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the
/// configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Load the simulation configuration.
///
/// The path comes from `NEBULA_CONFIG` when set, otherwise
/// `nebula-config.yaml` in the working directory is used if it exists.
/// Without either, defaults apply. Returns the path that was read.
fn load_config() -> Result<(SimulationConfig, Option<PathBuf>), EngineError> {
    if let Some(path) = std::env::var_os(CONFIG_ENV).map(PathBuf::from) {
        let config = SimulationConfig::from_file(&path)?;
        return Ok((config, Some(path)));
    }
    let path = Path::new(DEFAULT_CONFIG_FILE);
    if path.exists() {
        let config = SimulationConfig::from_file(path)?;
        Ok((config, Some(path.to_path_buf())))
    } else {
        Ok((SimulationConfig::default(), None))
    }
}
