//! Configuration loading and typed config structures for the Nebula automaton.
//!
//! The canonical configuration lives in `nebula-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, a loader that reads the file, and [`SimulationConfig::validate`]
//! which rejects parameter sets the automaton cannot run with.
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! reference configuration: a 100 x 100 grid, 15% gas, proto size 10,
//! formation size 50.

use std::path::Path;

use serde::{Deserialize, Serialize};

use nebula_agents::LifecycleConfig;
use nebula_grid::DensityMode;

/// Tolerance when checking that the occupancy vector sums to one.
const OCCUPANCY_TOLERANCE: f64 = 1e-9;

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A parameter is outside its allowed range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level automaton configuration.
///
/// Mirrors the structure of `nebula-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Grid size, seed, and initial occupancy.
    #[serde(default)]
    pub world: WorldConfig,

    /// Density field parameters.
    #[serde(default)]
    pub density: DensityConfig,

    /// Biased-walk parameters.
    #[serde(default)]
    pub movement: MovementConfig,

    /// Group formation, absorption, and proximity parameters.
    #[serde(default)]
    pub clustering: ClusteringConfig,

    /// Lifecycle thresholds.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    /// Run-length bounds.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Density sweep; when present the engine runs the sweep instead of a
    /// single simulation.
    #[serde(default)]
    pub sweep: Option<SweepConfig>,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// The result is not validated; call [`validate`](Self::validate) or
    /// let [`Automaton::new`](crate::Automaton::new) do it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Check every parameter against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::Invalid`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let size = self.world.size;
        if size == 0 {
            return invalid("world.size", "must be greater than 0");
        }
        let cell_count = size
            .checked_mul(size)
            .ok_or_else(|| ConfigError::Invalid {
                field: "world.size",
                reason: format!("{size} x {size} cells overflow"),
            })?;

        self.validate_occupancy()?;

        check_radius("density.radius", self.density.radius, size)?;
        check_radius("movement.radius", self.movement.radius, size)?;
        check_radius("clustering.radius", self.clustering.radius, size)?;
        check_radius("clustering.absorb_radius", self.clustering.absorb_radius, size)?;

        if self.clustering.proto_size == 0 || self.clustering.proto_size > cell_count {
            return invalid(
                "clustering.proto_size",
                format!("must be in 1..={cell_count}"),
            );
        }
        if self.clustering.absorb_min_neighbors == 0 {
            return invalid("clustering.absorb_min_neighbors", "must be greater than 0");
        }
        if let Some(distance) = self.clustering.proximity_distance {
            if !distance.is_finite() || distance <= 0.0 {
                return invalid(
                    "clustering.proximity_distance",
                    format!("must be positive and finite, got {distance}"),
                );
            }
        }

        let lifecycle = &self.lifecycle;
        if lifecycle.formation_size == 0 || lifecycle.formation_size > cell_count {
            return invalid(
                "lifecycle.formation_size",
                format!("must be in 1..={cell_count}"),
            );
        }
        if lifecycle.star_duration == 0 {
            return invalid("lifecycle.star_duration", "must be greater than 0");
        }
        if lifecycle.dissipation_duration == 0 {
            return invalid("lifecycle.dissipation_duration", "must be greater than 0");
        }
        if lifecycle.dissipation_steps == 0 {
            return invalid("lifecycle.dissipation_steps", "must be greater than 0");
        }

        if let Some(sweep) = &self.sweep {
            sweep.validate()?;
        }
        Ok(())
    }

    /// Probability that a cell starts as gas.
    pub fn gas_probability(&self) -> f64 {
        self.world.occupancy.get(1).copied().unwrap_or(0.0)
    }

    /// A copy of this configuration with the occupancy vector set to
    /// `[1 - p_gas, p_gas]` and the given seed.
    pub fn with_gas_probability(&self, p_gas: f64, seed: u64) -> Self {
        let mut config = self.clone();
        config.world.occupancy = vec![1.0 - p_gas, p_gas];
        config.world.seed = seed;
        config
    }

    fn validate_occupancy(&self) -> Result<(), ConfigError> {
        let occupancy = &self.world.occupancy;
        if occupancy.len() != 2 {
            return invalid(
                "world.occupancy",
                format!("expected [p_empty, p_gas], got {} values", occupancy.len()),
            );
        }
        if let Some(p) = occupancy.iter().find(|p| !(0.0..=1.0).contains(*p)) {
            return invalid("world.occupancy", format!("{p} is not a probability"));
        }
        let total: f64 = occupancy.iter().sum();
        if (total - 1.0).abs() > OCCUPANCY_TOLERANCE {
            return invalid("world.occupancy", format!("values sum to {total}, not 1"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid {
        field,
        reason: reason.into(),
    })
}

/// A radius must be positive and its window `2r + 1` must fit on the grid.
fn check_radius(field: &'static str, radius: usize, size: usize) -> Result<(), ConfigError> {
    let window = radius.checked_mul(2).and_then(|d| d.checked_add(1));
    match window {
        Some(w) if radius > 0 && w <= size => Ok(()),
        _ => invalid(
            field,
            format!("radius {radius} does not fit a {size} x {size} grid"),
        ),
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Side length `N` of the torus.
    #[serde(default = "default_size")]
    pub size: usize,

    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Initial occupancy probabilities `[p_empty, p_gas]`.
    #[serde(default = "default_occupancy")]
    pub occupancy: Vec<f64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            size: default_size(),
            seed: default_seed(),
            occupancy: default_occupancy(),
        }
    }
}

/// Density field configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DensityConfig {
    /// How neighbours contribute to a cell's density.
    #[serde(default)]
    pub mode: DensityMode,

    /// Neighbourhood radius of the density estimate.
    #[serde(default = "default_density_radius")]
    pub radius: usize,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            mode: DensityMode::default(),
            radius: default_density_radius(),
        }
    }
}

/// Biased-walk configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementConfig {
    /// Radius of the candidate neighbourhood (1 = eight neighbours).
    #[serde(default = "default_movement_radius")]
    pub radius: usize,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            radius: default_movement_radius(),
        }
    }
}

/// Group formation configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusteringConfig {
    /// Radius within which gas neighbours are counted for formation.
    #[serde(default = "default_cluster_radius")]
    pub radius: usize,

    /// A gas agent forms a group when strictly more than this many gas
    /// neighbours surround it.
    #[serde(default = "default_proto_size")]
    pub proto_size: usize,

    /// Radius within which a gas agent is captured by a bound neighbour.
    #[serde(default = "default_absorb_radius")]
    pub absorb_radius: usize,

    /// Bound neighbours needed for capture.
    #[serde(default = "default_absorb_min_neighbors")]
    pub absorb_min_neighbors: usize,

    /// Forming groups whose centroids lie closer than this ignite together
    /// with a ready neighbour. `null` disables proximity ignition.
    #[serde(default = "default_proximity_distance")]
    pub proximity_distance: Option<f64>,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            radius: default_cluster_radius(),
            proto_size: default_proto_size(),
            absorb_radius: default_absorb_radius(),
            absorb_min_neighbors: default_absorb_min_neighbors(),
            proximity_distance: default_proximity_distance(),
        }
    }
}

/// Run-length bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Maximum number of ticks before the run ends (0 = unlimited).
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// Maximum wall-clock seconds before the run ends (0 = unlimited).
    #[serde(default)]
    pub max_real_time_seconds: u64,

    /// End the run on the first tick that shows a star.
    #[serde(default)]
    pub stop_on_star: bool,
}

impl Default for SimulationBoundsConfig {
    fn default() -> Self {
        Self {
            max_ticks: default_max_ticks(),
            max_real_time_seconds: 0,
            stop_on_star: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines instead of human-readable ones.
    #[serde(default)]
    pub json: bool,

    /// Log per-state counts every N ticks (0 = never).
    #[serde(default = "default_report_interval_ticks")]
    pub report_interval_ticks: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            report_interval_ticks: default_report_interval_ticks(),
        }
    }
}

/// Gas-density sweep configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Gas probabilities to sample.
    #[serde(default = "default_gas_probabilities")]
    pub gas_probabilities: Vec<f64>,

    /// Independent runs per probability.
    #[serde(default = "default_runs_per_density")]
    pub runs_per_density: u32,

    /// Tick limit of each run.
    #[serde(default = "default_sweep_max_ticks")]
    pub max_ticks: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            gas_probabilities: default_gas_probabilities(),
            runs_per_density: default_runs_per_density(),
            max_ticks: default_sweep_max_ticks(),
        }
    }
}

impl SweepConfig {
    /// Check the sweep parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an empty probability list, a
    /// value outside `[0, 1]`, or a zero run count or tick limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gas_probabilities.is_empty() {
            return invalid("sweep.gas_probabilities", "must not be empty");
        }
        if let Some(p) = self
            .gas_probabilities
            .iter()
            .find(|p| !(0.0..=1.0).contains(*p))
        {
            return invalid("sweep.gas_probabilities", format!("{p} is not a probability"));
        }
        if self.runs_per_density == 0 {
            return invalid("sweep.runs_per_density", "must be greater than 0");
        }
        if self.max_ticks == 0 {
            return invalid("sweep.max_ticks", "must be greater than 0");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_size() -> usize {
    100
}

const fn default_seed() -> u64 {
    42
}

fn default_occupancy() -> Vec<f64> {
    vec![0.85, 0.15]
}

const fn default_density_radius() -> usize {
    3
}

const fn default_movement_radius() -> usize {
    1
}

const fn default_cluster_radius() -> usize {
    3
}

const fn default_proto_size() -> usize {
    10
}

const fn default_absorb_radius() -> usize {
    1
}

const fn default_absorb_min_neighbors() -> usize {
    1
}

#[allow(clippy::unnecessary_wraps)]
const fn default_proximity_distance() -> Option<f64> {
    Some(30.0)
}

const fn default_max_ticks() -> u64 {
    1000
}

fn default_log_level() -> String {
    String::from("info")
}

const fn default_report_interval_ticks() -> u64 {
    50
}

fn default_gas_probabilities() -> Vec<f64> {
    vec![0.02, 0.04, 0.06, 0.08, 0.10, 0.12, 0.14, 0.16, 0.18, 0.20]
}

const fn default_runs_per_density() -> u32 {
    10
}

const fn default_sweep_max_ticks() -> u64 {
    1000
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert_eq!(config.world.size, 100);
        assert_eq!(config.world.seed, 42);
        assert_eq!(config.world.occupancy, vec![0.85, 0.15]);
        assert_eq!(config.density.mode, DensityMode::Count);
        assert_eq!(config.density.radius, 3);
        assert_eq!(config.movement.radius, 1);
        assert_eq!(config.clustering.proto_size, 10);
        assert_eq!(config.clustering.proximity_distance, Some(30.0));
        assert_eq!(config.lifecycle.formation_size, 50);
        assert!(config.sweep.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
world:
  size: 40
  seed: 7
  occupancy: [0.7, 0.3]

density:
  mode: inverse_square
  radius: 2

movement:
  radius: 2

clustering:
  radius: 2
  proto_size: 6
  absorb_radius: 1
  absorb_min_neighbors: 2
  proximity_distance: null

lifecycle:
  formation_size: 20
  star_duration: 5
  dissipation_duration: 15
  dissipation_steps: 4

simulation:
  max_ticks: 300
  max_real_time_seconds: 60
  stop_on_star: true

logging:
  level: debug
  json: true
  report_interval_ticks: 10

sweep:
  gas_probabilities: [0.05, 0.1]
  runs_per_density: 3
  max_ticks: 200
";
        let config = SimulationConfig::parse(yaml).unwrap();
        assert_eq!(config.world.size, 40);
        assert_eq!(config.world.seed, 7);
        assert_eq!(config.density.mode, DensityMode::InverseSquare);
        assert_eq!(config.movement.radius, 2);
        assert_eq!(config.clustering.absorb_min_neighbors, 2);
        assert_eq!(config.clustering.proximity_distance, None);
        assert_eq!(config.lifecycle.dissipation_steps, 4);
        assert!(config.simulation.stop_on_star);
        assert_eq!(config.logging.level, "debug");
        let sweep = config.sweep.as_ref().unwrap();
        assert_eq!(sweep.gas_probabilities, vec![0.05, 0.1]);
        assert_eq!(sweep.runs_per_density, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_yaml_uses_defaults() {
        let config = SimulationConfig::parse("{}").unwrap();
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn invalid_yaml_is_reported() {
        assert!(matches!(
            SimulationConfig::parse("world: [unclosed"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    fn field_of(config: &SimulationConfig) -> &'static str {
        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => field,
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn rejects_zero_size() {
        let mut config = SimulationConfig::default();
        config.world.size = 0;
        assert_eq!(field_of(&config), "world.size");
    }

    #[test]
    fn rejects_bad_occupancy() {
        let mut config = SimulationConfig::default();
        config.world.occupancy = vec![0.5, 0.6];
        assert_eq!(field_of(&config), "world.occupancy");
        config.world.occupancy = vec![1.0];
        assert_eq!(field_of(&config), "world.occupancy");
        config.world.occupancy = vec![1.5, -0.5];
        assert_eq!(field_of(&config), "world.occupancy");
    }

    #[test]
    fn rejects_oversized_thresholds() {
        let mut config = SimulationConfig::default();
        config.world.size = 5;
        config.density.radius = 2;
        config.clustering.radius = 2;
        config.lifecycle.formation_size = 26;
        assert_eq!(field_of(&config), "lifecycle.formation_size");
        config.lifecycle.formation_size = 25;
        config.clustering.proto_size = 0;
        assert_eq!(field_of(&config), "clustering.proto_size");
    }

    #[test]
    fn rejects_zero_durations() {
        let mut config = SimulationConfig::default();
        config.lifecycle.star_duration = 0;
        assert_eq!(field_of(&config), "lifecycle.star_duration");

        let mut config = SimulationConfig::default();
        config.lifecycle.dissipation_steps = 0;
        assert_eq!(field_of(&config), "lifecycle.dissipation_steps");
    }

    #[test]
    fn rejects_radius_wider_than_grid() {
        let mut config = SimulationConfig::default();
        config.world.size = 6;
        assert_eq!(field_of(&config), "density.radius");

        let mut config = SimulationConfig::default();
        config.movement.radius = 0;
        assert_eq!(field_of(&config), "movement.radius");
    }

    #[test]
    fn rejects_non_finite_proximity() {
        let mut config = SimulationConfig::default();
        config.clustering.proximity_distance = Some(f64::INFINITY);
        assert_eq!(field_of(&config), "clustering.proximity_distance");
        config.clustering.proximity_distance = Some(-1.0);
        assert_eq!(field_of(&config), "clustering.proximity_distance");
    }

    #[test]
    fn rejects_empty_sweep() {
        let mut config = SimulationConfig::default();
        config.sweep = Some(SweepConfig {
            gas_probabilities: Vec::new(),
            ..SweepConfig::default()
        });
        assert_eq!(field_of(&config), "sweep.gas_probabilities");
    }

    #[test]
    fn gas_probability_override() {
        let config = SimulationConfig::default().with_gas_probability(0.3, 9);
        assert!((config.gas_probability() - 0.3).abs() < 1e-12);
        assert_eq!(config.world.seed, 9);
        assert!(config.validate().is_ok());
    }
}
