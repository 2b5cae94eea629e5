//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup, a single run, or a sweep.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: nebula_core::config::ConfigError,
    },

    /// The automaton could not be built.
    #[error("automaton error: {source}")]
    Automaton {
        /// The underlying automaton error.
        #[from]
        source: nebula_core::automaton::AutomatonError,
    },

    /// Simulation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: nebula_core::runner::RunnerError,
    },

    /// The density sweep failed.
    #[error("sweep error: {source}")]
    Sweep {
        /// The underlying sweep error.
        #[from]
        source: nebula_core::sweep::SweepError,
    },

    /// A report could not be serialized.
    #[error("report error: {source}")]
    Report {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}
