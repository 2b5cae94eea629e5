//! Lifecycle thresholds shared by every group.
//!
//! These values correspond to the `lifecycle` section of
//! `nebula-config.yaml`. The [`LifecycleConfig`] struct bundles the
//! thresholds so callers (tick cycle, tests) can override defaults.

use serde::{Deserialize, Serialize};

/// Thresholds driving the `Forming -> Star -> Dissipating -> Gas` cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Minimum members a forming group needs to ignite (default: 50).
    pub formation_size: usize,

    /// Ticks a forming group spends before it may ignite (default: 10).
    pub star_duration: u32,

    /// Ticks a star burns before its members disperse (default: 30).
    pub dissipation_duration: u32,

    /// Ticks a dispersing agent walks before reverting to gas (default: 10).
    pub dissipation_steps: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            formation_size: 50,
            star_duration: 10,
            dissipation_duration: 30,
            dissipation_steps: 10,
        }
    }
}

impl LifecycleConfig {
    /// Whether a forming group of `size` members that has spent `steps`
    /// ticks forming meets the ignition condition.
    pub const fn ignition_met(&self, size: usize, steps: u32) -> bool {
        steps >= self.star_duration && size >= self.formation_size
    }

    /// Whether a star that has burned for `steps` ticks should dissipate.
    pub const fn dissipation_met(&self, steps: u32) -> bool {
        steps >= self.dissipation_duration
    }
}
