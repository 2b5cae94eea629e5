//! Density fields over a state snapshot.
//!
//! The density of a cell is a weighted count of the non-empty cells around
//! it within a fixed radius. The movement phase reads the field to bias
//! each agent's step towards crowded regions.
//!
//! # Modes
//!
//! | Mode             | Contribution of a non-empty neighbour at offset `(dr, dc)` |
//! |------------------|-------------------------------------------------------------|
//! | `count`          | `1`                                                         |
//! | `state_weighted` | the neighbour's state code (gas 1, forming 2, ...)          |
//! | `inverse_square` | `1 / (dr^2 + dc^2)`                                         |
//!
//! The field is always computed from the snapshot taken before any agent
//! moves, so the result does not depend on traversal order.

use serde::{Deserialize, Serialize};

use nebula_types::{CellState, Position};

use crate::cell_grid::CellGrid;
use crate::torus::Neighbor;

/// Per-cell density values.
pub type DensityField = CellGrid<f64>;

/// How neighbours contribute to a cell's density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DensityMode {
    /// Every non-empty neighbour counts 1.
    #[default]
    Count,
    /// Every non-empty neighbour counts its state code.
    StateWeighted,
    /// Every non-empty neighbour counts the inverse of its squared distance.
    InverseSquare,
}

impl DensityMode {
    /// Whether occupied destinations get zero weight during movement.
    ///
    /// The state-weighted mode was tuned without masking and leaves every
    /// candidate's weight as computed.
    pub const fn masks_occupied(self) -> bool {
        !matches!(self, Self::StateWeighted)
    }

    /// Weight contributed by a neighbour in `state` at `neighbor`'s offset.
    fn contribution(self, state: CellState, neighbor: &Neighbor) -> f64 {
        if !state.is_occupied() {
            return 0.0;
        }
        match self {
            Self::Count => 1.0,
            Self::StateWeighted => state.weight(),
            Self::InverseSquare => {
                let squared = i32::try_from(neighbor.distance_squared()).unwrap_or(i32::MAX);
                f64::from(squared).recip()
            }
        }
    }
}

/// Density of the single cell at `position`.
pub fn density_at(
    states: &CellGrid<CellState>,
    position: Position,
    radius: usize,
    mode: DensityMode,
) -> f64 {
    states
        .torus()
        .neighborhood(position, radius)
        .map(|neighbor| {
            let state = states
                .get(neighbor.position)
                .copied()
                .unwrap_or_default();
            mode.contribution(state, &neighbor)
        })
        .sum()
}

/// Density of every cell of `states`.
pub fn density_field(states: &CellGrid<CellState>, radius: usize, mode: DensityMode) -> DensityField {
    CellGrid::from_fn(states.torus(), |position| {
        density_at(states, position, radius, mode)
    })
}
