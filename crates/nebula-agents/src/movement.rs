//! Movement rules: the density-biased walk and the dispersal walk.
//!
//! Both functions only *propose* a destination. The tick cycle commits a
//! proposal when the destination is still empty in the write buffer and
//! otherwise leaves the agent where it is.
//!
//! # Biased walk
//!
//! Every cell of the movement neighbourhood (the origin excluded) is a
//! candidate weighted by its density. With masking on, candidates occupied
//! in the pre-move snapshot weigh zero. A zero total falls back to a
//! uniform pick. Either way exactly one random draw is consumed.
//!
//! # Dispersal walk
//!
//! A dissipating agent steps one cell along the sign of its shortest
//! wrapped displacement from the group centroid. An agent sitting on the
//! centroid picks one of the eight compass directions at random.

use rand::Rng;

use nebula_grid::{COMPASS, CellGrid, DensityField, Torus};
use nebula_types::{CellState, Position};

/// Propose a destination for a gas, forming, or star agent at `origin`.
///
/// `snapshot` is the state of every cell before anyone moved this tick.
/// Returns `origin` only when the neighbourhood is empty (radius 0).
pub fn propose_move<R: Rng + ?Sized>(
    origin: Position,
    radius: usize,
    density: &DensityField,
    snapshot: &CellGrid<CellState>,
    mask_occupied: bool,
    rng: &mut R,
) -> Position {
    let candidates: Vec<(Position, f64)> = density
        .torus()
        .neighborhood(origin, radius)
        .map(|neighbor| {
            let occupied = snapshot
                .get(neighbor.position)
                .is_some_and(|state| state.is_occupied());
            let weight = if mask_occupied && occupied {
                0.0
            } else {
                density.get(neighbor.position).copied().unwrap_or(0.0)
            };
            (neighbor.position, weight)
        })
        .collect();

    if candidates.is_empty() {
        return origin;
    }

    let total: f64 = candidates.iter().map(|(_, weight)| weight).sum();
    if total <= 0.0 || !total.is_finite() {
        let pick = rng.random_range(0..candidates.len());
        return candidates.get(pick).map_or(origin, |(position, _)| *position);
    }

    let target = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    let mut last_positive = origin;
    for &(position, weight) in &candidates {
        if weight <= 0.0 {
            continue;
        }
        cumulative += weight;
        last_positive = position;
        if target < cumulative {
            return position;
        }
    }
    // Rounding can leave `target` a hair above the final cumulative sum.
    last_positive
}

/// Propose the next cell of a dissipating agent's walk away from `center`.
pub fn dissipation_step<R: Rng + ?Sized>(
    torus: Torus,
    position: Position,
    center: Position,
    rng: &mut R,
) -> Position {
    let (d_row, d_col) = torus.displacement(center, position);
    let (step_row, step_col) = if d_row == 0 && d_col == 0 {
        let pick = rng.random_range(0..COMPASS.len());
        COMPASS.get(pick).copied().unwrap_or((0, 1))
    } else {
        (d_row.signum(), d_col.signum())
    };
    torus.offset(position, step_row, step_col)
}
