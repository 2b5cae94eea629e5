//! Toroidal grid topology and cell storage for the Nebula automaton.
//!
//! Everything spatial lives here and nothing else: wrapped coordinates,
//! neighbourhood iteration, minimal-image displacement, flat row-major
//! storage, and the density field derived from a state snapshot. The crate
//! knows nothing about agents or groups.
//!
//! # Modules
//!
//! - [`torus`] -- Wrapped offsets, neighbourhoods, displacement ([`Torus`])
//! - [`cell_grid`] -- One value per cell, row-major ([`CellGrid`])
//! - [`density`] -- Density modes and fields ([`DensityMode`], [`density_field`])
//! - [`error`] -- Construction errors ([`GridError`])

pub mod cell_grid;
pub mod density;
pub mod error;
pub mod torus;

pub use cell_grid::CellGrid;
pub use density::{DensityField, DensityMode, density_at, density_field};
pub use error::GridError;
pub use torus::{COMPASS, Neighbor, Torus};
