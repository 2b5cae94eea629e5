//! Toroidal topology: wrapped offsets, neighbourhoods, and distances.
//!
//! The grid has no edges. Every coordinate computation wraps modulo the
//! side length, so a neighbourhood query at `(0, 0)` reaches `(N-1, N-1)`
//! and no lookup can fall off the grid.
//!
//! All methods take `self` by value; [`Torus`] is a single `usize`.

use serde::{Deserialize, Serialize};

use nebula_types::Position;

use crate::error::GridError;

/// The eight compass steps, as `(d_row, d_col)`.
pub const COMPASS: [(i64, i64); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

/// An `N x N` torus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Torus {
    /// Side length `N`.
    size: usize,
}

/// One cell of a neighbourhood, with its offset from the centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor {
    /// Wrapped coordinate of the neighbour.
    pub position: Position,
    /// Row offset from the centre, in `[-radius, radius]`.
    pub d_row: i64,
    /// Column offset from the centre, in `[-radius, radius]`.
    pub d_col: i64,
}

impl Neighbor {
    /// Squared Euclidean length of the offset. Never zero: the centre is
    /// not part of its own neighbourhood.
    pub const fn distance_squared(&self) -> i64 {
        self.d_row
            .saturating_mul(self.d_row)
            .saturating_add(self.d_col.saturating_mul(self.d_col))
    }
}

impl Torus {
    /// Create a torus with side length `size`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::ZeroSize`] for `size == 0` and
    /// [`GridError::TooLarge`] when `size * size` overflows.
    pub const fn new(size: usize) -> Result<Self, GridError> {
        if size == 0 {
            return Err(GridError::ZeroSize);
        }
        if size.checked_mul(size).is_none() {
            return Err(GridError::TooLarge { size });
        }
        Ok(Self { size })
    }

    /// Side length `N`.
    pub const fn size(self) -> usize {
        self.size
    }

    /// Total number of cells, `N * N`.
    pub const fn cell_count(self) -> usize {
        // Overflow is ruled out by the constructor.
        self.size.saturating_mul(self.size)
    }

    /// Whether `position` lies inside `[0, N) x [0, N)`.
    pub const fn contains(self, position: Position) -> bool {
        position.row < self.size && position.col < self.size
    }

    /// Row-major slot of `position`, if it lies on the grid.
    pub fn index_of(self, position: Position) -> Option<usize> {
        if !self.contains(position) {
            return None;
        }
        position
            .row
            .checked_mul(self.size)?
            .checked_add(position.col)
    }

    /// Position of the row-major slot `index`, if it lies on the grid.
    pub fn position_of(self, index: usize) -> Option<Position> {
        if index >= self.cell_count() {
            return None;
        }
        let row = index.checked_div(self.size)?;
        let col = index.checked_rem(self.size)?;
        Some(Position::new(row, col))
    }

    /// Every position, row-major.
    pub fn positions(self) -> impl Iterator<Item = Position> {
        let size = self.size;
        (0..size).flat_map(move |row| (0..size).map(move |col| Position::new(row, col)))
    }

    /// Move `position` by `(d_row, d_col)` with wraparound.
    pub fn offset(self, position: Position, d_row: i64, d_col: i64) -> Position {
        Position::new(
            wrap_coord(position.row, d_row, self.size),
            wrap_coord(position.col, d_col, self.size),
        )
    }

    /// Every cell within Chebyshev distance `radius` of `center`, excluding
    /// `center` itself, in row-major offset order (`d_row` outer, `d_col`
    /// inner, both from `-radius` to `radius`).
    ///
    /// When `2 * radius + 1 > N` offsets wrap onto the same cell more than
    /// once; configuration validation keeps radii below that bound.
    pub fn neighborhood(self, center: Position, radius: usize) -> impl Iterator<Item = Neighbor> {
        let reach = i64::try_from(radius).unwrap_or(0);
        let low = reach.saturating_neg();
        (low..=reach)
            .flat_map(move |d_row| (low..=reach).map(move |d_col| (d_row, d_col)))
            .filter(|&(d_row, d_col)| d_row != 0 || d_col != 0)
            .map(move |(d_row, d_col)| Neighbor {
                position: self.offset(center, d_row, d_col),
                d_row,
                d_col,
            })
    }

    /// Shortest signed displacement `to - from` on each axis, taking the
    /// wraparound into account. Each component lies in `(-N/2, N/2]`.
    pub fn displacement(self, from: Position, to: Position) -> (i64, i64) {
        (
            axis_delta(from.row, to.row, self.size),
            axis_delta(from.col, to.col, self.size),
        )
    }

    /// Euclidean distance between two cells along the shortest wrapped path.
    pub fn distance(self, a: Position, b: Position) -> f64 {
        let (d_row, d_col) = self.displacement(a, b);
        let squared = d_row
            .saturating_mul(d_row)
            .saturating_add(d_col.saturating_mul(d_col));
        lossless_f64(squared).sqrt()
    }
}

/// Wrap `coord + delta` into `[0, size)`.
fn wrap_coord(coord: usize, delta: i64, size: usize) -> usize {
    let modulus = i64::try_from(size).unwrap_or(i64::MAX);
    let start = i64::try_from(coord).unwrap_or(0);
    let wrapped = start
        .wrapping_add(delta)
        .checked_rem_euclid(modulus)
        .unwrap_or(0);
    usize::try_from(wrapped).unwrap_or(0)
}

/// Signed minimal-image difference `to - from` on a ring of `size` cells.
fn axis_delta(from: usize, to: usize, size: usize) -> i64 {
    let modulus = i64::try_from(size).unwrap_or(i64::MAX);
    let from = i64::try_from(from).unwrap_or(0);
    let to = i64::try_from(to).unwrap_or(0);
    let forward = to
        .wrapping_sub(from)
        .checked_rem_euclid(modulus)
        .unwrap_or(0);
    if forward.saturating_mul(2) > modulus {
        forward.saturating_sub(modulus)
    } else {
        forward
    }
}

/// Convert a grid-scale integer to `f64`. Grid distances are far below
/// 2^31, so the `i32` route is exact.
fn lossless_f64(value: i64) -> f64 {
    i32::try_from(value).map_or(f64::from(i32::MAX), f64::from)
}
