//! Row-major storage of one value per cell.
//!
//! [`CellGrid`] is the single storage shape used by the automaton: the
//! occupancy grid of agent handles, the pre-move state snapshot, and the
//! density field are all `CellGrid`s over the same [`Torus`].

use nebula_types::Position;

use crate::error::GridError;
use crate::torus::Torus;

/// One `T` per cell of a torus.
#[derive(Debug, Clone, PartialEq)]
pub struct CellGrid<T> {
    /// Shape of the grid.
    torus: Torus,
    /// `N * N` values, row-major.
    cells: Vec<T>,
}

impl<T: Clone> CellGrid<T> {
    /// A grid with every cell set to `value`.
    pub fn filled(torus: Torus, value: T) -> Self {
        Self {
            torus,
            cells: vec![value; torus.cell_count()],
        }
    }

    /// Overwrite every cell with the contents of `other`, reusing this
    /// grid's allocation. Used to reset a back buffer from the front one.
    pub fn copy_from(&mut self, other: &Self) {
        self.torus = other.torus;
        self.cells.clone_from(&other.cells);
    }
}

impl<T> CellGrid<T> {
    /// Wrap an existing row-major vector.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::CellCountMismatch`] if `cells.len() != N * N`.
    pub fn from_cells(torus: Torus, cells: Vec<T>) -> Result<Self, GridError> {
        let expected = torus.cell_count();
        if cells.len() != expected {
            return Err(GridError::CellCountMismatch {
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self { torus, cells })
    }

    /// Build a grid by evaluating `init` at every position, row-major.
    pub fn from_fn(torus: Torus, mut init: impl FnMut(Position) -> T) -> Self {
        let cells = torus.positions().map(&mut init).collect();
        Self { torus, cells }
    }

    /// Shape of the grid.
    pub const fn torus(&self) -> Torus {
        self.torus
    }

    /// Side length `N`.
    pub const fn size(&self) -> usize {
        self.torus.size()
    }

    /// Value at `position`.
    pub fn get(&self, position: Position) -> Option<&T> {
        self.cells.get(self.torus.index_of(position)?)
    }

    /// Mutable value at `position`.
    pub fn get_mut(&mut self, position: Position) -> Option<&mut T> {
        let index = self.torus.index_of(position)?;
        self.cells.get_mut(index)
    }

    /// Replace the value at `position`, returning the previous one.
    pub fn set(&mut self, position: Position, value: T) -> Option<T> {
        self.get_mut(position)
            .map(|slot| core::mem::replace(slot, value))
    }

    /// Exchange the values at two positions. Returns `false` if either
    /// position is off the grid.
    pub fn swap(&mut self, a: Position, b: Position) -> bool {
        match (self.torus.index_of(a), self.torus.index_of(b)) {
            (Some(i), Some(j)) => {
                self.cells.swap(i, j);
                true
            }
            _ => false,
        }
    }

    /// All values, row-major.
    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    /// `(position, value)` pairs, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &T)> {
        self.torus.positions().zip(self.cells.iter())
    }

    /// A grid of the same shape holding `f(value)` for every cell.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> CellGrid<U> {
        CellGrid {
            torus: self.torus,
            cells: self.cells.iter().map(f).collect(),
        }
    }

    /// Consume the grid, returning the row-major values.
    pub fn into_cells(self) -> Vec<T> {
        self.cells
    }
}
