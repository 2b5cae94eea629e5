//! Error types for the `nebula-grid` crate.

/// Errors that can occur while building grids.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GridError {
    /// A torus needs at least one cell per side.
    #[error("grid size must be at least 1")]
    ZeroSize,

    /// `size * size` does not fit in `usize`.
    #[error("grid size {size} overflows the cell count")]
    TooLarge {
        /// The requested side length.
        size: usize,
    },

    /// A cell vector does not match the grid's cell count.
    #[error("expected {expected} cells, got {actual}")]
    CellCountMismatch {
        /// `size * size`.
        expected: usize,
        /// Length of the supplied vector.
        actual: usize,
    },
}
