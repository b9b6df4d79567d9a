use thiserror::Error;

pub type SolverResult<T> = Result<T, SolverError>;

/// Misuse of the solver API. Every variant is detected before the first pass
/// over the grid, so a failed call never leaves a half-written buffer behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolverError {
    #[error("grid of {width}x{height} cells has no interior (width and height must be at least 3)")]
    InvalidDimension { width: usize, height: usize },

    #[error("buffer `{buffer}` has length {actual}, expected {expected}")]
    BufferSizeMismatch {
        buffer: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Only reachable through [`FieldArena`](crate::FieldArena): slice based
    /// functions take `&mut` destinations, so the borrow checker already rules
    /// aliasing out there.
    #[error("{operation}: destination field must not be one of its sources")]
    AliasedBuffers { operation: &'static str },

    #[error("field slot {slot} does not belong to this arena")]
    UnknownField { slot: usize },
}
