//! Error types for the board engine.

/// Errors that can occur while building or mutating a board.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// Boards need at least one cell.
    #[error("board size must be at least 1")]
    ZeroSize,

    /// The free cell sits at the exact centre, which only exists for odd sizes.
    #[error("board size must be odd, got {0}")]
    EvenSize(usize),

    /// The vocabulary cannot fill every non-free cell with a distinct value.
    #[error("vocabulary has {available} values, board needs {needed}")]
    PoolTooSmall { needed: usize, available: usize },

    /// The addressed cell lies outside the board.
    #[error("cell ({x}, {y}) is outside a {size}x{size} board")]
    OutOfBounds { x: usize, y: usize, size: usize },
}
