//! Error types for collage composition

use thiserror::Error;

/// Precondition violated when composing a collage.
///
/// Both variants indicate a bug in whatever assembled the tile list; the
/// composer never tries to recover from them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    /// Fewer tiles were supplied than the grid has cells
    #[error("Collage needs {required} tiles but only {supplied} were supplied")]
    NotEnoughTiles { required: usize, supplied: usize },
    /// A tile was not normalized to the grid's tile size
    #[error("Tile of rank {rank} is {actual_w}x{actual_h}, expected {expected}x{expected}", actual_w = actual.0, actual_h = actual.1)]
    TileSizeMismatch { rank: usize, expected: u32, actual: (u32, u32) },
}
