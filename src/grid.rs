//! Grid geometry for a collage
//!
//! A [`GridSpec`] is derived once per run from the requested canvas size and
//! tile size, and stays immutable afterwards. [`Coordinate`] values are only
//! produced by the orderings in [`crate::order`].

use thiserror::Error;

/// Error raised when a grid cannot be built from the given dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// Rows, columns, tile size or a canvas dimension was zero
    #[error("Invalid grid: {rows} rows x {cols} cols with {tile_size}px tiles (all must be positive)")]
    InvalidGridSpec { rows: u32, cols: u32, tile_size: u32 },
    /// The canvas has a zero dimension
    #[error("Invalid canvas size {width}x{height} (both dimensions must be positive)")]
    InvalidCanvas { width: u32, height: u32 },
    /// rows * cols does not fit in memory-addressable space
    #[error("Grid of {rows} rows x {cols} cols needs more tiles than can be addressed")]
    TooManyTiles { rows: u32, cols: u32 },
}

/// Pixel dimensions of the output canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    /// Create a canvas size, rejecting zero dimensions.
    pub fn new(width: u32, height: u32) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::InvalidCanvas { width, height });
        }
        Ok(Self { width, height })
    }
}

/// Row/column count and tile size for a collage.
///
/// Invariant: `rows > 0`, `cols > 0`, `tile_size > 0`, and `rows * cols`
/// fits in a `usize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpec {
    rows: u32,
    cols: u32,
    tile_size: u32,
}

impl GridSpec {
    /// Create a grid with an explicit shape.
    pub fn new(rows: u32, cols: u32, tile_size: u32) -> Result<Self, GridError> {
        if rows == 0 || cols == 0 || tile_size == 0 {
            return Err(GridError::InvalidGridSpec { rows, cols, tile_size });
        }
        (rows as usize)
            .checked_mul(cols as usize)
            .ok_or(GridError::TooManyTiles { rows, cols })?;
        Ok(Self { rows, cols, tile_size })
    }

    /// Derive the grid needed to cover a canvas with square tiles.
    ///
    /// Uses ceiling division on both axes, so the grid may overhang the
    /// canvas by less than one tile.
    ///
    /// # Examples
    ///
    /// ```
    /// use fmcollage::grid::{CanvasSize, GridSpec};
    ///
    /// let canvas = CanvasSize::new(1920, 1080).unwrap();
    /// let grid = GridSpec::for_canvas(canvas, 300).unwrap();
    /// assert_eq!((grid.rows(), grid.cols()), (4, 7));
    /// assert_eq!(grid.tiles_required(), 28);
    /// ```
    pub fn for_canvas(canvas: CanvasSize, tile_size: u32) -> Result<Self, GridError> {
        if tile_size == 0 {
            return Err(GridError::InvalidGridSpec { rows: 0, cols: 0, tile_size });
        }
        let cols = canvas.width.div_ceil(tile_size);
        let rows = canvas.height.div_ceil(tile_size);
        Self::new(rows, cols, tile_size)
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Exact number of tiles the acquisition pipeline must supply.
    pub fn tiles_required(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Total pixel extent of the grid as `(width, height)`.
    pub fn extent(&self) -> (u64, u64) {
        (
            u64::from(self.cols) * u64::from(self.tile_size),
            u64::from(self.rows) * u64::from(self.tile_size),
        )
    }
}

/// A cell in the grid, 0-indexed from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate {
    row: u32,
    col: u32,
}

impl Coordinate {
    pub(crate) fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn col(&self) -> u32 {
        self.col
    }
}

impl From<Coordinate> for (u32, u32) {
    fn from(coord: Coordinate) -> Self {
        (coord.row, coord.col)
    }
}
