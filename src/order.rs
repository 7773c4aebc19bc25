//! Tile orderings - map popularity rank to grid cells
//!
//! Two traversals are provided:
//! - [`spiral`]: clockwise inward spiral starting at the top-left corner
//! - [`column_major`]: columns left to right, each column top to bottom
//!
//! The traversals only produce coordinates. Which rank lands on which
//! coordinate is decided by [`placements`], which for the spiral layout
//! walks the ranks backwards via [`rank_spiral`] so that rank 0 ends up in
//! the innermost cell.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::grid::{Coordinate, GridSpec};

/// Arrangement of tiles on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Most popular tiles nearest the center, following an inward spiral
    Spiral,
    /// Most popular tiles at the top-left, filling column by column
    #[default]
    #[value(name = "topleft")]
    TopLeft,
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Layout::Spiral => write!(f, "spiral"),
            Layout::TopLeft => write!(f, "topleft"),
        }
    }
}

/// A tile rank paired with the cell it is pasted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub rank: usize,
    pub coord: Coordinate,
}

/// Generate the cells of a `rows x cols` grid as a clockwise inward spiral.
///
/// Starts at `(0, 0)`, walks the top row, the right column, the bottom row
/// backwards and the left column upwards, then shrinks the bounds and
/// repeats. Returns `rows * cols` distinct coordinates; empty if either
/// dimension is zero.
///
/// # Examples
///
/// ```
/// use fmcollage::order::spiral;
///
/// let cells: Vec<(u32, u32)> = spiral(2, 2).into_iter().map(Into::into).collect();
/// assert_eq!(cells, vec![(0, 0), (0, 1), (1, 1), (1, 0)]);
/// ```
pub fn spiral(rows: u32, cols: u32) -> Vec<Coordinate> {
    let mut result = Vec::with_capacity(rows as usize * cols as usize);

    // Signed bounds: max_row/max_col drop below min on the last lap
    let mut min_row = 0i64;
    let mut max_row = i64::from(rows) - 1;
    let mut min_col = 0i64;
    let mut max_col = i64::from(cols) - 1;

    let cell = |row: i64, col: i64| Coordinate::new(row as u32, col as u32);

    while min_row <= max_row && min_col <= max_col {
        for col in min_col..=max_col {
            result.push(cell(min_row, col));
        }
        min_row += 1;

        for row in min_row..=max_row {
            result.push(cell(row, max_col));
        }
        max_col -= 1;

        // Guards keep single-row and single-column laps from re-emitting cells
        if min_row <= max_row {
            for col in (min_col..=max_col).rev() {
                result.push(cell(max_row, col));
            }
        }
        max_row -= 1;

        if min_col <= max_col {
            for row in (min_row..=max_row).rev() {
                result.push(cell(row, min_col));
            }
        }
        min_col += 1;
    }

    result
}

/// Generate the cells of a `rows x cols` grid column by column.
///
/// # Examples
///
/// ```
/// use fmcollage::order::column_major;
///
/// let cells: Vec<(u32, u32)> = column_major(2, 3).into_iter().map(Into::into).collect();
/// assert_eq!(cells, vec![(0, 0), (1, 0), (0, 1), (1, 1), (0, 2), (1, 2)]);
/// ```
pub fn column_major(rows: u32, cols: u32) -> Vec<Coordinate> {
    (0..cols).flat_map(|col| (0..rows).map(move |row| Coordinate::new(row, col))).collect()
}

/// Assign ranks to spiral cells so the last cell visited gets rank 0.
///
/// The spiral walks from the corner inward; the collage wants the most
/// popular tile at the center. The i-th cell of an `n`-cell spiral gets rank
/// `n - 1 - i`, so iterating the result pastes ranks from `n - 1` down to 0.
pub fn rank_spiral(cells: Vec<Coordinate>) -> Vec<Placement> {
    let total = cells.len();
    cells
        .into_iter()
        .enumerate()
        .map(|(i, coord)| Placement { rank: total - 1 - i, coord })
        .collect()
}

/// Assign ranks in traversal order: the first cell gets rank 0.
pub fn rank_in_order(cells: Vec<Coordinate>) -> Vec<Placement> {
    cells.into_iter().enumerate().map(|(rank, coord)| Placement { rank, coord }).collect()
}

/// Placements for a grid in the order tiles are pasted.
pub fn placements(layout: Layout, grid: &GridSpec) -> Vec<Placement> {
    match layout {
        Layout::Spiral => rank_spiral(spiral(grid.rows(), grid.cols())),
        Layout::TopLeft => rank_in_order(column_major(grid.rows(), grid.cols())),
    }
}
