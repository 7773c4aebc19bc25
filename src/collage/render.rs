//! Canvas composition - pastes ranked tiles into a centered grid

use image::{Rgb, RgbImage};

use super::error::ComposeError;
use crate::grid::{CanvasSize, GridSpec};
use crate::order::{placements, Layout};

/// Background shown wherever no tile covers the canvas.
const BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);

/// Offset of the grid's first cell along one axis.
///
/// Centers a grid of `extent` pixels over a canvas of `canvas` pixels.
/// Integer division truncates toward zero, so a 5px surplus gives an offset
/// of 2 and a 5px overhang gives -2.
pub fn centering_offset(canvas: u32, extent: u64) -> i64 {
    (i64::from(canvas) - extent as i64) / 2
}

/// Compose ranked tiles onto a new canvas.
///
/// `tiles[rank]` is the tile for that rank; every tile must already be
/// `tile_size x tile_size`. Tiles are pasted in the order returned by
/// [`placements`]: for [`Layout::Spiral`] the least popular tile goes first
/// and rank 0 last, for [`Layout::TopLeft`] rank 0 goes first.
///
/// Tiles hanging over the canvas edge are cropped; any uncovered border is
/// left black. No I/O is performed, and the same inputs always produce the
/// same pixels.
///
/// # Errors
///
/// Returns [`ComposeError::NotEnoughTiles`] when `tiles` is shorter than the
/// grid, and [`ComposeError::TileSizeMismatch`] for a tile that was not
/// normalized.
pub fn compose(
    grid: &GridSpec,
    canvas: CanvasSize,
    layout: Layout,
    tiles: &[RgbImage],
) -> super::Result<RgbImage> {
    compose_with_progress(grid, canvas, layout, tiles, |_, _| {})
}

/// [`compose`], calling `on_placed(pasted, total)` after each tile is pasted.
pub fn compose_with_progress<F>(
    grid: &GridSpec,
    canvas: CanvasSize,
    layout: Layout,
    tiles: &[RgbImage],
    mut on_placed: F,
) -> super::Result<RgbImage>
where
    F: FnMut(usize, usize),
{
    let required = grid.tiles_required();
    if tiles.len() < required {
        return Err(ComposeError::NotEnoughTiles { required, supplied: tiles.len() });
    }

    let tile_size = grid.tile_size();
    if let Some((rank, tile)) =
        tiles[..required].iter().enumerate().find(|(_, t)| t.dimensions() != (tile_size, tile_size))
    {
        return Err(ComposeError::TileSizeMismatch {
            rank,
            expected: tile_size,
            actual: tile.dimensions(),
        });
    }

    let (extent_w, extent_h) = grid.extent();
    let origin_x = centering_offset(canvas.width, extent_w);
    let origin_y = centering_offset(canvas.height, extent_h);
    let step = i64::from(tile_size);

    let mut image = RgbImage::from_pixel(canvas.width, canvas.height, BACKGROUND);

    for (i, placement) in placements(layout, grid).into_iter().enumerate() {
        let x = origin_x + i64::from(placement.coord.col()) * step;
        let y = origin_y + i64::from(placement.coord.row()) * step;
        image::imageops::replace(&mut image, &tiles[placement.rank], x, y);
        on_placed(i + 1, required);
    }

    Ok(image)
}
