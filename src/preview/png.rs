use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use std::path::Path;

use super::PALETTE;
use crate::grid::{DAYS, Grid};

const CELL: u32 = 10;
const GAP: u32 = 3;
const MARGIN: u32 = 8;
const BACKGROUND: Rgb<u8> = Rgb([13, 17, 23]);

/// Draw the grid as GitHub would, one rounded-off square per day.
pub fn save_png(grid: &Grid, path: &Path) -> Result<()> {
    let pitch = CELL + GAP;
    let width = MARGIN * 2 + grid.weeks() as u32 * pitch - GAP;
    let height = MARGIN * 2 + DAYS as u32 * pitch - GAP;

    let mut img = RgbImage::from_pixel(width, height, BACKGROUND);
    for (week, col) in grid.columns().iter().enumerate() {
        for (day, &level) in col.iter().enumerate() {
            let (r, g, b) = PALETTE[usize::from(level).min(PALETTE.len() - 1)];
            let x0 = MARGIN + week as u32 * pitch;
            let y0 = MARGIN + day as u32 * pitch;
            for y in 0..CELL {
                for x in 0..CELL {
                    let corner = (x == 0 || x == CELL - 1) && (y == 0 || y == CELL - 1);
                    if !corner {
                        img.put_pixel(x0 + x, y0 + y, Rgb([r, g, b]));
                    }
                }
            }
        }
    }

    img.save(path)
        .with_context(|| format!("failed to write {}", path.display()))
}
