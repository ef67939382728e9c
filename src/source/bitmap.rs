use anyhow::{Context, Result, bail};
use image::{DynamicImage, GrayImage, Luma, imageops, imageops::FilterType};
use std::path::Path;

use super::{Fit, Overflow, Rendered};
use crate::grid::{DAYS, Grid, Shading};

pub fn load_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).with_context(|| format!("failed to load image {}", path.display()))
}

/// Luma channel with transparency composited over white.
fn flatten(img: &DynamicImage) -> GrayImage {
    let la = img.to_luma_alpha8();
    GrayImage::from_fn(la.width(), la.height(), |x, y| {
        let [l, a] = la.get_pixel(x, y).0;
        let ink = u16::from(255 - l) * u16::from(a) / 255;
        Luma([255 - ink as u8])
    })
}

pub fn grid_from_image(
    img: &DynamicImage,
    weeks: usize,
    overflow: Overflow,
    shading: &Shading,
) -> Result<Rendered> {
    grid_from_luma(&flatten(img), weeks, overflow, shading)
}

/// Downsample a grayscale picture into a `weeks` x 7 grid.
///
/// Dark pixels become high levels. With [`Overflow::Scale`] the picture is
/// stretched to the full span; with [`Overflow::Truncate`] it keeps its
/// aspect ratio at 7 rows and is cut or padded on the right.
pub fn grid_from_luma(
    gray: &GrayImage,
    weeks: usize,
    overflow: Overflow,
    shading: &Shading,
) -> Result<Rendered> {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        bail!("image is empty ({}x{})", w, h);
    }
    let rows = DAYS as u32;
    let native = ((f64::from(w) * f64::from(rows) / f64::from(h)).round() as u32).max(1);

    let target_w = match overflow {
        Overflow::Scale => weeks as u32,
        Overflow::Truncate => native,
    };
    let resized = if (w, h) == (target_w, rows) {
        gray.clone()
    } else {
        imageops::resize(gray, target_w, rows, FilterType::Lanczos3)
    };

    let mut grid = Grid::new(weeks);
    for (x, y, px) in resized.enumerate_pixels() {
        if (x as usize) < weeks {
            grid.set(y as usize, x as usize, shading.level_for_luma(px.0[0]));
        }
    }

    Ok(Rendered {
        grid,
        fit: Fit {
            policy: overflow,
            source_columns: native as usize,
            weeks,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn stripes(w: u32, h: u32) -> GrayImage {
        // black left half, white right half
        GrayImage::from_fn(w, h, |x, _| if x < w / 2 { Luma([0]) } else { Luma([255]) })
    }

    #[test]
    fn truncate_keeps_native_width_at_seven_rows() {
        let r =
            grid_from_luma(&stripes(20, 7), 52, Overflow::Truncate, &Shading::default()).unwrap();
        assert_eq!(r.fit.source_columns, 20);
        assert_eq!(r.fit.dropped_columns(), 0);
        for day in 0..DAYS {
            assert_eq!(r.grid.get(day, 0), 4);
            assert_eq!(r.grid.get(day, 9), 4);
            assert_eq!(r.grid.get(day, 10), 0);
            assert_eq!(r.grid.get(day, 30), 0);
        }
    }

    #[test]
    fn truncate_reports_dropped_columns() {
        let r =
            grid_from_luma(&stripes(60, 7), 52, Overflow::Truncate, &Shading::default()).unwrap();
        assert_eq!(r.grid.weeks(), 52);
        assert_eq!(r.fit.dropped_columns(), 8);
    }

    #[test]
    fn scale_fills_the_span() {
        let r =
            grid_from_luma(&stripes(200, 70), 52, Overflow::Scale, &Shading::default()).unwrap();
        assert_eq!(r.fit.source_columns, 20);
        assert_eq!(r.grid.get(3, 0), 4);
        assert_eq!(r.grid.get(3, 51), 0);
        assert!(r.fit.describe().is_some());
    }

    #[test]
    fn transparent_pixels_count_as_white() {
        let mut img = RgbaImage::from_pixel(7, 7, Rgba([0, 0, 0, 0]));
        img.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        let r = grid_from_image(
            &DynamicImage::ImageRgba8(img),
            52,
            Overflow::Truncate,
            &Shading::default(),
        )
        .unwrap();
        assert_eq!(r.grid.active_cells().collect::<Vec<_>>(), vec![(0, 0, 4)]);
    }

    #[test]
    fn gray_levels_follow_shading() {
        let img = GrayImage::from_fn(4, 7, |x, _| Luma([[200u8, 120, 60, 0][x as usize]]));
        let r = grid_from_luma(&img, 4, Overflow::Truncate, &Shading::default()).unwrap();
        let levels: Vec<u8> = (0..4).map(|w| r.grid.get(0, w)).collect();
        assert_eq!(levels, vec![0, 2, 3, 4]);
    }

    #[test]
    fn load_image_reads_png_from_disk() {
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("dot.png");
        stripes(14, 7).save(&path).unwrap();
        let img = load_image(&path).unwrap();
        assert_eq!((img.width(), img.height()), (14, 7));
    }
}
