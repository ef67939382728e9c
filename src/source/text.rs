use anyhow::{Context, Result, bail};
use image::{GrayImage, Luma, imageops};
use rusttype::{Font, Scale, point};
use std::fs;
use std::path::Path;

use super::font::{GLYPH_WIDTH, glyph, supported_chars};
use super::{Overflow, Rendered, grid_from_luma};
use crate::grid::{DAYS, Shading};

/// Pixel height TrueType text is rasterized at before downsampling.
const TTF_RENDER_PX: f32 = 48.0;

/// Rasterize `text` and fit it into a `weeks` x 7 grid.
///
/// Without a font the built-in 5x7 pixel font is used; otherwise the text is
/// drawn with the TrueType font at `font` and downsampled like an image.
pub fn render_text(
    text: &str,
    font: Option<&Path>,
    weeks: usize,
    overflow: Overflow,
    shading: &Shading,
) -> Result<Rendered> {
    let gray = match font {
        Some(path) => ttf_to_luma(text.trim(), path)?,
        None => text_to_luma(text.trim())?,
    };
    grid_from_luma(&gray, weeks, overflow, shading)
}

/// Draw `text` with the built-in font: black ink on white, 7 rows high,
/// one blank column between glyphs.
pub fn text_to_luma(text: &str) -> Result<GrayImage> {
    let unsupported: String = text.chars().filter(|c| glyph(*c).is_none()).collect();
    if !unsupported.is_empty() {
        bail!(
            "unsupported characters {:?} (built-in font has {}; pass --font for anything else)",
            unsupported,
            supported_chars()
        );
    }

    let glyphs: Vec<[u8; 7]> = text.chars().filter_map(glyph).collect();
    if glyphs.is_empty() {
        bail!("text is empty");
    }
    let width = glyphs.len() * (GLYPH_WIDTH + 1) - 1;

    let mut img = GrayImage::from_pixel(width as u32, DAYS as u32, Luma([255]));
    for (i, rows) in glyphs.iter().enumerate() {
        let x0 = i * (GLYPH_WIDTH + 1);
        for (y, bits) in rows.iter().enumerate() {
            for dx in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - dx)) != 0 {
                    img.put_pixel((x0 + dx) as u32, y as u32, Luma([0]));
                }
            }
        }
    }
    Ok(img)
}

/// Draw `text` with a TrueType font and crop to the inked area.
fn ttf_to_luma(text: &str, font_path: &Path) -> Result<GrayImage> {
    let data = fs::read(font_path)
        .with_context(|| format!("failed to read font {}", font_path.display()))?;
    let font = Font::try_from_vec(data)
        .with_context(|| format!("not a usable TrueType font: {}", font_path.display()))?;

    let scale = Scale::uniform(TTF_RENDER_PX);
    let v = font.v_metrics(scale);
    let glyphs: Vec<_> = font.layout(text, scale, point(0.0, v.ascent)).collect();

    let width = glyphs
        .iter()
        .filter_map(|g| g.pixel_bounding_box())
        .map(|bb| bb.max.x)
        .max()
        .unwrap_or(0)
        .max(1) as u32;
    let height = (v.ascent - v.descent).ceil().max(1.0) as u32;

    let mut canvas = GrayImage::from_pixel(width, height, Luma([255]));
    for g in &glyphs {
        if let Some(bb) = g.pixel_bounding_box() {
            g.draw(|x, y, coverage| {
                let px = x as i32 + bb.min.x;
                let py = y as i32 + bb.min.y;
                if px >= 0 && py >= 0 && (px as u32) < width && (py as u32) < height {
                    let ink = (coverage.clamp(0.0, 1.0) * 255.0) as u8;
                    let pixel = canvas.get_pixel_mut(px as u32, py as u32);
                    pixel.0[0] = pixel.0[0].min(255 - ink);
                }
            });
        }
    }

    crop_to_ink(&canvas).context("text renders no visible pixels")
}

fn crop_to_ink(img: &GrayImage) -> Option<GrayImage> {
    let inked = img.enumerate_pixels().filter(|(_, _, p)| p.0[0] < 255);
    let (mut x0, mut y0, mut x1, mut y1) = (u32::MAX, u32::MAX, 0, 0);
    let mut any = false;
    for (x, y, _) in inked {
        any = true;
        x0 = x0.min(x);
        y0 = y0.min(y);
        x1 = x1.max(x);
        y1 = y1.max(y);
    }
    if !any {
        return None;
    }
    Some(imageops::crop_imm(img, x0, y0, x1 - x0 + 1, y1 - y0 + 1).to_image())
}
