//! Embedded image extraction
//!
//! Images are cropped from a page render at their placed bounds and
//! returned as base64 PNG. Tiny placements (bullets, rules) are skipped.

use base64::{engine::general_purpose::STANDARD, Engine};
use image::imageops;
use serde::Serialize;

use crate::pdf::{dpi_to_scale, encode_image, ImageFormat, PageMap, PdfParser, Rect, Result};

/// Crops smaller than this many pixels on a side are dropped
const MIN_IMAGE_PIXELS: u32 = 4;

/// An image cropped out of a page render
#[derive(Debug, Serialize)]
pub struct ExtractedImage {
    /// Position among the page's image blocks
    pub index: usize,
    pub bbox: Rect,
    pub width: u32,
    pub height: u32,
    pub format: &'static str,
    /// Base64-encoded PNG
    pub data: String,
}

/// Images of every page, cropped from a render at `dpi`
pub fn extract_images(parser: &PdfParser, dpi: u32) -> Result<PageMap<Vec<ExtractedImage>>> {
    let scale = dpi_to_scale(dpi);

    (0..parser.page_count())
        .map(|page| {
            let bounds = parser.image_bounds(page)?;
            if bounds.is_empty() {
                return Ok(Vec::new());
            }

            let render = parser.render_rgb(page, dpi)?;
            let mut images = Vec::with_capacity(bounds.len());

            for (index, bbox) in bounds.into_iter().enumerate() {
                let px = bbox.scaled(scale);
                let x0 = px.x0.floor().max(0.0) as u32;
                let y0 = px.y0.floor().max(0.0) as u32;
                let x1 = (px.x1.ceil().max(0.0) as u32).min(render.width());
                let y1 = (px.y1.ceil().max(0.0) as u32).min(render.height());
                if x1 < x0 + MIN_IMAGE_PIXELS || y1 < y0 + MIN_IMAGE_PIXELS {
                    tracing::debug!("Page {}: skipping tiny image {}", page, index);
                    continue;
                }

                let crop = imageops::crop_imm(&render, x0, y0, x1 - x0, y1 - y0).to_image();
                let png = encode_image(&crop, ImageFormat::Png, 100)?;
                images.push(ExtractedImage {
                    index,
                    bbox,
                    width: crop.width(),
                    height: crop.height(),
                    format: ImageFormat::Png.extension(),
                    data: STANDARD.encode(png),
                });
            }

            tracing::debug!("Page {}: extracted {} images", page, images.len());
            Ok(images)
        })
        .collect()
}
