//! Visual checkbox detection
//!
//! Two sources: checkbox glyphs in the text layer (`☐`, `☒`, `[x]`, ...) and
//! small hollow squares drawn as vector graphics, found as connected
//! components of the page raster. Drawn boxes overlapping text are glyphs or
//! letters and are left to the text-based pass.

use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};
use serde::Serialize;

use super::{PageLayout, PageRaster};
use crate::pdf::{Rect, TextSpan};

/// Glyphs that are checked on their own
const CHECKED_GLYPHS: [char; 7] = ['☑', '☒', '■', '✓', '✔', '✗', '✘'];

/// Glyphs that are checked only when something is drawn inside them
const HOLLOW_GLYPHS: [char; 2] = ['☐', '□'];

/// Interior ink ratio at which a hollow glyph counts as checked
pub const GLYPH_CHECKED_INK: f32 = 0.2;

/// Side length range of drawn checkboxes, in points
pub const MIN_BOX_SIZE: f32 = 6.0;
pub const MAX_BOX_SIZE: f32 = 24.0;

/// Accepted width/height ratio of drawn checkboxes
pub const MIN_BOX_ASPECT: f32 = 0.8;
pub const MAX_BOX_ASPECT: f32 = 1.25;

/// Components filling more of their bbox than this are not hollow
pub const MAX_BOX_FILL: f32 = 0.5;

/// Interior inset (per side, as a share of the box size) for the ink test
pub const BOX_INTERIOR_INSET: f32 = 0.15;

/// Interior ink ratio at which a drawn box counts as checked
pub const BOX_CHECKED_INK: f32 = 0.12;

/// Drawn boxes sharing more than this share of their area with text are
/// ignored
const MAX_TEXT_OVERLAP: f32 = 0.3;

/// How a checkbox was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckboxKind {
    Glyph,
    Drawn,
}

/// A checkbox found in the page content
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualCheckbox {
    pub bbox: Rect,
    pub checked: bool,
    pub label: Option<String>,
    pub kind: CheckboxKind,
}

/// Find glyph and drawn checkboxes, sorted top to bottom, left to right
pub fn detect_checkboxes(layout: &PageLayout, raster: Option<&PageRaster>) -> Vec<VisualCheckbox> {
    let mut boxes = detect_glyph_checkboxes(layout, raster);
    if let Some(raster) = raster {
        boxes.extend(detect_drawn_checkboxes(layout, raster));
    }
    boxes.sort_by(|a, b| {
        a.bbox
            .y0
            .total_cmp(&b.bbox.y0)
            .then(a.bbox.x0.total_cmp(&b.bbox.x0))
    });
    boxes
}

/// Checkbox glyphs at the start of a span; the rest of the span is the label
pub fn detect_glyph_checkboxes(
    layout: &PageLayout,
    raster: Option<&PageRaster>,
) -> Vec<VisualCheckbox> {
    let mut boxes = Vec::new();

    for span in &layout.spans {
        let text = span.text.trim_start();
        let leading = span.text.chars().count() - text.chars().count();

        let (glyph_len, state) = match parse_glyph(text) {
            Some(found) => found,
            None => continue,
        };

        let bbox = span.char_range_bbox(leading, leading + glyph_len);
        let checked = match state {
            GlyphState::Checked => true,
            GlyphState::Unchecked => false,
            GlyphState::Hollow => raster
                .map(|r| r.ink_ratio(&interior(&bbox)) >= GLYPH_CHECKED_INK)
                .unwrap_or(false),
        };

        let rest: String = text.chars().skip(glyph_len).collect();
        let label = match rest.trim() {
            "" => nearest_label(&bbox, &layout.spans),
            inline => Some(inline.to_string()),
        };

        boxes.push(VisualCheckbox {
            bbox,
            checked,
            label,
            kind: CheckboxKind::Glyph,
        });
    }

    boxes
}

enum GlyphState {
    Checked,
    Unchecked,
    Hollow,
}

/// Length in chars and state of a checkbox glyph at the start of `text`
fn parse_glyph(text: &str) -> Option<(usize, GlyphState)> {
    let first = text.chars().next()?;
    if CHECKED_GLYPHS.contains(&first) {
        return Some((1, GlyphState::Checked));
    }
    if HOLLOW_GLYPHS.contains(&first) {
        return Some((1, GlyphState::Hollow));
    }

    let bracket: String = text.chars().take(3).collect();
    match bracket.as_str() {
        "[x]" | "[X]" => Some((3, GlyphState::Checked)),
        "[ ]" => Some((3, GlyphState::Unchecked)),
        _ if text.starts_with("[]") => Some((2, GlyphState::Unchecked)),
        _ => None,
    }
}

/// Hollow squares drawn on the page
pub fn detect_drawn_checkboxes(layout: &PageLayout, raster: &PageRaster) -> Vec<VisualCheckbox> {
    let candidates = square_components(raster);

    // Marks inside a box (an X, a tick) can form squares of their own
    let outer: Vec<Rect> = candidates
        .iter()
        .filter(|c| {
            !candidates
                .iter()
                .any(|other| *other != **c && other.contains(c))
        })
        .copied()
        .collect();

    outer
        .into_iter()
        .filter(|bbox| !overlaps_text(bbox, &layout.spans))
        .map(|bbox| VisualCheckbox {
            checked: raster.ink_ratio(&interior(&bbox)) >= BOX_CHECKED_INK,
            label: nearest_label(&bbox, &layout.spans),
            bbox,
            kind: CheckboxKind::Drawn,
        })
        .collect()
}

/// Page-space bboxes of connected ink components shaped like a checkbox
fn square_components(raster: &PageRaster) -> Vec<Rect> {
    let (width, height) = raster.image.dimensions();
    let binary = GrayImage::from_fn(width, height, |x, y| {
        if raster.is_ink(x, y) {
            Luma([255])
        } else {
            Luma([0])
        }
    });
    let labels = connected_components(&binary, Connectivity::Eight, Luma([0u8]));

    // label -> (x0, y0, x1, y1, pixel count)
    let mut stats: Vec<(u32, u32, u32, u32, u32)> = Vec::new();
    for (x, y, pixel) in labels.enumerate_pixels() {
        let label = pixel.0[0] as usize;
        if label == 0 {
            continue;
        }
        if stats.len() < label {
            stats.resize(label, (u32::MAX, u32::MAX, 0, 0, 0));
        }
        let s = &mut stats[label - 1];
        s.0 = s.0.min(x);
        s.1 = s.1.min(y);
        s.2 = s.2.max(x + 1);
        s.3 = s.3.max(y + 1);
        s.4 += 1;
    }

    stats
        .into_iter()
        .filter(|s| s.4 > 0)
        .filter_map(|(x0, y0, x1, y1, count)| {
            let w = (x1 - x0) as f32;
            let h = (y1 - y0) as f32;
            let size_w = w / raster.scale;
            let size_h = h / raster.scale;
            let aspect = w / h;
            let fill = count as f32 / (w * h);

            let is_box = (MIN_BOX_SIZE..=MAX_BOX_SIZE).contains(&size_w)
                && (MIN_BOX_SIZE..=MAX_BOX_SIZE).contains(&size_h)
                && (MIN_BOX_ASPECT..=MAX_BOX_ASPECT).contains(&aspect)
                && fill < MAX_BOX_FILL;

            is_box.then(|| {
                Rect::new(
                    x0 as f32 / raster.scale,
                    y0 as f32 / raster.scale,
                    x1 as f32 / raster.scale,
                    y1 as f32 / raster.scale,
                )
            })
        })
        .collect()
}

fn interior(bbox: &Rect) -> Rect {
    let dx = bbox.width() * BOX_INTERIOR_INSET;
    let dy = bbox.height() * BOX_INTERIOR_INSET;
    Rect::new(bbox.x0 + dx, bbox.y0 + dy, bbox.x1 - dx, bbox.y1 - dy)
}

fn overlaps_text(bbox: &Rect, spans: &[TextSpan]) -> bool {
    let area = bbox.area();
    area > 0.0
        && spans.iter().any(|span| {
            let overlap = bbox.horizontal_overlap(&span.bbox) * bbox.vertical_overlap(&span.bbox);
            overlap / area > MAX_TEXT_OVERLAP
        })
}

/// Text of the nearest span to the right on the same row, else to the left
pub fn nearest_label(bbox: &Rect, spans: &[TextSpan]) -> Option<String> {
    let same_row = |span: &&TextSpan| {
        let cy = bbox.center_y();
        cy >= span.bbox.y0 - 1.0 && cy <= span.bbox.y1 + 1.0
    };
    let is_box = |span: &&TextSpan| parse_glyph(span.text.trim()).is_some() && span.text.trim().chars().count() <= 3;

    let right = spans
        .iter()
        .filter(same_row)
        .filter(|s| !is_box(s))
        .filter(|s| s.bbox.x0 >= bbox.x1 - 1.0)
        .min_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
    let left = || {
        spans
            .iter()
            .filter(same_row)
            .filter(|s| !is_box(s))
            .filter(|s| s.bbox.x1 <= bbox.x0 + 1.0)
            .max_by(|a, b| a.bbox.x1.total_cmp(&b.bbox.x1))
    };

    right
        .or_else(left)
        .map(|s| s.text.trim().to_string())
        .filter(|t| !t.is_empty())
}
