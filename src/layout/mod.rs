//! Layout inference
//!
//! Infers structure from positioned text and page pixels without a declared
//! schema: rows, bold runs, titles and headings, label/value fields, tables,
//! checkboxes and chapter starts.
//!
//! Every threshold is a named constant expressed relative to the font size
//! or the page's median line height, so the heuristics hold across scales.
//!
//! # Usage
//!
//! ```rust,ignore
//! let (layout, raster) = PageLayout::analyze(&parser, 0, 144)?;
//! let tables = tables::detect_tables(&layout);
//! let checkboxes = checkbox::detect_checkboxes(&layout, Some(&raster));
//! ```

pub mod chapters;
pub mod checkbox;
pub mod fields;
pub mod rows;
pub mod style;
pub mod tables;
pub mod titles;

use image::GrayImage;

use crate::pdf::{dpi_to_scale, PageSize, PdfParser, Rect, Result, TextSpan};

pub use chapters::{chapters_from_outline, detect_chapter_heading, heuristic_chapters, Chapter};
pub use checkbox::{detect_checkboxes, CheckboxKind, VisualCheckbox};
pub use fields::{extract_fields, FieldPair, LabeledValues};
pub use rows::{group_rows, Row};
pub use tables::{detect_tables, Table};
pub use titles::{detect_titles, Heading, TitleInfo};

/// Luma below this value counts as ink
pub const INK_THRESHOLD: u8 = 128;

/// Row height relative to font size when a page has no rows to measure
const DEFAULT_LINE_HEIGHT_EM: f32 = 1.2;

/// Grayscale page render with its points-to-pixels factor
pub struct PageRaster {
    pub image: GrayImage,
    pub scale: f32,
}

impl PageRaster {
    pub fn new(image: GrayImage, scale: f32) -> Self {
        Self { image, scale }
    }

    /// Pixel bounds of a page-space rectangle, clipped to the image
    pub fn pixel_bounds(&self, rect: &Rect) -> Option<(u32, u32, u32, u32)> {
        let r = rect.scaled(self.scale);
        let x0 = r.x0.floor().max(0.0) as u32;
        let y0 = r.y0.floor().max(0.0) as u32;
        let x1 = (r.x1.ceil().max(0.0) as u32).min(self.image.width());
        let y1 = (r.y1.ceil().max(0.0) as u32).min(self.image.height());
        (x1 > x0 && y1 > y0).then_some((x0, y0, x1, y1))
    }

    pub fn is_ink(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y).0[0] < INK_THRESHOLD
    }

    /// Share of ink pixels inside a page-space rectangle
    pub fn ink_ratio(&self, rect: &Rect) -> f32 {
        let Some((x0, y0, x1, y1)) = self.pixel_bounds(rect) else {
            return 0.0;
        };
        let mut ink = 0u32;
        for y in y0..y1 {
            for x in x0..x1 {
                if self.is_ink(x, y) {
                    ink += 1;
                }
            }
        }
        ink as f32 / ((x1 - x0) * (y1 - y0)) as f32
    }
}

/// Text of one page arranged for the heuristics
#[derive(Debug, Clone)]
pub struct PageLayout {
    /// 0-based page index
    pub index: usize,
    pub size: PageSize,
    pub spans: Vec<TextSpan>,
    pub rows: Vec<Row>,
    /// Character-weighted median font size
    pub body_size: f32,
    /// Median row height
    pub line_height: f32,
}

impl PageLayout {
    /// Arrange spans whose bold flags are already final
    pub fn from_spans(index: usize, size: PageSize, spans: Vec<TextSpan>) -> Self {
        let rows = group_rows(&spans);
        let body_size = body_font_size(&spans);
        let line_height = median(rows.iter().map(|r| r.bbox.height()).collect())
            .unwrap_or(body_size * DEFAULT_LINE_HEIGHT_EM);

        Self {
            index,
            size,
            spans,
            rows,
            body_size,
            line_height,
        }
    }

    /// Extract spans, infer boldness from a render at `dpi` and arrange
    pub fn analyze(parser: &PdfParser, index: usize, dpi: u32) -> Result<(Self, PageRaster)> {
        let size = parser.page_size(index)?;
        let mut spans = parser.page_spans(index)?;
        let raster = PageRaster::new(parser.render_gray(index, dpi)?, dpi_to_scale(dpi));

        style::apply_bold(&mut spans, &raster);
        tracing::debug!(
            "Page {}: {} spans, {} bold",
            index,
            spans.len(),
            spans.iter().filter(|s| s.bold).count()
        );

        Ok((Self::from_spans(index, size, spans), raster))
    }

    /// Whether a rectangle starts within the top `fraction` of the page
    pub fn in_top(&self, rect: &Rect, fraction: f32) -> bool {
        rect.y0 < self.size.height * fraction
    }
}

/// Median font size with every character counted once
pub fn body_font_size(spans: &[TextSpan]) -> f32 {
    let mut sizes: Vec<(f32, usize)> = spans
        .iter()
        .filter(|s| s.font_size > 0.0)
        .map(|s| (s.font_size, s.char_count()))
        .collect();
    if sizes.is_empty() {
        return 0.0;
    }
    sizes.sort_by(|a, b| a.0.total_cmp(&b.0));

    let total: usize = sizes.iter().map(|(_, n)| n).sum();
    let mut seen = 0;
    for (size, count) in &sizes {
        seen += count;
        if seen * 2 >= total {
            return *size;
        }
    }
    sizes[sizes.len() - 1].0
}

/// Median of a list (upper median for even lengths)
pub fn median(mut values: Vec<f32>) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f32::total_cmp);
    Some(values[values.len() / 2])
}
