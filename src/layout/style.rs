//! Boldness from pixels
//!
//! MuPDF's text API does not expose font weight, so weight is measured on the
//! render: every horizontal run of ink inside a span is a cut through a
//! stroke, and the median run width approximates the vertical stem width.
//! Runs are summed by anti-aliasing coverage, which keeps the estimate
//! sub-pixel accurate at analysis resolutions.

use super::{median, PageRaster};
use crate::pdf::TextSpan;

/// Stem width (in em) at or above which a span is bold on its own
pub const BOLD_STEM_EM: f32 = 0.115;

/// Stem width relative to the page median at or above which a span is bold
pub const BOLD_RELATIVE: f32 = 1.3;

/// Relative boldness also needs at least this absolute stem width (in em)
pub const BOLD_RELATIVE_FLOOR_EM: f32 = 0.095;

/// A page median needs at least this many measurable spans
pub const MIN_SPANS_FOR_MEDIAN: usize = 4;

/// Runs wider than this (in em) cut horizontal bars or rules, not stems
const MAX_RUN_EM: f32 = 0.5;

/// Pixels with less coverage end a run
const MIN_COVERAGE: f32 = 0.02;

/// Fewer runs than this give no usable estimate
const MIN_RUNS: usize = 6;

/// Median stem width of a span in em, `None` when unmeasurable
pub fn stem_width_em(raster: &PageRaster, span: &TextSpan) -> Option<f32> {
    if span.font_size <= 0.0 {
        return None;
    }
    let (x0, y0, x1, y1) = raster.pixel_bounds(&span.bbox)?;
    let max_run = span.font_size * raster.scale * MAX_RUN_EM;

    let mut runs = Vec::new();
    for y in y0..y1 {
        let mut run = 0.0f32;
        for x in x0..x1 {
            let coverage = (255 - raster.image.get_pixel(x, y).0[0]) as f32 / 255.0;
            if coverage > MIN_COVERAGE {
                run += coverage;
            } else if run > 0.0 {
                runs.push(run);
                run = 0.0;
            }
        }
        if run > 0.0 {
            runs.push(run);
        }
    }

    runs.retain(|&r| r >= 0.5 && r <= max_run);
    if runs.len() < MIN_RUNS {
        return None;
    }

    median(runs).map(|px| px / raster.scale / span.font_size)
}

/// Set `bold` on every span from its measured stem width
pub fn apply_bold(spans: &mut [TextSpan], raster: &PageRaster) {
    let stems: Vec<Option<f32>> = spans.iter().map(|s| stem_width_em(raster, s)).collect();

    let measured: Vec<f32> = stems.iter().flatten().copied().collect();
    let page_median = if measured.len() >= MIN_SPANS_FOR_MEDIAN {
        median(measured)
    } else {
        None
    };

    for (span, stem) in spans.iter_mut().zip(stems) {
        span.bold = stem.is_some_and(|stem| is_bold(stem, page_median));
    }
}

fn is_bold(stem: f32, page_median: Option<f32>) -> bool {
    if stem >= BOLD_STEM_EM {
        return true;
    }
    match page_median {
        Some(m) if m > 0.0 => stem >= m * BOLD_RELATIVE && stem >= BOLD_RELATIVE_FLOOR_EM,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PageLayout;
    use crate::pdf::{PdfParser, Rect};
    use crate::testutil::PdfBuilder;
    use image::{GrayImage, Luma};

    /// Paint vertical bars `full` pixels wide plus one pixel of `partial`
    /// coverage, every 6 pixels, into a 20 px tall band starting at `x0`
    fn bars(image: &mut GrayImage, x0: u32, full: u32, partial: f32) {
        for bar in 0..5 {
            let left = x0 + bar * 6;
            for y in 0..20 {
                for dx in 0..full {
                    image.put_pixel(left + dx, y, Luma([0]));
                }
                if partial > 0.0 {
                    let luma = (255.0 * (1.0 - partial)).round() as u8;
                    image.put_pixel(left + full, y, Luma([luma]));
                }
            }
        }
    }

    fn span_at(x0_px: u32) -> TextSpan {
        // scale 2, font 10 pt: one em is 20 px
        let x = x0_px as f32 / 2.0;
        TextSpan::new("IIIII", Rect::new(x, 0.0, x + 15.0, 10.0), 10.0)
    }

    #[test]
    fn test_stem_width_in_em() {
        let mut image = GrayImage::from_pixel(200, 20, Luma([255]));
        bars(&mut image, 0, 2, 0.0);
        bars(&mut image, 100, 3, 0.0);
        let raster = PageRaster::new(image, 2.0);

        let regular = stem_width_em(&raster, &span_at(0)).unwrap();
        let bold = stem_width_em(&raster, &span_at(100)).unwrap();
        assert!((regular - 0.10).abs() < 0.005);
        assert!((bold - 0.15).abs() < 0.005);
    }

    #[test]
    fn test_wide_junction_does_not_embolden_span() {
        // Four 2 px stems and one 6 px junction; a mean would land at 0.14 em
        let mut image = GrayImage::from_pixel(100, 20, Luma([255]));
        bars(&mut image, 0, 2, 0.0);
        for y in 0..20 {
            for x in 24..30 {
                image.put_pixel(x, y, Luma([0]));
            }
        }
        let raster = PageRaster::new(image, 2.0);

        let stem = stem_width_em(&raster, &span_at(0)).unwrap();
        assert!((stem - 0.10).abs() < 0.005, "stem {}", stem);
        assert!(!is_bold(stem, None));
    }

    #[test]
    fn test_absolute_threshold_without_median() {
        let mut image = GrayImage::from_pixel(200, 20, Luma([255]));
        bars(&mut image, 0, 2, 0.0);
        bars(&mut image, 100, 3, 0.0);
        let raster = PageRaster::new(image, 2.0);

        let mut spans = vec![span_at(0), span_at(100)];
        apply_bold(&mut spans, &raster);
        assert!(!spans[0].bold);
        assert!(spans[1].bold);
    }

    #[test]
    fn test_relative_threshold_with_median() {
        // Four light spans (1.5 px = 0.075 em) and one at 2 px = 0.1 em
        let mut image = GrayImage::from_pixel(250, 20, Luma([255]));
        for i in 0..4 {
            bars(&mut image, i * 40, 1, 0.5);
        }
        bars(&mut image, 200, 2, 0.0);
        let raster = PageRaster::new(image, 2.0);

        let mut spans: Vec<TextSpan> = (0..4).map(|i| span_at(i * 40)).collect();
        spans.push(span_at(200));
        apply_bold(&mut spans, &raster);

        assert!(spans[..4].iter().all(|s| !s.bold));
        assert!(spans[4].bold);
    }

    #[test]
    fn test_blank_span_is_not_bold() {
        let raster = PageRaster::new(GrayImage::from_pixel(100, 100, Luma([255])), 2.0);
        assert!(stem_width_em(&raster, &span_at(0)).is_none());
    }

    #[test]
    fn test_detects_helvetica_bold_on_render() {
        let data = PdfBuilder::new()
            .page(|p| {
                p.text(72.0, 100.0, 18.0, "Normaler Text hier")
                    .bold_text(72.0, 150.0, 18.0, "Fetter Text hier")
            })
            .build();
        let parser = PdfParser::from_bytes(data).unwrap();
        let (layout, _) = PageLayout::analyze(&parser, 0, 144).unwrap();

        let regular = layout.spans.iter().find(|s| s.text.starts_with("Normaler")).unwrap();
        let bold = layout.spans.iter().find(|s| s.text.starts_with("Fetter")).unwrap();
        assert!(!regular.bold);
        assert!(bold.bold);
    }
}
