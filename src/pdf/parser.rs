//! PDF parsing using MuPDF
//!
//! Provides metadata and outline extraction, positioned text, image block
//! discovery and page rasterization on top of [`SafeDocument`].
//!
//! Page indices are 0-based throughout.

use std::io::Cursor;

use chrono::{FixedOffset, NaiveDate, TimeZone};
use image::codecs::jpeg::JpegEncoder;
use image::{GrayImage, RgbImage};
use mupdf::{Colorspace, Matrix, MetadataName, Pixmap};

use crate::mupdf::{self as mu, SafeDocument};

use super::error::{PdfError, Result};
use super::types::{ImageFormat, OutlineEntry, PageSize, PdfMetadata, Rect, TextSpan};

/// Lowest and highest accepted rasterization resolution
pub const MIN_DPI: u32 = 36;
pub const MAX_DPI: u32 = 600;

/// Upper bound on search hits per page and term
const MAX_SEARCH_HITS: u32 = 500;

/// MuPDF-backed PDF parser for one uploaded document
pub struct PdfParser {
    doc: SafeDocument,
}

impl PdfParser {
    /// Open a parser over uploaded bytes
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let doc = SafeDocument::from_bytes(data)?;
        tracing::debug!("Opened PDF with {} pages", doc.page_count());
        Ok(Self { doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.page_count()
    }

    /// Raw bytes, for operations that go through lopdf
    pub fn bytes(&self) -> &[u8] {
        self.doc.bytes()
    }

    /// Page size in points
    pub fn page_size(&self, index: usize) -> Result<PageSize> {
        self.doc.with_page(index, |page| {
            let bounds = page.bounds()?;
            Ok(PageSize {
                width: bounds.x1 - bounds.x0,
                height: bounds.y1 - bounds.y0,
            })
        })
    }

    /// Metadata from the PDF info dictionary
    pub fn metadata(&self) -> Result<PdfMetadata> {
        self.doc.with_doc(|doc| {
            let get_meta = |name: MetadataName| -> Option<String> {
                doc.metadata(name)
                    .ok()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            };

            Ok(PdfMetadata {
                title: get_meta(MetadataName::Title),
                author: get_meta(MetadataName::Author),
                subject: get_meta(MetadataName::Subject),
                keywords: get_meta(MetadataName::Keywords)
                    .map(|k| {
                        k.split([',', ';'])
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect()
                    })
                    .unwrap_or_default(),
                creator: get_meta(MetadataName::Creator),
                producer: get_meta(MetadataName::Producer),
                creation_date: get_meta(MetadataName::CreationDate).map(|d| normalize_pdf_date(&d)),
                modification_date: get_meta(MetadataName::ModDate).map(|d| normalize_pdf_date(&d)),
            })
        })
    }

    /// Document outline flattened in document order
    pub fn outline(&self) -> Result<Vec<OutlineEntry>> {
        self.doc.with_doc(|doc| {
            let outlines = doc.outlines()?;
            let mut entries = Vec::new();
            flatten_outline(&outlines, 1, &mut entries);
            Ok(entries)
        })
    }

    /// Whether any of the first pages carries extractable text
    pub fn has_text_layer(&self) -> Result<bool> {
        let pages_to_check = self.page_count().min(3);
        self.doc.with_doc(|doc| {
            for i in 0..pages_to_check {
                let page = doc.load_page(i as i32)?;
                if let Ok(text) = page.to_text() {
                    if !text.trim().is_empty() {
                        return Ok(true);
                    }
                }
            }
            Ok(false)
        })
    }

    /// Plain text of one page
    pub fn page_text(&self, index: usize) -> Result<String> {
        self.doc.with_page(index, mu::extract_plain_text)
    }

    /// Positioned text spans of one page (bold flags unset)
    pub fn page_spans(&self, index: usize) -> Result<Vec<TextSpan>> {
        self.doc.with_page(index, mu::extract_spans)
    }

    /// Bounding boxes of a term's occurrences (case-insensitive, MuPDF search)
    pub fn search(&self, index: usize, needle: &str) -> Result<Vec<Rect>> {
        self.doc
            .with_page(index, |page| mu::search_text(page, needle, MAX_SEARCH_HITS))
    }

    /// Bounding boxes of embedded images on one page
    pub fn image_bounds(&self, index: usize) -> Result<Vec<Rect>> {
        self.doc.with_page(index, mu::image_block_bounds)
    }

    /// Rasterize a page to an RGB buffer
    pub fn render_rgb(&self, index: usize, dpi: u32) -> Result<RgbImage> {
        let scale = dpi_to_scale(dpi);
        self.doc.with_page(index, |page| {
            let matrix = Matrix::new_scale(scale, scale);
            let pixmap = page
                .to_pixmap(&matrix, &Colorspace::device_rgb(), false, true)
                .map_err(|e| PdfError::RenderError(e.to_string()))?;
            pixmap_to_rgb(&pixmap)
        })
    }

    /// Rasterize a page to a grayscale buffer (layout analysis)
    pub fn render_gray(&self, index: usize, dpi: u32) -> Result<GrayImage> {
        let scale = dpi_to_scale(dpi);
        self.doc.with_page(index, |page| {
            let matrix = Matrix::new_scale(scale, scale);
            let pixmap = page
                .to_pixmap(&matrix, &Colorspace::device_gray(), false, true)
                .map_err(|e| PdfError::RenderError(e.to_string()))?;
            pixmap_to_gray(&pixmap)
        })
    }

    /// Rasterize and encode a page
    pub fn render_page(
        &self,
        index: usize,
        dpi: u32,
        format: ImageFormat,
        quality: u8,
    ) -> Result<Vec<u8>> {
        let image = self.render_rgb(index, dpi)?;
        encode_image(&image, format, quality)
    }
}

/// Points-to-pixels factor for a resolution, clamped to the accepted range
pub fn dpi_to_scale(dpi: u32) -> f32 {
    dpi.clamp(MIN_DPI, MAX_DPI) as f32 / 72.0
}

fn flatten_outline(outlines: &[mupdf::Outline], level: usize, entries: &mut Vec<OutlineEntry>) {
    for outline in outlines {
        let title = outline.title.trim();
        entries.push(OutlineEntry {
            title: if title.is_empty() {
                "Untitled".to_string()
            } else {
                title.to_string()
            },
            level,
            page: outline.page.map(|p| p as usize),
        });
        flatten_outline(&outline.down, level + 1, entries);
    }
}

fn pixmap_to_rgb(pixmap: &Pixmap) -> Result<RgbImage> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let n = (pixmap.n() as usize).max(1);
    let samples = pixmap.samples();

    let mut buffer = Vec::with_capacity((width * height * 3) as usize);
    for px in samples.chunks_exact(n).take((width * height) as usize) {
        if n >= 3 {
            buffer.extend_from_slice(&px[..3]);
        } else {
            buffer.extend_from_slice(&[px[0], px[0], px[0]]);
        }
    }

    RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| PdfError::ImageError("Failed to create RGB buffer".to_string()))
}

fn pixmap_to_gray(pixmap: &Pixmap) -> Result<GrayImage> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let n = (pixmap.n() as usize).max(1);
    let samples = pixmap.samples();

    let mut buffer = Vec::with_capacity((width * height) as usize);
    for px in samples.chunks_exact(n).take((width * height) as usize) {
        let luma = if n >= 3 {
            (0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32) as u8
        } else {
            px[0]
        };
        buffer.push(luma);
    }

    GrayImage::from_raw(width, height, buffer)
        .ok_or_else(|| PdfError::ImageError("Failed to create gray buffer".to_string()))
}

/// Encode an RGB buffer
pub fn encode_image(image: &RgbImage, format: ImageFormat, quality: u8) -> Result<Vec<u8>> {
    let mut output = Vec::new();

    match format {
        ImageFormat::Png => {
            image.write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)?;
        }
        ImageFormat::Webp => {
            image.write_to(&mut Cursor::new(&mut output), image::ImageFormat::WebP)?;
        }
        ImageFormat::Jpeg => {
            let mut encoder = JpegEncoder::new_with_quality(&mut output, quality.clamp(1, 100));
            encoder.encode_image(image)?;
        }
    }

    Ok(output)
}

/// Convert a PDF date (`D:YYYYMMDDHHmmSSOHH'mm'`) to RFC 3339
///
/// Missing trailing components default to their minimum; values that do not
/// parse are returned unchanged.
pub fn normalize_pdf_date(raw: &str) -> String {
    parse_pdf_date(raw).unwrap_or_else(|| raw.to_string())
}

fn parse_pdf_date(raw: &str) -> Option<String> {
    let s = raw.trim().strip_prefix("D:").unwrap_or(raw.trim());
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() < 4 {
        return None;
    }

    let field = |start: usize, len: usize, default: u32| -> Option<u32> {
        match digits.get(start..start + len) {
            Some(part) => part.parse().ok(),
            None => Some(default),
        }
    };

    let year = digits.get(0..4)?.parse::<i32>().ok()?;
    let month = field(4, 2, 1)?;
    let day = field(6, 2, 1)?;
    let hour = field(8, 2, 0)?;
    let minute = field(10, 2, 0)?;
    let second = field(12, 2, 0)?;

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;

    let rest = &s[digits.len()..];
    let offset_secs = match rest.chars().next() {
        Some(sign @ ('+' | '-')) => {
            let tz: String = rest[1..].chars().filter(|c| c.is_ascii_digit()).collect();
            let hours: i32 = tz.get(0..2).and_then(|h| h.parse().ok()).unwrap_or(0);
            let minutes: i32 = tz.get(2..4).and_then(|m| m.parse().ok()).unwrap_or(0);
            let total = hours * 3600 + minutes * 60;
            if sign == '-' {
                -total
            } else {
                total
            }
        }
        _ => 0,
    };

    let offset = FixedOffset::east_opt(offset_secs)?;
    let datetime = offset.from_local_datetime(&naive).single()?;
    Some(datetime.to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::PdfBuilder;

    #[test]
    fn test_normalize_pdf_date() {
        assert_eq!(
            normalize_pdf_date("D:20240131143000+01'00'"),
            "2024-01-31T14:30:00+01:00"
        );
        assert_eq!(normalize_pdf_date("D:2023"), "2023-01-01T00:00:00+00:00");
        assert_eq!(normalize_pdf_date("D:20230615120000Z"), "2023-06-15T12:00:00+00:00");
        assert_eq!(normalize_pdf_date("yesterday"), "yesterday");
    }

    #[test]
    fn test_dpi_to_scale_clamps() {
        assert_eq!(dpi_to_scale(72), 1.0);
        assert_eq!(dpi_to_scale(1), MIN_DPI as f32 / 72.0);
        assert_eq!(dpi_to_scale(10_000), MAX_DPI as f32 / 72.0);
    }

    #[test]
    fn test_page_spans_and_text() {
        let data = PdfBuilder::new()
            .page(|p| {
                p.text(72.0, 100.0, 12.0, "Objekt:")
                    .text(300.0, 100.0, 12.0, "Halle 7")
            })
            .build();
        let parser = PdfParser::from_bytes(data).unwrap();

        let spans = parser.page_spans(0).unwrap();
        let texts: Vec<&str> = spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Objekt:", "Halle 7"]);
        assert!((spans[0].font_size - 12.0).abs() < 0.5);
        assert!(spans[0].bbox.x0 >= 71.0 && spans[0].bbox.x0 <= 74.0);

        let text = parser.page_text(0).unwrap();
        assert!(text.contains("Objekt:"));
        assert!(text.contains("Halle 7"));
    }

    #[test]
    fn test_page_out_of_range() {
        let data = PdfBuilder::new().page(|p| p).build();
        let parser = PdfParser::from_bytes(data).unwrap();
        assert!(matches!(parser.page_spans(1), Err(PdfError::PageNotFound(1, 1))));
    }

    #[test]
    fn test_render_page_formats() {
        let data = PdfBuilder::new()
            .page(|p| p.text(72.0, 72.0, 20.0, "Render me"))
            .build();
        let parser = PdfParser::from_bytes(data).unwrap();

        let png = parser.render_page(0, 72, ImageFormat::Png, 85).unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));

        let jpeg = parser.render_page(0, 72, ImageFormat::Jpeg, 80).unwrap();
        assert!(jpeg.starts_with(&[0xFF, 0xD8]));

        let gray = parser.render_gray(0, 72).unwrap();
        let size = parser.page_size(0).unwrap();
        assert_eq!(gray.width(), size.width.round() as u32);
    }

    #[test]
    fn test_metadata_title() {
        let data = PdfBuilder::new()
            .title("Prüfprotokoll")
            .page(|p| p)
            .build();
        let parser = PdfParser::from_bytes(data).unwrap();
        let metadata = parser.metadata().unwrap();
        assert_eq!(metadata.title.as_deref(), Some("Prüfprotokoll"));
        assert!(metadata.author.is_none());
    }

    #[test]
    fn test_search_finds_term() {
        let data = PdfBuilder::new()
            .page(|p| p.text(72.0, 200.0, 12.0, "Kennzeichen ABC-123"))
            .build();
        let parser = PdfParser::from_bytes(data).unwrap();
        let hits = parser.search(0, "abc-123").unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].y0 > 180.0 && hits[0].y1 < 215.0);
    }

    #[test]
    fn test_has_text_layer() {
        let blank = PdfParser::from_bytes(PdfBuilder::new().page(|p| p).build()).unwrap();
        assert!(!blank.has_text_layer().unwrap());

        let text = PdfBuilder::new().page(|p| p.text(72.0, 72.0, 12.0, "x")).build();
        assert!(PdfParser::from_bytes(text).unwrap().has_text_layer().unwrap());
    }
}
