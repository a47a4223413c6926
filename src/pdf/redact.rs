//! Raster redaction
//!
//! Every page of the output is a flattened JPEG of the input page with the
//! redacted areas painted black, so no text layer or vector content survives.
//! Pages outside the selection are flattened too.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use lopdf::{dictionary, Document, Object, Stream};
use regex::Regex;

use super::error::{PdfError, Result};
use super::parser::{dpi_to_scale, encode_image, PdfParser};
use super::types::{ImageFormat, PageSize, Rect, TextSpan};

/// Hit rectangles are grown by this many points on every side
pub const REDACTION_PADDING: f32 = 1.0;

/// JPEG quality of flattened pages
const PAGE_QUALITY: u8 = 90;

/// What to redact
#[derive(Debug, Clone)]
pub struct RedactionRequest {
    /// Literal terms
    pub terms: Vec<String>,
    /// Regular expressions matched against each text span
    pub patterns: Vec<String>,
    /// Match terms with exact case instead of MuPDF's case-insensitive search
    pub case_sensitive: bool,
    /// Rasterization resolution of the output pages
    pub dpi: u32,
    /// 0-based pages to search; `None` searches every page
    pub pages: Option<Vec<usize>>,
}

/// Redacted document
#[derive(Debug)]
pub struct RedactionResult {
    pub data: Vec<u8>,
    /// Number of painted rectangles
    pub hits: usize,
    /// Number of pages with at least one hit
    pub pages_affected: usize,
}

/// Compiled matchers for one request
struct Matchers {
    /// Terms for MuPDF search (case-insensitive mode)
    search_terms: Vec<String>,
    /// Patterns plus, in case-sensitive mode, the escaped terms
    regexes: Vec<Regex>,
}

impl Matchers {
    fn compile(request: &RedactionRequest) -> Result<Self> {
        let terms: Vec<String> = request
            .terms
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        let mut regexes = request
            .patterns
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| Regex::new(p).map_err(|e| PdfError::InvalidPattern(format!("'{}': {}", p, e))))
            .collect::<Result<Vec<_>>>()?;

        let search_terms = if request.case_sensitive {
            for term in &terms {
                regexes.push(Regex::new(&regex::escape(term))?);
            }
            Vec::new()
        } else {
            terms
        };

        if search_terms.is_empty() && regexes.is_empty() {
            return Err(PdfError::InvalidPattern(
                "at least one term or pattern is required".to_string(),
            ));
        }

        Ok(Self {
            search_terms,
            regexes,
        })
    }
}

/// Redact a document
pub fn redact(parser: &PdfParser, request: &RedactionRequest) -> Result<RedactionResult> {
    let matchers = Matchers::compile(request)?;
    let scale = dpi_to_scale(request.dpi);
    let page_count = parser.page_count();

    let mut pages = Vec::with_capacity(page_count);
    let mut hits = 0;
    let mut pages_affected = 0;

    for index in 0..page_count {
        let selected = request
            .pages
            .as_ref()
            .map_or(true, |pages| pages.contains(&index));

        let rects = if selected {
            find_hits(parser, index, &matchers)?
        } else {
            Vec::new()
        };

        let mut image = parser.render_rgb(index, request.dpi)?;
        for rect in &rects {
            paint(&mut image, &rect.pad(REDACTION_PADDING).scaled(scale));
        }

        if !rects.is_empty() {
            tracing::debug!("Page {}: {} redactions", index, rects.len());
            hits += rects.len();
            pages_affected += 1;
        }

        let size = parser.page_size(index)?;
        let width = image.width();
        let height = image.height();
        let jpeg = encode_image(&image, ImageFormat::Jpeg, PAGE_QUALITY)?;
        pages.push(FlatPage {
            size,
            width,
            height,
            jpeg,
        });
    }

    let data = assemble(pages)?;
    tracing::info!(
        "Redacted {} areas on {} of {} pages",
        hits,
        pages_affected,
        page_count
    );

    Ok(RedactionResult {
        data,
        hits,
        pages_affected,
    })
}

fn find_hits(parser: &PdfParser, index: usize, matchers: &Matchers) -> Result<Vec<Rect>> {
    let mut rects = Vec::new();

    for term in &matchers.search_terms {
        rects.extend(parser.search(index, term)?);
    }

    if !matchers.regexes.is_empty() {
        let spans = parser.page_spans(index)?;
        for regex in &matchers.regexes {
            rects.extend(regex_hits(&spans, regex));
        }
    }

    Ok(rects)
}

/// Bounding boxes of every non-empty regex match within single spans
fn regex_hits(spans: &[TextSpan], regex: &Regex) -> Vec<Rect> {
    let mut rects = Vec::new();
    for span in spans {
        for m in regex.find_iter(&span.text) {
            if m.as_str().is_empty() {
                continue;
            }
            let start = span.text[..m.start()].chars().count();
            let end = start + m.as_str().chars().count();
            rects.push(span.char_range_bbox(start, end));
        }
    }
    rects
}

/// Fill a pixel-space rectangle with black, clipped to the image
fn paint(image: &mut RgbImage, rect: &Rect) {
    let x0 = rect.x0.floor().max(0.0) as i32;
    let y0 = rect.y0.floor().max(0.0) as i32;
    let x1 = (rect.x1.ceil() as i32).min(image.width() as i32);
    let y1 = (rect.y1.ceil() as i32).min(image.height() as i32);
    if x1 <= x0 || y1 <= y0 {
        return;
    }

    let area = imageproc::rect::Rect::at(x0, y0).of_size((x1 - x0) as u32, (y1 - y0) as u32);
    draw_filled_rect_mut(image, area, Rgb([0, 0, 0]));
}

struct FlatPage {
    size: PageSize,
    width: u32,
    height: u32,
    jpeg: Vec<u8>,
}

/// Build a PDF with one full-page JPEG per page
fn assemble(pages: Vec<FlatPage>) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::with_capacity(pages.len());

    for page in pages {
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => page.width as i64,
                "Height" => page.height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            page.jpeg,
        ));

        let content = format!(
            "q {:.3} 0 0 {:.3} 0 0 cm /Im0 Do Q",
            page.size.width, page.size.height
        );
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::from(page.size.width),
                Object::from(page.size.height),
            ],
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| PdfError::WriteError(e.to_string()))?;
    Ok(output)
}
