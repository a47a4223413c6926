//! Page text with optional positioned spans

use serde::Serialize;

use crate::layout::{style, PageRaster};
use crate::pdf::{dpi_to_scale, PageMap, PdfParser, Result, TextSpan};

/// Text of one page
#[derive(Debug, Serialize)]
pub struct PageText {
    pub text: String,
    pub width: f32,
    pub height: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spans: Option<Vec<TextSpan>>,
}

/// Plain text of every page, optionally with positioned spans
///
/// Span boldness is measured on a render at `analysis_dpi`.
pub fn extract_text(
    parser: &PdfParser,
    include_spans: bool,
    analysis_dpi: u32,
) -> Result<PageMap<PageText>> {
    (0..parser.page_count())
        .map(|index| {
            let size = parser.page_size(index)?;
            let spans = if include_spans {
                let mut spans = parser.page_spans(index)?;
                if !spans.is_empty() {
                    let raster = PageRaster::new(
                        parser.render_gray(index, analysis_dpi)?,
                        dpi_to_scale(analysis_dpi),
                    );
                    style::apply_bold(&mut spans, &raster);
                }
                Some(spans)
            } else {
                None
            };

            Ok(PageText {
                text: parser.page_text(index)?,
                width: size.width,
                height: size.height,
                spans,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::PdfBuilder;

    #[test]
    fn test_extract_text_keys_every_page() {
        let data = PdfBuilder::new()
            .page(|p| p.text(72.0, 100.0, 12.0, "Seite eins"))
            .page(|p| p)
            .build();
        let parser = PdfParser::from_bytes(data).unwrap();

        let pages = extract_text(&parser, true, 72).unwrap();
        let json = serde_json::to_value(&pages).unwrap();
        assert!(json["0"]["text"].as_str().unwrap().contains("Seite eins"));
        assert_eq!(json["0"]["spans"][0]["text"], "Seite eins");
        assert_eq!(json["1"]["spans"].as_array().unwrap().len(), 0);
        assert!(json["0"]["spans"][0].get("char_edges").is_none());

        let plain = serde_json::to_value(extract_text(&parser, false, 72).unwrap()).unwrap();
        assert!(plain["0"].get("spans").is_none());
        assert_eq!(plain["0"]["width"], 595.0);
    }
}
