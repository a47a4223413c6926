//! Document metadata, page geometry and outline

use serde::Serialize;

use crate::pdf::{OutlineEntry, PageOrientation, PdfMetadata, PdfParser, Result};

/// Size and orientation of one page
#[derive(Debug, Serialize)]
pub struct PageInfo {
    pub index: usize,
    pub width: f32,
    pub height: f32,
    pub orientation: PageOrientation,
}

/// Document overview
#[derive(Debug, Serialize)]
pub struct DocumentInfo {
    pub page_count: usize,
    pub metadata: PdfMetadata,
    pub has_text_layer: bool,
    pub pages: Vec<PageInfo>,
    pub outline: Vec<OutlineEntry>,
}

/// Metadata, page geometry and outline
pub fn document_info(parser: &PdfParser) -> Result<DocumentInfo> {
    let pages = (0..parser.page_count())
        .map(|index| {
            let size = parser.page_size(index)?;
            Ok(PageInfo {
                index,
                width: size.width,
                height: size.height,
                orientation: size.orientation(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DocumentInfo {
        page_count: parser.page_count(),
        metadata: parser.metadata()?,
        has_text_layer: parser.has_text_layer()?,
        pages,
        outline: parser.outline()?,
    })
}
