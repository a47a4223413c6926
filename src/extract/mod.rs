//! Extraction pipelines
//!
//! One function per JSON endpoint. Each takes an opened [`PdfParser`], walks
//! every page and returns a serializable result; they are blocking and meant
//! to run on the job pool.

mod chapters;
mod checkboxes;
mod fields;
mod images;
mod info;
mod tables;
mod text;

pub use chapters::{extract_chapters, ChapterReport, ChapterSource};
pub use checkboxes::{extract_checkboxes, CheckboxEntry, CheckboxSource};
pub use fields::{extract_all_fields, PageFields};
pub use images::{extract_images, ExtractedImage};
pub use info::{document_info, DocumentInfo, PageInfo};
pub use tables::extract_tables;
pub use text::{extract_text, PageText};

use crate::pdf::{read_widgets, PdfParser, WidgetField};

/// AcroForm widgets grouped per page, padded to the page count
///
/// Documents MuPDF can open but lopdf cannot parse are treated as having no
/// widgets.
fn widgets_per_page(parser: &PdfParser) -> Vec<Vec<WidgetField>> {
    let mut pages = read_widgets(parser.bytes()).unwrap_or_else(|e| {
        tracing::warn!("Cannot read form widgets, continuing without: {}", e);
        Vec::new()
    });
    pages.resize_with(parser.page_count(), Vec::new);
    pages
}
