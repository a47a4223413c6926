//! Table extraction from aligned text rows

use crate::layout::{detect_tables, PageLayout, Table};
use crate::pdf::{PageMap, PdfParser, Result};

/// Tables of every page
pub fn extract_tables(parser: &PdfParser, analysis_dpi: u32) -> Result<PageMap<Vec<Table>>> {
    (0..parser.page_count())
        .map(|index| {
            let (layout, _) = PageLayout::analyze(parser, index, analysis_dpi)?;
            let tables = detect_tables(&layout);
            tracing::debug!("Page {}: {} tables", index, tables.len());
            Ok(tables)
        })
        .collect()
}
