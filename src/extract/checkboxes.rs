//! Checkbox detection
//!
//! AcroForm checkbox widgets first; pages without any fall back to boxes
//! found in the page content.

use serde::Serialize;

use super::widgets_per_page;
use crate::layout::{detect_checkboxes, PageLayout, PageRaster, VisualCheckbox};
use crate::pdf::{FieldKind, PageMap, PdfParser, Result, WidgetField};

/// Where a checkbox was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckboxSource {
    /// AcroForm widget
    Widget,
    /// Inferred from page content
    Visual,
}

/// A checkbox as reported by the API
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckboxEntry {
    pub name: String,
    pub value: Option<String>,
    pub checked: bool,
    pub x_pos: f32,
    /// Distance from the top of the page
    pub y_pos: f32,
    pub source: CheckboxSource,
}

impl CheckboxEntry {
    fn from_widget(widget: &WidgetField) -> Self {
        Self {
            name: widget.name.clone(),
            value: widget.value.clone(),
            checked: widget.is_checked(),
            x_pos: widget.rect.x0,
            y_pos: widget.rect.y0,
            source: CheckboxSource::Widget,
        }
    }

    fn from_visual(index: usize, checkbox: &VisualCheckbox) -> Self {
        Self {
            name: checkbox
                .label
                .clone()
                .unwrap_or_else(|| format!("checkbox_{}", index + 1)),
            value: Some(if checkbox.checked { "Yes" } else { "Off" }.to_string()),
            checked: checkbox.checked,
            x_pos: checkbox.bbox.x0,
            y_pos: checkbox.bbox.y0,
            source: CheckboxSource::Visual,
        }
    }
}

/// Checkboxes of one page: widgets when there are any, visual detection
/// otherwise
pub(super) fn page_checkboxes(
    widgets: &[WidgetField],
    layout: &PageLayout,
    raster: &PageRaster,
) -> Vec<CheckboxEntry> {
    let mut entries: Vec<CheckboxEntry> = widgets
        .iter()
        .filter(|w| w.kind == FieldKind::Checkbox)
        .map(CheckboxEntry::from_widget)
        .collect();

    if entries.is_empty() {
        entries = detect_checkboxes(layout, Some(raster))
            .iter()
            .enumerate()
            .map(|(i, c)| CheckboxEntry::from_visual(i, c))
            .collect();
    }

    entries.sort_by(|a, b| a.y_pos.total_cmp(&b.y_pos).then(a.x_pos.total_cmp(&b.x_pos)));
    entries
}

/// Checkboxes of every page
pub fn extract_checkboxes(
    parser: &PdfParser,
    analysis_dpi: u32,
) -> Result<PageMap<Vec<CheckboxEntry>>> {
    let widgets = widgets_per_page(parser);

    widgets
        .iter()
        .enumerate()
        .map(|(index, page_widgets)| {
            let (layout, raster) = PageLayout::analyze(parser, index, analysis_dpi)?;
            let entries = page_checkboxes(page_widgets, &layout, &raster);
            tracing::debug!("Page {}: {} checkboxes", index, entries.len());
            Ok(entries)
        })
        .collect()
}
