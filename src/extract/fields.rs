//! Label/value fields, titles and checkboxes per page

use serde::Serialize;

use super::checkboxes::{page_checkboxes, CheckboxEntry};
use super::widgets_per_page;
use crate::layout::{detect_titles, extract_fields, LabeledValues, PageLayout};
use crate::pdf::{FieldKind, PageMap, PdfParser, Result, WidgetField};

/// Everything form-like on one page
#[derive(Debug, Serialize)]
pub struct PageFields {
    pub title: Option<String>,
    pub headings: Vec<String>,
    pub fields: LabeledValues,
    pub checkboxes: Vec<CheckboxEntry>,
}

/// Title, headings, label/value fields and checkboxes of every page
///
/// AcroForm text values come first under their field names; inferred pairs
/// whose label matches a field name are dropped in their favour.
pub fn extract_all_fields(parser: &PdfParser, analysis_dpi: u32) -> Result<PageMap<PageFields>> {
    let widgets = widgets_per_page(parser);

    widgets
        .iter()
        .enumerate()
        .map(|(index, page_widgets)| {
            let (layout, raster) = PageLayout::analyze(parser, index, analysis_dpi)?;
            let titles = detect_titles(&layout);

            let mut fields = LabeledValues::new();
            for widget in page_widgets.iter().filter(|w| is_value_field(w)) {
                fields.insert(&widget.name, widget.value.clone().unwrap_or_default());
            }
            let widget_names: Vec<&str> = page_widgets.iter().map(|w| w.name.as_str()).collect();
            for pair in extract_fields(&layout) {
                if !widget_names.contains(&pair.label.as_str()) {
                    fields.insert(&pair.label, pair.value);
                }
            }

            tracing::debug!(
                "Page {}: {} fields, {} headings",
                index,
                fields.len(),
                titles.headings.len()
            );

            Ok(PageFields {
                title: titles.title,
                headings: titles.headings.into_iter().map(|h| h.text).collect(),
                fields,
                checkboxes: page_checkboxes(page_widgets, &layout, &raster),
            })
        })
        .collect()
}

fn is_value_field(widget: &WidgetField) -> bool {
    matches!(
        widget.kind,
        FieldKind::Text | FieldKind::ComboBox | FieldKind::ListBox
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::PdfBuilder;

    #[test]
    fn test_combines_widgets_and_inferred_fields() {
        let data = PdfBuilder::new()
            .page(|p| {
                p.text(72.0, 80.0, 22.0, "Abnahmeprotokoll")
                    .text(72.0, 200.0, 10.0, "Objekt:")
                    .text(200.0, 200.0, 10.0, "Halle 7")
                    .text(72.0, 220.0, 10.0, "Datum:")
                    .text(200.0, 220.0, 10.0, "12.03.2024")
                    .text(72.0, 240.0, 10.0, "Pruefer:")
                    .text(200.0, 240.0, 10.0, "wird überschrieben")
                    .text_field("Pruefer", 300.0, 300.0, "M. Meier")
                    .checkbox("abgenommen", 72.0, 400.0, 12.0, true)
            })
            .build();
        let parser = PdfParser::from_bytes(data).unwrap();
        let pages = extract_all_fields(&parser, 72).unwrap();
        let page = &pages.0[0];

        assert_eq!(page.title.as_deref(), Some("Abnahmeprotokoll"));
        assert_eq!(page.fields.get("Objekt"), Some("Halle 7"));
        assert_eq!(page.fields.get("Datum"), Some("12.03.2024"));
        assert_eq!(page.fields.get("Pruefer"), Some("M. Meier"));
        assert!(!page.fields.contains("Pruefer_2"));
        assert_eq!(page.checkboxes.len(), 1);
        assert!(page.checkboxes[0].checked);

        let json = serde_json::to_value(&pages).unwrap();
        assert_eq!(json["0"]["fields"]["Objekt"], "Halle 7");
    }
}
