//! AcroForm widget reader
//!
//! Walks every page's `/Annots` array for widget annotations and resolves
//! the field attributes they inherit through `/Parent` (`FT`, `Ff`, `V`, `T`).
//! Unlike a walk of `/AcroForm/Fields`, this knows which page each widget sits
//! on and where.

use lopdf::{Dictionary, Document, Object};
use serde::Serialize;

use super::error::Result;
use super::objects::{
    dict_get, number, page_box, page_rotation, rect_from_array, resolve, resolve_dict, text_value,
    to_page_space,
};
use super::types::Rect;

const FLAG_RADIO: u32 = 1 << 15; // Bit 16
const FLAG_PUSH_BUTTON: u32 = 1 << 16; // Bit 17
const FLAG_COMBO: u32 = 1 << 17; // Bit 18

/// Parent chains longer than this are treated as cyclic
const MAX_FIELD_DEPTH: usize = 32;

/// Form field type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Checkbox,
    Radio,
    PushButton,
    ComboBox,
    ListBox,
    Signature,
    Unknown,
}

/// One widget annotation with its resolved field attributes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetField {
    /// 0-based page index
    pub page: usize,
    /// Fully qualified field name (ancestor names joined with `.`)
    pub name: String,
    pub kind: FieldKind,
    pub value: Option<String>,
    /// Widget rectangle in the displayed (rotated) page, top-left origin
    pub rect: Rect,
}

impl WidgetField {
    /// Checked state for checkboxes and radio buttons
    pub fn is_checked(&self) -> bool {
        matches!(self.value.as_deref(), Some(v) if !v.is_empty() && v != "Off")
    }
}

/// Read all widgets, grouped by 0-based page index
pub fn read_widgets(data: &[u8]) -> Result<Vec<Vec<WidgetField>>> {
    let doc = Document::load_mem(data)?;
    let pages = doc.get_pages();
    let mut result = Vec::with_capacity(pages.len());

    for (index, (_, page_id)) in pages.iter().enumerate() {
        let mut widgets = Vec::new();
        let page_rect = page_box(&doc, *page_id);
        let rotation = page_rotation(&doc, *page_id);

        let annots = doc
            .get_dictionary(*page_id)
            .ok()
            .and_then(|page| dict_get(&doc, page, b"Annots"));

        if let Some(Object::Array(annots)) = annots {
            for annot in annots {
                let Some(dict) = resolve_dict(&doc, annot) else {
                    continue;
                };
                if !is_widget(&doc, dict) {
                    continue;
                }
                if let Some(widget) = parse_widget(&doc, dict, index, page_rect, rotation) {
                    widgets.push(widget);
                }
            }
        }

        tracing::debug!("Page {} has {} form widgets", index, widgets.len());
        result.push(widgets);
    }

    Ok(result)
}

fn is_widget(doc: &Document, dict: &Dictionary) -> bool {
    matches!(dict_get(doc, dict, b"Subtype"), Some(Object::Name(name)) if name == b"Widget")
}

fn parse_widget(
    doc: &Document,
    widget: &Dictionary,
    page: usize,
    page_rect: Rect,
    rotation: u16,
) -> Option<WidgetField> {
    let chain = field_chain(doc, widget);

    let name = full_name(doc, &chain);
    let flags = inherited(doc, &chain, b"Ff")
        .and_then(number)
        .unwrap_or(0.0) as u32;
    let kind = field_kind(doc, &chain, flags);

    // Checkbox and radio widgets carry their state in AS; V lives on the field
    let value = match kind {
        FieldKind::Checkbox | FieldKind::Radio => dict_get(doc, widget, b"AS")
            .and_then(text_value)
            .or_else(|| inherited(doc, &chain, b"V").and_then(text_value)),
        _ => inherited(doc, &chain, b"V").and_then(text_value),
    };

    let pdf_rect = widget
        .get(b"Rect")
        .ok()
        .and_then(|obj| rect_from_array(doc, obj))?;

    Some(WidgetField {
        page,
        name,
        kind,
        value,
        rect: to_page_space(pdf_rect, page_rect, rotation),
    })
}

/// The widget followed by its ancestors, nearest first
fn field_chain<'a>(doc: &'a Document, widget: &'a Dictionary) -> Vec<&'a Dictionary> {
    let mut chain = vec![widget];
    let mut current = widget;
    while chain.len() < MAX_FIELD_DEPTH {
        match current.get(b"Parent").ok().and_then(|p| resolve_dict(doc, p)) {
            Some(parent) => {
                chain.push(parent);
                current = parent;
            }
            None => break,
        }
    }
    chain
}

fn inherited<'a>(doc: &'a Document, chain: &[&'a Dictionary], key: &[u8]) -> Option<&'a Object> {
    chain.iter().find_map(|dict| dict_get(doc, dict, key))
}

fn full_name(doc: &Document, chain: &[&Dictionary]) -> String {
    let parts: Vec<String> = chain
        .iter()
        .rev()
        .filter_map(|dict| dict.get(b"T").ok())
        .filter_map(|t| resolve(doc, t).and_then(text_value))
        .filter(|t| !t.is_empty())
        .collect();

    if parts.is_empty() {
        "unnamed".to_string()
    } else {
        parts.join(".")
    }
}

fn field_kind(doc: &Document, chain: &[&Dictionary], flags: u32) -> FieldKind {
    let ft = match inherited(doc, chain, b"FT") {
        Some(Object::Name(name)) => name.as_slice(),
        _ => return FieldKind::Unknown,
    };

    match ft {
        b"Tx" => FieldKind::Text,
        b"Btn" => {
            if flags & FLAG_PUSH_BUTTON != 0 {
                FieldKind::PushButton
            } else if flags & FLAG_RADIO != 0 {
                FieldKind::Radio
            } else {
                FieldKind::Checkbox
            }
        }
        b"Ch" => {
            if flags & FLAG_COMBO != 0 {
                FieldKind::ComboBox
            } else {
                FieldKind::ListBox
            }
        }
        b"Sig" => FieldKind::Signature,
        _ => FieldKind::Unknown,
    }
}
