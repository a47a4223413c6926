//! lopdf object helpers
//!
//! Reference resolution, inherited page attributes and text-string decoding
//! shared by the form-field reader and the page splitter.

use lopdf::{Dictionary, Document, Object, ObjectId};

use super::types::Rect;

/// Reference chains longer than this are treated as broken
const MAX_REFERENCE_DEPTH: usize = 32;

/// Follow references until a direct object is reached
pub fn resolve<'a>(doc: &'a Document, mut object: &'a Object) -> Option<&'a Object> {
    for _ in 0..MAX_REFERENCE_DEPTH {
        match object {
            Object::Reference(id) => object = doc.get_object(*id).ok()?,
            other => return Some(other),
        }
    }
    None
}

/// Resolve and view as a dictionary (stream dictionaries included)
pub fn resolve_dict<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, object)? {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

/// Look up a key and resolve its value
pub fn dict_get<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    resolve(doc, dict.get(key).ok()?)
}

/// Numeric value of an integer or real object
pub fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Name or string value as text
pub fn text_value(object: &Object) -> Option<String> {
    match object {
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        _ => None,
    }
}

/// Decode a PDF text string (UTF-16BE with BOM, UTF-8 with BOM, or
/// PDFDocEncoding, approximated as Latin-1)
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// Rectangle from a 4-number array, normalized so x0 <= x1 and y0 <= y1
/// (PDF user space, bottom-left origin)
pub fn rect_from_array(doc: &Document, object: &Object) -> Option<Rect> {
    let Object::Array(items) = resolve(doc, object)? else {
        return None;
    };
    if items.len() != 4 {
        return None;
    }
    let values: Vec<f32> = items
        .iter()
        .filter_map(|item| resolve(doc, item).and_then(number))
        .collect();
    if values.len() != 4 {
        return None;
    }
    Some(Rect::new(
        values[0].min(values[2]),
        values[1].min(values[3]),
        values[0].max(values[2]),
        values[1].max(values[3]),
    ))
}

/// Look up a page attribute, walking up the page tree for inheritable keys
/// (`Resources`, `MediaBox`, `CropBox`, `Rotate`)
pub fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_REFERENCE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        let parent = node.get(b"Parent").ok()?;
        node = resolve_dict(doc, parent)?;
    }
    None
}

/// Page rotation in degrees clockwise, normalised to 0, 90, 180 or 270
pub fn page_rotation(doc: &Document, page_id: ObjectId) -> u16 {
    let degrees = inherited_attribute(doc, page_id, b"Rotate")
        .and_then(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_i64().ok())
        .unwrap_or(0);
    match degrees.rem_euclid(360) {
        90 => 90,
        180 => 180,
        270 => 270,
        _ => 0,
    }
}

/// Map a rectangle from PDF user space into the displayed page's
/// top-left space, the one MuPDF reports text in
pub fn to_page_space(rect: Rect, page: Rect, rotation: u16) -> Rect {
    let (width, height) = (page.width(), page.height());
    let corner = |x: f32, y: f32| {
        let (x, y) = (x - page.x0, page.y1 - y);
        match rotation {
            90 => (height - y, x),
            180 => (width - x, height - y),
            270 => (y, width - x),
            _ => (x, y),
        }
    };
    let (ax, ay) = corner(rect.x0, rect.y0);
    let (bx, by) = corner(rect.x1, rect.y1);
    Rect::new(ax.min(bx), ay.min(by), ax.max(bx), ay.max(by))
}

/// Visible page box (CropBox falling back to MediaBox, then US Letter)
pub fn page_box(doc: &Document, page_id: ObjectId) -> Rect {
    inherited_attribute(doc, page_id, b"CropBox")
        .and_then(|obj| rect_from_array(doc, obj))
        .or_else(|| {
            inherited_attribute(doc, page_id, b"MediaBox").and_then(|obj| rect_from_array(doc, obj))
        })
        .unwrap_or(Rect::new(0.0, 0.0, 612.0, 792.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn test_decode_text_string() {
        assert_eq!(decode_text_string(b"Pr\xfcfung"), "Prüfung");
        assert_eq!(
            decode_text_string(&[0xFE, 0xFF, 0x00, 0x4F, 0x00, 0x4B]),
            "OK"
        );
        assert_eq!(decode_text_string(b"\xef\xbb\xbfGr\xc3\xbc\xc3\x9fe"), "Grüße");
    }

    #[test]
    fn test_number() {
        assert_eq!(number(&Object::Integer(3)), Some(3.0));
        assert_eq!(number(&Object::Name(b"X".to_vec())), None);
    }

    #[test]
    fn test_resolve_and_rect() {
        let mut doc = Document::with_version("1.5");
        let id = doc.add_object(Object::Array(vec![
            Object::Integer(100),
            Object::Integer(50),
            Object::Integer(20),
            Object::Integer(10),
        ]));
        let rect = rect_from_array(&doc, &Object::Reference(id)).unwrap();
        assert_eq!(rect, Rect::new(20.0, 10.0, 100.0, 50.0));
        assert!(resolve(&doc, &Object::Reference((999, 0))).is_none());
    }

    #[test]
    fn test_to_page_space_rotations() {
        let page = Rect::new(0.0, 0.0, 600.0, 800.0);
        // 10pt box 50pt from the left, 100pt from the top of the unrotated page
        let rect = Rect::new(50.0, 690.0, 60.0, 700.0);

        assert_eq!(to_page_space(rect, page, 0), Rect::new(50.0, 100.0, 60.0, 110.0));
        assert_eq!(to_page_space(rect, page, 90), Rect::new(690.0, 50.0, 700.0, 60.0));
        assert_eq!(to_page_space(rect, page, 180), Rect::new(540.0, 690.0, 550.0, 700.0));
        assert_eq!(to_page_space(rect, page, 270), Rect::new(100.0, 540.0, 110.0, 550.0));
    }

    #[test]
    fn test_page_rotation_is_inherited_and_normalised() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.add_object(dictionary! { "Type" => "Pages", "Rotate" => Object::Integer(-90) });
        let page_id = doc.add_object(dictionary! { "Type" => "Page", "Parent" => pages_id });
        let odd_id = doc.add_object(dictionary! { "Type" => "Page", "Rotate" => Object::Integer(45) });

        assert_eq!(page_rotation(&doc, page_id), 270);
        assert_eq!(page_rotation(&doc, odd_id), 0);
    }
}
