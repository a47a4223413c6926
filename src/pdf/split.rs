//! Page splitting with lopdf
//!
//! Copies page ranges into fresh documents. Page objects are deep-cloned with
//! everything they reference; shared resources are copied once per output
//! document, and inheritable attributes are pinned onto the copied page.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use lopdf::{dictionary, Document, Object, ObjectId};

use super::error::{PdfError, Result};
use super::objects::inherited_attribute;

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Back-references that would drag unrelated pages into the copy
const SKIPPED_KEYS: [&[u8]; 3] = [b"Parent", b"P", b"B"];

/// A finished part of a split
#[derive(Debug, Clone)]
pub struct SplitPart {
    /// 0-based pages contained in this part
    pub pages: RangeInclusive<usize>,
    pub data: Vec<u8>,
}

impl SplitPart {
    /// Archive entry name, e.g. `page_0003.pdf` or `pages_0000-0002.pdf`
    pub fn file_name(&self) -> String {
        if self.pages.start() == self.pages.end() {
            format!("page_{:04}.pdf", self.pages.start())
        } else {
            format!("pages_{:04}-{:04}.pdf", self.pages.start(), self.pages.end())
        }
    }
}

/// Split a PDF into one document per range
pub fn split_pages(data: &[u8], ranges: &[RangeInclusive<usize>]) -> Result<Vec<SplitPart>> {
    let source = Document::load_mem(data)?;
    let page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();

    ranges
        .iter()
        .map(|range| {
            let ids = range
                .clone()
                .map(|index| {
                    page_ids
                        .get(index)
                        .copied()
                        .ok_or(PdfError::PageNotFound(index, page_ids.len()))
                })
                .collect::<Result<Vec<_>>>()?;

            let data = extract_pages(&source, &ids)?;
            tracing::debug!("Split part {:?}: {} bytes", range, data.len());
            Ok(SplitPart {
                pages: range.clone(),
                data,
            })
        })
        .collect()
}

/// Copy the given pages (in order) into a new serialized document
fn extract_pages(source: &Document, page_ids: &[ObjectId]) -> Result<Vec<u8>> {
    let mut target = Document::with_version(source.version.as_str());
    let pages_id = target.new_object_id();
    let mut copier = Copier {
        source,
        target: &mut target,
        mapping: HashMap::new(),
    };

    let mut kids = Vec::with_capacity(page_ids.len());
    for &page_id in page_ids {
        let new_page_id = copier.copy_page(page_id, pages_id)?;
        kids.push(Object::Reference(new_page_id));
    }

    let count = kids.len() as i64;
    target.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = target.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    target.trailer.set("Root", catalog_id);

    let mut output = Vec::new();
    target
        .save_to(&mut output)
        .map_err(|e| PdfError::WriteError(e.to_string()))?;
    Ok(output)
}

struct Copier<'a> {
    source: &'a Document,
    target: &'a mut Document,
    /// Source object id -> target object id
    mapping: HashMap<ObjectId, ObjectId>,
}

impl Copier<'_> {
    fn copy_page(&mut self, page_id: ObjectId, pages_id: ObjectId) -> Result<ObjectId> {
        let page = self
            .source
            .get_dictionary(page_id)
            .map_err(|e| PdfError::LoadError(format!("page object {:?}: {}", page_id, e)))?;

        // Reserve the id first so annotations pointing back at the page resolve
        let new_id = self.target.new_object_id();
        self.mapping.insert(page_id, new_id);

        let mut copy = lopdf::Dictionary::new();
        for (key, value) in page.iter() {
            if SKIPPED_KEYS.contains(&key.as_slice()) {
                continue;
            }
            copy.set(key.clone(), self.copy_object(value));
        }
        for key in INHERITABLE {
            if !page.has(key) {
                if let Some(value) = inherited_attribute(self.source, page_id, key) {
                    copy.set(key.to_vec(), self.copy_object(value));
                }
            }
        }
        copy.set("Parent", Object::Reference(pages_id));

        self.target.objects.insert(new_id, Object::Dictionary(copy));
        Ok(new_id)
    }

    fn copy_object(&mut self, object: &Object) -> Object {
        match object {
            Object::Reference(id) => Object::Reference(self.copy_reference(*id)),
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dictionary(dict)),
            Object::Array(items) => Object::Array(items.iter().map(|i| self.copy_object(i)).collect()),
            Object::Stream(stream) => {
                let dict = self.copy_dictionary(&stream.dict);
                Object::Stream(lopdf::Stream::new(dict, stream.content.clone()))
            }
            other => other.clone(),
        }
    }

    fn copy_dictionary(&mut self, dict: &lopdf::Dictionary) -> lopdf::Dictionary {
        let mut copy = lopdf::Dictionary::new();
        for (key, value) in dict.iter() {
            if SKIPPED_KEYS.contains(&key.as_slice()) {
                continue;
            }
            copy.set(key.clone(), self.copy_object(value));
        }
        copy
    }

    fn copy_reference(&mut self, id: ObjectId) -> ObjectId {
        if let Some(mapped) = self.mapping.get(&id) {
            return *mapped;
        }

        let new_id = self.target.new_object_id();
        self.mapping.insert(id, new_id);

        let copied = match self.source.get_object(id) {
            Ok(object) => self.copy_object(object),
            Err(err) => {
                tracing::warn!("Cannot resolve reference {:?}: {}, using null", id, err);
                Object::Null
            }
        };
        self.target.objects.insert(new_id, copied);
        new_id
    }
}
