//! Test fixtures
//!
//! Builds small PDFs in memory with lopdf. Coordinates given to the builder
//! use a top-left origin like the rest of the crate; text `y` is the
//! baseline. Pages are A4 and inherit their MediaBox from the page tree.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;

enum Widget {
    Checkbox {
        name: String,
        rect: [f32; 4],
        checked: bool,
    },
    TextField {
        name: String,
        rect: [f32; 4],
        value: String,
    },
}

/// Solid-colour RGB image placed on a page
struct PlacedImage {
    name: String,
    pixels: u32,
    color: [u8; 3],
}

/// Content, images and widgets of one page
#[derive(Default)]
pub struct PageBuilder {
    operations: Vec<Operation>,
    images: Vec<PlacedImage>,
    widgets: Vec<Widget>,
    rotation: Option<i64>,
}

impl PageBuilder {
    /// Set the page's `/Rotate` (degrees clockwise)
    pub fn rotate(mut self, degrees: i64) -> Self {
        self.rotation = Some(degrees);
        self
    }

    pub fn text(self, x: f32, y: f32, size: f32, text: &str) -> Self {
        self.text_with_font("F1", x, y, size, text)
    }

    pub fn bold_text(self, x: f32, y: f32, size: f32, text: &str) -> Self {
        self.text_with_font("F2", x, y, size, text)
    }

    fn text_with_font(mut self, font: &str, x: f32, y: f32, size: f32, text: &str) -> Self {
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), size.into()]),
            Operation::new("Td", vec![x.into(), (PAGE_HEIGHT - y).into()]),
            Operation::new("Tj", vec![Object::String(win_ansi(text), StringFormat::Literal)]),
            Operation::new("ET", vec![]),
        ]);
        self
    }

    /// Stroked rectangle (top-left corner at `x`, `y`)
    pub fn rect(mut self, x: f32, y: f32, width: f32, height: f32, line_width: f32) -> Self {
        self.operations.extend([
            Operation::new("w", vec![line_width.into()]),
            Operation::new(
                "re",
                vec![
                    x.into(),
                    (PAGE_HEIGHT - y - height).into(),
                    width.into(),
                    height.into(),
                ],
            ),
            Operation::new("S", vec![]),
        ]);
        self
    }

    pub fn filled_rect(mut self, x: f32, y: f32, width: f32, height: f32) -> Self {
        self.operations.extend([
            Operation::new(
                "re",
                vec![
                    x.into(),
                    (PAGE_HEIGHT - y - height).into(),
                    width.into(),
                    height.into(),
                ],
            ),
            Operation::new("f", vec![]),
        ]);
        self
    }

    pub fn line(mut self, x0: f32, y0: f32, x1: f32, y1: f32, line_width: f32) -> Self {
        self.operations.extend([
            Operation::new("w", vec![line_width.into()]),
            Operation::new("m", vec![x0.into(), (PAGE_HEIGHT - y0).into()]),
            Operation::new("l", vec![x1.into(), (PAGE_HEIGHT - y1).into()]),
            Operation::new("S", vec![]),
        ]);
        self
    }

    /// Image XObject drawn into the box with its top-left corner at `x`, `y`
    pub fn image(mut self, x: f32, y: f32, width: f32, height: f32, color: [u8; 3]) -> Self {
        let name = format!("Im{}", self.images.len());
        self.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    width.into(),
                    Object::Integer(0),
                    Object::Integer(0),
                    height.into(),
                    x.into(),
                    (PAGE_HEIGHT - y - height).into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ]);
        self.images.push(PlacedImage {
            name,
            pixels: 8,
            color,
        });
        self
    }

    /// AcroForm checkbox widget with its top-left corner at `x`, `y`
    pub fn checkbox(mut self, name: &str, x: f32, y: f32, size: f32, checked: bool) -> Self {
        self.widgets.push(Widget::Checkbox {
            name: name.to_string(),
            rect: [x, PAGE_HEIGHT - y - size, x + size, PAGE_HEIGHT - y],
            checked,
        });
        self
    }

    /// AcroForm text field widget with its top-left corner at `x`, `y`
    pub fn text_field(mut self, name: &str, x: f32, y: f32, value: &str) -> Self {
        self.widgets.push(Widget::TextField {
            name: name.to_string(),
            rect: [x, PAGE_HEIGHT - y - 14.0, x + 150.0, PAGE_HEIGHT - y],
            value: value.to_string(),
        });
        self
    }
}

/// Outline item pointing at a 0-based page
struct Bookmark {
    title: String,
    page: usize,
    children: Vec<Bookmark>,
}

/// In-memory PDF builder
#[derive(Default)]
pub struct PdfBuilder {
    title: Option<String>,
    pages: Vec<PageBuilder>,
    bookmarks: Vec<Bookmark>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Top-level outline item
    pub fn bookmark(mut self, title: &str, page: usize) -> Self {
        self.bookmarks.push(Bookmark {
            title: title.to_string(),
            page,
            children: Vec::new(),
        });
        self
    }

    /// Outline item nested under the last top-level one
    pub fn sub_bookmark(mut self, title: &str, page: usize) -> Self {
        let child = Bookmark {
            title: title.to_string(),
            page,
            children: Vec::new(),
        };
        match self.bookmarks.last_mut() {
            Some(parent) => parent.children.push(child),
            None => self.bookmarks.push(child),
        }
        self
    }

    pub fn page(mut self, build: impl FnOnce(PageBuilder) -> PageBuilder) -> Self {
        self.pages.push(build(PageBuilder::default()));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let regular = doc.add_object(font("Helvetica"));
        let bold = doc.add_object(font("Helvetica-Bold"));
        let resources = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => regular, "F2" => bold },
        });

        let mut kids = Vec::new();
        let mut page_ids = Vec::new();
        let mut fields = Vec::new();

        for page in self.pages {
            let content = Content {
                operations: page.operations,
            };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("encode page content"),
            ));

            let page_id = doc.new_object_id();
            let annots: Vec<Object> = page
                .widgets
                .iter()
                .map(|widget| {
                    let id = doc.add_object(widget_dict(widget, page_id));
                    fields.push(Object::Reference(id));
                    Object::Reference(id)
                })
                .collect();

            let page_resources = if page.images.is_empty() {
                Object::Reference(resources)
            } else {
                let mut xobjects = Dictionary::new();
                for image in &page.images {
                    let id = doc.add_object(image_stream(image));
                    xobjects.set(image.name.as_str(), id);
                }
                Object::Dictionary(dictionary! {
                    "Font" => dictionary! { "F1" => regular, "F2" => bold },
                    "XObject" => xobjects,
                })
            };

            let mut page_dict = dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Resources" => page_resources,
                "Contents" => content_id,
            };
            if !annots.is_empty() {
                page_dict.set("Annots", annots);
            }
            if let Some(degrees) = page.rotation {
                page_dict.set("Rotate", Object::Integer(degrees));
            }
            doc.objects.insert(page_id, Object::Dictionary(page_dict));
            kids.push(Object::Reference(page_id));
            page_ids.push(page_id);
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::from(PAGE_WIDTH),
                    Object::from(PAGE_HEIGHT),
                ],
            }),
        );

        let mut catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        };
        if !fields.is_empty() {
            catalog.set("AcroForm", dictionary! { "Fields" => fields });
        }
        if !self.bookmarks.is_empty() {
            let outlines_id = doc.new_object_id();
            let (first, last, count) =
                add_outline_items(&mut doc, outlines_id, &self.bookmarks, &page_ids);
            doc.objects.insert(
                outlines_id,
                Object::Dictionary(dictionary! {
                    "Type" => "Outlines",
                    "First" => first,
                    "Last" => last,
                    "Count" => count,
                }),
            );
            catalog.set("Outlines", outlines_id);
        }
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", catalog_id);

        if let Some(title) = self.title {
            let info_id = doc.add_object(dictionary! {
                "Title" => Object::String(utf16_be(&title), StringFormat::Hexadecimal),
            });
            doc.trailer.set("Info", info_id);
        }

        let mut output = Vec::new();
        doc.save_to(&mut output).expect("save test PDF");
        output
    }
}

fn image_stream(image: &PlacedImage) -> Stream {
    let pixels: Vec<u8> = (0..image.pixels * image.pixels)
        .flat_map(|_| image.color)
        .collect();
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.pixels as i64,
            "Height" => image.pixels as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        pixels,
    )
}

/// Write sibling outline items, returning (first, last, visible count)
fn add_outline_items(
    doc: &mut Document,
    parent: ObjectId,
    items: &[Bookmark],
    page_ids: &[ObjectId],
) -> (ObjectId, ObjectId, i64) {
    let ids: Vec<ObjectId> = items.iter().map(|_| doc.new_object_id()).collect();
    let mut count = 0;

    for (i, item) in items.iter().enumerate() {
        let mut dict = dictionary! {
            "Title" => Object::String(utf16_be(&item.title), StringFormat::Hexadecimal),
            "Parent" => parent,
            "Dest" => vec![Object::Reference(page_ids[item.page]), Object::Name(b"Fit".to_vec())],
        };
        if i > 0 {
            dict.set("Prev", ids[i - 1]);
        }
        if i + 1 < ids.len() {
            dict.set("Next", ids[i + 1]);
        }
        if !item.children.is_empty() {
            let (first, last, children) = add_outline_items(doc, ids[i], &item.children, page_ids);
            dict.set("First", first);
            dict.set("Last", last);
            dict.set("Count", children);
            count += children;
        }
        doc.objects.insert(ids[i], Object::Dictionary(dict));
        count += 1;
    }

    (ids[0], ids[ids.len() - 1], count)
}

fn font(base: &str) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    }
}

fn widget_dict(widget: &Widget, page_id: ObjectId) -> Dictionary {
    match widget {
        Widget::Checkbox {
            name,
            rect,
            checked,
        } => {
            let state = if *checked { "Yes" } else { "Off" };
            dictionary! {
                "Type" => "Annot",
                "Subtype" => "Widget",
                "FT" => "Btn",
                "T" => Object::string_literal(name.as_str()),
                "V" => state,
                "AS" => state,
                "F" => 4,
                "P" => page_id,
                "Rect" => rect.iter().map(|&v| Object::from(v)).collect::<Vec<_>>(),
            }
        }
        Widget::TextField { name, rect, value } => dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Tx",
            "T" => Object::string_literal(name.as_str()),
            "V" => Object::string_literal(value.as_str()),
            "F" => 4,
            "P" => page_id,
            "Rect" => rect.iter().map(|&v| Object::from(v)).collect::<Vec<_>>(),
        },
    }
}

/// Latin-1 subset of WinAnsiEncoding
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if (c as u32) < 256 { c as u8 } else { b'?' })
        .collect()
}

fn utf16_be(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    bytes
}
