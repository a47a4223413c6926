//! PDF data types
//!
//! Core types shared by the extraction endpoints and the layout engine.
//! All coordinates are in PDF points with the origin at the top-left corner
//! of the page (MuPDF's device space).

use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Axis-aligned rectangle in page space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        (self.x1 - self.x0).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y1 - self.y0).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn center_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    pub fn center_y(&self) -> f32 {
        (self.y0 + self.y1) / 2.0
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Smallest rectangle covering both
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Length of the shared horizontal interval (0 when disjoint)
    pub fn horizontal_overlap(&self, other: &Rect) -> f32 {
        (self.x1.min(other.x1) - self.x0.max(other.x0)).max(0.0)
    }

    /// Length of the shared vertical interval (0 when disjoint)
    pub fn vertical_overlap(&self, other: &Rect) -> f32 {
        (self.y1.min(other.y1) - self.y0.max(other.y0)).max(0.0)
    }

    pub fn contains(&self, other: &Rect) -> bool {
        other.x0 >= self.x0 && other.x1 <= self.x1 && other.y0 >= self.y0 && other.y1 <= self.y1
    }

    /// Grow (positive) or shrink (negative) on every side
    pub fn pad(&self, amount: f32) -> Rect {
        Rect {
            x0: self.x0 - amount,
            y0: self.y0 - amount,
            x1: self.x1 + amount,
            y1: self.y1 + amount,
        }
    }

    /// Scale into raster pixel space
    pub fn scaled(&self, scale: f32) -> Rect {
        Rect {
            x0: self.x0 * scale,
            y0: self.y0 * scale,
            x1: self.x1 * scale,
            y1: self.y1 * scale,
        }
    }
}

/// A run of text on a single line, separated from its neighbours by a
/// visible horizontal gap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    pub bbox: Rect,
    pub font_size: f32,
    /// Filled in by the layout engine from the page raster
    pub bold: bool,
    /// Index of the MuPDF line this span was cut from
    pub line: usize,
    /// Index of the MuPDF block this span belongs to
    pub block: usize,
    /// Horizontal extent of each character in `text`
    #[serde(skip)]
    pub char_edges: Vec<(f32, f32)>,
}

impl TextSpan {
    /// Convenience constructor used by the layout engine and tests
    pub fn new(text: impl Into<String>, bbox: Rect, font_size: f32) -> Self {
        let text = text.into();
        let count = text.chars().count().max(1) as f32;
        let step = bbox.width() / count;
        let char_edges = (0..text.chars().count())
            .map(|i| {
                let x0 = bbox.x0 + step * i as f32;
                (x0, x0 + step)
            })
            .collect();
        Self {
            text,
            bbox,
            font_size,
            bold: false,
            line: 0,
            block: 0,
            char_edges,
        }
    }

    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Bounding box of the characters `start..end` (char indices)
    pub fn char_range_bbox(&self, start: usize, end: usize) -> Rect {
        if self.char_edges.is_empty() || start >= end {
            return self.bbox;
        }
        let last = self.char_edges.len() - 1;
        let first = start.min(last);
        let final_idx = (end - 1).min(last);
        Rect {
            x0: self.char_edges[first].0,
            y0: self.bbox.y0,
            x1: self.char_edges[final_idx].1,
            y1: self.bbox.y1,
        }
    }
}

/// Page size in points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub fn orientation(&self) -> PageOrientation {
        if self.width > self.height {
            PageOrientation::Landscape
        } else {
            PageOrientation::Portrait
        }
    }
}

/// Page orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageOrientation {
    #[default]
    Portrait,
    Landscape,
}

/// PDF metadata extracted from the document info dictionary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PdfMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Vec<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    /// RFC 3339 when the PDF date could be parsed, raw value otherwise
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
}

/// A flattened outline (bookmark) entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub title: String,
    /// Nesting depth, 1 for top-level entries
    pub level: usize,
    /// 0-based target page, `None` for external links
    pub page: Option<usize>,
}

/// Image output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Webp,
    Jpeg,
}

impl ImageFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Webp => "webp",
            ImageFormat::Jpeg => "jpg",
        }
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "png" => Ok(ImageFormat::Png),
            "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
            "webp" => Ok(ImageFormat::Webp),
            other => Err(format!("unsupported image format '{}'", other)),
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Per-page results serialized as a JSON object keyed by the 0-based page
/// index ("0", "1", ...), in page order
#[derive(Debug, Clone, PartialEq)]
pub struct PageMap<T>(pub Vec<T>);

impl<T> PageMap<T> {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> FromIterator<T> for PageMap<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        PageMap(iter.into_iter().collect())
    }
}

impl<T: Serialize> Serialize for PageMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (index, value) in self.0.iter().enumerate() {
            map.serialize_entry(&index.to_string(), value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_format_content_type() {
        assert_eq!(ImageFormat::Png.content_type(), "image/png");
        assert_eq!(ImageFormat::Webp.content_type(), "image/webp");
        assert_eq!(ImageFormat::Jpeg.content_type(), "image/jpeg");
    }

    #[test]
    fn test_image_format_parse() {
        assert_eq!("JPG".parse::<ImageFormat>().unwrap(), ImageFormat::Jpeg);
        assert_eq!("".parse::<ImageFormat>().unwrap(), ImageFormat::Png);
        assert!("tiff".parse::<ImageFormat>().is_err());
    }

    #[test]
    fn test_page_map_keeps_page_order() {
        let pages: PageMap<usize> = (0..12).collect();
        let json = serde_json::to_string(&pages).unwrap();
        assert!(json.starts_with(r#"{"0":0,"1":1,"2":2"#));
        assert!(json.ends_with(r#""10":10,"11":11}"#));
    }

    #[test]
    fn test_char_range_bbox() {
        let span = TextSpan::new("abcd", Rect::new(10.0, 0.0, 50.0, 10.0), 10.0);
        let bbox = span.char_range_bbox(1, 3);
        assert_eq!(bbox.x0, 20.0);
        assert_eq!(bbox.x1, 40.0);
        assert_eq!(bbox.y1, 10.0);
    }

    #[test]
    fn test_rect_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 8.0, 20.0, 30.0);
        assert_eq!(a.horizontal_overlap(&b), 5.0);
        assert_eq!(a.vertical_overlap(&b), 2.0);
        assert_eq!(a.union(&b), Rect::new(0.0, 0.0, 20.0, 30.0));
    }
}
