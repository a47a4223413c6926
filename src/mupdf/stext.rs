//! Structured Text Helpers
//!
//! Helpers for extracting positioned text from MuPDF pages. MuPDF groups
//! characters into blocks and lines; forms routinely put a label and its
//! value on the same MuPDF line, so lines are cut further into spans at
//! visible horizontal gaps.

use mupdf::text_page::TextBlockType;
use mupdf::{Page, TextPageOptions};

use crate::pdf::{Rect, Result, TextSpan};

/// A line is cut where the gap between two inked glyphs exceeds this
/// fraction of the font size
pub const SPAN_GAP_EM: f32 = 0.8;

/// One positioned character
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub c: char,
    pub bbox: Rect,
    pub size: f32,
}

impl Glyph {
    pub fn new(c: char, bbox: Rect, size: f32) -> Self {
        Self { c, bbox, size }
    }
}

/// Extract text spans from a page in reading order
pub fn extract_spans(page: &Page) -> Result<Vec<TextSpan>> {
    let text_page = page.to_text_page(TextPageOptions::PRESERVE_WHITESPACE)?;
    let mut spans = Vec::new();
    let mut line_index = 0;

    for (block_index, block) in text_page.blocks().enumerate() {
        if block.r#type() != TextBlockType::Text {
            continue;
        }
        for line in block.lines() {
            let glyphs: Vec<Glyph> = line
                .chars()
                .filter_map(|ch| {
                    let c = ch.char()?;
                    let quad = ch.quad();
                    // Character bounding box from quad
                    let bbox = Rect::new(
                        quad.ul.x.min(quad.ll.x),
                        quad.ul.y.min(quad.ur.y),
                        quad.ur.x.max(quad.lr.x),
                        quad.ll.y.max(quad.lr.y),
                    );
                    Some(Glyph::new(c, bbox, ch.size()))
                })
                .collect();

            spans.extend(split_line(&glyphs, line_index, block_index));
            line_index += 1;
        }
    }

    Ok(spans)
}

/// Cut one line of glyphs into spans at wide horizontal gaps
pub fn split_line(glyphs: &[Glyph], line: usize, block: usize) -> Vec<TextSpan> {
    let mut spans = Vec::new();
    let mut current: Vec<Glyph> = Vec::new();
    let mut last_ink_x1: Option<f32> = None;

    for glyph in glyphs {
        if glyph.c.is_whitespace() {
            if !current.is_empty() {
                current.push(*glyph);
            }
            continue;
        }

        if let Some(x1) = last_ink_x1 {
            let gap = glyph.bbox.x0 - x1;
            if gap > glyph.size.max(1.0) * SPAN_GAP_EM {
                if let Some(span) = build_span(&current, line, block) {
                    spans.push(span);
                }
                current.clear();
            }
        }

        current.push(*glyph);
        last_ink_x1 = Some(glyph.bbox.x1);
    }

    if let Some(span) = build_span(&current, line, block) {
        spans.push(span);
    }

    spans
}

fn build_span(glyphs: &[Glyph], line: usize, block: usize) -> Option<TextSpan> {
    let start = glyphs.iter().position(|g| !g.c.is_whitespace())?;
    let end = glyphs.iter().rposition(|g| !g.c.is_whitespace())? + 1;
    let glyphs = &glyphs[start..end];

    let mut bbox: Option<Rect> = None;
    let mut font_size = 0.0f32;
    for glyph in glyphs.iter().filter(|g| !g.c.is_whitespace()) {
        bbox = Some(match bbox {
            Some(b) => b.union(&glyph.bbox),
            None => glyph.bbox,
        });
        font_size = font_size.max(glyph.size);
    }

    Some(TextSpan {
        text: glyphs.iter().map(|g| g.c).collect(),
        bbox: bbox?,
        font_size,
        bold: false,
        line,
        block,
        char_edges: glyphs.iter().map(|g| (g.bbox.x0, g.bbox.x1)).collect(),
    })
}

/// Get plain text from a page (without positions)
pub fn extract_plain_text(page: &Page) -> Result<String> {
    let text_page = page.to_text_page(TextPageOptions::empty())?;
    let mut text = String::new();

    for block in text_page.blocks() {
        if block.r#type() != TextBlockType::Text {
            continue;
        }
        for line in block.lines() {
            for ch in line.chars() {
                if let Some(c) = ch.char() {
                    text.push(c);
                }
            }
            text.push('\n');
        }
        text.push('\n');
    }

    Ok(text)
}

/// Search for text in a page, returning bounding boxes
pub fn search_text(page: &Page, query: &str, max_hits: u32) -> Result<Vec<Rect>> {
    let quads = page.search(query, max_hits)?;

    Ok(quads
        .into_iter()
        .map(|q| {
            Rect::new(
                q.ul.x.min(q.ll.x),
                q.ul.y.min(q.ur.y),
                q.ur.x.max(q.lr.x),
                q.ll.y.max(q.lr.y),
            )
        })
        .collect())
}

/// Bounding boxes of the image blocks on a page
pub fn image_block_bounds(page: &Page) -> Result<Vec<Rect>> {
    let text_page = page.to_text_page(TextPageOptions::PRESERVE_IMAGES)?;

    Ok(text_page
        .blocks()
        .filter(|block| block.r#type() == TextBlockType::Image)
        .map(|block| {
            let b = block.bounds();
            Rect::new(b.x0, b.y0, b.x1, b.y1)
        })
        .filter(|r| !r.is_empty())
        .collect())
}
