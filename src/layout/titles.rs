//! Titles and headings

use serde::Serialize;

use super::{PageLayout, Row};
use crate::pdf::Rect;

/// The title must start in this top fraction of the page
pub const TITLE_REGION: f32 = 0.30;

/// Minimum title size relative to the body size
pub const TITLE_SIZE_RATIO: f32 = 1.25;

/// Bold body-size rows in this top fraction are a title fallback
pub const BOLD_TITLE_REGION: f32 = 0.15;

/// Minimum heading size relative to the body size
pub const HEADING_SIZE_RATIO: f32 = 1.2;

/// Entirely bold rows up to this length are headings
pub const MAX_BOLD_HEADING_CHARS: usize = 80;

/// A heading row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heading {
    pub text: String,
    pub font_size: f32,
    pub bold: bool,
    pub bbox: Rect,
}

impl Heading {
    fn from_row(row: &Row) -> Self {
        Self {
            text: row.text(),
            font_size: row.font_size(),
            bold: row.all_bold(),
            bbox: row.bbox,
        }
    }
}

/// Title and headings of one page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TitleInfo {
    pub title: Option<String>,
    pub headings: Vec<Heading>,
}

/// Find the page title and headings
pub fn detect_titles(layout: &PageLayout) -> TitleInfo {
    let title_row = find_title_row(layout);

    let headings = layout
        .rows
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != title_row)
        .filter(|(_, row)| is_heading(layout, row))
        .map(|(_, row)| Heading::from_row(row))
        .collect();

    TitleInfo {
        title: title_row.map(|i| layout.rows[i].text()),
        headings,
    }
}

fn find_title_row(layout: &PageLayout) -> Option<usize> {
    if layout.body_size <= 0.0 {
        return None;
    }

    // Largest row near the top; the first one wins ties
    let largest = layout
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| layout.in_top(&row.bbox, TITLE_REGION))
        .fold(None::<(usize, f32)>, |best, (i, row)| match best {
            Some((_, size)) if size >= row.font_size() => best,
            _ => Some((i, row.font_size())),
        });

    if let Some((i, size)) = largest {
        if size >= layout.body_size * TITLE_SIZE_RATIO {
            return Some(i);
        }
    }

    layout.rows.iter().position(|row| {
        layout.in_top(&row.bbox, BOLD_TITLE_REGION)
            && row.all_bold()
            && !ends_with_colon(row)
            && row.font_size() >= layout.body_size * 0.95
    })
}

fn is_heading(layout: &PageLayout, row: &Row) -> bool {
    if ends_with_colon(row) {
        return false;
    }
    if layout.body_size > 0.0 && row.font_size() >= layout.body_size * HEADING_SIZE_RATIO {
        return true;
    }
    row.all_bold() && row.char_count() <= MAX_BOLD_HEADING_CHARS
}

/// Label rows ("Datum:") are fields, never headings
fn ends_with_colon(row: &Row) -> bool {
    row.spans
        .last()
        .is_some_and(|s| s.text.trim_end().ends_with(':'))
}
