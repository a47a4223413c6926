//! Chapter boundaries
//!
//! Chapters come from the document outline when there is one. Otherwise a
//! page starts a chapter when a prominent row near its top looks like a
//! chapter heading ("Kapitel 3", "2.1 Ergebnisse").

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::PageLayout;
use crate::pdf::OutlineEntry;

/// Chapter headings must start in this top fraction of the page
pub const CHAPTER_REGION: f32 = 0.35;

/// Minimum heading size relative to the body size (unless bold)
pub const CHAPTER_SIZE_RATIO: f32 = 1.3;

/// Title of the pseudo-chapter covering pages before the first heading
pub const FRONT_MATTER: &str = "Front matter";

static KEYWORD_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(Kapitel|Chapter|Teil|Part|Abschnitt|Section)\s+\S+")
        .expect("valid chapter keyword regex")
});

static NUMBERED_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)*)\.?\s+\p{Lu}").expect("valid numbered heading regex")
});

/// A chapter and its inclusive 0-based page range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chapter {
    pub title: String,
    pub level: usize,
    pub start_page: usize,
    pub end_page: usize,
}

/// Chapters at `level` from outline entries in document order
///
/// A chapter ends on the page before the next entry at the same or a higher
/// level, the last one on the final page. Entries without a target page are
/// skipped.
pub fn chapters_from_outline(
    entries: &[OutlineEntry],
    level: usize,
    page_count: usize,
) -> Vec<Chapter> {
    if page_count == 0 {
        return Vec::new();
    }
    let last_page = page_count - 1;
    let targeted: Vec<(&OutlineEntry, usize)> = entries
        .iter()
        .filter_map(|e| e.page.map(|p| (e, p.min(last_page))))
        .collect();

    targeted
        .iter()
        .enumerate()
        .filter(|(_, (entry, _))| entry.level == level)
        .map(|(i, (entry, start))| {
            let end = targeted[i + 1..]
                .iter()
                .find(|(next, _)| next.level <= level)
                .map_or(last_page, |(_, next_start)| next_start.saturating_sub(1))
                .max(*start);
            Chapter {
                title: entry.title.clone(),
                level: entry.level,
                start_page: *start,
                end_page: end,
            }
        })
        .collect()
}

/// The chapter heading on a page, with its nesting level
///
/// `body_size` is the document's body size; a page's own median is useless
/// on chapter openers made up mostly of the heading itself.
pub fn detect_chapter_heading(layout: &PageLayout, body_size: f32) -> Option<(String, usize)> {
    layout
        .rows
        .iter()
        .filter(|row| layout.in_top(&row.bbox, CHAPTER_REGION))
        .filter(|row| {
            row.all_bold()
                || (body_size > 0.0 && row.font_size() >= body_size * CHAPTER_SIZE_RATIO)
        })
        .find_map(|row| {
            let text = row.text();
            let text = text.trim();
            if KEYWORD_HEADING.is_match(text) {
                return Some((text.to_string(), 1));
            }
            NUMBERED_HEADING.captures(text).map(|caps| {
                let level = caps[1].split('.').count();
                (text.to_string(), level)
            })
        })
}

/// Chapters from per-page headings (`headings[i]` belongs to page `i`)
pub fn heuristic_chapters(
    headings: &[Option<(String, usize)>],
    level: usize,
    page_count: usize,
) -> Vec<Chapter> {
    let entries: Vec<OutlineEntry> = headings
        .iter()
        .enumerate()
        .filter_map(|(page, heading)| {
            heading.as_ref().map(|(title, heading_level)| OutlineEntry {
                title: title.clone(),
                level: *heading_level,
                page: Some(page),
            })
        })
        .collect();

    let mut chapters = chapters_from_outline(&entries, level, page_count);
    if let Some(first) = chapters.first() {
        if first.start_page > 0 {
            let end_page = first.start_page - 1;
            chapters.insert(
                0,
                Chapter {
                    title: FRONT_MATTER.to_string(),
                    level,
                    start_page: 0,
                    end_page,
                },
            );
        }
    }
    chapters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::{PageSize, Rect, TextSpan};

    fn entry(title: &str, level: usize, page: Option<usize>) -> OutlineEntry {
        OutlineEntry {
            title: title.to_string(),
            level,
            page,
        }
    }

    fn page(rows: &[(&str, f32, f32, bool)]) -> PageLayout {
        let spans = rows
            .iter()
            .map(|(text, y, size, bold)| {
                let width = text.chars().count() as f32 * size * 0.5;
                TextSpan::new(*text, Rect::new(50.0, *y, 50.0 + width, y + size * 1.2), *size)
                    .with_bold(*bold)
            })
            .collect();
        PageLayout::from_spans(
            0,
            PageSize {
                width: 595.0,
                height: 842.0,
            },
            spans,
        )
    }

    #[test]
    fn test_outline_ranges() {
        let entries = vec![
            entry("Einleitung", 1, Some(0)),
            entry("Grundlagen", 1, Some(2)),
            entry("Begriffe", 2, Some(3)),
            entry("Extern", 1, None),
            entry("Auswertung", 1, Some(5)),
        ];
        let chapters = chapters_from_outline(&entries, 1, 9);
        let ranges: Vec<(&str, usize, usize)> = chapters
            .iter()
            .map(|c| (c.title.as_str(), c.start_page, c.end_page))
            .collect();
        assert_eq!(
            ranges,
            vec![("Einleitung", 0, 1), ("Grundlagen", 2, 4), ("Auswertung", 5, 8)]
        );

        let sub = chapters_from_outline(&entries, 2, 9);
        assert_eq!((sub[0].start_page, sub[0].end_page), (3, 4));
    }

    #[test]
    fn test_same_page_entries_do_not_invert() {
        let entries = vec![entry("A", 1, Some(2)), entry("B", 1, Some(2))];
        let chapters = chapters_from_outline(&entries, 1, 4);
        assert_eq!((chapters[0].start_page, chapters[0].end_page), (2, 2));
        assert_eq!((chapters[1].start_page, chapters[1].end_page), (2, 3));
    }

    #[test]
    fn test_detect_heading_patterns() {
        let body = ("Fließtext auf normaler Größe, lang genug.", 400.0, 10.0, false);

        let keyword = page(&[("Kapitel 2 Messungen", 80.0, 16.0, false), body]);
        assert_eq!(
            detect_chapter_heading(&keyword, 10.0),
            Some(("Kapitel 2 Messungen".to_string(), 1))
        );

        let numbered = page(&[("3.1 Ergebnisse", 80.0, 10.0, true), body]);
        assert_eq!(
            detect_chapter_heading(&numbered, 10.0),
            Some(("3.1 Ergebnisse".to_string(), 2))
        );

        let small = page(&[("Kapitel 4", 80.0, 10.0, false), body]);
        assert_eq!(detect_chapter_heading(&small, 10.0), None);

        let low = page(&[body, ("Kapitel 5", 500.0, 16.0, false)]);
        assert_eq!(detect_chapter_heading(&low, 10.0), None);
    }

    #[test]
    fn test_heading_dominated_page_uses_document_body_size() {
        let opener = page(&[
            ("Kapitel 1 Einleitung", 80.0, 18.0, false),
            ("Siehe unten.", 140.0, 10.0, false),
        ]);
        assert_eq!(opener.body_size, 18.0);
        assert_eq!(
            detect_chapter_heading(&opener, 10.0),
            Some(("Kapitel 1 Einleitung".to_string(), 1))
        );
        assert_eq!(detect_chapter_heading(&opener, opener.body_size), None);
    }

    #[test]
    fn test_heuristic_chapters_with_front_matter() {
        let headings = vec![
            None,
            None,
            Some(("1 Einleitung".to_string(), 1)),
            None,
            Some(("2 Methodik".to_string(), 1)),
            Some(("2.1 Aufbau".to_string(), 2)),
        ];
        let chapters = heuristic_chapters(&headings, 1, 6);
        let ranges: Vec<(&str, usize, usize)> = chapters
            .iter()
            .map(|c| (c.title.as_str(), c.start_page, c.end_page))
            .collect();
        assert_eq!(
            ranges,
            vec![
                (FRONT_MATTER, 0, 1),
                ("1 Einleitung", 2, 3),
                ("2 Methodik", 4, 5)
            ]
        );
        assert!(heuristic_chapters(&[None, None], 1, 2).is_empty());
    }
}
