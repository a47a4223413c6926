//! Chapter boundaries
//!
//! Outline entries at the requested level when the document has them,
//! otherwise page-level chapter headings measured against the document's
//! body font size.

use serde::Serialize;

use crate::layout::{
    body_font_size, chapters_from_outline, detect_chapter_heading, heuristic_chapters, Chapter,
    PageLayout,
};
use crate::pdf::{PdfParser, Result, TextSpan};

/// Where chapter boundaries came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChapterSource {
    Outline,
    Heuristic,
}

/// Chapter boundaries of a document
#[derive(Debug, Serialize)]
pub struct ChapterReport {
    pub source: ChapterSource,
    pub page_count: usize,
    pub chapters: Vec<Chapter>,
}

/// Chapter boundaries at `level`
///
/// Uses the outline unless `force_heuristic` is set or the outline has no
/// entries at that level; otherwise scans every page for chapter headings.
pub fn extract_chapters(
    parser: &PdfParser,
    level: usize,
    force_heuristic: bool,
    analysis_dpi: u32,
) -> Result<ChapterReport> {
    let page_count = parser.page_count();

    if !force_heuristic {
        let outline = parser.outline()?;
        let chapters = chapters_from_outline(&outline, level, page_count);
        if !chapters.is_empty() {
            tracing::debug!("{} chapters from outline", chapters.len());
            return Ok(ChapterReport {
                source: ChapterSource::Outline,
                page_count,
                chapters,
            });
        }
    }

    let layouts = (0..page_count)
        .map(|index| PageLayout::analyze(parser, index, analysis_dpi).map(|(layout, _)| layout))
        .collect::<Result<Vec<_>>>()?;
    let all_spans: Vec<TextSpan> = layouts.iter().flat_map(|l| l.spans.iter().cloned()).collect();
    let body_size = body_font_size(&all_spans);
    tracing::debug!("Document body size {:.1}pt", body_size);

    let headings: Vec<_> = layouts
        .iter()
        .map(|layout| detect_chapter_heading(layout, body_size))
        .collect();

    let chapters = heuristic_chapters(&headings, level, page_count);
    tracing::debug!("{} chapters from page headings", chapters.len());

    Ok(ChapterReport {
        source: ChapterSource::Heuristic,
        page_count,
        chapters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::chapters::FRONT_MATTER;
    use crate::testutil::PdfBuilder;

    #[test]
    fn test_heuristic_when_no_outline() {
        let body = "Dies ist gewöhnlicher Fließtext einer Seite.";
        let data = PdfBuilder::new()
            .page(|p| p.text(72.0, 100.0, 10.0, body))
            .page(|p| p.text(72.0, 100.0, 18.0, "Kapitel 1 Einleitung").text(72.0, 300.0, 10.0, body))
            .page(|p| p.text(72.0, 300.0, 10.0, body))
            .page(|p| p.text(72.0, 100.0, 18.0, "Kapitel 2 Befund").text(72.0, 300.0, 10.0, body))
            .build();
        let parser = PdfParser::from_bytes(data).unwrap();
        let report = extract_chapters(&parser, 1, false, 72).unwrap();

        assert_eq!(report.source, ChapterSource::Heuristic);
        assert_eq!(report.page_count, 4);
        let ranges: Vec<(&str, usize, usize)> = report
            .chapters
            .iter()
            .map(|c| (c.title.as_str(), c.start_page, c.end_page))
            .collect();
        assert_eq!(
            ranges,
            vec![
                (FRONT_MATTER, 0, 0),
                ("Kapitel 1 Einleitung", 1, 2),
                ("Kapitel 2 Befund", 3, 3)
            ]
        );
    }

    #[test]
    fn test_outline_chapters() {
        let data = PdfBuilder::new()
            .page(|p| p.text(72.0, 100.0, 10.0, "Vorwort"))
            .page(|p| p.text(72.0, 100.0, 10.0, "Einleitung"))
            .page(|p| p.text(72.0, 100.0, 10.0, "Methodik"))
            .page(|p| p.text(72.0, 100.0, 10.0, "Aufbau"))
            .page(|p| p.text(72.0, 100.0, 10.0, "Anhang"))
            .bookmark("Einleitung", 1)
            .bookmark("Methodik", 2)
            .sub_bookmark("Aufbau", 3)
            .build();
        let parser = PdfParser::from_bytes(data).unwrap();

        let report = extract_chapters(&parser, 1, false, 72).unwrap();
        assert_eq!(report.source, ChapterSource::Outline);
        let ranges: Vec<(&str, usize, usize)> = report
            .chapters
            .iter()
            .map(|c| (c.title.as_str(), c.start_page, c.end_page))
            .collect();
        assert_eq!(ranges, vec![("Einleitung", 1, 1), ("Methodik", 2, 4)]);

        let sub = extract_chapters(&parser, 2, false, 72).unwrap();
        assert_eq!(sub.source, ChapterSource::Outline);
        assert_eq!(sub.chapters.len(), 1);
        assert_eq!((sub.chapters[0].start_page, sub.chapters[0].end_page), (3, 4));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["source"], "outline");
        assert_eq!(json["chapters"][1]["level"], 1);
    }

    #[test]
    fn test_heading_dominated_opener() {
        let body = "Gewöhnlicher Fließtext, der den Großteil jeder Seite ausmacht.";
        let data = PdfBuilder::new()
            .page(|p| {
                p.text(72.0, 100.0, 10.0, body)
                    .text(72.0, 120.0, 10.0, body)
                    .text(72.0, 140.0, 10.0, body)
            })
            .page(|p| {
                p.text(72.0, 100.0, 18.0, "Kapitel 1 Einleitung")
                    .text(72.0, 160.0, 10.0, "Siehe unten.")
            })
            .page(|p| p.text(72.0, 100.0, 10.0, body).text(72.0, 120.0, 10.0, body))
            .build();
        let parser = PdfParser::from_bytes(data).unwrap();
        let report = extract_chapters(&parser, 1, true, 144).unwrap();

        assert_eq!(report.source, ChapterSource::Heuristic);
        let titles: Vec<&str> = report.chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec![FRONT_MATTER, "Kapitel 1 Einleitung"]);
        assert_eq!(report.chapters[1].start_page, 1);
        assert_eq!(report.chapters[1].end_page, 2);
    }
}
