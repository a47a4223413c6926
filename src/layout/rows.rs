//! Row grouping
//!
//! Spans whose vertical centres lie within half the smaller span height of
//! each other share a row. Rows are ordered top to bottom, spans within a
//! row left to right.

use crate::pdf::{Rect, TextSpan};

/// Spans sharing a baseline band
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub spans: Vec<TextSpan>,
    pub bbox: Rect,
}

impl Row {
    fn new(span: TextSpan) -> Self {
        Self {
            bbox: span.bbox,
            spans: vec![span],
        }
    }

    fn push(&mut self, span: TextSpan) {
        self.bbox = self.bbox.union(&span.bbox);
        self.spans.push(span);
    }

    /// Whether a span's centre falls into this row's band
    fn accepts(&self, span: &TextSpan) -> bool {
        let min_height = self
            .spans
            .iter()
            .map(|s| s.bbox.height())
            .fold(span.bbox.height(), f32::min);
        let centre = self.spans.iter().map(|s| s.bbox.center_y()).sum::<f32>() / self.spans.len() as f32;
        (span.bbox.center_y() - centre).abs() <= min_height / 2.0
    }

    /// Span texts joined with single spaces
    pub fn text(&self) -> String {
        self.spans
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Largest font size in the row
    pub fn font_size(&self) -> f32 {
        self.spans.iter().map(|s| s.font_size).fold(0.0, f32::max)
    }

    pub fn all_bold(&self) -> bool {
        !self.spans.is_empty() && self.spans.iter().all(|s| s.bold)
    }

    pub fn char_count(&self) -> usize {
        self.spans.iter().map(TextSpan::char_count).sum()
    }
}

/// Group spans into rows
pub fn group_rows(spans: &[TextSpan]) -> Vec<Row> {
    let mut sorted: Vec<&TextSpan> = spans.iter().collect();
    sorted.sort_by(|a, b| a.bbox.center_y().total_cmp(&b.bbox.center_y()));

    let mut rows: Vec<Row> = Vec::new();
    for span in sorted {
        match rows.last_mut() {
            Some(row) if row.accepts(span) => row.push(span.clone()),
            _ => rows.push(Row::new(span.clone())),
        }
    }

    for row in &mut rows {
        row.spans.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
    }
    rows.sort_by(|a, b| a.bbox.y0.total_cmp(&b.bbox.y0));
    rows
}
