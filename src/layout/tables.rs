//! Table detection
//!
//! Runs of consecutive multi-span rows form candidate blocks. Span start
//! positions within a block are clustered into column anchors; anchors that
//! enough rows agree on become columns.

use serde::Serialize;

use super::{PageLayout, Row};
use crate::pdf::{Rect, TextSpan};

/// Consecutive table rows are at most this many line heights apart
pub const MAX_ROW_GAP_LINE_HEIGHTS: f32 = 2.2;

/// Span starts closer than this (in points) belong to the same column
pub const COLUMN_TOLERANCE: f32 = 6.0;

/// Share of a block's rows that must have a span in a column
pub const MIN_COLUMN_SUPPORT: f32 = 0.5;

/// A detected table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub bbox: Rect,
    pub columns: usize,
    pub header: Option<Vec<String>>,
    pub rows: Vec<Vec<String>>,
}

/// Detect tables on a page, top to bottom
pub fn detect_tables(layout: &PageLayout) -> Vec<Table> {
    candidate_blocks(layout)
        .into_iter()
        .filter_map(|block| build_table(&block))
        .collect()
}

fn candidate_blocks(layout: &PageLayout) -> Vec<Vec<&Row>> {
    let max_gap = layout.line_height * MAX_ROW_GAP_LINE_HEIGHTS;
    let mut blocks: Vec<Vec<&Row>> = Vec::new();
    let mut current: Vec<&Row> = Vec::new();

    for row in layout.rows.iter() {
        if row.spans.len() < 2 {
            flush(&mut blocks, &mut current);
            continue;
        }
        if let Some(prev) = current.last() {
            if row.bbox.center_y() - prev.bbox.center_y() > max_gap {
                flush(&mut blocks, &mut current);
            }
        }
        current.push(row);
    }
    flush(&mut blocks, &mut current);
    blocks
}

fn flush<'a>(blocks: &mut Vec<Vec<&'a Row>>, current: &mut Vec<&'a Row>) {
    if current.len() >= 2 {
        blocks.push(std::mem::take(current));
    } else {
        current.clear();
    }
}

/// A cluster of span start positions
struct Anchor {
    x: f32,
    rows: Vec<usize>,
}

fn column_anchors(block: &[&Row]) -> Vec<f32> {
    let mut starts: Vec<(f32, usize)> = block
        .iter()
        .enumerate()
        .flat_map(|(r, row)| row.spans.iter().map(move |s| (s.bbox.x0, r)))
        .collect();
    starts.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut clusters: Vec<(Vec<f32>, Vec<usize>)> = Vec::new();
    for (x, r) in starts {
        match clusters.last_mut() {
            Some((xs, rows)) if xs.last().is_some_and(|last| x - last <= COLUMN_TOLERANCE) => {
                xs.push(x);
                rows.push(r);
            }
            _ => clusters.push((vec![x], vec![r])),
        }
    }

    let min_support = ((block.len() as f32 * MIN_COLUMN_SUPPORT).ceil() as usize).max(2);
    clusters
        .into_iter()
        .map(|(xs, mut rows)| {
            rows.sort_unstable();
            rows.dedup();
            Anchor {
                x: xs.iter().sum::<f32>() / xs.len() as f32,
                rows,
            }
        })
        .filter(|anchor| anchor.rows.len() >= min_support)
        .map(|anchor| anchor.x)
        .collect()
}

/// Column of a span: the interval containing its start, else the nearest anchor
fn column_of(span: &TextSpan, anchors: &[f32]) -> usize {
    let x = span.bbox.x0;
    for (i, anchor) in anchors.iter().enumerate() {
        let lower = anchor - COLUMN_TOLERANCE;
        let upper = anchors
            .get(i + 1)
            .map_or(f32::INFINITY, |next| next - COLUMN_TOLERANCE);
        if x >= lower && x < upper {
            return i;
        }
    }
    anchors
        .iter()
        .enumerate()
        .min_by(|a, b| (a.1 - x).abs().total_cmp(&(b.1 - x).abs()))
        .map_or(0, |(i, _)| i)
}

fn build_table(block: &[&Row]) -> Option<Table> {
    // Key/value grids ("Name:" | value) are forms, not tables
    if block.iter().all(|row| {
        row.spans
            .first()
            .is_some_and(|s| s.text.trim_end().ends_with(':'))
    }) {
        return None;
    }

    let anchors = column_anchors(block);
    if anchors.len() < 2 {
        return None;
    }

    let cells: Vec<Vec<String>> = block
        .iter()
        .map(|row| {
            let mut cells = vec![String::new(); anchors.len()];
            for span in &row.spans {
                let cell = &mut cells[column_of(span, &anchors)];
                if !cell.is_empty() {
                    cell.push(' ');
                }
                cell.push_str(span.text.trim());
            }
            cells
        })
        .collect();

    let bbox = block
        .iter()
        .map(|row| row.bbox)
        .reduce(|a, b| a.union(&b))?;

    let has_header = is_header(block);
    let mut rows = cells;
    let header = if has_header { Some(rows.remove(0)) } else { None };

    tracing::debug!(
        "Table with {} columns and {} rows at y={:.1}",
        anchors.len(),
        rows.len(),
        bbox.y0
    );

    Some(Table {
        bbox,
        columns: anchors.len(),
        header,
        rows,
    })
}

/// First row is a header when it is entirely bold, or digit-free above body
/// rows that carry digits
fn is_header(block: &[&Row]) -> bool {
    let Some((first, body)) = block.split_first() else {
        return false;
    };
    if first.all_bold() {
        return true;
    }
    let has_digit = |row: &Row| row.spans.iter().any(|s| s.text.chars().any(|c| c.is_ascii_digit()));
    !has_digit(*first) && body.iter().any(|row| has_digit(*row))
}
