//! Label/value pairs
//!
//! Three patterns are recognised, in order of precedence:
//!
//! 1. A span ending in `:` labels the spans to its right on the same row (up
//!    to the next label), or, when there are none, the nearest span directly
//!    below it.
//! 2. A single span `Label: value` is split at its first colon.
//! 3. A bold span followed by regular spans on the same row labels them.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::PageLayout;
use crate::pdf::{Rect, TextSpan};

/// A value below its label must start within this many line heights
pub const VALUE_BELOW_LINE_HEIGHTS: f32 = 1.6;

/// Labels of inline `Label: value` spans are at most this long
pub const MAX_INLINE_LABEL_CHARS: usize = 40;

/// Clock times and ratios are not labels
static TIME_OR_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\d{1,2}:\d{2}|^\s*[\d.,]+\s*:\s*[\d.,]+\s*$").expect("valid time regex")
});

/// A label with its value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldPair {
    pub label: String,
    pub value: String,
    pub label_bbox: Rect,
    pub value_bbox: Option<Rect>,
}

/// Extract label/value pairs in reading order
pub fn extract_fields(layout: &PageLayout) -> Vec<FieldPair> {
    // Spans are addressed by (row, position in row)
    let mut consumed: HashSet<(usize, usize)> = HashSet::new();
    let mut pairs = Vec::new();

    for (r, row) in layout.rows.iter().enumerate() {
        let mut i = 0;
        while i < row.spans.len() {
            if consumed.contains(&(r, i)) {
                i += 1;
                continue;
            }
            let span = &row.spans[i];

            if let Some(label) = trailing_colon_label(span) {
                consumed.insert((r, i));
                let mut j = i + 1;
                while j < row.spans.len()
                    && !consumed.contains(&(r, j))
                    && trailing_colon_label(&row.spans[j]).is_none()
                {
                    j += 1;
                }

                if j > i + 1 {
                    let values = &row.spans[i + 1..j];
                    for k in i + 1..j {
                        consumed.insert((r, k));
                    }
                    pairs.push(FieldPair {
                        label,
                        value: join_spans(values),
                        label_bbox: span.bbox,
                        value_bbox: union_bbox(values),
                    });
                    i = j;
                    continue;
                }

                match value_below(layout, r, span, &consumed) {
                    Some((vr, vi)) => {
                        consumed.insert((vr, vi));
                        let value = &layout.rows[vr].spans[vi];
                        pairs.push(FieldPair {
                            label,
                            value: value.text.trim().to_string(),
                            label_bbox: span.bbox,
                            value_bbox: Some(value.bbox),
                        });
                    }
                    None => pairs.push(FieldPair {
                        label,
                        value: String::new(),
                        label_bbox: span.bbox,
                        value_bbox: None,
                    }),
                }
                i += 1;
                continue;
            }

            if let Some((label, value)) = split_inline(span) {
                consumed.insert((r, i));
                pairs.push(FieldPair {
                    label,
                    value,
                    label_bbox: span.bbox,
                    value_bbox: None,
                });
                i += 1;
                continue;
            }

            if span.bold {
                let mut j = i + 1;
                while j < row.spans.len()
                    && !row.spans[j].bold
                    && !consumed.contains(&(r, j))
                    && trailing_colon_label(&row.spans[j]).is_none()
                {
                    j += 1;
                }
                if j > i + 1 {
                    let values = &row.spans[i + 1..j];
                    for k in i..j {
                        consumed.insert((r, k));
                    }
                    pairs.push(FieldPair {
                        label: span.text.trim().to_string(),
                        value: join_spans(values),
                        label_bbox: span.bbox,
                        value_bbox: union_bbox(values),
                    });
                    i = j;
                    continue;
                }
            }

            i += 1;
        }
    }

    pairs
}

/// `"Datum:"` -> `"Datum"`
fn trailing_colon_label(span: &TextSpan) -> Option<String> {
    let text = span.text.trim();
    let label = text.strip_suffix(':')?.trim_end();
    if label.is_empty() || TIME_OR_NUMBER.is_match(text) {
        return None;
    }
    Some(label.to_string())
}

/// `"Datum: 12.03.2024"` -> `("Datum", "12.03.2024")`
fn split_inline(span: &TextSpan) -> Option<(String, String)> {
    let text = span.text.trim();
    if TIME_OR_NUMBER.is_match(text) {
        return None;
    }
    let (label, value) = text.split_once(':')?;
    if colon_between_digits(label, value) {
        return None;
    }
    let label = label.trim();
    let value = value.trim();
    if label.is_empty()
        || label.chars().count() > MAX_INLINE_LABEL_CHARS
        || value.starts_with("//")
    {
        return None;
    }
    Some((label.to_string(), value.to_string()))
}

/// `12:30` inside a longer span is a time, not a separator
fn colon_between_digits(before: &str, after: &str) -> bool {
    before.chars().next_back().is_some_and(|c| c.is_ascii_digit())
        && after.chars().next().is_some_and(|c| c.is_ascii_digit())
}

/// Nearest unconsumed, non-label span in the rows below that overlaps the
/// label horizontally
fn value_below(
    layout: &PageLayout,
    label_row: usize,
    label: &TextSpan,
    consumed: &HashSet<(usize, usize)>,
) -> Option<(usize, usize)> {
    let max_gap = layout.line_height * VALUE_BELOW_LINE_HEIGHTS;

    for (r, row) in layout.rows.iter().enumerate().skip(label_row + 1) {
        if row.bbox.y0 - label.bbox.y1 > max_gap {
            break;
        }
        let candidate = row.spans.iter().enumerate().find(|(i, span)| {
            !consumed.contains(&(r, *i))
                && span.bbox.horizontal_overlap(&label.bbox) > 0.0
                && trailing_colon_label(span).is_none()
        });
        if let Some((i, _)) = candidate {
            return Some((r, i));
        }
    }
    None
}

fn join_spans(spans: &[TextSpan]) -> String {
    spans
        .iter()
        .map(|s| s.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn union_bbox(spans: &[TextSpan]) -> Option<Rect> {
    spans.iter().map(|s| s.bbox).reduce(|a, b| a.union(&b))
}

/// Label/value pairs serialized as a JSON object in insertion order, with
/// repeated labels suffixed `_2`, `_3`, ...
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledValues(Vec<(String, String)>);

impl LabeledValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert under a unique key, returning the key used
    pub fn insert(&mut self, label: &str, value: impl Into<String>) -> String {
        let key = if self.contains(label) {
            (2..)
                .map(|n| format!("{}_{}", label, n))
                .find(|candidate| !self.contains(candidate))
                .unwrap_or_else(|| label.to_string())
        } else {
            label.to_string()
        };
        self.0.push((key.clone(), value.into()));
        key
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.iter().any(|(k, _)| k == label)
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == label)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> FromIterator<&'a FieldPair> for LabeledValues {
    fn from_iter<I: IntoIterator<Item = &'a FieldPair>>(iter: I) -> Self {
        let mut values = Self::new();
        for pair in iter {
            values.insert(&pair.label, pair.value.clone());
        }
        values
    }
}

impl Serialize for LabeledValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
