//! Page selection expressions
//!
//! `"0-2,5,7-"` selects pages 0, 1, 2, 5 and 7 through the last page.
//! Indices are 0-based like the keys of every page-organized response.

use std::ops::RangeInclusive;

use super::error::{PdfError, Result};

/// One term of a selection; `end == None` means "to the last page"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Term {
    start: usize,
    end: Option<usize>,
}

/// Parsed, not yet bounds-checked page selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    terms: Vec<Term>,
}

impl PageSelection {
    /// Parse a selection expression
    pub fn parse(expr: &str) -> Result<Self> {
        let mut terms = Vec::new();

        for part in expr.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let term = match part.split_once('-') {
                Some((start, end)) => {
                    let start = parse_index(start, part)?;
                    let end = match end.trim() {
                        "" => None,
                        end => Some(parse_index(end, part)?),
                    };
                    if matches!(end, Some(e) if e < start) {
                        return Err(PdfError::InvalidRange(format!(
                            "'{}' ends before it starts",
                            part
                        )));
                    }
                    Term { start, end }
                }
                None => {
                    let index = parse_index(part, part)?;
                    Term {
                        start: index,
                        end: Some(index),
                    }
                }
            };
            terms.push(term);
        }

        if terms.is_empty() {
            return Err(PdfError::InvalidRange("empty page selection".to_string()));
        }

        Ok(Self { terms })
    }

    /// Every page of a document
    pub fn all() -> Self {
        Self {
            terms: vec![Term { start: 0, end: None }],
        }
    }

    /// Resolve against a page count, keeping each term as its own range
    pub fn ranges(&self, page_count: usize) -> Result<Vec<RangeInclusive<usize>>> {
        if page_count == 0 {
            return Err(PdfError::InvalidRange("document has no pages".to_string()));
        }
        let last = page_count - 1;

        self.terms
            .iter()
            .map(|term| {
                let end = term.end.unwrap_or(last);
                if term.start > last || end > last {
                    return Err(PdfError::InvalidRange(format!(
                        "page {} is out of range (document has {} pages)",
                        term.start.max(end),
                        page_count
                    )));
                }
                Ok(term.start..=end)
            })
            .collect()
    }

    /// Resolve against a page count into sorted, de-duplicated page indices
    pub fn pages(&self, page_count: usize) -> Result<Vec<usize>> {
        let mut pages: Vec<usize> = self.ranges(page_count)?.into_iter().flatten().collect();
        pages.sort_unstable();
        pages.dedup();
        Ok(pages)
    }
}

fn parse_index(value: &str, part: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| PdfError::InvalidRange(format!("'{}' is not a page index or range", part)))
}
