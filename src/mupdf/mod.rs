//! Low-level MuPDF Wrapper
//!
//! Thin, thread-aware layer over the `mupdf` crate.
//!
//! # Thread Safety
//!
//! MuPDF's `fz_context` is **NOT thread-safe**. This module addresses this via:
//!
//! 1. **SafeDocument**: opens a fresh document per operation, serialized by a mutex
//! 2. **JobPool**: bounds how many MuPDF jobs run concurrently
//!
//! # Usage
//!
//! ```rust,ignore
//! let doc = SafeDocument::from_bytes(pdf_bytes)?;
//! let spans = doc.with_page(0, |page| stext::extract_spans(page))?;
//! ```

mod pool;
mod safe;
mod stext;

pub use pool::{JobPermit, JobPool, PoolStats};
pub use safe::{is_pdf, SafeDocument};
pub use stext::{
    extract_plain_text, extract_spans, image_block_bounds, search_text, split_line, Glyph,
    SPAN_GAP_EM,
};
