//! PDF module
//!
//! MuPDF-backed parsing and rasterization, lopdf-backed page tree work
//! (form widgets, splitting, redacted output) and the shared data types.

mod archive;
mod error;
mod forms;
mod objects;
mod parser;
mod ranges;
mod redact;
mod split;
mod types;

pub use archive::build_zip;
pub use error::{PdfError, Result};
pub use forms::{read_widgets, FieldKind, WidgetField};
pub use parser::{dpi_to_scale, encode_image, normalize_pdf_date, PdfParser, MAX_DPI, MIN_DPI};
pub use ranges::PageSelection;
pub use redact::{redact, RedactionRequest, RedactionResult};
pub use split::{split_pages, SplitPart};
pub use types::{
    ImageFormat, OutlineEntry, PageMap, PageOrientation, PageSize, PdfMetadata, Rect, TextSpan,
};
