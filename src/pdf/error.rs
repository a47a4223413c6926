//! PDF error types
//!
//! Errors raised by the library layer (MuPDF, lopdf, image encoding,
//! archive building). The HTTP layer maps them onto status codes.

use thiserror::Error;

/// Unified PDF error type
#[derive(Debug, Error)]
pub enum PdfError {
    /// Upload is not a PDF at all
    #[error("Not a PDF document")]
    NotPdf,

    /// MuPDF or lopdf refused to open the document
    #[error("Failed to load PDF: {0}")]
    LoadError(String),

    /// Page index outside the document
    #[error("Page {0} not found (document has {1} pages)")]
    PageNotFound(usize, usize),

    /// Malformed page range expression
    #[error("Invalid page range: {0}")]
    InvalidRange(String),

    /// Malformed redaction pattern
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// Failed to render content
    #[error("Render error: {0}")]
    RenderError(String),

    /// Image encoding or decoding error
    #[error("Image error: {0}")]
    ImageError(String),

    /// Failed to write a PDF
    #[error("Write error: {0}")]
    WriteError(String),

    /// ZIP archive error
    #[error("Archive error: {0}")]
    ArchiveError(String),

    /// MuPDF context error
    #[error("MuPDF error: {0}")]
    MuPdf(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

impl From<mupdf::Error> for PdfError {
    fn from(err: mupdf::Error) -> Self {
        PdfError::MuPdf(err.to_string())
    }
}

impl From<lopdf::Error> for PdfError {
    fn from(err: lopdf::Error) -> Self {
        PdfError::LoadError(err.to_string())
    }
}

impl From<image::ImageError> for PdfError {
    fn from(err: image::ImageError) -> Self {
        PdfError::ImageError(err.to_string())
    }
}

impl From<zip::result::ZipError> for PdfError {
    fn from(err: zip::result::ZipError) -> Self {
        PdfError::ArchiveError(err.to_string())
    }
}

impl From<regex::Error> for PdfError {
    fn from(err: regex::Error) -> Self {
        PdfError::InvalidPattern(err.to_string())
    }
}
