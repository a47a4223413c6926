//! Owned document wrapper for MuPDF
//!
//! MuPDF documents are not thread-safe and borrow the bytes they were opened
//! from. This wrapper:
//!
//! 1. Stores the uploaded bytes behind an `Arc`
//! 2. Opens a fresh `mupdf::Document` for each operation
//! 3. Serializes operations on the same wrapper through a mutex
//!
//! No document reference escapes the closure passed to `with_doc`.

use std::sync::Arc;

use mupdf::{Document, Page};
use parking_lot::Mutex;

use crate::pdf::{PdfError, Result};

const PDF_MIME: &str = "application/pdf";

/// Thread-safe document wrapper
pub struct SafeDocument {
    data: Arc<Vec<u8>>,
    page_count: usize,
    lock: Mutex<()>,
}

impl SafeDocument {
    /// Open a document from uploaded bytes
    ///
    /// Rejects anything without the `%PDF` magic before handing the bytes to
    /// MuPDF, which would otherwise happily open images and XPS files. A
    /// document without pages counts as unloadable.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        if !is_pdf(&data) {
            return Err(PdfError::NotPdf);
        }

        let doc = Document::from_bytes(&data, PDF_MIME)
            .map_err(|e| PdfError::LoadError(e.to_string()))?;
        let page_count = doc.page_count().map_err(|e| PdfError::LoadError(e.to_string()))?;
        if page_count <= 0 {
            return Err(PdfError::LoadError("document has no pages".to_string()));
        }

        Ok(Self {
            data: Arc::new(data),
            page_count: page_count as usize,
            lock: Mutex::new(()),
        })
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Raw bytes of the document (for lopdf based operations)
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    fn open_document(&self) -> Result<Document> {
        Document::from_bytes(&self.data, PDF_MIME).map_err(Into::into)
    }

    /// Execute a closure with a freshly opened document
    pub fn with_doc<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Document) -> Result<R>,
    {
        let _guard = self.lock.lock();
        let doc = self.open_document()?;
        f(&doc)
    }

    /// Execute a closure with one loaded page (0-based index)
    pub fn with_page<F, R>(&self, index: usize, f: F) -> Result<R>
    where
        F: FnOnce(&Page) -> Result<R>,
    {
        self.check_page(index)?;
        self.with_doc(|doc| {
            let page = doc.load_page(index as i32)?;
            f(&page)
        })
    }

    /// Validate a 0-based page index
    pub fn check_page(&self, index: usize) -> Result<()> {
        if index >= self.page_count {
            return Err(PdfError::PageNotFound(index, self.page_count));
        }
        Ok(())
    }
}

/// PDF magic check, tolerating a short preamble before the header
pub fn is_pdf(data: &[u8]) -> bool {
    let head = &data[..data.len().min(1024)];
    head.windows(5).any(|w| w == b"%PDF-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf(b"%PDF-1.7\n..."));
        assert!(is_pdf(b"\xef\xbb\xbf%PDF-1.4"));
        assert!(!is_pdf(b"PK\x03\x04"));
        assert!(!is_pdf(b""));
    }

    #[test]
    fn test_rejects_non_pdf() {
        let err = SafeDocument::from_bytes(b"GIF89a".to_vec()).err().unwrap();
        assert!(matches!(err, PdfError::NotPdf));
    }

    #[test]
    fn test_opens_generated_pdf() {
        let data = crate::testutil::PdfBuilder::new()
            .page(|p| p.text(72.0, 72.0, 12.0, "Hello"))
            .page(|p| p)
            .build();
        let doc = SafeDocument::from_bytes(data).unwrap();
        assert_eq!(doc.page_count(), 2);
        assert!(doc.check_page(1).is_ok());
        assert!(matches!(doc.check_page(2), Err(PdfError::PageNotFound(2, 2))));
    }
}
