//! ZIP packaging for multi-file responses

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::error::Result;

/// Pack named files into an in-memory ZIP archive
///
/// PDFs and images are already compressed, so entries are stored as-is.
pub fn build_zip(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        for (name, data) in entries {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data)?;
        }

        zip.finish()?;
    }

    tracing::debug!("Built archive with {} entries ({} bytes)", entries.len(), buffer.len());
    Ok(buffer)
}
