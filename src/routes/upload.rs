//! Multipart PDF upload handling
//!
//! Every `/api/*` endpoint takes the document in a `file` (or `pdf`) part.
//! Other text parts are kept as form parameters; a name may repeat.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;

use crate::error::{AppError, Result};
use crate::mupdf::is_pdf;
use crate::pdf::{PdfParser, Result as PdfResult};

const FILE_FIELDS: [&str; 2] = ["file", "pdf"];

/// A validated upload plus the other form parameters
#[derive(Debug)]
pub struct PdfUpload {
    pub file_name: String,
    pub data: Vec<u8>,
    fields: HashMap<String, Vec<String>>,
}

impl PdfUpload {
    /// Read every part of the request
    ///
    /// Validation order: missing file part, empty file name, then content
    /// that is empty or lacks the `%PDF-` header.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self> {
        let mut file: Option<(String, Vec<u8>)> = None;
        let mut fields: HashMap<String, Vec<String>> = HashMap::new();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();

            if FILE_FIELDS.contains(&name.as_str()) && file.is_none() {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                file = Some((file_name, data.to_vec()));
            } else {
                let value = field.text().await.map_err(multipart_error)?;
                fields.entry(name).or_default().push(value);
            }
        }

        let (file_name, data) =
            file.ok_or_else(|| AppError::BadRequest("No file part".to_string()))?;
        if file_name.trim().is_empty() {
            return Err(AppError::BadRequest("No selected file".to_string()));
        }
        if data.is_empty() || !is_pdf(&data) {
            return Err(AppError::BadRequest("File must be a PDF".to_string()));
        }

        tracing::debug!("Received '{}' ({} bytes)", file_name, data.len());
        Ok(Self {
            file_name,
            data,
            fields,
        })
    }

    /// First value of a form parameter, if non-blank
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|values| values.first())
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Every value of a repeatable parameter, also split on newlines
    pub fn values(&self, name: &str) -> Vec<String> {
        self.fields
            .get(name)
            .into_iter()
            .flatten()
            .flat_map(|v| v.lines())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// File name without extension, safe for a `Content-Disposition` header
    pub fn stem(&self) -> String {
        let stem: String = Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
            .collect();
        if stem.trim().is_empty() {
            "document".to_string()
        } else {
            stem
        }
    }

    /// Open the upload with MuPDF (blocking)
    pub fn open(self) -> PdfResult<PdfParser> {
        PdfParser::from_bytes(self.data)
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}

/// Parse a boolean form or query value
/// Parse an optional numeric parameter; malformed values are a 400
pub fn parse_param<T: FromStr>(name: &str, raw: Option<&str>) -> Result<Option<T>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| {
            AppError::BadRequest(format!("'{}' is not a valid {}", value, name))
        }),
    }
}

pub fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AppError::BadRequest(format!("'{}' is not a boolean", other))),
    }
}
