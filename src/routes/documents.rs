//! Endpoints that return files instead of JSON
//!
//! - Split pages into separate PDFs (ZIP)
//! - Render pages to images (single image or ZIP)
//! - Redact terms and patterns (PDF)

use axum::{
    body::Body,
    extract::{Multipart, Query, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::check_dpi;
use super::upload::{parse_flag, parse_param, PdfUpload};
use crate::error::{AppError, Result};
use crate::pdf::{
    build_zip, redact as redact_pdf, split_pages, ImageFormat, PageSelection, RedactionRequest,
};
use crate::state::AppState;

/// Header carrying the number of painted areas
pub const REDACTION_COUNT_HEADER: HeaderName = HeaderName::from_static("x-redaction-count");

const DEFAULT_QUALITY: u8 = 85;

/// Query parameters for splitting
#[derive(Debug, Deserialize)]
pub struct SplitQuery {
    /// Range expression such as `0-2,5,7-`; one file per page when absent
    pub ranges: Option<String>,
}

/// Query parameters for page rendering
#[derive(Debug, Deserialize)]
pub struct RenderQuery {
    pub dpi: Option<String>,
    /// Output format (png, jpeg, webp)
    pub format: Option<String>,
    /// Image quality for JPEG (1-100). Default: 85
    pub quality: Option<String>,
    /// Pages to render; every page when absent
    pub pages: Option<String>,
}

fn file_response(content_type: &str, disposition: String, data: Vec<u8>) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CONTENT_LENGTH, data.len())
        .body(Body::from(data))
        .unwrap_or_else(|e| {
            AppError::Internal(format!("Failed to build response: {}", e)).into_response()
        })
}

fn parse_selection(expr: Option<&str>) -> Result<Option<PageSelection>> {
    expr.map(|e| PageSelection::parse(e).map_err(AppError::from))
        .transpose()
}

pub async fn split(
    State(state): State<AppState>,
    Query(query): Query<SplitQuery>,
    multipart: Multipart,
) -> Result<Response> {
    let upload = PdfUpload::from_multipart(multipart).await?;
    let selection = parse_selection(query.ranges.as_deref().or_else(|| upload.text("ranges")))?;
    let stem = upload.stem();

    let archive = state
        .run_job("split-pages", move || {
            let parser = upload.open()?;
            let page_count = parser.page_count();
            let ranges = match selection {
                Some(selection) => selection.ranges(page_count)?,
                None => (0..page_count).map(|i| i..=i).collect(),
            };

            let parts = split_pages(parser.bytes(), &ranges)?;
            tracing::info!("Split {} pages into {} documents", page_count, parts.len());
            let entries: Vec<(String, Vec<u8>)> = parts
                .into_iter()
                .map(|part| (part.file_name(), part.data))
                .collect();
            build_zip(&entries)
        })
        .await?;

    Ok(file_response(
        "application/zip",
        format!("attachment; filename=\"{}_split.zip\"", stem),
        archive,
    ))
}

pub async fn render(
    State(state): State<AppState>,
    Query(query): Query<RenderQuery>,
    multipart: Multipart,
) -> Result<Response> {
    let upload = PdfUpload::from_multipart(multipart).await?;

    let dpi = parse_param("dpi", query.dpi.as_deref())?;
    let dpi = check_dpi(dpi.unwrap_or(state.config().render.render_dpi))?;
    let format: ImageFormat = query
        .format
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(AppError::BadRequest)?;
    let quality = parse_param("quality", query.quality.as_deref())?.unwrap_or(DEFAULT_QUALITY);
    if !(1..=100).contains(&quality) {
        return Err(AppError::BadRequest(format!(
            "quality must be between 1 and 100, got {}",
            quality
        )));
    }
    let selection = parse_selection(query.pages.as_deref().or_else(|| upload.text("pages")))?;
    let stem = upload.stem();

    let (pages, data) = state
        .run_job("render", move || {
            let parser = upload.open()?;
            let pages = selection
                .unwrap_or_else(PageSelection::all)
                .pages(parser.page_count())?;

            if let [index] = pages[..] {
                let image = parser.render_page(index, dpi, format, quality)?;
                return Ok((pages, image));
            }

            let entries = pages
                .iter()
                .map(|&index| {
                    let image = parser.render_page(index, dpi, format, quality)?;
                    Ok((format!("page_{:04}.{}", index, format.extension()), image))
                })
                .collect::<crate::pdf::Result<Vec<_>>>()?;
            tracing::info!("Rendered {} pages at {} dpi", entries.len(), dpi);
            Ok((pages, build_zip(&entries)?))
        })
        .await?;

    Ok(match pages[..] {
        [index] => file_response(
            format.content_type(),
            format!(
                "inline; filename=\"{}_page_{:04}.{}\"",
                stem,
                index,
                format.extension()
            ),
            data,
        ),
        _ => file_response(
            "application/zip",
            format!("attachment; filename=\"{}_pages.zip\"", stem),
            data,
        ),
    })
}

pub async fn redact(State(state): State<AppState>, multipart: Multipart) -> Result<Response> {
    let upload = PdfUpload::from_multipart(multipart).await?;

    let terms = upload.values("terms");
    let patterns = upload.values("patterns");
    if terms.is_empty() && patterns.is_empty() {
        return Err(AppError::BadRequest(
            "At least one term or pattern is required".to_string(),
        ));
    }
    let case_sensitive = upload
        .text("case_sensitive")
        .map(parse_flag)
        .transpose()?
        .unwrap_or(false);
    let dpi = parse_param("dpi", upload.text("dpi"))?;
    let dpi = check_dpi(dpi.unwrap_or(state.config().render.render_dpi))?;
    let selection = parse_selection(upload.text("pages"))?;
    let stem = upload.stem();

    let result = state
        .run_job("redact", move || {
            let parser = upload.open()?;
            let pages = selection
                .map(|s| s.pages(parser.page_count()))
                .transpose()?;
            let request = RedactionRequest {
                terms,
                patterns,
                case_sensitive,
                dpi,
                pages,
            };
            redact_pdf(&parser, &request)
        })
        .await?;

    let mut response = file_response(
        "application/pdf",
        format!("attachment; filename=\"{}_redacted.pdf\"", stem),
        result.data,
    );
    response
        .headers_mut()
        .insert(REDACTION_COUNT_HEADER, result.hits.into());
    Ok(response)
}
