//! JSON extraction endpoints
//!
//! - Document info
//! - Text with positioned spans
//! - Images, tables, form fields, checkboxes
//! - Chapter boundaries

use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use serde::Deserialize;

use super::upload::{parse_flag, parse_param, PdfUpload};
use super::check_dpi;
use crate::error::{AppError, Result};
use crate::extract::{
    document_info, extract_all_fields, extract_chapters, extract_checkboxes, extract_images,
    extract_tables, extract_text, ChapterReport, CheckboxEntry, DocumentInfo, ExtractedImage,
    PageFields, PageText,
};
use crate::layout::Table;
use crate::pdf::PageMap;
use crate::state::AppState;

/// Query parameters for text extraction
#[derive(Debug, Deserialize)]
pub struct TextQuery {
    /// Include positioned spans (default: true)
    pub spans: Option<String>,
}

/// Query parameters for image extraction
#[derive(Debug, Deserialize)]
pub struct ImagesQuery {
    /// Resolution of the page render images are cropped from
    pub dpi: Option<String>,
}

/// Query parameters for chapter boundaries
#[derive(Debug, Deserialize)]
pub struct ChapterQuery {
    /// Outline level to split on (default: 1)
    pub level: Option<String>,
    /// `outline` (default, falls back to heuristics) or `heuristic`
    pub source: Option<String>,
}

pub async fn info(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<DocumentInfo>> {
    let upload = PdfUpload::from_multipart(multipart).await?;
    let info = state
        .run_job("info", move || document_info(&upload.open()?))
        .await?;
    Ok(Json(info))
}

pub async fn text(
    State(state): State<AppState>,
    Query(query): Query<TextQuery>,
    multipart: Multipart,
) -> Result<Json<PageMap<PageText>>> {
    let upload = PdfUpload::from_multipart(multipart).await?;
    let include_spans = match query.spans.as_deref().or_else(|| upload.text("spans")) {
        Some(value) => parse_flag(value)?,
        None => true,
    };
    let analysis_dpi = state.config().render.analysis_dpi;

    let pages = state
        .run_job("extract-text", move || {
            extract_text(&upload.open()?, include_spans, analysis_dpi)
        })
        .await?;
    Ok(Json(pages))
}

pub async fn images(
    State(state): State<AppState>,
    Query(query): Query<ImagesQuery>,
    multipart: Multipart,
) -> Result<Json<PageMap<Vec<ExtractedImage>>>> {
    let upload = PdfUpload::from_multipart(multipart).await?;
    let dpi = parse_param("dpi", query.dpi.as_deref())?;
    let dpi = check_dpi(dpi.unwrap_or(state.config().render.render_dpi))?;

    let pages = state
        .run_job("extract-images", move || extract_images(&upload.open()?, dpi))
        .await?;
    Ok(Json(pages))
}

pub async fn tables(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<PageMap<Vec<Table>>>> {
    let upload = PdfUpload::from_multipart(multipart).await?;
    let analysis_dpi = state.config().render.analysis_dpi;

    let pages = state
        .run_job("extract-tables", move || {
            extract_tables(&upload.open()?, analysis_dpi)
        })
        .await?;
    Ok(Json(pages))
}

pub async fn all_fields(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<PageMap<PageFields>>> {
    let upload = PdfUpload::from_multipart(multipart).await?;
    let analysis_dpi = state.config().render.analysis_dpi;

    let pages = state
        .run_job("extract-all-fields", move || {
            extract_all_fields(&upload.open()?, analysis_dpi)
        })
        .await?;
    Ok(Json(pages))
}

pub async fn checkboxes(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<PageMap<Vec<CheckboxEntry>>>> {
    let upload = PdfUpload::from_multipart(multipart).await?;
    let analysis_dpi = state.config().render.analysis_dpi;

    let pages = state
        .run_job("get-checkboxes", move || {
            extract_checkboxes(&upload.open()?, analysis_dpi)
        })
        .await?;
    Ok(Json(pages))
}

pub async fn chapters(
    State(state): State<AppState>,
    Query(query): Query<ChapterQuery>,
    multipart: Multipart,
) -> Result<Json<ChapterReport>> {
    let upload = PdfUpload::from_multipart(multipart).await?;
    let level = parse_param("level", query.level.as_deref())?.unwrap_or(1usize);
    if level == 0 {
        return Err(AppError::BadRequest("level must be at least 1".to_string()));
    }
    let force_heuristic = match query.source.as_deref().map(str::trim) {
        None | Some("") | Some("outline") => false,
        Some("heuristic") => true,
        Some(other) => {
            return Err(AppError::BadRequest(format!(
                "Unknown source '{}' (expected outline or heuristic)",
                other
            )))
        }
    };
    let analysis_dpi = state.config().render.analysis_dpi;

    let report = state
        .run_job("chapter-boundaries", move || {
            extract_chapters(&upload.open()?, level, force_heuristic, analysis_dpi)
        })
        .await?;
    Ok(Json(report))
}
