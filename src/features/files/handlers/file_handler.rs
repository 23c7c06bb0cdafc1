use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};

use crate::core::error::{AppError, Result};
use crate::features::files::services::FileStorageService;

/// Download an attachment
///
/// Streams the stored bytes back with a content-disposition header carrying
/// the original filename.
#[utoipa::path(
    get,
    path = "/files/download/{id}",
    params(
        ("id" = i64, Path, description = "Attachment ID")
    ),
    responses(
        (status = 200, description = "File content", body = Vec<u8>, content_type = "application/octet-stream"),
        (status = 404, description = "Attachment not found"),
        (status = 500, description = "Stored file missing or unreadable")
    ),
    tag = "files"
)]
pub async fn download_file(
    State(service): State<Arc<FileStorageService>>,
    Path(id): Path<i64>,
) -> Result<Response> {
    let attachment = service.get_attachment(id).await?;
    let bytes = service.load_file(&attachment.stored_file_name).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"",
                attachment.original_file_name.replace('"', "")
            ),
        )
        .body(Body::from(bytes))
        .map_err(|e| AppError::Internal(format!("Failed to build download response: {}", e)))
}
