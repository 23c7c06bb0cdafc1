use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::features::files::dtos::UploadedFile;
use crate::features::notices::dtos::{
    NoticeCreateDto, NoticeDetailResponseDto, NoticeResponseDto, NoticeSearchQuery, NoticeUpdateDto,
};
use crate::features::notices::services::NoticeService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// Pull the `notice` JSON part and any `files` parts out of a multipart
/// body. The metadata part is required; files are not.
async fn parse_notice_multipart<T: DeserializeOwned>(
    multipart: &mut Multipart,
) -> Result<(T, Vec<UploadedFile>)> {
    let mut metadata: Option<T> = None;
    let mut files: Vec<UploadedFile> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "notice" => {
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read notice metadata: {}", e))
                })?;
                let parsed = serde_json::from_slice(&bytes).map_err(|e| {
                    AppError::BadRequest(format!("Invalid notice metadata: {}", e))
                })?;
                metadata = Some(parsed);
            }
            "files" => {
                let file_name = field.file_name().map(|s| s.to_string()).unwrap_or_default();
                let data = field.bytes().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?;

                // Browsers send an empty part when the file input is left
                // blank; skip those.
                if file_name.is_empty() && data.is_empty() {
                    continue;
                }

                files.push(UploadedFile {
                    file_name,
                    data: data.to_vec(),
                });
            }
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let metadata = metadata
        .ok_or_else(|| AppError::BadRequest("Notice metadata part is required".to_string()))?;

    Ok((metadata, files))
}

/// Create a notice
///
/// Accepts multipart/form-data with a `notice` JSON part and zero or more
/// `files` parts.
#[utoipa::path(
    post,
    path = "/notices",
    request_body(
        content = NoticeCreateDto,
        content_type = "multipart/form-data",
        description = "Notice metadata as a `notice` JSON part plus optional `files` parts",
    ),
    responses(
        (status = 201, description = "Notice created", body = ApiResponse<NoticeResponseDto>),
        (status = 400, description = "Validation error or malformed multipart body"),
        (status = 500, description = "Attachment storage failed")
    ),
    tag = "notices"
)]
pub async fn create_notice(
    State(service): State<Arc<NoticeService>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<NoticeResponseDto>>)> {
    let (dto, files) = parse_notice_multipart::<NoticeCreateDto>(&mut multipart).await?;

    let response = service.create_notice(dto, files).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(response), None, None)),
    ))
}

/// List notices
#[utoipa::path(
    get,
    path = "/notices",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Paginated notices", body = ApiResponse<Vec<NoticeResponseDto>>),
    ),
    tag = "notices"
)]
pub async fn list_notices(
    State(service): State<Arc<NoticeService>>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<NoticeResponseDto>>>> {
    let (notices, total) = service.get_all_notices(&pagination).await?;

    Ok(Json(ApiResponse::success(
        Some(notices),
        None,
        Some(Meta::new(total, &pagination)),
    )))
}

/// Search notices
///
/// Filters compose with AND; unset filters match everything.
#[utoipa::path(
    get,
    path = "/notices/search",
    params(NoticeSearchQuery, PaginationQuery),
    responses(
        (status = 200, description = "Matching notices", body = ApiResponse<Vec<NoticeResponseDto>>),
    ),
    tag = "notices"
)]
pub async fn search_notices(
    State(service): State<Arc<NoticeService>>,
    Query(query): Query<NoticeSearchQuery>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<NoticeResponseDto>>>> {
    let (notices, total) = service.search_notices(&query, &pagination).await?;

    Ok(Json(ApiResponse::success(
        Some(notices),
        None,
        Some(Meta::new(total, &pagination)),
    )))
}

/// Get notice detail by ID
#[utoipa::path(
    get,
    path = "/notices/{id}",
    params(
        ("id" = i64, Path, description = "Notice ID")
    ),
    responses(
        (status = 200, description = "Notice found", body = ApiResponse<NoticeDetailResponseDto>),
        (status = 404, description = "Notice missing or deleted")
    ),
    tag = "notices"
)]
pub async fn get_notice(
    State(service): State<Arc<NoticeService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<NoticeDetailResponseDto>>> {
    let notice = service.get_notice_detail(id).await?;
    Ok(Json(ApiResponse::success(Some(notice), None, None)))
}

/// Update a notice
///
/// Replaces the notice fields and the whole attachment set with the supplied
/// files.
#[utoipa::path(
    put,
    path = "/notices/{id}",
    params(
        ("id" = i64, Path, description = "Notice ID")
    ),
    request_body(
        content = NoticeUpdateDto,
        content_type = "multipart/form-data",
        description = "Notice metadata as a `notice` JSON part plus optional `files` parts",
    ),
    responses(
        (status = 200, description = "Notice updated", body = ApiResponse<NoticeResponseDto>),
        (status = 400, description = "Validation error or malformed multipart body"),
        (status = 404, description = "Notice not found")
    ),
    tag = "notices"
)]
pub async fn update_notice(
    State(service): State<Arc<NoticeService>>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<NoticeResponseDto>>> {
    let (dto, files) = parse_notice_multipart::<NoticeUpdateDto>(&mut multipart).await?;

    let response = service.update_notice(id, dto, files).await?;

    Ok(Json(ApiResponse::success(Some(response), None, None)))
}

/// Delete a notice
///
/// Soft-deletes the notice and its attachments; physical files are removed.
#[utoipa::path(
    delete,
    path = "/notices/{id}",
    params(
        ("id" = i64, Path, description = "Notice ID")
    ),
    responses(
        (status = 204, description = "Notice deleted"),
        (status = 404, description = "Notice not found")
    ),
    tag = "notices"
)]
pub async fn delete_notice(
    State(service): State<Arc<NoticeService>>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    service.delete_notice(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
