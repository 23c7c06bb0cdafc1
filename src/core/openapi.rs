use utoipa::{Modify, OpenApi};

use crate::features::files::{dtos as files_dtos, handlers as files_handlers};
use crate::features::notices::{dtos as notices_dtos, handlers as notices_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Notices
        notices_handlers::notice_handler::create_notice,
        notices_handlers::notice_handler::list_notices,
        notices_handlers::notice_handler::search_notices,
        notices_handlers::notice_handler::get_notice,
        notices_handlers::notice_handler::update_notice,
        notices_handlers::notice_handler::delete_notice,
        // Files
        files_handlers::file_handler::download_file,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Notices
            notices_dtos::NoticeCreateDto,
            notices_dtos::NoticeUpdateDto,
            notices_dtos::NoticeResponseDto,
            notices_dtos::NoticeDetailResponseDto,
            ApiResponse<notices_dtos::NoticeResponseDto>,
            ApiResponse<Vec<notices_dtos::NoticeResponseDto>>,
            ApiResponse<notices_dtos::NoticeDetailResponseDto>,
            // Files
            files_dtos::AttachmentDto,
        )
    ),
    tags(
        (name = "notices", description = "Notice CRUD, listing and search"),
        (name = "files", description = "Attachment download"),
    ),
    info(
        title = "Noticeboard API",
        version = "0.1.0",
        description = "Notice board with attachments",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
