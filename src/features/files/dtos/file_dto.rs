use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::files::models::Attachment;

/// Attachment metadata as returned inside notice responses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttachmentDto {
    pub id: i64,
    pub original_file_name: String,
    pub stored_file_name: String,
    pub file_path: String,
}

impl From<Attachment> for AttachmentDto {
    fn from(a: Attachment) -> Self {
        Self {
            id: a.id,
            original_file_name: a.original_file_name,
            stored_file_name: a.stored_file_name,
            file_path: a.file_path,
        }
    }
}

/// One file received from a multipart request, held in memory until stored.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub data: Vec<u8>,
}
