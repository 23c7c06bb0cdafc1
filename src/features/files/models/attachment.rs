use sqlx::FromRow;

/// Database model for an attachment row.
///
/// `stored_file_name` is globally unique (UNIQUE constraint); `file_path`
/// always resolves under the configured storage root.
#[derive(Debug, Clone, FromRow)]
#[allow(dead_code)]
pub struct Attachment {
    pub id: i64,
    pub notice_id: i64,
    pub original_file_name: String,
    pub stored_file_name: String,
    pub file_path: String,
    pub is_deleted: bool,
}
