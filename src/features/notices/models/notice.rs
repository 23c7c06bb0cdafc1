use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for a notice row. Attachments live in their own table and
/// reference the notice.
#[derive(Debug, Clone, FromRow)]
#[allow(dead_code)]
pub struct Notice {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub view_count: i32,
    pub author: String,
    pub is_deleted: bool,
}
