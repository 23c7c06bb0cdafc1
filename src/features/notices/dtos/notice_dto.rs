use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::features::files::dtos::AttachmentDto;
use crate::features::files::models::Attachment;
use crate::features::notices::models::Notice;

/// Metadata part of a multipart create request.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NoticeCreateDto {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,

    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,

    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,

    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
}

/// Metadata part of a multipart update request. The author never changes.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NoticeUpdateDto {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,

    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,

    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// Notice as returned from create/update/list/search.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoticeResponseDto {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub view_count: i32,
    pub author: String,
    pub attachments: Vec<AttachmentDto>,
}

impl NoticeResponseDto {
    pub fn from_parts(notice: Notice, attachments: Vec<Attachment>) -> Self {
        Self {
            id: notice.id,
            title: notice.title,
            content: notice.content,
            start_date: notice.start_date,
            end_date: notice.end_date,
            created_at: notice.created_at,
            view_count: notice.view_count,
            author: notice.author,
            attachments: attachments.into_iter().map(AttachmentDto::from).collect(),
        }
    }
}

/// Detail view of a single notice.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoticeDetailResponseDto {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub author: String,
    pub attachments: Vec<AttachmentDto>,
}

impl NoticeDetailResponseDto {
    pub fn from_parts(notice: Notice, attachments: Vec<Attachment>) -> Self {
        Self {
            id: notice.id,
            title: notice.title,
            content: notice.content,
            start_date: notice.start_date,
            end_date: notice.end_date,
            created_at: notice.created_at,
            author: notice.author,
            attachments: attachments.into_iter().map(AttachmentDto::from).collect(),
        }
    }
}

/// Search filters. Unset fields widen to match-everything sentinels.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct NoticeSearchQuery {
    /// Substring match on title
    pub title: Option<String>,
    /// Substring match on content
    pub content: Option<String>,
    /// Substring match on author
    pub author: Option<String>,
    /// Lower bound on creation time (RFC 3339)
    pub start_date: Option<DateTime<Utc>>,
    /// Upper bound on creation time (RFC 3339)
    pub end_date: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn create_dto(title: &str, content: &str, author: &str) -> NoticeCreateDto {
        NoticeCreateDto {
            title: title.to_string(),
            content: content.to_string(),
            start_date: Utc::now(),
            end_date: Utc::now(),
            author: author.to_string(),
        }
    }

    #[test]
    fn empty_title_or_content_fails_validation() {
        assert!(create_dto("", "body", "alice").validate().is_err());
        assert!(create_dto("hello", "", "alice").validate().is_err());
        assert!(create_dto("hello", "body", "").validate().is_err());
        assert!(create_dto("hello", "body", "alice").validate().is_ok());
    }

    #[test]
    fn response_maps_notice_and_attachments() {
        let now = Utc::now();
        let notice = Notice {
            id: 7,
            title: "T".into(),
            content: "C".into(),
            start_date: now,
            end_date: now,
            created_at: now,
            view_count: 0,
            author: "A".into(),
            is_deleted: false,
        };
        let attachments = vec![Attachment {
            id: 3,
            notice_id: 7,
            original_file_name: "a.txt".into(),
            stored_file_name: "uuid.txt".into(),
            file_path: "/tmp/uuid.txt".into(),
            is_deleted: false,
        }];

        let dto = NoticeResponseDto::from_parts(notice.clone(), attachments);
        assert_eq!(dto.id, 7);
        assert_eq!(dto.attachments.len(), 1);
        assert_eq!(dto.attachments[0].original_file_name, "a.txt");

        let detail = NoticeDetailResponseDto::from_parts(notice, vec![]);
        assert!(detail.attachments.is_empty());
    }
}
