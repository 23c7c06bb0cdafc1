use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use validator::Validate;

use crate::core::cache::ResponseCache;
use crate::core::database::ReplicationPool;
use crate::core::error::{AppError, Result};
use crate::features::files::dtos::UploadedFile;
use crate::features::files::services::FileStorageService;
use crate::features::notices::dtos::{
    NoticeCreateDto, NoticeDetailResponseDto, NoticeResponseDto, NoticeSearchQuery, NoticeUpdateDto,
};
use crate::features::notices::models::Notice;
use crate::shared::constants::NOTICE_CACHE;
use crate::shared::types::PaginationQuery;

const NOTICE_COLUMNS: &str =
    "id, title, content, start_date, end_date, created_at, view_count, author, is_deleted";

/// CRUD orchestration for notices and their attachment lifecycle.
pub struct NoticeService {
    db: Arc<ReplicationPool>,
    storage: Arc<FileStorageService>,
    cache: Arc<ResponseCache>,
}

impl NoticeService {
    pub fn new(
        db: Arc<ReplicationPool>,
        storage: Arc<FileStorageService>,
        cache: Arc<ResponseCache>,
    ) -> Self {
        Self { db, storage, cache }
    }

    /// Validate, insert the notice, then store its attachments. Read-write,
    /// so everything goes through the writer.
    pub async fn create_notice(
        &self,
        dto: NoticeCreateDto,
        files: Vec<UploadedFile>,
    ) -> Result<NoticeResponseDto> {
        dto.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let notice = sqlx::query_as::<_, Notice>(
            r#"
            INSERT INTO notices (title, content, start_date, end_date, author, view_count, is_deleted)
            VALUES ($1, $2, $3, $4, $5, 0, FALSE)
            RETURNING id, title, content, start_date, end_date, created_at, view_count, author, is_deleted
            "#,
        )
        .bind(&dto.title)
        .bind(&dto.content)
        .bind(dto.start_date)
        .bind(dto.end_date)
        .bind(&dto.author)
        .fetch_one(self.db.writer())
        .await?;

        let attachments = self.storage.process_files(notice.id, &files).await?;

        tracing::info!(
            "Notice created: id={}, attachments={}",
            notice.id,
            attachments.len()
        );

        self.cache.evict_namespace(NOTICE_CACHE).await;

        Ok(NoticeResponseDto::from_parts(notice, attachments))
    }

    /// Detail by id, cached. Soft-deleted notices report not-found.
    pub async fn get_notice_detail(&self, id: i64) -> Result<NoticeDetailResponseDto> {
        let key = id.to_string();
        if let Some(cached) = self
            .cache
            .get::<NoticeDetailResponseDto>(NOTICE_CACHE, &key)
            .await
        {
            return Ok(cached);
        }

        let notice = self.find_live_notice(id).await?;
        let attachments = self.storage.find_by_notice(notice.id).await?;

        let dto = NoticeDetailResponseDto::from_parts(notice, attachments);
        self.cache.put(NOTICE_CACHE, &key, &dto).await;

        Ok(dto)
    }

    /// Paginated listing of live notices, newest first. Returns the page and
    /// the total live count.
    pub async fn get_all_notices(
        &self,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<NoticeResponseDto>, i64)> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notices WHERE is_deleted = FALSE")
                .fetch_one(self.db.reader())
                .await?;

        let notices = sqlx::query_as::<_, Notice>(&format!(
            r#"
            SELECT {NOTICE_COLUMNS}
            FROM notices
            WHERE is_deleted = FALSE
            ORDER BY created_at DESC
            OFFSET $1 LIMIT $2
            "#
        ))
        .bind(pagination.offset())
        .bind(pagination.limit())
        .fetch_all(self.db.reader())
        .await?;

        let responses = self.with_attachments(notices).await?;
        Ok((responses, total))
    }

    /// Search by title/content/author substring and creation date range.
    /// Unset filters fall back to match-everything sentinels, so an empty
    /// query equals the full listing.
    pub async fn search_notices(
        &self,
        query: &NoticeSearchQuery,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<NoticeResponseDto>, i64)> {
        let title = text_filter(&query.title);
        let content = text_filter(&query.content);
        let author = text_filter(&query.author);
        let (start, end) = date_range(query.start_date, query.end_date);

        let filter = r#"
            is_deleted = FALSE
              AND title LIKE '%' || $1 || '%'
              AND content LIKE '%' || $2 || '%'
              AND author LIKE '%' || $3 || '%'
              AND created_at BETWEEN $4 AND $5
        "#;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM notices WHERE {filter}"))
                .bind(&title)
                .bind(&content)
                .bind(&author)
                .bind(start)
                .bind(end)
                .fetch_one(self.db.reader())
                .await?;

        let notices = sqlx::query_as::<_, Notice>(&format!(
            r#"
            SELECT {NOTICE_COLUMNS}
            FROM notices
            WHERE {filter}
            ORDER BY created_at DESC
            OFFSET $6 LIMIT $7
            "#
        ))
        .bind(&title)
        .bind(&content)
        .bind(&author)
        .bind(start)
        .bind(end)
        .bind(pagination.offset())
        .bind(pagination.limit())
        .fetch_all(self.db.reader())
        .await?;

        let responses = self.with_attachments(notices).await?;
        Ok((responses, total))
    }

    /// Replace the notice fields and its attachment set wholesale: old files
    /// are soft-deleted and removed from disk, new ones stored.
    pub async fn update_notice(
        &self,
        id: i64,
        dto: NoticeUpdateDto,
        files: Vec<UploadedFile>,
    ) -> Result<NoticeResponseDto> {
        dto.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        // Existence check goes through the writer: this read is part of a
        // read-write operation and must observe the primary.
        self.find_notice_for_write(id).await?;

        self.storage.delete_files_by_notice(id).await?;
        let attachments = self.storage.process_files(id, &files).await?;

        let notice = sqlx::query_as::<_, Notice>(
            r#"
            UPDATE notices
            SET title = $1, content = $2, start_date = $3, end_date = $4
            WHERE id = $5
            RETURNING id, title, content, start_date, end_date, created_at, view_count, author, is_deleted
            "#,
        )
        .bind(&dto.title)
        .bind(&dto.content)
        .bind(dto.start_date)
        .bind(dto.end_date)
        .bind(id)
        .fetch_one(self.db.writer())
        .await?;

        tracing::info!(
            "Notice updated: id={}, attachments={}",
            notice.id,
            attachments.len()
        );

        self.cache.evict_namespace(NOTICE_CACHE).await;

        Ok(NoticeResponseDto::from_parts(notice, attachments))
    }

    /// Soft-delete the notice, cascading to its attachments. Rows stay in
    /// the database.
    pub async fn delete_notice(&self, id: i64) -> Result<()> {
        self.find_notice_for_write(id).await?;

        self.storage.delete_files_by_notice(id).await?;

        sqlx::query("UPDATE notices SET is_deleted = TRUE WHERE id = $1")
            .bind(id)
            .execute(self.db.writer())
            .await?;

        tracing::info!("Notice deleted: id={}", id);

        self.cache.evict_namespace(NOTICE_CACHE).await;

        Ok(())
    }

    async fn find_live_notice(&self, id: i64) -> Result<Notice> {
        sqlx::query_as::<_, Notice>(&format!(
            "SELECT {NOTICE_COLUMNS} FROM notices WHERE id = $1 AND is_deleted = FALSE"
        ))
        .bind(id)
        .fetch_optional(self.db.reader())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Notice not found with id {}", id)))
    }

    async fn find_notice_for_write(&self, id: i64) -> Result<Notice> {
        sqlx::query_as::<_, Notice>(&format!(
            "SELECT {NOTICE_COLUMNS} FROM notices WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.db.writer())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Notice not found with id {}", id)))
    }

    async fn with_attachments(&self, notices: Vec<Notice>) -> Result<Vec<NoticeResponseDto>> {
        let mut responses = Vec::with_capacity(notices.len());
        for notice in notices {
            let attachments = self.storage.find_by_notice(notice.id).await?;
            responses.push(NoticeResponseDto::from_parts(notice, attachments));
        }
        Ok(responses)
    }
}

fn text_filter(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// Sentinel bounds for the creation-date filter. Wide enough to cover any
/// practicable timestamp while staying inside Postgres' timestamptz range.
fn date_range(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let min = Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).unwrap();
    let max = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap();
    (start.unwrap_or(min), end.unwrap_or(max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    async fn lazy_service() -> NoticeService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://test@localhost/noticeboard")
            .expect("lazy pool");
        let db = Arc::new(ReplicationPool::new(pool, None));
        let cache = Arc::new(ResponseCache::disabled());
        // The storage root is never touched by the validation tests below.
        let storage = Arc::new(
            FileStorageService::init(&std::env::temp_dir(), Arc::clone(&db), Arc::clone(&cache))
                .await
                .expect("storage init"),
        );
        NoticeService::new(db, storage, cache)
    }

    fn sample_create(title: &str, content: &str) -> NoticeCreateDto {
        NoticeCreateDto {
            title: title.to_string(),
            content: content.to_string(),
            start_date: Utc::now(),
            end_date: Utc::now(),
            author: "tester".to_string(),
        }
    }

    #[test]
    fn unset_text_filters_default_to_empty_string() {
        assert_eq!(text_filter(&None), "");
        assert_eq!(text_filter(&Some("kernel".into())), "kernel");
    }

    #[test]
    fn unset_date_filters_default_to_full_range() {
        let (start, end) = date_range(None, None);
        assert_eq!(start, Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap());

        let pinned = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let (start, end) = date_range(Some(pinned), None);
        assert_eq!(start, pinned);
        assert!(end > pinned);
    }

    #[tokio::test]
    async fn empty_title_is_rejected_before_any_database_write() {
        let service = lazy_service().await;

        // The pool is lazy and points at nothing; reaching the database
        // would fail with a connection error, not a validation error.
        let err = service
            .create_notice(sample_create("", "body"), vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = service
            .create_notice(sample_create("title", ""), vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn update_with_empty_fields_is_rejected_up_front() {
        let service = lazy_service().await;

        let dto = NoticeUpdateDto {
            title: String::new(),
            content: "body".to_string(),
            start_date: Utc::now(),
            end_date: Utc::now(),
        };
        let err = service.update_notice(1, dto, vec![]).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
