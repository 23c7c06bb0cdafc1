use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::core::cache::ResponseCache;
use crate::core::database::ReplicationPool;
use crate::core::error::{AppError, Result};
use crate::features::files::dtos::{AttachmentDto, UploadedFile};
use crate::features::files::models::Attachment;
use crate::shared::constants::FILE_CACHE;

/// Disk-backed attachment storage plus the metadata rows that describe it.
///
/// Stored names are UUIDv4 plus the original extension, so collisions on the
/// shared root cannot happen. All I/O is awaited inline; there is no
/// coordination between concurrent requests beyond that.
pub struct FileStorageService {
    root: PathBuf,
    db: Arc<ReplicationPool>,
    cache: Arc<ResponseCache>,
}

impl FileStorageService {
    /// Create the storage root if needed and resolve it to an absolute path.
    pub async fn init(
        root: &Path,
        db: Arc<ReplicationPool>,
        cache: Arc<ResponseCache>,
    ) -> Result<Self> {
        tokio::fs::create_dir_all(root).await.map_err(|e| {
            AppError::Storage(format!(
                "Could not create storage directory {}: {}",
                root.display(),
                e
            ))
        })?;

        let root = tokio::fs::canonicalize(root).await.map_err(|e| {
            AppError::Storage(format!(
                "Could not resolve storage directory {}: {}",
                root.display(),
                e
            ))
        })?;

        Ok(Self { root, db, cache })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn validate_file_name(file_name: &str) -> Result<()> {
        if file_name.is_empty() || file_name.contains("..") {
            return Err(AppError::InvalidFileName(format!(
                "Filename contains invalid path sequence or is empty: {}",
                file_name
            )));
        }
        Ok(())
    }

    /// Collision-free stored name: a fresh UUID carrying over the original
    /// extension (dot included).
    fn stored_name_for(original: &str) -> String {
        match original.rfind('.') {
            Some(idx) if idx > 0 => format!("{}{}", Uuid::new_v4(), &original[idx..]),
            _ => Uuid::new_v4().to_string(),
        }
    }

    /// Write one uploaded file under the root. The filename is validated
    /// before anything touches the disk.
    async fn store_file(&self, file: &UploadedFile) -> Result<(String, PathBuf)> {
        Self::validate_file_name(&file.file_name)?;

        let stored_file_name = Self::stored_name_for(&file.file_name);
        let target = self.root.join(&stored_file_name);

        tokio::fs::write(&target, &file.data).await.map_err(|e| {
            AppError::Storage(format!(
                "Could not store file {}. Please try again: {}",
                file.file_name, e
            ))
        })?;

        debug!("Stored {} as {}", file.file_name, stored_file_name);
        Ok((stored_file_name, target))
    }

    /// Store every uploaded file and insert its metadata row, in upload
    /// order. Part of a read-write operation, so rows go through the writer.
    pub async fn process_files(
        &self,
        notice_id: i64,
        files: &[UploadedFile],
    ) -> Result<Vec<Attachment>> {
        let mut attachments = Vec::with_capacity(files.len());

        for file in files {
            let (stored_file_name, target) = self.store_file(file).await?;

            let attachment = sqlx::query_as::<_, Attachment>(
                r#"
                INSERT INTO attachments (notice_id, original_file_name, stored_file_name, file_path, is_deleted)
                VALUES ($1, $2, $3, $4, FALSE)
                RETURNING id, notice_id, original_file_name, stored_file_name, file_path, is_deleted
                "#,
            )
            .bind(notice_id)
            .bind(&file.file_name)
            .bind(&stored_file_name)
            .bind(target.to_string_lossy().into_owned())
            .fetch_one(self.db.writer())
            .await?;

            attachments.push(attachment);
        }

        Ok(attachments)
    }

    /// Live attachments for a notice, oldest first.
    pub async fn find_by_notice(&self, notice_id: i64) -> Result<Vec<Attachment>> {
        let attachments = sqlx::query_as::<_, Attachment>(
            r#"
            SELECT id, notice_id, original_file_name, stored_file_name, file_path, is_deleted
            FROM attachments
            WHERE notice_id = $1 AND is_deleted = FALSE
            ORDER BY id
            "#,
        )
        .bind(notice_id)
        .fetch_all(self.db.reader())
        .await?;

        Ok(attachments)
    }

    /// Soft-delete every live attachment of a notice and remove its bytes
    /// from disk. Files already gone from disk are tolerated.
    pub async fn delete_files_by_notice(&self, notice_id: i64) -> Result<()> {
        let attachments = sqlx::query_as::<_, Attachment>(
            r#"
            SELECT id, notice_id, original_file_name, stored_file_name, file_path, is_deleted
            FROM attachments
            WHERE notice_id = $1 AND is_deleted = FALSE
            ORDER BY id
            "#,
        )
        .bind(notice_id)
        .fetch_all(self.db.writer())
        .await?;

        for attachment in &attachments {
            sqlx::query("UPDATE attachments SET is_deleted = TRUE WHERE id = $1")
                .bind(attachment.id)
                .execute(self.db.writer())
                .await?;

            Self::remove_physical_file(Path::new(&attachment.file_path), &attachment.stored_file_name)
                .await?;
        }

        if !attachments.is_empty() {
            info!(
                "Deleted {} attachment(s) for notice {}",
                attachments.len(),
                notice_id
            );
        }

        self.cache.evict_namespace(FILE_CACHE).await;

        Ok(())
    }

    async fn remove_physical_file(path: &Path, stored_file_name: &str) -> Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!(
                "Could not delete file {}: {}",
                stored_file_name, e
            ))),
        }
    }

    /// Attachment metadata by id, cached.
    pub async fn get_attachment(&self, id: i64) -> Result<AttachmentDto> {
        let key = id.to_string();
        if let Some(cached) = self.cache.get::<AttachmentDto>(FILE_CACHE, &key).await {
            return Ok(cached);
        }

        let attachment = sqlx::query_as::<_, Attachment>(
            r#"
            SELECT id, notice_id, original_file_name, stored_file_name, file_path, is_deleted
            FROM attachments
            WHERE id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(id)
        .fetch_optional(self.db.reader())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Attachment not found with id {}", id)))?;

        let dto = AttachmentDto::from(attachment);
        self.cache.put(FILE_CACHE, &key, &dto).await;

        Ok(dto)
    }

    /// Read the bytes of a stored file. Metadata that points at a missing
    /// file is a storage failure, not a not-found.
    pub async fn load_file(&self, stored_file_name: &str) -> Result<Vec<u8>> {
        Self::validate_file_name(stored_file_name)?;

        let path = self.root.join(stored_file_name);
        tokio::fs::read(&path)
            .await
            .map_err(|e| AppError::Storage(format!("File not found {}: {}", stored_file_name, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn test_service(root: &Path) -> FileStorageService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://test@localhost/noticeboard")
            .expect("lazy pool");
        FileStorageService {
            root: root.to_path_buf(),
            db: Arc::new(ReplicationPool::new(pool, None)),
            cache: Arc::new(ResponseCache::disabled()),
        }
    }

    fn upload(name: &str, data: &[u8]) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            data: data.to_vec(),
        }
    }

    #[test]
    fn stored_names_keep_the_extension_and_never_collide() {
        let a = FileStorageService::stored_name_for("report.pdf");
        let b = FileStorageService::stored_name_for("report.pdf");
        assert!(a.ends_with(".pdf"));
        assert!(b.ends_with(".pdf"));
        assert_ne!(a, b);

        let bare = FileStorageService::stored_name_for("README");
        assert!(!bare.contains('.'));
    }

    #[test]
    fn filenames_with_traversal_sequences_are_invalid() {
        assert!(FileStorageService::validate_file_name("../../etc/passwd").is_err());
        assert!(FileStorageService::validate_file_name("notes/../x.txt").is_err());
        assert!(FileStorageService::validate_file_name("").is_err());
        assert!(FileStorageService::validate_file_name("plain.txt").is_ok());
    }

    #[tokio::test]
    async fn traversal_upload_is_rejected_before_any_disk_write() {
        let dir = tempfile::tempdir().unwrap();
        let service = test_service(dir.path());

        let err = service
            .store_file(&upload("../escape.txt", b"owned"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidFileName(_)));

        // nothing may have been written
        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stored_bytes_round_trip_through_load() {
        let dir = tempfile::tempdir().unwrap();
        let service = test_service(dir.path());

        let (stored_name, path) = service
            .store_file(&upload("hello.txt", b"hello world"))
            .await
            .unwrap();
        assert!(path.starts_with(dir.path()));

        let bytes = service.load_file(&stored_name).await.unwrap();
        assert_eq!(bytes, b"hello world");
    }

    #[tokio::test]
    async fn loading_a_missing_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let service = test_service(dir.path());

        let err = service.load_file("no-such-file.bin").await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));

        // traversal guard applies on the read path too
        let err = service.load_file("../outside.bin").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidFileName(_)));
    }

    #[tokio::test]
    async fn physical_removal_tolerates_already_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("already-gone.dat");

        FileStorageService::remove_physical_file(&gone, "already-gone.dat")
            .await
            .unwrap();

        tokio::fs::write(&gone, b"x").await.unwrap();
        FileStorageService::remove_physical_file(&gone, "already-gone.dat")
            .await
            .unwrap();
        assert!(!gone.exists());
    }

    #[tokio::test]
    async fn init_creates_the_root_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested/uploads");

        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://test@localhost/noticeboard")
            .expect("lazy pool");
        let service = FileStorageService::init(
            &root,
            Arc::new(ReplicationPool::new(pool, None)),
            Arc::new(ResponseCache::disabled()),
        )
        .await
        .unwrap();

        assert!(root.is_dir());
        assert!(service.root().is_absolute());
    }
}
