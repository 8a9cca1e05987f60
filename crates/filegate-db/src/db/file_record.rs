use filegate_core::{
    models::{FileRecord, NewFileRecord, ScanFields},
    AppError,
};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::traits::ScanUpdate;

const FILE_COLUMNS: &str = "id, subject_id, name, path, size, content_type, uploaded_by, \
     scanned, infected, scan_output, scanned_at, uploaded_at";

/// Repository for file records and their scan audit fields
#[derive(Clone)]
pub struct FileRecordRepository {
    pool: PgPool,
}

impl FileRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert one record with its scan fields already populated
    #[tracing::instrument(skip(self, record), fields(db.table = "files", db.operation = "insert", subject_id = %record.subject_id))]
    pub async fn insert(&self, record: NewFileRecord) -> Result<FileRecord, AppError> {
        let sql = format!(
            r#"
            INSERT INTO files (id, subject_id, name, path, size, content_type, uploaded_by,
                               scanned, infected, scan_output, scanned_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, true, $8, $9, $10)
            RETURNING {}
            "#,
            FILE_COLUMNS
        );

        let file = sqlx::query_as::<Postgres, FileRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(&record.subject_id)
            .bind(&record.name)
            .bind(&record.path)
            .bind(record.size)
            .bind(&record.content_type)
            .bind(&record.uploaded_by)
            .bind(record.scan.infected)
            .bind(&record.scan.scan_output)
            .bind(record.scan.scanned_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(file)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select", db.record_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        let sql = format!("SELECT {} FROM files WHERE id = $1", FILE_COLUMNS);
        let file = sqlx::query_as::<Postgres, FileRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(file)
    }

    /// Most recently uploaded record stored under `path`
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select"))]
    pub async fn find_latest_by_path(&self, path: &str) -> Result<Option<FileRecord>, AppError> {
        let sql = format!(
            "SELECT {} FROM files WHERE path = $1 ORDER BY uploaded_at DESC LIMIT 1",
            FILE_COLUMNS
        );
        let file = sqlx::query_as::<Postgres, FileRecord>(&sql)
            .bind(path)
            .fetch_optional(&self.pool)
            .await?;

        Ok(file)
    }

    /// Overwrite the scan fields unless a scan of a newer snapshot already landed.
    #[tracing::instrument(skip(self, fields), fields(db.table = "files", db.operation = "update", db.record_id = %id))]
    pub async fn update_scan_fields(
        &self,
        id: Uuid,
        fields: &ScanFields,
    ) -> Result<ScanUpdate, AppError> {
        let sql = format!(
            r#"
            UPDATE files
            SET scanned = true, infected = $2, scan_output = $3, scanned_at = $4
            WHERE id = $1 AND (scanned_at IS NULL OR scanned_at < $4)
            RETURNING {}
            "#,
            FILE_COLUMNS
        );

        let updated = sqlx::query_as::<Postgres, FileRecord>(&sql)
            .bind(id)
            .bind(fields.infected)
            .bind(&fields.scan_output)
            .bind(fields.scanned_at)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(record) = updated {
            return Ok(ScanUpdate::Applied(record));
        }

        // Either the row is gone or a fresher scan won the race.
        match self.get(id).await? {
            Some(current) => {
                tracing::info!(
                    file_id = %id,
                    "Scan update superseded by a newer scan"
                );
                Ok(ScanUpdate::Superseded(current))
            }
            None => Ok(ScanUpdate::Missing),
        }
    }

    /// Records of one subject, newest first
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select"))]
    pub async fn list_by_subject(&self, subject_id: &str) -> Result<Vec<FileRecord>, AppError> {
        let sql = format!(
            "SELECT {} FROM files WHERE subject_id = $1 ORDER BY uploaded_at DESC, id",
            FILE_COLUMNS
        );
        let files = sqlx::query_as::<Postgres, FileRecord>(&sql)
            .bind(subject_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(files)
    }
}
