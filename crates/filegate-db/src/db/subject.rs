use filegate_core::{models::Subject, AppError};
use sqlx::{PgPool, Postgres};

/// Repository for subjects (the containers files are attached to)
#[derive(Clone)]
pub struct SubjectRepository {
    pool: PgPool,
}

impl SubjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "subjects", db.operation = "select"))]
    pub async fn exists(&self, id: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM subjects WHERE id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    #[tracing::instrument(skip(self), fields(db.table = "subjects", db.operation = "select"))]
    pub async fn get(&self, id: &str) -> Result<Option<Subject>, AppError> {
        let subject = sqlx::query_as::<Postgres, Subject>(
            "SELECT id, name, created_at FROM subjects WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subject)
    }
}
