// SQLite JobStore Implementation

use async_trait::async_trait;
use carelens_core::domain::{Job, JobId, JobPriority, JobResults, JobStatus};
use carelens_core::error::{AppError, Result};
use carelens_core::port::JobStore;
use sqlx::SqlitePool;

// Convert sqlx::Error to AppError, keeping the SQLite result code visible
// where one exists (https://www.sqlite.org/rescode.html)
fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some("5") => AppError::Storage(format!(
                "database locked (SQLITE_BUSY): {}",
                db_err.message()
            )),
            Some("13") => AppError::Storage(format!("database full: {}", db_err.message())),
            Some(code) => {
                AppError::Storage(format!("database error [{}]: {}", code, db_err.message()))
            }
            None => AppError::Storage(format!("database error: {}", db_err.message())),
        },
        _ => AppError::Storage(err.to_string()),
    }
}

#[derive(sqlx::FromRow)]
struct JobRow {
    job_id: String,
    document_id: String,
    document_uri: String,
    document_type: String,
    patient_id: String,
    referral_id: String,
    priority: String,
    callback_url: Option<String>,
    status: String,
    progress: Option<f64>,
    message: Option<String>,
    created_at: i64,
    started_at: Option<i64>,
    completed_at: Option<i64>,
    results: Option<String>,
}

impl JobRow {
    fn into_job(self) -> Result<Job> {
        let status: JobStatus = self
            .status
            .parse()
            .map_err(|_| AppError::Storage(format!("unknown job status in row: {}", self.status)))?;
        let priority: JobPriority = self
            .priority
            .parse()
            .map_err(|e| AppError::Storage(format!("bad priority in row: {e}")))?;
        let results: Option<JobResults> = self
            .results
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;

        Ok(Job {
            job_id: self.job_id,
            document_id: self.document_id,
            document_uri: self.document_uri,
            document_type: self.document_type,
            patient_id: self.patient_id,
            referral_id: self.referral_id,
            priority,
            callback_url: self.callback_url,
            status,
            progress: self.progress,
            message: self.message,
            created_at: self.created_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
            results,
        })
    }
}

/// JobStore backed by SQLite; `put` is an upsert keyed by job_id
pub struct SqliteJobStore {
    pool: SqlitePool,
}

impl SqliteJobStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn put(&self, job: &Job) -> Result<()> {
        let results_json = job
            .results
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO jobs (
                job_id, document_id, document_uri, document_type,
                patient_id, referral_id, priority, callback_url,
                status, progress, message,
                created_at, started_at, completed_at, results
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (job_id) DO UPDATE SET
                status = excluded.status,
                progress = excluded.progress,
                message = excluded.message,
                started_at = excluded.started_at,
                completed_at = excluded.completed_at,
                results = excluded.results
            "#,
        )
        .bind(&job.job_id)
        .bind(&job.document_id)
        .bind(&job.document_uri)
        .bind(&job.document_type)
        .bind(&job.patient_id)
        .bind(&job.referral_id)
        .bind(job.priority.to_string())
        .bind(&job.callback_url)
        .bind(job.status.to_string())
        .bind(job.progress)
        .bind(&job.message)
        .bind(job.created_at)
        .bind(job.started_at)
        .bind(job.completed_at)
        .bind(&results_json)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn get(&self, job_id: &JobId) -> Result<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE job_id = ?")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(JobRow::into_job).transpose()
    }
}
