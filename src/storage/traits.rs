//! Storage traits and error types
//!
//! The backend is split by concern: the work queue, the structure cache and
//! the company directory. A single backend usually implements all three and
//! is shared between the worker pool and the read API.

use crate::queue::{AnalysisJob, EnqueueOutcome, FailOutcome, JobStatus, QueueStats, RetryPolicy};
use crate::storage::{Company, WebsiteStructure};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Job not found: {0}")]
    JobNotFound(i64),

    #[error("Cannot {action} job {job_id} in state {from}")]
    InvalidTransition {
        job_id: i64,
        from: JobStatus,
        action: &'static str,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable job queue
///
/// Every method takes `now` explicitly so callers own the clock.
pub trait QueueStore {
    /// Inserts a queued job, or lowers the priority of the company's live job
    ///
    /// # Arguments
    ///
    /// * `company_id` - The company to analyze
    /// * `domain` - The company's website domain
    /// * `priority` - Lower is more urgent
    /// * `now` - Enqueue time, also the first eligibility time
    ///
    /// # Returns
    ///
    /// Whether a job was created or an existing live job was reused
    fn enqueue_job(
        &mut self,
        company_id: i64,
        domain: &str,
        priority: i64,
        now: DateTime<Utc>,
    ) -> StorageResult<EnqueueOutcome>;

    /// Atomically moves up to `max_batch` eligible jobs to `in_progress`
    ///
    /// Returned jobs are ordered by priority, enqueue time, then id.
    fn claim_jobs(&mut self, max_batch: usize, now: DateTime<Utc>) -> StorageResult<Vec<AnalysisJob>>;

    /// Marks an in-progress job as succeeded
    fn complete_job(&mut self, job_id: i64, now: DateTime<Utc>) -> StorageResult<()>;

    /// Records a failed attempt on an in-progress job
    ///
    /// The job goes back to `queued` with a backoff delay while attempts
    /// remain, otherwise it becomes `failed`.
    fn fail_job(
        &mut self,
        job_id: i64,
        error: &str,
        now: DateTime<Utc>,
        policy: &RetryPolicy,
    ) -> StorageResult<FailOutcome>;

    fn get_job(&self, job_id: i64) -> StorageResult<Option<AnalysisJob>>;

    /// The company's queued or in-progress job, if any
    fn active_job_for(&self, company_id: i64) -> StorageResult<Option<AnalysisJob>>;

    fn queue_stats(&self) -> StorageResult<QueueStats>;

    /// Moves jobs claimed before `claimed_before` back to `queued`
    fn requeue_stale_claims(&mut self, claimed_before: DateTime<Utc>) -> StorageResult<usize>;

    /// Deletes all queued jobs
    fn clear_queue(&mut self) -> StorageResult<usize>;

    /// Deletes terminal jobs that finished before `finished_before`
    fn purge_finished(&mut self, finished_before: DateTime<Utc>) -> StorageResult<usize>;
}

/// Latest known website structure per company
pub trait CacheStore {
    fn get_structure(&self, company_id: i64) -> StorageResult<Option<WebsiteStructure>>;

    /// Replaces the company's structure, pages and subdomains in one transaction
    fn put_structure(&mut self, structure: &WebsiteStructure) -> StorageResult<()>;

    /// True if nothing is cached or the cached structure is older than `window_days`
    ///
    /// A structure exactly `window_days` old is still fresh.
    fn is_stale(&self, company_id: i64, window_days: i64, now: DateTime<Utc>) -> StorageResult<bool> {
        Ok(match self.get_structure(company_id)? {
            Some(structure) => structure.age(now) > chrono::Duration::days(window_days),
            None => true,
        })
    }
}

/// Read-only view of the companies being analyzed
pub trait CompanyDirectory {
    fn list_companies(&self) -> StorageResult<Vec<Company>>;

    fn get_company(&self, company_id: i64) -> StorageResult<Option<Company>>;
}

/// Everything the worker pool and read API need from one backend
pub trait Storage: QueueStore + CacheStore + CompanyDirectory + Send + 'static {}

impl<T> Storage for T where T: QueueStore + CacheStore + CompanyDirectory + Send + 'static {}
