//! Durable analysis queue
//!
//! The queue holds at most one live (queued or in-progress) job per
//! company. Workers claim batches in priority order, then report each job
//! as completed or failed; failures are retried with exponential backoff
//! until the attempt budget runs out.
//!
//! All exclusivity comes from the database: claiming is a single
//! conditional update, so separate processes sharing one database file
//! never claim the same job twice.

mod backoff;
mod job;

pub use backoff::{BackoffPolicy, RetryPolicy};
pub use job::{AnalysisJob, EnqueueOutcome, FailOutcome, JobStatus, QueueStats};

use crate::storage::{lock, QueueStore, StorageResult};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Source of the current time
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Queue operations over a shared storage backend
pub struct AnalysisQueue<S> {
    storage: Arc<Mutex<S>>,
    retry: RetryPolicy,
    clock: Clock,
}

impl<S> Clone for AnalysisQueue<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            retry: self.retry,
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S: QueueStore> AnalysisQueue<S> {
    pub fn new(storage: Arc<Mutex<S>>, retry: RetryPolicy) -> Self {
        Self {
            storage,
            retry,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replaces the wall clock, used by tests to move time forward
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Adds a job for a company, or reuses its live job
    ///
    /// When a live job exists its priority becomes `min(existing, priority)`
    /// and its attempt count and backoff are left alone.
    ///
    /// # Arguments
    ///
    /// * `company_id` - The company to analyze
    /// * `domain` - The company's website domain
    /// * `priority` - Lower is more urgent
    pub fn enqueue(&self, company_id: i64, domain: &str, priority: i64) -> StorageResult<EnqueueOutcome> {
        let now = self.now();
        let outcome = lock(&self.storage)?.enqueue_job(company_id, domain, priority, now)?;

        match outcome {
            EnqueueOutcome::Created(job_id) => {
                debug!(job_id, company_id, domain, priority, "Enqueued analysis job");
            }
            EnqueueOutcome::Existing(job_id) => {
                debug!(job_id, company_id, priority, "Company already has a live job");
            }
        }

        Ok(outcome)
    }

    /// Claims up to `max_batch` eligible jobs, most urgent first
    pub fn claim_next(&self, max_batch: usize) -> StorageResult<Vec<AnalysisJob>> {
        if max_batch == 0 {
            return Ok(Vec::new());
        }

        let now = self.now();
        let jobs = lock(&self.storage)?.claim_jobs(max_batch, now)?;

        if !jobs.is_empty() {
            debug!(count = jobs.len(), "Claimed analysis jobs");
        }

        Ok(jobs)
    }

    /// Marks an in-progress job as succeeded
    pub fn complete(&self, job_id: i64) -> StorageResult<()> {
        let now = self.now();
        lock(&self.storage)?.complete_job(job_id, now)
    }

    /// Records a failed attempt, scheduling a retry or giving up
    pub fn fail(&self, job_id: i64, error: &str) -> StorageResult<FailOutcome> {
        let now = self.now();
        let outcome = lock(&self.storage)?.fail_job(job_id, error, now, &self.retry)?;

        match outcome {
            FailOutcome::Retrying {
                attempts,
                next_eligible_at,
            } => {
                info!(job_id, attempts, %next_eligible_at, error, "Job failed, retry scheduled");
            }
            FailOutcome::Exhausted { attempts } => {
                warn!(job_id, attempts, error, "Job failed permanently");
            }
        }

        Ok(outcome)
    }

    pub fn stats(&self) -> StorageResult<QueueStats> {
        lock(&self.storage)?.queue_stats()
    }

    pub fn get(&self, job_id: i64) -> StorageResult<Option<AnalysisJob>> {
        lock(&self.storage)?.get_job(job_id)
    }

    /// The company's queued or in-progress job, if any
    pub fn active_job_for(&self, company_id: i64) -> StorageResult<Option<AnalysisJob>> {
        lock(&self.storage)?.active_job_for(company_id)
    }

    /// Puts jobs claimed longer than `older_than` ago back in the queue
    ///
    /// Attempts are not incremented: the worker that held them is gone.
    pub fn requeue_stale_claims(&self, older_than: chrono::Duration) -> StorageResult<usize> {
        let cutoff = self.now() - older_than;
        let count = lock(&self.storage)?.requeue_stale_claims(cutoff)?;
        if count > 0 {
            warn!(count, "Requeued jobs abandoned by a previous worker");
        }
        Ok(count)
    }

    /// Deletes every queued job
    pub fn clear(&self) -> StorageResult<usize> {
        lock(&self.storage)?.clear_queue()
    }

    /// Deletes terminal jobs that finished more than `older_than` ago
    pub fn purge_finished(&self, older_than: chrono::Duration) -> StorageResult<usize> {
        let cutoff = self.now() - older_than;
        lock(&self.storage)?.purge_finished(cutoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStorage;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::time::Duration;

    /// A clock that only moves when told to
    fn manual_clock(start: DateTime<Utc>) -> (Clock, Arc<AtomicI64>) {
        let offset = Arc::new(AtomicI64::new(0));
        let handle = Arc::clone(&offset);
        let clock: Clock = Arc::new(move || {
            start + chrono::Duration::milliseconds(handle.load(Ordering::SeqCst))
        });
        (clock, offset)
    }

    fn queue() -> (AnalysisQueue<SqliteStorage>, Arc<AtomicI64>) {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let retry = RetryPolicy {
            max_attempts: 5,
            backoff: BackoffPolicy::new(Duration::from_secs(60), Duration::from_secs(3600), 0.0),
        };
        let (clock, offset) = manual_clock(Utc::now());
        let queue = AnalysisQueue::new(Arc::new(Mutex::new(storage)), retry).with_clock(clock);
        (queue, offset)
    }

    fn advance(offset: &AtomicI64, secs: i64) {
        offset.fetch_add(secs * 1000, Ordering::SeqCst);
    }

    #[test]
    fn test_enqueue_is_idempotent() {
        let (queue, _) = queue();
        let first = queue.enqueue(1, "acme.com", 5).unwrap();
        let second = queue.enqueue(1, "acme.com", 5).unwrap();

        assert!(first.is_created());
        assert_eq!(second, EnqueueOutcome::Existing(first.job_id()));
        assert_eq!(queue.stats().unwrap().total, 1);
    }

    #[test]
    fn test_enqueue_keeps_most_urgent_priority() {
        let (queue, _) = queue();
        let id = queue.enqueue(1, "acme.com", 5).unwrap().job_id();
        queue.enqueue(1, "acme.com", 1).unwrap();
        queue.enqueue(1, "acme.com", 9).unwrap();

        assert_eq!(queue.get(id).unwrap().unwrap().priority, 1);
    }

    #[test]
    fn test_claim_orders_by_priority_then_age() {
        let (queue, offset) = queue();
        queue.enqueue(1, "a.com", 5).unwrap();
        advance(&offset, 1);
        queue.enqueue(2, "b.com", 1).unwrap();
        advance(&offset, 1);
        queue.enqueue(3, "c.com", 5).unwrap();

        let claimed = queue.claim_next(10).unwrap();
        let companies: Vec<i64> = claimed.iter().map(|j| j.company_id).collect();
        assert_eq!(companies, vec![2, 1, 3]);
        assert!(claimed.iter().all(|j| j.status == JobStatus::InProgress));
    }

    #[test]
    fn test_claim_zero_or_empty() {
        let (queue, _) = queue();
        assert!(queue.claim_next(5).unwrap().is_empty());
        queue.enqueue(1, "acme.com", 5).unwrap();
        assert!(queue.claim_next(0).unwrap().is_empty());
    }

    #[test]
    fn test_claimed_job_is_not_reclaimed() {
        let (queue, _) = queue();
        queue.enqueue(1, "acme.com", 5).unwrap();
        assert_eq!(queue.claim_next(5).unwrap().len(), 1);
        assert!(queue.claim_next(5).unwrap().is_empty());
    }

    #[test]
    fn test_fail_backs_off_then_retries() {
        let (queue, offset) = queue();
        let id = queue.enqueue(1, "acme.com", 5).unwrap().job_id();
        queue.claim_next(1).unwrap();

        let outcome = queue.fail(id, "network error").unwrap();
        assert!(matches!(outcome, FailOutcome::Retrying { attempts: 1, .. }));

        assert!(queue.claim_next(1).unwrap().is_empty());
        advance(&offset, 59);
        assert!(queue.claim_next(1).unwrap().is_empty());
        advance(&offset, 1);
        let retried = queue.claim_next(1).unwrap();
        assert_eq!(retried.len(), 1);
        assert_eq!(retried[0].attempts, 1);
        assert_eq!(retried[0].last_error.as_deref(), Some("network error"));
    }

    #[test]
    fn test_fail_exhausts_after_max_attempts() {
        let (queue, offset) = queue();
        let id = queue.enqueue(1, "acme.com", 5).unwrap().job_id();

        for attempt in 1..=5 {
            advance(&offset, 3600);
            let claimed = queue.claim_next(1).unwrap();
            assert_eq!(claimed.len(), 1, "attempt {} should be claimable", attempt);
            let outcome = queue.fail(id, "timeout").unwrap();
            if attempt < 5 {
                assert!(matches!(outcome, FailOutcome::Retrying { .. }));
            } else {
                assert_eq!(outcome, FailOutcome::Exhausted { attempts: 5 });
            }
        }

        let job = queue.get(id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.last_error.as_deref(), Some("timeout"));
        assert!(job.finished_at.is_some());

        advance(&offset, 86_400);
        assert!(queue.claim_next(1).unwrap().is_empty());
    }

    #[test]
    fn test_complete_sets_succeeded() {
        let (queue, _) = queue();
        let id = queue.enqueue(1, "acme.com", 5).unwrap().job_id();
        queue.claim_next(1).unwrap();
        queue.complete(id).unwrap();

        let job = queue.get(id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Succeeded);
        assert!(job.finished_at.is_some());
        assert!(queue.active_job_for(1).unwrap().is_none());
    }

    #[test]
    fn test_complete_requires_claim() {
        let (queue, _) = queue();
        let id = queue.enqueue(1, "acme.com", 5).unwrap().job_id();
        assert!(queue.complete(id).is_err());
    }

    #[test]
    fn test_enqueue_after_terminal_creates_new_job() {
        let (queue, _) = queue();
        let first = queue.enqueue(1, "acme.com", 5).unwrap().job_id();
        queue.claim_next(1).unwrap();
        queue.complete(first).unwrap();

        let second = queue.enqueue(1, "acme.com", 5).unwrap();
        assert!(second.is_created());
        assert_ne!(second.job_id(), first);
    }

    #[test]
    fn test_requeue_stale_claims() {
        let (queue, offset) = queue();
        queue.enqueue(1, "acme.com", 5).unwrap();
        queue.claim_next(1).unwrap();

        assert_eq!(queue.requeue_stale_claims(chrono::Duration::minutes(30)).unwrap(), 0);
        advance(&offset, 31 * 60);
        assert_eq!(queue.requeue_stale_claims(chrono::Duration::minutes(30)).unwrap(), 1);

        let job = queue.claim_next(1).unwrap().remove(0);
        assert_eq!(job.attempts, 0);
    }

    #[test]
    fn test_stats_counts_and_average() {
        let (queue, offset) = queue();
        let a = queue.enqueue(1, "a.com", 5).unwrap().job_id();
        queue.enqueue(2, "b.com", 5).unwrap();
        queue.claim_next(1).unwrap();
        advance(&offset, 2);
        queue.complete(a).unwrap();

        let stats = queue.stats().unwrap();
        assert_eq!(stats.queued, 1);
        assert_eq!(stats.succeeded, 1);
        assert_eq!(stats.total, 2);
        let avg = stats.avg_processing_ms.unwrap();
        assert!((avg - 2000.0).abs() < 5.0, "avg was {}", avg);
    }

    #[test]
    fn test_clear_and_purge() {
        let (queue, offset) = queue();
        let a = queue.enqueue(1, "a.com", 5).unwrap().job_id();
        queue.enqueue(2, "b.com", 5).unwrap();
        queue.claim_next(1).unwrap();
        queue.complete(a).unwrap();

        assert_eq!(queue.clear().unwrap(), 1);
        assert_eq!(queue.purge_finished(chrono::Duration::days(1)).unwrap(), 0);
        advance(&offset, 2 * 86_400);
        assert_eq!(queue.purge_finished(chrono::Duration::days(1)).unwrap(), 1);
        assert_eq!(queue.stats().unwrap().total, 0);
    }
}
