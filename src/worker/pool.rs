use crate::config::Config;
use crate::crawler::SiteCrawler;
use crate::queue::{AnalysisJob, AnalysisQueue, FailOutcome};
use crate::scoring::RelevanceScorer;
use crate::storage::{lock, Storage, StorageError, StorageResult, WebsiteStructure};
use crate::worker::outcome::{JobOutcome, RunSummary};
use crate::AnalyzerError;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info, info_span, warn, Instrument};

type JobTasks = JoinSet<StorageResult<JobOutcome>>;

/// Limits and timings for the worker pool
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Jobs analyzed at the same time
    pub concurrency: usize,
    /// Pause between claims in the background loop
    pub batch_delay: Duration,
    /// Pages kept per company after ranking
    pub max_pages: usize,
    /// Subdomains kept per company
    pub max_subdomains: usize,
    pub freshness_window_days: i64,
    /// Claims older than this are considered abandoned at startup
    pub stale_claim_after: chrono::Duration,
}

impl WorkerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            concurrency: config.worker.concurrency,
            batch_delay: config.worker.batch_delay(),
            max_pages: config.crawler.max_pages,
            max_subdomains: config.crawler.max_subdomains,
            freshness_window_days: config.cache.freshness_window_days,
            stale_claim_after: chrono::Duration::minutes(config.queue.stale_claim_minutes),
        }
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Analyzes one claimed job from start to finish
struct JobRunner<S, C> {
    queue: AnalysisQueue<S>,
    storage: Arc<Mutex<S>>,
    crawler: Arc<C>,
    scorer: RelevanceScorer,
    max_pages: usize,
    max_subdomains: usize,
    freshness_window_days: i64,
}

impl<S, C> Clone for JobRunner<S, C> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            storage: Arc::clone(&self.storage),
            crawler: Arc::clone(&self.crawler),
            scorer: self.scorer.clone(),
            max_pages: self.max_pages,
            max_subdomains: self.max_subdomains,
            freshness_window_days: self.freshness_window_days,
        }
    }
}

impl<S: Storage, C: SiteCrawler> JobRunner<S, C> {
    /// Crawls, ranks and caches one company, then settles its job
    ///
    /// Crawl failures become a `fail` on the job. Only storage errors are
    /// returned as errors.
    async fn run(self, job: AnalysisJob) -> StorageResult<JobOutcome> {
        let company = lock(&self.storage)?.get_company(job.company_id)?;
        if company.is_none() {
            self.queue.complete(job.id)?;
            info!("Company no longer in directory, skipping");
            return Ok(JobOutcome::Skipped {
                job_id: job.id,
                company_id: job.company_id,
                reason: "company not found".to_string(),
            });
        }

        info!(attempt = job.attempts + 1, "Analyzing website");
        let crawled = self.crawler.crawl(&job.domain).await;

        match crawled {
            Ok(report) => {
                let pages = self.scorer.rank(report.candidates, self.max_pages);
                let mut subdomains = report.subdomains;
                subdomains.truncate(self.max_subdomains);

                let structure = WebsiteStructure::new(
                    job.company_id,
                    report.domain,
                    pages,
                    subdomains,
                    report.discovery_method,
                    report.sitemap_url,
                    self.queue.now(),
                    self.freshness_window_days,
                );

                lock(&self.storage)?.put_structure(&structure)?;
                self.queue.complete(job.id)?;

                info!(
                    pages = structure.pages.len(),
                    subdomains = structure.subdomains.len(),
                    has_careers_page = structure.has_careers_page,
                    "Website structure cached"
                );

                Ok(JobOutcome::Succeeded {
                    job_id: job.id,
                    company_id: job.company_id,
                    pages: structure.pages.len(),
                    has_careers_page: structure.has_careers_page,
                })
            }
            Err(e) => {
                let message = e.to_string();
                let (attempts, will_retry) = match self.queue.fail(job.id, &message)? {
                    FailOutcome::Retrying { attempts, .. } => (attempts, true),
                    FailOutcome::Exhausted { attempts } => (attempts, false),
                };

                Ok(JobOutcome::Failed {
                    job_id: job.id,
                    company_id: job.company_id,
                    kind: e.kind().to_string(),
                    error: message,
                    attempts,
                    will_retry,
                })
            }
        }
    }
}

/// Bounded-concurrency processor for the analysis queue
///
/// A semaphore caps the number of jobs in flight across `run_pass` calls
/// and the background loop alike. Claims never exceed the free permits.
pub struct WorkerPool<S, C> {
    runner: JobRunner<S, C>,
    permits: Arc<Semaphore>,
    concurrency: usize,
    batch_delay: Duration,
    stale_claim_after: chrono::Duration,
}

impl<S: Storage, C: SiteCrawler> WorkerPool<S, C> {
    /// Creates a worker pool
    ///
    /// # Arguments
    ///
    /// * `queue` - The analysis queue to claim from
    /// * `storage` - Backend holding the cache and the company directory
    /// * `crawler` - Crawler used for every job
    /// * `settings` - Concurrency, timing and truncation limits
    pub fn new(
        queue: AnalysisQueue<S>,
        storage: Arc<Mutex<S>>,
        crawler: Arc<C>,
        settings: WorkerSettings,
    ) -> Self {
        let concurrency = settings.concurrency.max(1);
        Self {
            runner: JobRunner {
                queue,
                storage,
                crawler,
                scorer: RelevanceScorer::default(),
                max_pages: settings.max_pages,
                max_subdomains: settings.max_subdomains,
                freshness_window_days: settings.freshness_window_days,
            },
            permits: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            batch_delay: settings.batch_delay,
            stale_claim_after: settings.stale_claim_after,
        }
    }

    pub fn queue(&self) -> &AnalysisQueue<S> {
        &self.runner.queue
    }

    /// Jobs currently being analyzed
    pub fn in_flight(&self) -> usize {
        self.concurrency - self.permits.available_permits()
    }

    /// Claims and processes one batch, waiting for every job in it
    ///
    /// # Arguments
    ///
    /// * `batch_size` - Upper bound on jobs claimed; further capped by free capacity
    ///
    /// # Returns
    ///
    /// One outcome per claimed job, or `Capacity` when no permit is free.
    /// A storage error fails the pass once every job has finished.
    ///
    /// Abandoned claims are requeued before claiming. If the returned future
    /// is dropped early, jobs already spawned keep running and settle their
    /// own claims.
    pub async fn run_pass(&self, batch_size: usize) -> crate::Result<Vec<JobOutcome>> {
        if batch_size == 0 {
            return Ok(Vec::new());
        }

        self.runner.queue.requeue_stale_claims(self.stale_claim_after)?;

        let mut tasks = DetachOnDrop(JoinSet::new());
        if self.dispatch(&mut tasks.0, batch_size)?.is_none() {
            return Err(AnalyzerError::Capacity {
                in_flight: self.in_flight(),
            });
        }

        let mut outcomes = Vec::with_capacity(tasks.0.len());
        let mut failure = None;
        while let Some(joined) = tasks.0.join_next().await {
            match settle(joined) {
                Ok(Some(outcome)) => outcomes.push(outcome),
                Ok(None) => {}
                Err(e) => {
                    failure.get_or_insert(e);
                }
            }
        }

        if let Some(e) = failure {
            return Err(e.into());
        }

        info!(processed = outcomes.len(), "Queue pass finished");
        Ok(outcomes)
    }

    /// Processes the queue until `shutdown` resolves
    ///
    /// Abandoned claims are requeued first. Each cycle claims up to the
    /// free capacity, then waits for the batch delay while collecting
    /// finished jobs. On shutdown, in-flight jobs are awaited before
    /// returning.
    pub async fn run<F>(&self, shutdown: F) -> crate::Result<RunSummary>
    where
        F: Future<Output = ()>,
    {
        self.runner.queue.requeue_stale_claims(self.stale_claim_after)?;

        tokio::pin!(shutdown);
        let mut tasks = JoinSet::new();
        let mut summary = RunSummary::default();

        info!(
            concurrency = self.concurrency,
            batch_delay_secs = self.batch_delay.as_secs(),
            "Worker pool started"
        );

        loop {
            if let Err(e) = self.dispatch(&mut tasks, self.concurrency) {
                error!(error = %e, "Claiming jobs failed");
                drain(&mut tasks, &mut summary).await;
                return Err(e.into());
            }

            let delay = tokio::time::sleep(self.batch_delay);
            tokio::pin!(delay);

            loop {
                tokio::select! {
                    _ = &mut shutdown => {
                        info!(in_flight = tasks.len(), "Shutdown requested, waiting for in-flight jobs");
                        return match drain(&mut tasks, &mut summary).await {
                            Some(e) => Err(e.into()),
                            None => Ok(summary),
                        };
                    }
                    _ = &mut delay => break,
                    Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                        match settle(joined) {
                            Ok(Some(outcome)) => summary.record(&outcome),
                            Ok(None) => {}
                            Err(e) => {
                                error!(error = %e, "Storage failed while settling a job");
                                drain(&mut tasks, &mut summary).await;
                                return Err(e.into());
                            }
                        }
                    }
                }
            }
        }
    }

    /// Claims up to `max_jobs` jobs within free capacity and spawns them
    ///
    /// Returns `None` when no permit was free, otherwise the number of jobs
    /// claimed (possibly zero when the queue is empty).
    fn dispatch(&self, tasks: &mut JobTasks, max_jobs: usize) -> StorageResult<Option<usize>> {
        let mut permits: Vec<OwnedSemaphorePermit> = Vec::new();
        while permits.len() < max_jobs {
            match Arc::clone(&self.permits).try_acquire_owned() {
                Ok(permit) => permits.push(permit),
                Err(_) => break,
            }
        }

        if permits.is_empty() {
            return Ok(None);
        }

        let jobs = self.runner.queue.claim_next(permits.len())?;
        let claimed = jobs.len();

        for (job, permit) in jobs.into_iter().zip(permits) {
            let span = info_span!(
                "analysis_job",
                job_id = job.id,
                company_id = job.company_id,
                domain = %job.domain
            );
            let runner = self.runner.clone();
            tasks.spawn(
                async move {
                    let _permit = permit;
                    runner.run(job).await
                }
                .instrument(span),
            );
        }

        Ok(Some(claimed))
    }
}

/// Detaches unfinished jobs instead of aborting them when a pass is dropped
struct DetachOnDrop(JobTasks);

impl Drop for DetachOnDrop {
    fn drop(&mut self) {
        if !self.0.is_empty() {
            warn!(in_flight = self.0.len(), "Pass abandoned, jobs continue in the background");
            self.0.detach_all();
        }
    }
}

/// Unwraps a finished task; a panicked job is logged and left for stale-claim recovery
fn settle(
    joined: Result<StorageResult<JobOutcome>, JoinError>,
) -> Result<Option<JobOutcome>, StorageError> {
    match joined {
        Ok(Ok(outcome)) => Ok(Some(outcome)),
        Ok(Err(e)) => Err(e),
        Err(e) => {
            warn!(error = %e, "Analysis task aborted");
            Ok(None)
        }
    }
}

/// Awaits every remaining task, returning the first storage error
async fn drain(tasks: &mut JobTasks, summary: &mut RunSummary) -> Option<StorageError> {
    let mut failure = None;
    while let Some(joined) = tasks.join_next().await {
        match settle(joined) {
            Ok(Some(outcome)) => summary.record(&outcome),
            Ok(None) => {}
            Err(e) => {
                failure.get_or_insert(e);
            }
        }
    }
    failure
}
