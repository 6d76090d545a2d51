//! Read API over the structure cache
//!
//! Readers always get an immediate answer built from the cache. A missing
//! or stale structure is answered as-is and an analysis job is queued in
//! the background; the reader never waits on a crawl.

mod routes;

pub use routes::{router, ApiError, AppState};

use crate::config::Config;
use crate::queue::{AnalysisQueue, EnqueueOutcome};
use crate::storage::{lock, Freshness, Storage, StorageResult, WebsiteStructure};
use crate::url::canonical_domain;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Cache state of a company's structure as seen by a reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureStatus {
    Fresh,
    Stale,
    None,
}

/// Answer to a structure lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureResponse {
    pub status: StructureStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure: Option<WebsiteStructure>,
}

impl StructureResponse {
    fn none() -> Self {
        Self {
            status: StructureStatus::None,
            structure: None,
        }
    }
}

/// Result of queueing every company in the directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeSummary {
    /// New jobs created
    pub enqueued: usize,
    /// Companies that already had a live job
    pub already_queued: usize,
    /// Companies without a usable domain
    pub skipped: usize,
}

/// Cache reads plus the enqueue side effects that go with them
pub struct ReadApi<S> {
    queue: AnalysisQueue<S>,
    storage: Arc<Mutex<S>>,
    on_demand_priority: i64,
    initial_priority: i64,
}

impl<S> Clone for ReadApi<S> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            storage: Arc::clone(&self.storage),
            on_demand_priority: self.on_demand_priority,
            initial_priority: self.initial_priority,
        }
    }
}

impl<S: Storage> ReadApi<S> {
    pub fn new(queue: AnalysisQueue<S>, storage: Arc<Mutex<S>>, config: &Config) -> Self {
        Self {
            queue,
            storage,
            on_demand_priority: config.queue.on_demand_priority,
            initial_priority: config.queue.initial_priority,
        }
    }

    pub fn queue(&self) -> &AnalysisQueue<S> {
        &self.queue
    }

    pub fn initial_priority(&self) -> i64 {
        self.initial_priority
    }

    /// Looks up a company's cached structure
    ///
    /// Never fails: storage problems are logged and reported as `none`.
    /// A `none` or `stale` answer also queues the company for analysis at
    /// on-demand priority.
    pub fn website_structure(&self, company_id: i64) -> StructureResponse {
        let cached = lock(&self.storage).and_then(|storage| storage.get_structure(company_id));

        let response = match cached {
            Ok(Some(structure)) => match structure.freshness(self.queue.now()) {
                Freshness::Fresh => {
                    return StructureResponse {
                        status: StructureStatus::Fresh,
                        structure: Some(structure),
                    }
                }
                Freshness::Stale => StructureResponse {
                    status: StructureStatus::Stale,
                    structure: Some(structure),
                },
            },
            Ok(None) => StructureResponse::none(),
            Err(e) => {
                warn!(company_id, error = %e, "Cache read failed, answering none");
                StructureResponse::none()
            }
        };

        if let Err(e) = self.request_analysis(company_id) {
            warn!(company_id, error = %e, "Could not queue on-demand analysis");
        }

        response
    }

    /// Queues one company at on-demand priority
    ///
    /// Returns `None` if the company is unknown or has no usable domain.
    pub fn request_analysis(&self, company_id: i64) -> StorageResult<Option<EnqueueOutcome>> {
        let company = lock(&self.storage)?.get_company(company_id)?;

        let Some(domain) = company
            .and_then(|c| c.domain)
            .and_then(|d| canonical_domain(&d).ok())
        else {
            debug!(company_id, "No domain to analyze");
            return Ok(None);
        };

        self.queue
            .enqueue(company_id, &domain, self.on_demand_priority)
            .map(Some)
    }

    /// Queues every company in the directory that has a usable domain
    ///
    /// # Arguments
    ///
    /// * `priority` - Priority for new jobs; live jobs keep the more urgent of the two
    pub fn initialize_queue(&self, priority: i64) -> StorageResult<InitializeSummary> {
        let companies = lock(&self.storage)?.list_companies()?;
        let mut summary = InitializeSummary::default();

        for company in companies {
            let domain = company.domain.as_deref().map(canonical_domain);
            let domain = match domain {
                Some(Ok(domain)) => domain,
                Some(Err(e)) => {
                    debug!(company_id = company.id, error = %e, "Skipping unusable domain");
                    summary.skipped += 1;
                    continue;
                }
                None => {
                    summary.skipped += 1;
                    continue;
                }
            };

            match self.queue.enqueue(company.id, &domain, priority)? {
                EnqueueOutcome::Created(_) => summary.enqueued += 1,
                EnqueueOutcome::Existing(_) => summary.already_queued += 1,
            }
        }

        info!(
            enqueued = summary.enqueued,
            already_queued = summary.already_queued,
            skipped = summary.skipped,
            "Queue initialized"
        );

        Ok(summary)
    }
}
