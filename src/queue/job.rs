use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle state of an analysis job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting to be claimed once `next_eligible_at` has passed
    Queued,
    /// Claimed by a worker
    InProgress,
    /// Finished and its structure written to the cache
    Succeeded,
    /// Gave up after exhausting its attempts
    Failed,
}

impl JobStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(Self::Queued),
            "in_progress" => Some(Self::InProgress),
            "succeeded" => Some(Self::Succeeded),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Terminal jobs never change status again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// A unit of work: analyze one company's website
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisJob {
    pub id: i64,
    pub company_id: i64,
    pub domain: String,
    /// Lower is more urgent
    pub priority: i64,
    pub status: JobStatus,
    pub attempts: u32,
    pub next_eligible_at: DateTime<Utc>,
    pub last_error: Option<String>,
    pub enqueued_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Result of an enqueue call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// A new queued job was inserted
    Created(i64),
    /// The company already had a live job; its priority may have been raised
    Existing(i64),
}

impl EnqueueOutcome {
    pub fn job_id(&self) -> i64 {
        match self {
            Self::Created(id) | Self::Existing(id) => *id,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Result of recording a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOutcome {
    /// Back in the queue, claimable again at `next_eligible_at`
    Retrying {
        attempts: u32,
        next_eligible_at: DateTime<Utc>,
    },
    /// Permanently failed
    Exhausted { attempts: u32 },
}

/// Counts per status and mean processing time, read from the `queue_stats` view
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub queued: u64,
    pub in_progress: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub total: u64,
    /// Mean of `finished_at - claimed_at` over succeeded jobs
    pub avg_processing_ms: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_roundtrip() {
        for status in &[
            JobStatus::Queued,
            JobStatus::InProgress,
            JobStatus::Succeeded,
            JobStatus::Failed,
        ] {
            assert_eq!(JobStatus::from_db_string(status.to_db_string()), Some(*status));
        }
        assert_eq!(JobStatus::from_db_string("done"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::InProgress.is_terminal());
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn test_enqueue_outcome_job_id() {
        assert_eq!(EnqueueOutcome::Created(7).job_id(), 7);
        assert_eq!(EnqueueOutcome::Existing(9).job_id(), 9);
        assert!(!EnqueueOutcome::Existing(9).is_created());
    }
}
