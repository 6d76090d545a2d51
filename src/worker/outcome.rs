use serde::Serialize;

/// What happened to one claimed job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JobOutcome {
    /// Structure cached and job completed
    #[serde(rename_all = "camelCase")]
    Succeeded {
        job_id: i64,
        company_id: i64,
        pages: usize,
        has_careers_page: bool,
    },

    /// Job completed without crawling (e.g. the company no longer exists)
    #[serde(rename_all = "camelCase")]
    Skipped {
        job_id: i64,
        company_id: i64,
        reason: String,
    },

    /// Crawl failed; the job was rescheduled or failed permanently
    #[serde(rename_all = "camelCase")]
    Failed {
        job_id: i64,
        company_id: i64,
        kind: String,
        error: String,
        attempts: u32,
        will_retry: bool,
    },
}

impl JobOutcome {
    pub fn job_id(&self) -> i64 {
        match self {
            Self::Succeeded { job_id, .. }
            | Self::Skipped { job_id, .. }
            | Self::Failed { job_id, .. } => *job_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Totals for a background worker run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &JobOutcome) {
        match outcome {
            JobOutcome::Succeeded { .. } => self.succeeded += 1,
            JobOutcome::Skipped { .. } => self.skipped += 1,
            JobOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.skipped + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_records_each_kind() {
        let mut summary = RunSummary::default();
        summary.record(&JobOutcome::Skipped {
            job_id: 1,
            company_id: 1,
            reason: "company not found".to_string(),
        });
        summary.record(&JobOutcome::Succeeded {
            job_id: 2,
            company_id: 2,
            pages: 4,
            has_careers_page: false,
        });
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.total(), 2);
    }

    #[test]
    fn test_outcome_json_shape() {
        let outcome = JobOutcome::Failed {
            job_id: 3,
            company_id: 9,
            kind: "network".to_string(),
            error: "timed out".to_string(),
            attempts: 2,
            will_retry: true,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["jobId"], 3);
        assert_eq!(json["willRetry"], true);
        assert_eq!(outcome.job_id(), 3);
        assert!(!outcome.is_success());
    }
}
