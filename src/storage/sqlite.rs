//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the queue, cache
//! and directory traits. Each process opens its own connection; WAL mode
//! and a busy timeout let several processes share one database file.

use crate::queue::{AnalysisJob, EnqueueOutcome, FailOutcome, JobStatus, QueueStats, RetryPolicy};
use crate::scoring::PageCategory;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{CacheStore, CompanyDirectory, QueueStore, StorageError, StorageResult};
use crate::storage::{Company, DiscoveryMethod, Page, PageSource, WebsiteStructure};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use std::time::Duration;

/// How long a connection waits for another writer before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const JOB_COLUMNS: &str = "id, company_id, domain, priority, status, attempts, next_eligible_at, \
                           last_error, enqueued_at, claimed_at, finished_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for tests and one-off runs)
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Inserts or updates a company in the local directory mirror
    pub fn upsert_company(&mut self, company: &Company) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO companies (id, name, domain) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, domain = excluded.domain",
            params![company.id, company.name, company.domain],
        )?;
        Ok(())
    }

    /// Removes a company from the directory mirror
    pub fn remove_company(&mut self, company_id: i64) -> StorageResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM companies WHERE id = ?1", params![company_id])?;
        Ok(removed > 0)
    }

    /// Builds the error for a complete/fail call on a job that is not in progress
    fn transition_error(&self, job_id: i64, action: &'static str) -> StorageError {
        match self.get_job(job_id) {
            Ok(Some(job)) => StorageError::InvalidTransition {
                job_id,
                from: job.status,
                action,
            },
            Ok(None) => StorageError::JobNotFound(job_id),
            Err(e) => e,
        }
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn timestamp_at(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let value: String = row.get(idx)?;
    parse_timestamp(idx, &value)
}

fn optional_timestamp_at(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    row.get::<_, Option<String>>(idx)?
        .map(|value| parse_timestamp(idx, &value))
        .transpose()
}

fn enum_at<T>(row: &Row, idx: usize, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let value: String = row.get(idx)?;
    parse(&value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown value '{}'", value).into(),
        )
    })
}

fn job_from_row(row: &Row) -> rusqlite::Result<AnalysisJob> {
    Ok(AnalysisJob {
        id: row.get(0)?,
        company_id: row.get(1)?,
        domain: row.get(2)?,
        priority: row.get(3)?,
        status: enum_at(row, 4, JobStatus::from_db_string)?,
        attempts: row.get(5)?,
        next_eligible_at: timestamp_at(row, 6)?,
        last_error: row.get(7)?,
        enqueued_at: timestamp_at(row, 8)?,
        claimed_at: optional_timestamp_at(row, 9)?,
        finished_at: optional_timestamp_at(row, 10)?,
    })
}

fn page_from_row(row: &Row) -> rusqlite::Result<Page> {
    Ok(Page {
        url: row.get(0)?,
        title: row.get(1)?,
        category: enum_at(row, 2, PageCategory::from_db_string)?,
        score: row.get(3)?,
        source: enum_at(row, 4, PageSource::from_db_string)?,
        depth: row.get(5)?,
        last_modified: optional_timestamp_at(row, 6)?,
        priority: row.get(7)?,
        change_frequency: row.get(8)?,
    })
}

fn company_from_row(row: &Row) -> rusqlite::Result<Company> {
    Ok(Company {
        id: row.get(0)?,
        name: row.get(1)?,
        domain: row.get(2)?,
    })
}

impl QueueStore for SqliteStorage {
    fn enqueue_job(
        &mut self,
        company_id: i64,
        domain: &str,
        priority: i64,
        now: DateTime<Utc>,
    ) -> StorageResult<EnqueueOutcome> {
        // IMMEDIATE takes the write lock up front so the lookup and insert
        // cannot interleave with another connection's enqueue
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<(i64, i64)> = tx
            .query_row(
                "SELECT id, priority FROM analysis_jobs
                 WHERE company_id = ?1 AND status IN ('queued', 'in_progress')",
                params![company_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let outcome = match existing {
            Some((job_id, current)) => {
                if priority < current {
                    tx.execute(
                        "UPDATE analysis_jobs SET priority = ?1 WHERE id = ?2",
                        params![priority, job_id],
                    )?;
                }
                EnqueueOutcome::Existing(job_id)
            }
            None => {
                let ts = format_timestamp(&now);
                tx.execute(
                    "INSERT INTO analysis_jobs
                        (company_id, domain, priority, status, attempts, next_eligible_at, enqueued_at)
                     VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)",
                    params![
                        company_id,
                        domain,
                        priority,
                        JobStatus::Queued.to_db_string(),
                        ts
                    ],
                )?;
                EnqueueOutcome::Created(tx.last_insert_rowid())
            }
        };

        tx.commit()?;
        Ok(outcome)
    }

    fn claim_jobs(&mut self, max_batch: usize, now: DateTime<Utc>) -> StorageResult<Vec<AnalysisJob>> {
        if max_batch == 0 {
            return Ok(Vec::new());
        }

        let sql = format!(
            "UPDATE analysis_jobs
             SET status = 'in_progress', claimed_at = ?1
             WHERE status = 'queued' AND id IN (
                 SELECT id FROM analysis_jobs
                 WHERE status = 'queued' AND next_eligible_at <= ?1
                 ORDER BY priority ASC, enqueued_at ASC, id ASC
                 LIMIT ?2
             )
             RETURNING {}",
            JOB_COLUMNS
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut jobs = stmt
            .query_map(params![format_timestamp(&now), max_batch as i64], job_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        // RETURNING yields rows in no particular order
        jobs.sort_by(|a, b| {
            (a.priority, a.enqueued_at, a.id).cmp(&(b.priority, b.enqueued_at, b.id))
        });

        Ok(jobs)
    }

    fn complete_job(&mut self, job_id: i64, now: DateTime<Utc>) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE analysis_jobs
             SET status = 'succeeded', last_error = NULL, finished_at = ?1
             WHERE id = ?2 AND status = 'in_progress'",
            params![format_timestamp(&now), job_id],
        )?;

        if updated == 0 {
            return Err(self.transition_error(job_id, "complete"));
        }
        Ok(())
    }

    fn fail_job(
        &mut self,
        job_id: i64,
        error: &str,
        now: DateTime<Utc>,
        policy: &RetryPolicy,
    ) -> StorageResult<FailOutcome> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current: Option<(String, u32)> = tx
            .query_row(
                "SELECT status, attempts FROM analysis_jobs WHERE id = ?1",
                params![job_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let (status, attempts) = current.ok_or(StorageError::JobNotFound(job_id))?;
        let status = JobStatus::from_db_string(&status)
            .ok_or_else(|| StorageError::Serialization(format!("unknown job status '{}'", status)))?;

        if status != JobStatus::InProgress {
            return Err(StorageError::InvalidTransition {
                job_id,
                from: status,
                action: "fail",
            });
        }

        let attempts = attempts + 1;
        let outcome = if attempts < policy.max_attempts {
            let next_eligible_at = policy.backoff.next_eligible_at(attempts, now);
            tx.execute(
                "UPDATE analysis_jobs
                 SET status = 'queued', attempts = ?1, next_eligible_at = ?2,
                     last_error = ?3, claimed_at = NULL
                 WHERE id = ?4",
                params![attempts, format_timestamp(&next_eligible_at), error, job_id],
            )?;
            FailOutcome::Retrying {
                attempts,
                next_eligible_at,
            }
        } else {
            tx.execute(
                "UPDATE analysis_jobs
                 SET status = 'failed', attempts = ?1, last_error = ?2, finished_at = ?3
                 WHERE id = ?4",
                params![attempts, error, format_timestamp(&now), job_id],
            )?;
            FailOutcome::Exhausted { attempts }
        };

        tx.commit()?;
        Ok(outcome)
    }

    fn get_job(&self, job_id: i64) -> StorageResult<Option<AnalysisJob>> {
        let sql = format!("SELECT {} FROM analysis_jobs WHERE id = ?1", JOB_COLUMNS);
        let job = self
            .conn
            .query_row(&sql, params![job_id], job_from_row)
            .optional()?;
        Ok(job)
    }

    fn active_job_for(&self, company_id: i64) -> StorageResult<Option<AnalysisJob>> {
        let sql = format!(
            "SELECT {} FROM analysis_jobs
             WHERE company_id = ?1 AND status IN ('queued', 'in_progress')",
            JOB_COLUMNS
        );
        let job = self
            .conn
            .query_row(&sql, params![company_id], job_from_row)
            .optional()?;
        Ok(job)
    }

    fn queue_stats(&self) -> StorageResult<QueueStats> {
        let stats = self.conn.query_row(
            "SELECT queued, in_progress, succeeded, failed, total, avg_processing_ms FROM queue_stats",
            [],
            |row| {
                Ok(QueueStats {
                    queued: row.get::<_, i64>(0)? as u64,
                    in_progress: row.get::<_, i64>(1)? as u64,
                    succeeded: row.get::<_, i64>(2)? as u64,
                    failed: row.get::<_, i64>(3)? as u64,
                    total: row.get::<_, i64>(4)? as u64,
                    avg_processing_ms: row.get(5)?,
                })
            },
        )?;
        Ok(stats)
    }

    fn requeue_stale_claims(&mut self, claimed_before: DateTime<Utc>) -> StorageResult<usize> {
        let count = self.conn.execute(
            "UPDATE analysis_jobs SET status = 'queued', claimed_at = NULL
             WHERE status = 'in_progress' AND claimed_at < ?1",
            params![format_timestamp(&claimed_before)],
        )?;
        Ok(count)
    }

    fn clear_queue(&mut self) -> StorageResult<usize> {
        let count = self
            .conn
            .execute("DELETE FROM analysis_jobs WHERE status = 'queued'", [])?;
        Ok(count)
    }

    fn purge_finished(&mut self, finished_before: DateTime<Utc>) -> StorageResult<usize> {
        let count = self.conn.execute(
            "DELETE FROM analysis_jobs
             WHERE status IN ('succeeded', 'failed') AND finished_at < ?1",
            params![format_timestamp(&finished_before)],
        )?;
        Ok(count)
    }
}

impl CacheStore for SqliteStorage {
    fn get_structure(&self, company_id: i64) -> StorageResult<Option<WebsiteStructure>> {
        let header = self
            .conn
            .query_row(
                "SELECT domain, last_analyzed_at, freshness_window_days, has_careers_page,
                        discovery_method, sitemap_url
                 FROM website_structures WHERE company_id = ?1",
                params![company_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        timestamp_at(row, 1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, bool>(3)?,
                        enum_at(row, 4, DiscoveryMethod::from_db_string)?,
                        row.get::<_, Option<String>>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((domain, last_analyzed_at, window, has_careers_page, method, sitemap_url)) = header
        else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT url, title, category, score, source, depth, last_modified, priority, change_frequency
             FROM structure_pages WHERE company_id = ?1 ORDER BY position",
        )?;
        let pages = stmt
            .query_map(params![company_id], page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT subdomain FROM structure_subdomains WHERE company_id = ?1 ORDER BY subdomain",
        )?;
        let subdomains = stmt
            .query_map(params![company_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(Some(WebsiteStructure {
            company_id,
            domain,
            pages,
            subdomains,
            last_analyzed_at,
            freshness_window_days: window,
            has_careers_page,
            discovery_method: method,
            sitemap_url,
        }))
    }

    fn put_structure(&mut self, structure: &WebsiteStructure) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        let company_id = structure.company_id;

        tx.execute(
            "DELETE FROM structure_pages WHERE company_id = ?1",
            params![company_id],
        )?;
        tx.execute(
            "DELETE FROM structure_subdomains WHERE company_id = ?1",
            params![company_id],
        )?;

        tx.execute(
            "INSERT INTO website_structures
                (company_id, domain, last_analyzed_at, freshness_window_days,
                 has_careers_page, discovery_method, sitemap_url)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(company_id) DO UPDATE SET
                domain = excluded.domain,
                last_analyzed_at = excluded.last_analyzed_at,
                freshness_window_days = excluded.freshness_window_days,
                has_careers_page = excluded.has_careers_page,
                discovery_method = excluded.discovery_method,
                sitemap_url = excluded.sitemap_url",
            params![
                company_id,
                structure.domain,
                format_timestamp(&structure.last_analyzed_at),
                structure.freshness_window_days,
                structure.has_careers_page,
                structure.discovery_method.to_db_string(),
                structure.sitemap_url,
            ],
        )?;

        {
            let mut insert_page = tx.prepare(
                "INSERT OR IGNORE INTO structure_pages
                    (company_id, position, url, title, category, score, source, depth,
                     last_modified, priority, change_frequency)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;
            for (position, page) in structure.pages.iter().enumerate() {
                insert_page.execute(params![
                    company_id,
                    position as i64,
                    page.url,
                    page.title,
                    page.category.to_db_string(),
                    page.score,
                    page.source.to_db_string(),
                    page.depth,
                    page.last_modified.as_ref().map(format_timestamp),
                    page.priority,
                    page.change_frequency,
                ])?;
            }

            let mut insert_subdomain = tx.prepare(
                "INSERT OR IGNORE INTO structure_subdomains (company_id, subdomain) VALUES (?1, ?2)",
            )?;
            for subdomain in &structure.subdomains {
                insert_subdomain.execute(params![company_id, subdomain])?;
            }
        }

        tx.commit()?;
        Ok(())
    }
}

impl CompanyDirectory for SqliteStorage {
    fn list_companies(&self) -> StorageResult<Vec<Company>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, domain FROM companies ORDER BY id")?;
        let companies = stmt
            .query_map([], company_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(companies)
    }

    fn get_company(&self, company_id: i64) -> StorageResult<Option<Company>> {
        let company = self
            .conn
            .query_row(
                "SELECT id, name, domain FROM companies WHERE id = ?1",
                params![company_id],
                company_from_row,
            )
            .optional()?;
        Ok(company)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::BackoffPolicy;
    use tempfile::TempDir;

    fn page(url: &str, category: PageCategory, score: u32) -> Page {
        Page {
            url: url.to_string(),
            title: Some("Title".to_string()),
            category,
            score,
            source: PageSource::Sitemap,
            depth: 1,
            last_modified: Some(Utc::now()),
            priority: Some(0.5),
            change_frequency: Some("monthly".to_string()),
        }
    }

    fn structure(company_id: i64, pages: Vec<Page>, analyzed: DateTime<Utc>) -> WebsiteStructure {
        WebsiteStructure::new(
            company_id,
            "acme.com",
            pages,
            vec!["shop.acme.com".to_string()],
            DiscoveryMethod::Sitemap,
            Some("https://acme.com/sitemap.xml".to_string()),
            analyzed,
            30,
        )
    }

    #[test]
    fn test_create_in_memory() {
        let storage = SqliteStorage::new_in_memory();
        assert!(storage.is_ok());
    }

    #[test]
    fn test_create_on_disk() {
        let dir = TempDir::new().unwrap();
        let storage = SqliteStorage::new(&dir.path().join("analyzer.db"));
        assert!(storage.is_ok());
    }

    #[test]
    fn test_structure_roundtrip_keeps_page_order() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let pages = vec![
            page("https://acme.com/careers", PageCategory::Careers, 1000),
            page("https://acme.com/about", PageCategory::About, 325),
            page("https://acme.com/news", PageCategory::News, 175),
        ];
        let original = structure(1, pages, Utc::now());
        storage.put_structure(&original).unwrap();

        let loaded = storage.get_structure(1).unwrap().unwrap();
        let urls: Vec<&str> = loaded.pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://acme.com/careers", "https://acme.com/about", "https://acme.com/news"]
        );
        assert!(loaded.has_careers_page);
        assert_eq!(loaded.subdomains, vec!["shop.acme.com"]);
        assert_eq!(loaded.sitemap_url.as_deref(), Some("https://acme.com/sitemap.xml"));
        assert_eq!(loaded.discovery_method, DiscoveryMethod::Sitemap);
        assert_eq!(loaded.pages[0].priority, Some(0.5));
        assert_eq!(loaded.pages[0].change_frequency.as_deref(), Some("monthly"));
    }

    #[test]
    fn test_put_replaces_whole_structure() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .put_structure(&structure(
                1,
                vec![
                    page("https://acme.com/careers", PageCategory::Careers, 1000),
                    page("https://acme.com/about", PageCategory::About, 325),
                ],
                Utc::now(),
            ))
            .unwrap();

        let mut replacement = structure(
            1,
            vec![page("https://acme.com/team", PageCategory::Team, 275)],
            Utc::now(),
        );
        replacement.subdomains.clear();
        storage.put_structure(&replacement).unwrap();

        let loaded = storage.get_structure(1).unwrap().unwrap();
        assert_eq!(loaded.pages.len(), 1);
        assert_eq!(loaded.pages[0].url, "https://acme.com/team");
        assert!(!loaded.has_careers_page);
        assert!(loaded.subdomains.is_empty());
    }

    #[test]
    fn test_missing_structure() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        assert!(storage.get_structure(42).unwrap().is_none());
        assert!(storage.is_stale(42, 30, Utc::now()).unwrap());
    }

    #[test]
    fn test_is_stale_boundary() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let analyzed = DateTime::parse_from_rfc3339("2026-01-01T00:00:00.000Z")
            .unwrap()
            .with_timezone(&Utc);
        storage.put_structure(&structure(1, vec![], analyzed)).unwrap();

        let exactly = analyzed + chrono::Duration::days(30);
        let just_after = exactly + chrono::Duration::milliseconds(1);
        assert!(!storage.is_stale(1, 30, exactly).unwrap());
        assert!(storage.is_stale(1, 30, just_after).unwrap());
    }

    #[test]
    fn test_companies() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .upsert_company(&Company {
                id: 2,
                name: "Beta".into(),
                domain: None,
            })
            .unwrap();
        storage
            .upsert_company(&Company {
                id: 1,
                name: "Acme".into(),
                domain: Some("acme.com".into()),
            })
            .unwrap();
        storage
            .upsert_company(&Company {
                id: 1,
                name: "Acme Corp".into(),
                domain: Some("acme.com".into()),
            })
            .unwrap();

        let all = storage.list_companies().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Acme Corp");
        assert!(storage.remove_company(2).unwrap());
        assert!(storage.get_company(2).unwrap().is_none());
    }

    #[test]
    fn test_claim_returns_rows_in_priority_order() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let now = Utc::now();
        for (company, priority) in [(1, 5), (2, 3), (3, 1), (4, 3)] {
            storage.enqueue_job(company, "x.com", priority, now).unwrap();
        }

        let jobs = storage.claim_jobs(3, now).unwrap();
        let companies: Vec<i64> = jobs.iter().map(|j| j.company_id).collect();
        assert_eq!(companies, vec![3, 2, 4]);
        assert!(jobs.iter().all(|j| j.claimed_at.is_some()));
    }

    #[test]
    fn test_claim_skips_ineligible() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let now = Utc::now();
        storage.enqueue_job(1, "x.com", 1, now).unwrap();

        let earlier = now - chrono::Duration::seconds(1);
        assert!(storage.claim_jobs(10, earlier).unwrap().is_empty());
        assert_eq!(storage.claim_jobs(10, now).unwrap().len(), 1);
    }

    #[test]
    fn test_fail_unclaimed_job_is_rejected() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let now = Utc::now();
        let id = storage.enqueue_job(1, "x.com", 1, now).unwrap().job_id();
        let policy = RetryPolicy {
            max_attempts: 5,
            backoff: BackoffPolicy::default(),
        };

        let err = storage.fail_job(id, "boom", now, &policy).unwrap_err();
        assert!(matches!(
            err,
            StorageError::InvalidTransition {
                from: JobStatus::Queued,
                ..
            }
        ));
        assert!(matches!(
            storage.fail_job(999, "boom", now, &policy),
            Err(StorageError::JobNotFound(999))
        ));
    }

    #[test]
    fn test_empty_stats() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let stats = storage.queue_stats().unwrap();
        assert_eq!(stats, QueueStats::default());
    }
}
