//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the analyzer database.
//! Timestamps are stored as RFC 3339 UTC strings with millisecond precision,
//! so comparing them as text matches comparing them as instants.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Mirror of the company directory
CREATE TABLE IF NOT EXISTS companies (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    domain TEXT
);

-- Latest known structure per company
CREATE TABLE IF NOT EXISTS website_structures (
    company_id INTEGER PRIMARY KEY,
    domain TEXT NOT NULL,
    last_analyzed_at TEXT NOT NULL,
    freshness_window_days INTEGER NOT NULL,
    has_careers_page INTEGER NOT NULL DEFAULT 0,
    discovery_method TEXT NOT NULL,
    sitemap_url TEXT
);

CREATE TABLE IF NOT EXISTS structure_pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    company_id INTEGER NOT NULL REFERENCES website_structures(company_id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    url TEXT NOT NULL,
    title TEXT,
    category TEXT NOT NULL,
    score INTEGER NOT NULL,
    source TEXT NOT NULL,
    depth INTEGER NOT NULL,
    last_modified TEXT,
    priority REAL,
    change_frequency TEXT,
    UNIQUE(company_id, url)
);

CREATE INDEX IF NOT EXISTS idx_structure_pages_company ON structure_pages(company_id, position);

CREATE TABLE IF NOT EXISTS structure_subdomains (
    company_id INTEGER NOT NULL REFERENCES website_structures(company_id) ON DELETE CASCADE,
    subdomain TEXT NOT NULL,
    PRIMARY KEY (company_id, subdomain)
);

-- Work queue
CREATE TABLE IF NOT EXISTS analysis_jobs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    company_id INTEGER NOT NULL,
    domain TEXT NOT NULL,
    priority INTEGER NOT NULL,
    status TEXT NOT NULL,
    attempts INTEGER NOT NULL DEFAULT 0,
    next_eligible_at TEXT NOT NULL,
    last_error TEXT,
    enqueued_at TEXT NOT NULL,
    claimed_at TEXT,
    finished_at TEXT
);

-- At most one live job per company
CREATE UNIQUE INDEX IF NOT EXISTS idx_analysis_jobs_live_company
    ON analysis_jobs(company_id)
    WHERE status IN ('queued', 'in_progress');

CREATE INDEX IF NOT EXISTS idx_analysis_jobs_claim
    ON analysis_jobs(status, next_eligible_at, priority, enqueued_at);

CREATE INDEX IF NOT EXISTS idx_analysis_jobs_finished ON analysis_jobs(finished_at);

CREATE VIEW IF NOT EXISTS queue_stats AS
SELECT
    COALESCE(SUM(CASE WHEN status = 'queued' THEN 1 ELSE 0 END), 0) AS queued,
    COALESCE(SUM(CASE WHEN status = 'in_progress' THEN 1 ELSE 0 END), 0) AS in_progress,
    COALESCE(SUM(CASE WHEN status = 'succeeded' THEN 1 ELSE 0 END), 0) AS succeeded,
    COALESCE(SUM(CASE WHEN status = 'failed' THEN 1 ELSE 0 END), 0) AS failed,
    COUNT(*) AS total,
    AVG(CASE
        WHEN status = 'succeeded' AND claimed_at IS NOT NULL AND finished_at IS NOT NULL
        THEN (julianday(finished_at) - julianday(claimed_at)) * 86400000.0
    END) AS avg_processing_ms
FROM analysis_jobs;
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The SQLite connection to initialize
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
