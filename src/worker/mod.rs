//! Queue worker pool
//!
//! Claims analysis jobs, runs the crawler for each under a concurrency
//! limit, ranks the discovered pages and writes the result to the cache.
//! A crawl failure only affects its own job; storage failures end the pass.

mod outcome;
mod pool;

pub use outcome::{JobOutcome, RunSummary};
pub use pool::{WorkerPool, WorkerSettings};
