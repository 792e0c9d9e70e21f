//! Search orchestrator: sequential failover, dedup, routing pipeline.
//!
//! [`router::SearchRouter`] drives a request end to end. It hands the
//! attempt plan to [`executor::AttemptExecutor`], then canonicalises and
//! deduplicates the winning provider's results.

pub mod canonical;
pub mod dedup;
pub mod executor;
pub mod router;
