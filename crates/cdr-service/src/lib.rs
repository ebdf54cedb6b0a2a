//! Call-record synthesis and asynchronous CSV report generation.
//!
//! [`ReportTracker`] accepts report requests, hands back a tracking token
//! straight away, and materialises the report on a background task. Callers
//! poll [`ReportTracker::status`] until the job reaches a terminal
//! [`JobStatus`](cdr_core::report::JobStatus).

pub mod error;
pub mod generate;
pub mod materialize;
pub mod retention;
pub mod tracker;

pub use error::{Error, MaterializeError, Result};
pub use retention::{RetentionConfig, spawn_retention};
pub use tracker::{ReportFile, ReportTracker};
