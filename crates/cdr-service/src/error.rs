//! Error types for `cdr-service`.

use std::path::PathBuf;

use cdr_core::report::ValidationError;
use thiserror::Error;
use uuid::Uuid;

/// An error returned synchronously to a caller of the service.
#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error("report job not found: {0}")]
  JobNotFound(Uuid),

  #[error("report {0} is not available")]
  NotAvailable(Uuid),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A failure while producing a report in the background. Never returned to
/// the submitter; its message is recorded on the job instead.
#[derive(Debug, Error)]
pub enum MaterializeError {
  #[error("record store query failed: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("failed to write report {}: {source}", path.display())]
  Write {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
