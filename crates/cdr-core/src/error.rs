//! Error types for `cdr-core`.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("call must end after it starts (start {start}, end {end})")]
  InvalidCallWindow {
    start: DateTime<Utc>,
    end:   DateTime<Utc>,
  },

  #[error("caller and callee are the same subscriber: {0}")]
  SelfCall(String),

  #[error("unknown call direction code: {0:?}")]
  UnknownDirection(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
