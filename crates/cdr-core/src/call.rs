//! Call detail records.
//!
//! A record describes one call between two subscribers. Records are immutable
//! once created; the store never updates or deletes them.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Timestamp layout used in CDR lines, e.g. `2025-03-23T14:30:00`.
pub const CDR_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ─── Direction ───────────────────────────────────────────────────────────────

/// Whether the call was placed by or to the first party on the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallDirection {
  Outgoing,
  Incoming,
}

impl CallDirection {
  /// The two-digit code used on the wire and in storage.
  pub fn code(self) -> &'static str {
    match self {
      Self::Outgoing => "01",
      Self::Incoming => "02",
    }
  }
}

impl fmt::Display for CallDirection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.code())
  }
}

impl FromStr for CallDirection {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "01" => Ok(Self::Outgoing),
      "02" => Ok(Self::Incoming),
      other => Err(Error::UnknownDirection(other.to_owned())),
    }
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// One call between two subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
  pub direction:     CallDirection,
  pub caller_msisdn: String,
  pub callee_msisdn: String,
  pub start_time:    DateTime<Utc>,
  pub end_time:      DateTime<Utc>,
}

impl CallRecord {
  /// Build a record, rejecting calls that do not end after they start and
  /// calls a subscriber places to themselves.
  pub fn new(
    direction: CallDirection,
    caller_msisdn: impl Into<String>,
    callee_msisdn: impl Into<String>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
  ) -> Result<Self> {
    if end_time <= start_time {
      return Err(Error::InvalidCallWindow { start: start_time, end: end_time });
    }
    let caller_msisdn = caller_msisdn.into();
    let callee_msisdn = callee_msisdn.into();
    if caller_msisdn == callee_msisdn {
      return Err(Error::SelfCall(caller_msisdn));
    }
    Ok(Self { direction, caller_msisdn, callee_msisdn, start_time, end_time })
  }

  /// Render as `direction,caller,callee,start,end` without a trailing newline.
  pub fn to_cdr_line(&self) -> String {
    format!(
      "{},{},{},{},{}",
      self.direction.code(),
      self.caller_msisdn,
      self.callee_msisdn,
      self.start_time.format(CDR_TIMESTAMP_FORMAT),
      self.end_time.format(CDR_TIMESTAMP_FORMAT),
    )
  }
}
