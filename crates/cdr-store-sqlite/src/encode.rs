//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings with a fixed number of
//! fractional digits, so string comparison in SQL matches chronological
//! order. UUIDs are stored as hyphenated lowercase strings.

use cdr_core::{
  call::{CallDirection, CallRecord},
  subscriber::Subscriber,
};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list shared by every `call_records` query; matches [`RawCallRecord`].
pub const RECORD_COLUMNS: &str =
  "call_type, caller_msisdn, callee_msisdn, start_time, end_time";

/// Raw strings read directly from a `call_records` row.
pub struct RawCallRecord {
  pub call_type:     String,
  pub caller_msisdn: String,
  pub callee_msisdn: String,
  pub start_time:    String,
  pub end_time:      String,
}

impl RawCallRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      call_type:     row.get(0)?,
      caller_msisdn: row.get(1)?,
      callee_msisdn: row.get(2)?,
      start_time:    row.get(3)?,
      end_time:      row.get(4)?,
    })
  }

  pub fn into_record(self) -> Result<CallRecord> {
    Ok(CallRecord {
      direction:     self.call_type.parse::<CallDirection>()?,
      caller_msisdn: self.caller_msisdn,
      callee_msisdn: self.callee_msisdn,
      start_time:    decode_dt(&self.start_time)?,
      end_time:      decode_dt(&self.end_time)?,
    })
  }
}

/// Raw strings read directly from a `subscribers` row.
pub struct RawSubscriber {
  pub subscriber_id: String,
  pub msisdn:        String,
}

impl RawSubscriber {
  pub fn into_subscriber(self) -> Result<Subscriber> {
    Ok(Subscriber {
      subscriber_id: decode_uuid(&self.subscriber_id)?,
      msisdn:        self.msisdn,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn encoded_timestamps_sort_chronologically() {
    let earlier = Utc.with_ymd_and_hms(2025, 3, 23, 9, 59, 59).unwrap();
    let later = earlier + chrono::Duration::milliseconds(1500);
    assert!(encode_dt(earlier) < encode_dt(later));
    assert_eq!(encode_dt(earlier).len(), encode_dt(later).len());
  }

  #[test]
  fn timestamps_decode_to_the_same_instant() {
    let at = Utc.with_ymd_and_hms(2025, 3, 23, 14, 30, 0).unwrap();
    assert_eq!(decode_dt(&encode_dt(at)).unwrap(), at);
    assert!(decode_dt("yesterday").is_err());
  }
}
