//! Synthetic call-record generation.
//!
//! Produces a year of plausible calls between members of a subscriber
//! population. Call volume comes from a single draw of calls per subscriber
//! per month, scaled by the population size and twelve months.

use std::{collections::HashSet, ops::Range};

use cdr_core::{
  call::{CallDirection, CallRecord},
  store::CdrStore,
  subscriber::Subscriber,
};
use chrono::{DateTime, Duration, Months, Utc};
use rand::Rng;

use crate::{Error, Result};

/// Calls per subscriber per month; one value is drawn per generation run.
pub const MONTHLY_CALLS: Range<usize> = 5..15;

/// Call duration in seconds.
pub const CALL_SECONDS: Range<i64> = 10..3600;

/// Generate a year of calls ending at `now`, sorted by start time.
///
/// Returns nothing when the population has fewer than two distinct MSISDNs,
/// since every call needs a receiver other than its caller.
pub fn generate_year<R: Rng + ?Sized>(
  subscribers: &[Subscriber],
  now: DateTime<Utc>,
  rng: &mut R,
) -> Vec<CallRecord> {
  let distinct: HashSet<&str> =
    subscribers.iter().map(|s| s.msisdn.as_str()).collect();
  if distinct.len() < 2 {
    if !subscribers.is_empty() {
      tracing::warn!(
        subscribers = subscribers.len(),
        "need at least two distinct subscribers to generate calls"
      );
    }
    return Vec::new();
  }

  let window_end = now.timestamp();
  let window_start = now
    .checked_sub_months(Months::new(12))
    .unwrap_or(now - Duration::days(365))
    .timestamp();
  let span = window_end - window_start;

  let total = subscribers.len() * rng.gen_range(MONTHLY_CALLS) * 12;
  let mut records = Vec::with_capacity(total);

  for _ in 0..total {
    let caller = &subscribers[rng.gen_range(0..subscribers.len())];
    let receiver = loop {
      let candidate = &subscribers[rng.gen_range(0..subscribers.len())];
      if candidate.msisdn != caller.msisdn {
        break candidate;
      }
    };

    let direction = if rng.gen_bool(0.5) {
      CallDirection::Outgoing
    } else {
      CallDirection::Incoming
    };

    let Some(start_time) =
      DateTime::<Utc>::from_timestamp(window_start + rng.gen_range(0..span), 0)
    else {
      continue;
    };
    let end_time = start_time + Duration::seconds(rng.gen_range(CALL_SECONDS));

    let (first, second) = match direction {
      CallDirection::Outgoing => (caller, receiver),
      CallDirection::Incoming => (receiver, caller),
    };

    records.push(CallRecord {
      direction,
      caller_msisdn: first.msisdn.clone(),
      callee_msisdn: second.msisdn.clone(),
      start_time,
      end_time,
    });
  }

  // Stable: calls drawn with the same start keep their draw order.
  records.sort_by_key(|r| r.start_time);
  records
}

/// Generate a year of calls for every stored subscriber and persist them.
/// Returns the number of records written; zero when there are no subscribers.
pub async fn generate_and_store<S: CdrStore>(
  store: &S,
  now: DateTime<Utc>,
) -> Result<usize> {
  let subscribers = store
    .list_subscribers()
    .await
    .map_err(|e| Error::Store(Box::new(e)))?;

  if subscribers.is_empty() {
    tracing::warn!("no subscribers found; seed the subscriber population first");
    return Ok(0);
  }

  let records = generate_year(&subscribers, now, &mut rand::thread_rng());
  if records.is_empty() {
    return Ok(0);
  }

  let written = store
    .save_records(records)
    .await
    .map_err(|e| Error::Store(Box::new(e)))?;

  tracing::info!(
    written,
    subscribers = subscribers.len(),
    "generated call records for one year"
  );
  Ok(written)
}
