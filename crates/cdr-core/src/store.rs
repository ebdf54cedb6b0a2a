//! The `CdrStore` trait.
//!
//! Implemented by storage backends (e.g. `cdr-store-sqlite`). The generator
//! and the report tracker depend on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{call::CallRecord, subscriber::Subscriber};

/// Durable storage for subscribers and their call records.
///
/// Call records are append-only. Every read returns records in ascending
/// start-time order; records sharing a start time come back in the order they
/// were saved.
///
/// All methods return `Send` futures so the trait can be used from tasks
/// spawned on a multi-threaded tokio runtime.
pub trait CdrStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Subscribers ───────────────────────────────────────────────────────

  /// Every known subscriber.
  fn list_subscribers(
    &self,
  ) -> impl Future<Output = Result<Vec<Subscriber>, Self::Error>> + Send + '_;

  /// Persist `subscribers`, skipping any whose MSISDN is already stored.
  /// Returns how many were newly inserted.
  fn save_subscribers(
    &self,
    subscribers: Vec<Subscriber>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Call records ──────────────────────────────────────────────────────

  /// Every stored record.
  fn list_records(
    &self,
  ) -> impl Future<Output = Result<Vec<CallRecord>, Self::Error>> + Send + '_;

  /// Records in which `msisdn` is either the caller or the callee.
  fn records_for<'a>(
    &'a self,
    msisdn: &'a str,
  ) -> impl Future<Output = Result<Vec<CallRecord>, Self::Error>> + Send + 'a;

  /// As [`CdrStore::records_for`], restricted to calls starting within
  /// `[start, end]` (both inclusive).
  fn records_in_range<'a>(
    &'a self,
    msisdn: &'a str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<CallRecord>, Self::Error>> + Send + 'a;

  /// Append `records` atomically. Returns how many were written.
  fn save_records(
    &self,
    records: Vec<CallRecord>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}
