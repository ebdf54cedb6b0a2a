//! [`SqliteStore`] — the SQLite implementation of [`CdrStore`].

use std::path::Path;

use cdr_core::{call::CallRecord, store::CdrStore, subscriber::Subscriber};
use chrono::{DateTime, Utc};

use crate::{
  encode::{RECORD_COLUMNS, RawCallRecord, RawSubscriber, encode_dt, encode_uuid},
  schema::SCHEMA,
  Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A CDR store backed by a single SQLite file.
///
/// Clones share the inner connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a `call_records` query with the given `WHERE` clause and parameters.
  async fn query_records(
    &self,
    where_clause: &'static str,
    params: Vec<String>,
  ) -> Result<Vec<CallRecord>> {
    let raws: Vec<RawCallRecord> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {RECORD_COLUMNS}
           FROM call_records
           {where_clause}
           ORDER BY start_time, record_id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params_from_iter(params.iter()),
            RawCallRecord::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCallRecord::into_record).collect()
  }
}

// ─── CdrStore impl ───────────────────────────────────────────────────────────

impl CdrStore for SqliteStore {
  type Error = crate::Error;

  // ── Subscribers ───────────────────────────────────────────────────────────

  async fn list_subscribers(&self) -> Result<Vec<Subscriber>> {
    let raws: Vec<RawSubscriber> = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare("SELECT subscriber_id, msisdn FROM subscribers ORDER BY rowid")?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawSubscriber {
              subscriber_id: row.get(0)?,
              msisdn:        row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubscriber::into_subscriber).collect()
  }

  async fn save_subscribers(&self, subscribers: Vec<Subscriber>) -> Result<usize> {
    let rows: Vec<(String, String)> = subscribers
      .into_iter()
      .map(|s| (encode_uuid(s.subscriber_id), s.msisdn))
      .collect();

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
          let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO subscribers (subscriber_id, msisdn) VALUES (?1, ?2)",
          )?;
          for (id, msisdn) in &rows {
            inserted += stmt.execute(rusqlite::params![id, msisdn])?;
          }
        }
        tx.commit()?;
        Ok(inserted)
      })
      .await?;

    tracing::debug!(inserted, "saved subscribers");
    Ok(inserted)
  }

  // ── Call records ──────────────────────────────────────────────────────────

  async fn list_records(&self) -> Result<Vec<CallRecord>> {
    self.query_records("", Vec::new()).await
  }

  async fn records_for(&self, msisdn: &str) -> Result<Vec<CallRecord>> {
    self
      .query_records(
        "WHERE caller_msisdn = ?1 OR callee_msisdn = ?1",
        vec![msisdn.to_owned()],
      )
      .await
  }

  async fn records_in_range(
    &self,
    msisdn: &str,
    start:  DateTime<Utc>,
    end:    DateTime<Utc>,
  ) -> Result<Vec<CallRecord>> {
    self
      .query_records(
        "WHERE (caller_msisdn = ?1 OR callee_msisdn = ?1)
           AND start_time >= ?2
           AND start_time <= ?3",
        vec![msisdn.to_owned(), encode_dt(start), encode_dt(end)],
      )
      .await
  }

  async fn save_records(&self, records: Vec<CallRecord>) -> Result<usize> {
    let rows: Vec<[String; 5]> = records
      .into_iter()
      .map(|r| {
        [
          r.direction.code().to_owned(),
          r.caller_msisdn,
          r.callee_msisdn,
          encode_dt(r.start_time),
          encode_dt(r.end_time),
        ]
      })
      .collect();

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(&format!(
            "INSERT INTO call_records ({RECORD_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"
          ))?;
          for row in &rows {
            stmt.execute(rusqlite::params_from_iter(row.iter()))?;
          }
        }
        tx.commit()?;
        Ok(rows.len())
      })
      .await?;

    tracing::debug!(written, "saved call records");
    Ok(written)
  }
}
