//! One function per subcommand.

use std::{sync::Arc, time::Duration};

use anyhow::{Context as _, bail};
use cdr_core::{
  report::{JobStatus, PeriodicReportRequest, ReportRequest},
  store::CdrStore,
  subscriber::Subscriber,
};
use cdr_service::{
  ReportFile, ReportTracker, RetentionConfig, generate::generate_and_store, spawn_retention,
};
use cdr_store_sqlite::SqliteStore;
use chrono::Utc;
use uuid::Uuid;

use crate::settings::Settings;

pub async fn seed(store: &SqliteStore, settings: &Settings) -> anyhow::Result<()> {
  let subscribers = settings
    .subscribers
    .iter()
    .map(Subscriber::new)
    .collect::<Vec<_>>();
  let configured = subscribers.len();

  let inserted = store
    .save_subscribers(subscribers)
    .await
    .context("failed to save subscribers")?;

  tracing::info!(configured, inserted, "seeded subscribers");
  Ok(())
}

pub async fn generate(store: &SqliteStore) -> anyhow::Result<()> {
  let written = generate_and_store(store, Utc::now())
    .await
    .context("failed to generate call records")?;
  println!("{written}");
  Ok(())
}

pub async fn records(
  store: &SqliteStore,
  msisdn: Option<&str>,
  csv: bool,
) -> anyhow::Result<()> {
  let records = match msisdn {
    Some(m) => store.records_for(m).await,
    None => store.list_records().await,
  }
  .context("failed to read call records")?;

  if records.is_empty() {
    tracing::warn!(msisdn = ?msisdn, "no call records found");
  }

  if csv {
    for record in &records {
      println!("{}", record.to_cdr_line());
    }
  } else {
    println!("{}", serde_json::to_string_pretty(&records)?);
  }
  Ok(())
}

pub async fn report(
  store: SqliteStore,
  settings: &Settings,
  request: ReportRequest,
) -> anyhow::Result<()> {
  let tracker = tracker(store, settings).await?;
  let job_id = tracker.submit(request).context("invalid report request")?;
  await_and_print(&tracker, settings, job_id).await
}

pub async fn periodic(
  store: SqliteStore,
  settings: &Settings,
  request: PeriodicReportRequest,
) -> anyhow::Result<()> {
  let tracker = tracker(store, settings).await?;
  let job_id = tracker
    .submit_periodic(request)
    .context("invalid periodic report request")?;
  await_and_print(&tracker, settings, job_id).await
}

pub async fn batch(
  store: SqliteStore,
  settings: &Settings,
  period: &str,
) -> anyhow::Result<()> {
  let tracker = tracker(store, settings).await?;
  let subscribers = tracker
    .store()
    .list_subscribers()
    .await
    .context("failed to list subscribers")?;

  let mut jobs = Vec::with_capacity(subscribers.len());
  for subscriber in subscribers {
    let request = PeriodicReportRequest::new(subscriber.msisdn, period);
    jobs.push(tracker.submit_periodic(request).context("invalid periodic report request")?);
  }

  let mut failed = 0;
  for job_id in jobs {
    if let Err(e) = await_and_print(&tracker, settings, job_id).await {
      tracing::error!(%job_id, error = %e, "report failed");
      failed += 1;
    }
  }
  if failed > 0 {
    bail!("{failed} report(s) failed");
  }
  Ok(())
}

async fn tracker(
  store: SqliteStore,
  settings: &Settings,
) -> anyhow::Result<ReportTracker<SqliteStore>> {
  let tracker = ReportTracker::new(Arc::new(store), &settings.reports_dir)
    .await
    .with_context(|| format!("failed to prepare {:?}", settings.reports_dir))?;

  if let Some(retention) = settings.retention() {
    spawn_retention(tracker.clone(), RetentionConfig {
      retention,
      interval: retention.min(Duration::from_secs(3600)),
    });
  }
  Ok(tracker)
}

/// Wait for `job_id` to finish and print the job as JSON, followed by the
/// report file when one was written.
async fn await_and_print(
  tracker: &ReportTracker<SqliteStore>,
  settings: &Settings,
  job_id: Uuid,
) -> anyhow::Result<()> {
  let status = tracker.wait(job_id, settings.poll_interval()).await?;
  let job = tracker.job(job_id)?;
  println!("{}", serde_json::to_string_pretty(&job)?);

  if let Some(file) = report_file(tracker, job_id, status).await? {
    println!("{}", serde_json::to_string_pretty(&file)?);
  }
  Ok(())
}

/// The downloadable file for a finished job. `None` for an empty report;
/// an error if the job failed or its file is gone.
async fn report_file(
  tracker: &ReportTracker<SqliteStore>,
  job_id: Uuid,
  status: JobStatus,
) -> anyhow::Result<Option<ReportFile>> {
  match status {
    JobStatus::Completed { .. } => {
      let file = tracker
        .result(job_id)
        .await
        .with_context(|| format!("report {job_id} cannot be downloaded"))?;
      Ok(Some(file))
    }
    JobStatus::Error { message } => bail!("report {job_id} failed: {message}"),
    JobStatus::CompletedEmpty | JobStatus::Processing => Ok(None),
  }
}

#[cfg(test)]
mod tests {
  use cdr_core::call::{CallDirection, CallRecord};
  use chrono::{DateTime, TimeZone};
  use tempfile::TempDir;

  use super::*;

  const MSISDN: &str = "79001112233";

  async fn tracker() -> (ReportTracker<SqliteStore>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open_in_memory().await.unwrap();
    let tracker = ReportTracker::new(Arc::new(store), dir.path().join("reports"))
      .await
      .unwrap();
    (tracker, dir)
  }

  fn march(day: u32) -> DateTime<Utc> { Utc.with_ymd_and_hms(2025, 3, day, 10, 0, 0).unwrap() }

  async fn finish(tracker: &ReportTracker<SqliteStore>, job_id: Uuid) -> JobStatus {
    tokio::time::timeout(
      Duration::from_secs(10),
      tracker.wait(job_id, Duration::from_millis(5)),
    )
    .await
    .unwrap()
    .unwrap()
  }

  async fn completed_job(tracker: &ReportTracker<SqliteStore>) -> (Uuid, JobStatus) {
    let record = CallRecord::new(
      CallDirection::Outgoing,
      MSISDN,
      "79002223344",
      march(3),
      march(3) + chrono::Duration::minutes(2),
    )
    .unwrap();
    tracker.store().save_records(vec![record]).await.unwrap();

    let job_id = tracker
      .submit(ReportRequest::new(MSISDN, march(1), march(31)))
      .unwrap();
    (job_id, finish(tracker, job_id).await)
  }

  #[tokio::test]
  async fn completed_report_resolves_to_its_file() {
    let (tracker, _dir) = tracker().await;
    let (job_id, status) = completed_job(&tracker).await;

    let file = report_file(&tracker, job_id, status.clone()).await.unwrap().unwrap();
    assert_eq!(file.job_id, job_id);
    assert_eq!(file.file_name, format!("{MSISDN}_{job_id}.csv"));
    assert_eq!(Some(&file.path), status.file_path());
  }

  #[tokio::test]
  async fn deleted_report_file_is_an_error() {
    let (tracker, _dir) = tracker().await;
    let (job_id, status) = completed_job(&tracker).await;
    tokio::fs::remove_file(status.file_path().unwrap()).await.unwrap();

    let err = report_file(&tracker, job_id, status).await.unwrap_err();
    assert!(err.to_string().contains("cannot be downloaded"), "{err}");
  }

  #[tokio::test]
  async fn empty_report_has_no_file() {
    let (tracker, _dir) = tracker().await;
    let job_id = tracker
      .submit(ReportRequest::new(MSISDN, march(1), march(31)))
      .unwrap();
    let status = finish(&tracker, job_id).await;
    assert_eq!(status, JobStatus::CompletedEmpty);

    assert!(report_file(&tracker, job_id, status).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn failed_report_is_an_error() {
    let (tracker, _dir) = tracker().await;
    let (job_id, _) = completed_job(&tracker).await;
    let status = JobStatus::Error { message: "disk full".into() };

    let err = report_file(&tracker, job_id, status).await.unwrap_err();
    assert!(err.to_string().contains("disk full"), "{err}");
  }
}
