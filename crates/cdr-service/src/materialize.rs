//! Report materialisation: query the store, write the CSV file, decide the
//! job's terminal status.
//!
//! Runs once per job on a background task. Failures never propagate; they are
//! folded into [`JobStatus::Error`].

use std::path::{Path, PathBuf};

use cdr_core::{
  call::CallRecord,
  report::{JobStatus, ReportCriteria},
  store::CdrStore,
};
use uuid::Uuid;

use crate::MaterializeError;

/// `{msisdn}_{job_id}.csv`. Unique per job, so concurrent jobs never share
/// a file.
pub fn report_file_name(msisdn: &str, job_id: Uuid) -> String {
  format!("{msisdn}_{job_id}.csv")
}

/// One CDR line per record, each newline-terminated. No header, no quoting.
pub fn render_csv(records: &[CallRecord]) -> String {
  records
    .iter()
    .map(|r| r.to_cdr_line() + "\n")
    .collect()
}

/// Produce the report for `criteria` and return the job's terminal status.
pub async fn materialize<S: CdrStore>(
  store: &S,
  reports_dir: &Path,
  job_id: Uuid,
  criteria: &ReportCriteria,
) -> JobStatus {
  tracing::info!(%job_id, msisdn = %criteria.msisdn, "building report");

  match write_report(store, reports_dir, job_id, criteria).await {
    Ok(Some(file_path)) => JobStatus::Completed { file_path },
    Ok(None) => JobStatus::CompletedEmpty,
    Err(e) => {
      tracing::error!(%job_id, error = %e, "report generation failed");
      JobStatus::Error { message: e.to_string() }
    }
  }
}

async fn write_report<S: CdrStore>(
  store: &S,
  reports_dir: &Path,
  job_id: Uuid,
  criteria: &ReportCriteria,
) -> Result<Option<PathBuf>, MaterializeError> {
  let records = store
    .records_in_range(&criteria.msisdn, criteria.start, criteria.end)
    .await
    .map_err(|e| MaterializeError::Store(Box::new(e)))?;

  if records.is_empty() {
    tracing::info!(%job_id, "no matching records; report is empty");
    return Ok(None);
  }

  let file_path = reports_dir.join(report_file_name(&criteria.msisdn, job_id));
  let partial = file_path.with_extension("csv.part");

  // Write under a temporary name so a completed path never refers to a
  // half-written file.
  let write = async {
    tokio::fs::write(&partial, render_csv(&records)).await?;
    tokio::fs::rename(&partial, &file_path).await
  };
  if let Err(source) = write.await {
    tokio::fs::remove_file(&partial).await.ok();
    return Err(MaterializeError::Write { path: file_path, source });
  }

  tracing::info!(
    %job_id,
    records = records.len(),
    path = %file_path.display(),
    "report written"
  );
  Ok(Some(file_path))
}

#[cfg(test)]
mod tests {
  use cdr_core::call::CallDirection;
  use chrono::{Duration, TimeZone, Utc};

  use super::*;

  #[test]
  fn file_name_combines_subscriber_and_token() {
    let id = Uuid::nil();
    assert_eq!(
      report_file_name("79001234567", id),
      "79001234567_00000000-0000-0000-0000-000000000000.csv"
    );
  }

  #[test]
  fn csv_has_one_terminated_line_per_record() {
    let start = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
    let records = vec![
      CallRecord::new(
        CallDirection::Outgoing,
        "79001234567",
        "79002223344",
        start,
        start + Duration::seconds(60),
      )
      .unwrap(),
      CallRecord::new(
        CallDirection::Incoming,
        "79002223344",
        "79001234567",
        start + Duration::hours(1),
        start + Duration::hours(2),
      )
      .unwrap(),
    ];

    assert_eq!(
      render_csv(&records),
      "01,79001234567,79002223344,2025-03-01T10:00:00,2025-03-01T10:01:00\n\
       02,79002223344,79001234567,2025-03-01T11:00:00,2025-03-01T12:00:00\n"
    );
    assert_eq!(render_csv(&[]), "");
  }
}
