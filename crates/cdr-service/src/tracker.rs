//! [`ReportTracker`] — accepts report requests and tracks their jobs.
//!
//! Each accepted request gets a fresh tracking token and a job in
//! [`JobStatus::Processing`]. A background task materialises the report and
//! moves the job to its terminal status exactly once. Lookups never block on
//! that task; they read whatever status was last recorded.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use cdr_core::{
  report::{JobStatus, PeriodicReportRequest, ReportCriteria, ReportJob, ReportRequest},
  store::CdrStore,
};
use chrono::{DateTime, Utc};
use dashmap::{DashMap, mapref::entry::Entry};
use serde::Serialize;
use uuid::Uuid;

use crate::{Error, Result, materialize::materialize};

/// A finished report file ready to be handed to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportFile {
  pub job_id:    Uuid,
  pub file_name: String,
  pub path:      PathBuf,
}

/// Tracks report jobs for one store and one reports directory.
///
/// Clones share the same job table.
pub struct ReportTracker<S> {
  store:       Arc<S>,
  reports_dir: Arc<PathBuf>,
  jobs:        Arc<DashMap<Uuid, ReportJob>>,
}

impl<S> Clone for ReportTracker<S> {
  fn clone(&self) -> Self {
    Self {
      store:       Arc::clone(&self.store),
      reports_dir: Arc::clone(&self.reports_dir),
      jobs:        Arc::clone(&self.jobs),
    }
  }
}

impl<S> ReportTracker<S>
where
  S: CdrStore + 'static,
{
  /// Create a tracker writing into `reports_dir`, creating the directory if
  /// it does not exist yet.
  pub async fn new(store: Arc<S>, reports_dir: impl Into<PathBuf>) -> Result<Self> {
    let reports_dir = reports_dir.into();
    if !tokio::fs::try_exists(&reports_dir).await? {
      tokio::fs::create_dir_all(&reports_dir).await?;
      tracing::info!(path = %reports_dir.display(), "created reports directory");
    }

    Ok(Self {
      store,
      reports_dir: Arc::new(reports_dir),
      jobs: Arc::new(DashMap::new()),
    })
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn reports_dir(&self) -> &Path { &self.reports_dir }

  // ── Submission ────────────────────────────────────────────────────────────

  /// Validate `request`, start materialising it in the background, and
  /// return the job's tracking token without waiting for the report.
  ///
  /// Must be called from within a tokio runtime.
  pub fn submit(&self, request: ReportRequest) -> Result<Uuid> {
    let criteria = request.validate()?;
    let job_id = self.register(criteria.clone());

    tracing::info!(
      %job_id,
      msisdn = %criteria.msisdn,
      start = %criteria.start,
      end = %criteria.end,
      "report job accepted"
    );

    let tracker = self.clone();
    tokio::spawn(async move {
      let worker = tokio::spawn({
        let tracker = tracker.clone();
        async move {
          materialize(&*tracker.store, &tracker.reports_dir, job_id, &criteria).await
        }
      });

      // A panicking materialiser still has to leave the job terminal.
      let status = worker.await.unwrap_or_else(|e| {
        tracing::error!(%job_id, error = %e, "report task aborted");
        JobStatus::Error { message: format!("report task aborted: {e}") }
      });
      tracker.finish(job_id, status);
    });

    Ok(job_id)
  }

  /// Resolve `request`'s period against the current time and submit the
  /// equivalent explicit-range request.
  pub fn submit_periodic(&self, request: PeriodicReportRequest) -> Result<Uuid> {
    tracing::info!(
      msisdn = ?request.msisdn,
      period = ?request.period,
      "periodic report requested"
    );
    let request = request.resolve(Utc::now())?;
    self.submit(request)
  }

  /// Insert a `Processing` job under a token no other job has used.
  fn register(&self, criteria: ReportCriteria) -> Uuid {
    loop {
      let job_id = Uuid::new_v4();
      if let Entry::Vacant(slot) = self.jobs.entry(job_id) {
        slot.insert(ReportJob::new(job_id, criteria));
        return job_id;
      }
    }
  }

  /// Move a job from `Processing` to `status`. Returns `false`, leaving the
  /// job untouched, if it is unknown or already terminal.
  pub(crate) fn finish(&self, job_id: Uuid, status: JobStatus) -> bool {
    let Some(mut job) = self.jobs.get_mut(&job_id) else {
      tracing::warn!(%job_id, "finished a job that is no longer tracked");
      return false;
    };
    if job.status.is_terminal() {
      tracing::warn!(%job_id, current = ?job.status, "job already finished");
      return false;
    }

    tracing::debug!(%job_id, ?status, "job finished");
    job.status = status;
    job.finished_at = Some(Utc::now());
    true
  }

  // ── Lookups ───────────────────────────────────────────────────────────────

  /// The latest recorded status of a job.
  pub fn status(&self, job_id: Uuid) -> Result<JobStatus> {
    self
      .jobs
      .get(&job_id)
      .map(|job| job.status.clone())
      .ok_or(Error::JobNotFound(job_id))
  }

  /// A snapshot of the whole job record.
  pub fn job(&self, job_id: Uuid) -> Result<ReportJob> {
    self
      .jobs
      .get(&job_id)
      .map(|job| job.clone())
      .ok_or(Error::JobNotFound(job_id))
  }

  /// Number of jobs currently tracked, in any status.
  pub fn job_count(&self) -> usize { self.jobs.len() }

  /// The report file of a completed job.
  ///
  /// [`Error::NotAvailable`] if the job is not `Completed` or its file has
  /// gone missing from disk.
  pub async fn result(&self, job_id: Uuid) -> Result<ReportFile> {
    let JobStatus::Completed { file_path } = self.status(job_id)? else {
      return Err(Error::NotAvailable(job_id));
    };

    if !tokio::fs::try_exists(&file_path).await.unwrap_or(false) {
      tracing::warn!(
        %job_id,
        path = %file_path.display(),
        "report file is missing"
      );
      return Err(Error::NotAvailable(job_id));
    }

    let file_name = file_path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();
    Ok(ReportFile { job_id, file_name, path: file_path })
  }

  /// Poll every `interval` until the job reaches a terminal status.
  pub async fn wait(&self, job_id: Uuid, interval: Duration) -> Result<JobStatus> {
    loop {
      let status = self.status(job_id)?;
      if status.is_terminal() {
        return Ok(status);
      }
      tokio::time::sleep(interval).await;
    }
  }

  // ── Retention ─────────────────────────────────────────────────────────────

  /// Forget terminal jobs that finished before `cutoff` and delete their
  /// report files. Jobs still processing are never pruned. Returns how many
  /// jobs were removed.
  pub async fn prune_finished(&self, cutoff: DateTime<Utc>) -> usize {
    let expired: Vec<Uuid> = self
      .jobs
      .iter()
      .filter(|job| job.finished_at.is_some_and(|at| at < cutoff))
      .map(|job| job.job_id)
      .collect();

    let mut pruned = 0;
    for job_id in expired {
      let Some((_, job)) = self.jobs.remove(&job_id) else {
        continue;
      };
      pruned += 1;

      if let JobStatus::Completed { file_path } = &job.status
        && let Err(e) = tokio::fs::remove_file(file_path).await
        && e.kind() != std::io::ErrorKind::NotFound
      {
        tracing::warn!(
          %job_id,
          path = %file_path.display(),
          error = %e,
          "failed to delete expired report"
        );
      }
    }
    pruned
  }
}
