//! Report requests, their validation, and the job state they produce.
//!
//! A request is validated synchronously into [`ReportCriteria`]; only valid
//! criteria ever become a [`ReportJob`]. Jobs start in
//! [`JobStatus::Processing`] and move to exactly one terminal status.

use std::{fmt, path::PathBuf, str::FromStr};

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ─── Validation ──────────────────────────────────────────────────────────────

/// A malformed or incomplete report request. No job is created for it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("subscriber identifier required")]
  SubscriberRequired,

  #[error("subscriber identifier must not contain path components: {0:?}")]
  InvalidSubscriber(String),

  #[error("start and end required")]
  RangeRequired,

  #[error("end before start")]
  EndBeforeStart,

  #[error(
    "unsupported period {0:?}; valid periods are 6months, 3months, 1month, 1week"
  )]
  UnsupportedPeriod(String),

  #[error("period {0} reaches before the earliest representable date")]
  PeriodOutOfRange(ReportPeriod),
}

fn validate_msisdn(msisdn: Option<String>) -> Result<String, ValidationError> {
  let msisdn = msisdn
    .map(|m| m.trim().to_owned())
    .filter(|m| !m.is_empty())
    .ok_or(ValidationError::SubscriberRequired)?;

  // The identifier becomes part of the report file name.
  if msisdn.contains(['/', '\\']) || msisdn.contains("..") {
    return Err(ValidationError::InvalidSubscriber(msisdn));
  }
  Ok(msisdn)
}

// ─── Periods ─────────────────────────────────────────────────────────────────

/// The closed set of look-back windows a periodic report may cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportPeriod {
  #[serde(rename = "6months")]
  SixMonths,
  #[serde(rename = "3months")]
  ThreeMonths,
  #[serde(rename = "1month")]
  OneMonth,
  #[serde(rename = "1week")]
  OneWeek,
}

impl ReportPeriod {
  pub const ALL: [Self; 4] =
    [Self::SixMonths, Self::ThreeMonths, Self::OneMonth, Self::OneWeek];

  pub fn keyword(self) -> &'static str {
    match self {
      Self::SixMonths => "6months",
      Self::ThreeMonths => "3months",
      Self::OneMonth => "1month",
      Self::OneWeek => "1week",
    }
  }

  /// The window `[now - period, now]`. Months are calendar months, so a month
  /// back from March 31st lands on the last day of February.
  pub fn range_ending_at(
    self,
    now: DateTime<Utc>,
  ) -> Result<(DateTime<Utc>, DateTime<Utc>), ValidationError> {
    let start = match self {
      Self::SixMonths => now.checked_sub_months(Months::new(6)),
      Self::ThreeMonths => now.checked_sub_months(Months::new(3)),
      Self::OneMonth => now.checked_sub_months(Months::new(1)),
      Self::OneWeek => now.checked_sub_signed(Duration::weeks(1)),
    };
    let start = start.ok_or(ValidationError::PeriodOutOfRange(self))?;
    Ok((start, now))
  }
}

impl fmt::Display for ReportPeriod {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.keyword())
  }
}

impl FromStr for ReportPeriod {
  type Err = ValidationError;

  /// Case-insensitive; surrounding whitespace is ignored.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let wanted = s.trim();
    Self::ALL
      .into_iter()
      .find(|p| p.keyword().eq_ignore_ascii_case(wanted))
      .ok_or_else(|| ValidationError::UnsupportedPeriod(s.to_owned()))
  }
}

// ─── Requests ────────────────────────────────────────────────────────────────

/// A report over an explicit time range. Fields are optional because callers
/// may omit them; [`ReportRequest::validate`] decides what is acceptable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportRequest {
  pub msisdn: Option<String>,
  pub start:  Option<DateTime<Utc>>,
  pub end:    Option<DateTime<Utc>>,
}

impl ReportRequest {
  pub fn new(
    msisdn: impl Into<String>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
  ) -> Self {
    Self { msisdn: Some(msisdn.into()), start: Some(start), end: Some(end) }
  }

  /// Check presence and ordering of every field.
  pub fn validate(self) -> Result<ReportCriteria, ValidationError> {
    let msisdn = validate_msisdn(self.msisdn)?;
    let (Some(start), Some(end)) = (self.start, self.end) else {
      return Err(ValidationError::RangeRequired);
    };
    if end < start {
      return Err(ValidationError::EndBeforeStart);
    }
    Ok(ReportCriteria { msisdn, start, end })
  }
}

/// A report over the most recent [`ReportPeriod`], named by keyword.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeriodicReportRequest {
  pub msisdn: Option<String>,
  pub period: Option<String>,
}

impl PeriodicReportRequest {
  pub fn new(msisdn: impl Into<String>, period: impl Into<String>) -> Self {
    Self { msisdn: Some(msisdn.into()), period: Some(period.into()) }
  }

  /// Translate into the equivalent explicit-range request anchored at `now`.
  pub fn resolve(
    self,
    now: DateTime<Utc>,
  ) -> Result<ReportRequest, ValidationError> {
    let msisdn = validate_msisdn(self.msisdn)?;
    let period: ReportPeriod = self.period.as_deref().unwrap_or("").parse()?;
    let (start, end) = period.range_ending_at(now)?;
    Ok(ReportRequest::new(msisdn, start, end))
  }
}

/// Validated report parameters: a subscriber and an inclusive time range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportCriteria {
  pub msisdn: String,
  pub start:  DateTime<Utc>,
  pub end:    DateTime<Utc>,
}

// ─── Job state ───────────────────────────────────────────────────────────────

/// Where a report job is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
  Processing,
  /// A report file was written.
  Completed {
    file_path: PathBuf,
  },
  /// No records matched; no file was written.
  CompletedEmpty,
  Error {
    message: String,
  },
}

impl JobStatus {
  pub fn is_terminal(&self) -> bool { !matches!(self, Self::Processing) }

  /// The report file, if one was produced.
  pub fn file_path(&self) -> Option<&PathBuf> {
    match self {
      Self::Completed { file_path } => Some(file_path),
      _ => None,
    }
  }
}

/// A tracked report request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportJob {
  /// The tracking token handed back to the submitter.
  pub job_id:       Uuid,
  pub criteria:     ReportCriteria,
  pub submitted_at: DateTime<Utc>,
  /// Set together with the terminal status.
  pub finished_at:  Option<DateTime<Utc>>,
  pub status:       JobStatus,
}

impl ReportJob {
  /// A freshly accepted job in [`JobStatus::Processing`].
  pub fn new(job_id: Uuid, criteria: ReportCriteria) -> Self {
    Self {
      job_id,
      criteria,
      submitted_at: Utc::now(),
      finished_at: None,
      status: JobStatus::Processing,
    }
  }
}
