//! Periodic pruning of finished report jobs and their files.

use std::time::Duration;

use cdr_core::store::CdrStore;
use chrono::Utc;
use tokio::{task::JoinHandle, time::interval};

use crate::ReportTracker;

/// How long finished jobs are kept, and how often to look for expired ones.
#[derive(Debug, Clone, Copy)]
pub struct RetentionConfig {
  pub retention: Duration,
  pub interval:  Duration,
}

/// Start a background task pruning jobs that finished more than
/// `config.retention` ago. Runs until the returned handle is aborted.
pub fn spawn_retention<S>(
  tracker: ReportTracker<S>,
  config: RetentionConfig,
) -> JoinHandle<()>
where
  S: CdrStore + 'static,
{
  tokio::spawn(async move {
    tracing::info!(
      retention_secs = config.retention.as_secs(),
      interval_secs = config.interval.as_secs(),
      "starting report retention"
    );

    let mut ticker = interval(config.interval.max(Duration::from_millis(1)));
    loop {
      ticker.tick().await;

      let Some(cutoff) = chrono::Duration::from_std(config.retention)
        .ok()
        .and_then(|retention| Utc::now().checked_sub_signed(retention))
      else {
        continue;
      };

      let pruned = tracker.prune_finished(cutoff).await;
      if pruned > 0 {
        tracing::info!(pruned, "pruned expired report jobs");
      }
    }
  })
}
