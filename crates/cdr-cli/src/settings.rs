//! Runtime configuration, read from an optional TOML file layered with
//! `CDR_`-prefixed environment variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use serde::Deserialize;

/// The subscriber population seeded when none is configured.
pub const DEFAULT_SUBSCRIBERS: [&str; 10] = [
  "79001112233",
  "79002223344",
  "79003334455",
  "79004445566",
  "79005556677",
  "79006667788",
  "79007778899",
  "79008889900",
  "79009990011",
  "79000001122",
];

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  #[serde(default = "default_store_path")]
  pub store_path:       PathBuf,
  #[serde(default = "default_reports_dir")]
  pub reports_dir:      PathBuf,
  #[serde(default = "default_subscribers")]
  pub subscribers:      Vec<String>,
  /// How often to poll a running report job.
  #[serde(default = "default_poll_interval_ms")]
  pub poll_interval_ms: u64,
  /// Prune finished report jobs older than this; unset or 0 keeps them forever.
  #[serde(default)]
  pub retention_hours:  Option<u64>,
}

fn default_store_path() -> PathBuf { PathBuf::from("cdr.sqlite3") }

fn default_reports_dir() -> PathBuf { PathBuf::from("reports") }

fn default_subscribers() -> Vec<String> {
  DEFAULT_SUBSCRIBERS.iter().map(|s| s.to_string()).collect()
}

fn default_poll_interval_ms() -> u64 { 250 }

impl Settings {
  /// Load from `path` (which need not exist) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("CDR")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("subscribers"),
      )
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise Settings")
  }

  pub fn poll_interval(&self) -> Duration {
    Duration::from_millis(self.poll_interval_ms.max(1))
  }

  /// How long finished reports are kept. `None` when retention is unset or
  /// set to zero hours.
  pub fn retention(&self) -> Option<Duration> {
    self
      .retention_hours
      .filter(|hours| *hours > 0)
      .map(|hours| Duration::from_secs(hours.saturating_mul(3600)))
  }

  /// Store path with a leading `~` expanded to the user's home directory.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::load(&dir.path().join("absent.toml")).unwrap();

    assert_eq!(settings.reports_dir, PathBuf::from("reports"));
    assert_eq!(settings.subscribers.len(), 10);
    assert_eq!(settings.subscribers[0], "79001112233");
    assert_eq!(settings.poll_interval(), Duration::from_millis(250));
    assert!(settings.retention_hours.is_none());
    assert!(settings.retention().is_none());
  }

  #[test]
  fn file_values_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cdr.toml");
    std::fs::write(
      &path,
      "reports_dir = \"out\"\n\
       subscribers = [\"79001234567\", \"79007654321\"]\n\
       retention_hours = 48\n",
    )
    .unwrap();

    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.reports_dir, PathBuf::from("out"));
    assert_eq!(settings.subscribers, vec!["79001234567", "79007654321"]);
    assert_eq!(settings.retention_hours, Some(48));
    assert_eq!(settings.retention(), Some(Duration::from_secs(48 * 3600)));
    assert_eq!(settings.store_path, PathBuf::from("cdr.sqlite3"));
  }

  #[test]
  fn zero_retention_hours_disables_retention() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cdr.toml");
    std::fs::write(&path, "retention_hours = 0\n").unwrap();

    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.retention_hours, Some(0));
    assert!(settings.retention().is_none());
  }

  #[test]
  fn tilde_is_expanded_only_at_the_start() {
    let plain = Path::new("data/~/cdr.sqlite3");
    assert_eq!(expand_tilde(plain), plain);

    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(
        expand_tilde(Path::new("~/cdr.sqlite3")),
        PathBuf::from(home).join("cdr.sqlite3")
      );
    }
  }
}
