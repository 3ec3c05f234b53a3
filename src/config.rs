//! Recorder configuration.
//!
//! Settings are layered with the `config` crate: built-in defaults, then an
//! optional TOML file, then `FEARGREED_*` environment variables. The binary
//! applies command-line overrides on top.
//!
//! ```toml
//! source_url = "https://production.dataviz.cnn.io/index/fearandgreed/graphdata/"
//! file_path = "fear_greed_data.csv"
//! policy = "append-ohlc"
//! remote = "origin"
//! branch = "main"
//! cycle_period_secs = 3600
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::observation::Granularity;

/// Default endpoint; the date is appended as `YYYY-MM-DD`.
pub const DEFAULT_SOURCE_URL: &str =
    "https://production.dataviz.cnn.io/index/fearandgreed/graphdata/";

const OVERWRITE_HEADER: &[&str] = &["date", "index"];
const APPEND_HEADER: &[&str] = &["timestamp", "index"];

/// How the record file is maintained. Exactly one policy is active per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PersistencePolicy {
    /// Replace the file with a header and the latest observation only.
    Overwrite,
    /// One `date,value` row per day under a `timestamp,index` header.
    AppendDaily,
    /// One `date-time,value` row per run under a `timestamp,index` header.
    AppendTimestamp,
    /// Headerless `date,o,h,l,c,0` rows for charting tools, one per day.
    #[default]
    AppendOhlc,
}

impl PersistencePolicy {
    /// Header line written when the file is created, if any.
    pub fn header(&self) -> Option<&'static [&'static str]> {
        match self {
            PersistencePolicy::Overwrite => Some(OVERWRITE_HEADER),
            PersistencePolicy::AppendDaily | PersistencePolicy::AppendTimestamp => {
                Some(APPEND_HEADER)
            }
            PersistencePolicy::AppendOhlc => None,
        }
    }

    /// Resolution at which observations are stamped.
    pub fn granularity(&self) -> Granularity {
        match self {
            PersistencePolicy::AppendTimestamp => Granularity::DateTime,
            _ => Granularity::Date,
        }
    }

    /// Whether new observations are appended rather than replacing the file.
    pub fn is_append(&self) -> bool {
        !matches!(self, PersistencePolicy::Overwrite)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PersistencePolicy::Overwrite => "overwrite",
            PersistencePolicy::AppendDaily => "append-daily",
            PersistencePolicy::AppendTimestamp => "append-timestamp",
            PersistencePolicy::AppendOhlc => "append-ohlc",
        }
    }
}

impl fmt::Display for PersistencePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersistencePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "overwrite" => Ok(PersistencePolicy::Overwrite),
            "append-daily" => Ok(PersistencePolicy::AppendDaily),
            "append-timestamp" => Ok(PersistencePolicy::AppendTimestamp),
            "append-ohlc" => Ok(PersistencePolicy::AppendOhlc),
            other => Err(format!(
                "unknown policy '{}' (expected overwrite, append-daily, append-timestamp or append-ohlc)",
                other
            )),
        }
    }
}

/// Everything a recorder needs, passed explicitly into each component.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Base URL of the indicator endpoint.
    pub source_url: String,
    /// Record file, relative to the working directory unless absolute.
    pub file_path: PathBuf,
    pub policy: PersistencePolicy,
    /// Git remote to push to.
    pub remote: String,
    /// Remote branch to push to.
    pub branch: String,
    /// Working directory for git commands (defaults to the current one).
    pub repo_dir: Option<PathBuf>,
    /// Whether to commit and push after a write.
    pub publish: bool,
    pub cycle_period_secs: u64,
    /// Wait before the forced push retry.
    pub push_backoff_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            file_path: PathBuf::from("fear_greed_data.csv"),
            policy: PersistencePolicy::default(),
            remote: "origin".to_string(),
            branch: "main".to_string(),
            repo_dir: None,
            publish: true,
            cycle_period_secs: 3600,
            push_backoff_secs: 5,
            request_timeout_secs: 30,
        }
    }
}

impl RecorderConfig {
    /// Load configuration from defaults, an optional file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(Environment::with_prefix("FEARGREED").try_parsing(true))
            .build()?;
        config.try_deserialize()
    }

    /// Record file path, resolved against `repo_dir` when it is relative.
    pub fn resolved_file_path(&self) -> PathBuf {
        match &self.repo_dir {
            Some(dir) if self.file_path.is_relative() => dir.join(&self.file_path),
            _ => self.file_path.clone(),
        }
    }

    pub fn cycle_period(&self) -> Duration {
        Duration::from_secs(self.cycle_period_secs)
    }

    pub fn push_backoff(&self) -> Duration {
        Duration::from_secs(self.push_backoff_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
