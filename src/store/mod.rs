//! Record file persistence.
//!
//! The record file is plain comma-separated text. Its shape depends on the
//! active [`PersistencePolicy`]: append policies grow the file by one row per
//! period, the overwrite policy keeps only the latest observation.

mod guard;

pub use guard::DuplicateGuard;

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::config::PersistencePolicy;
use crate::error::StoreError;
use crate::observation::Observation;

/// Volume column written by the OHLC policy.
const OHLC_VOLUME: &str = "0";

/// The on-disk record of observations.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
    policy: PersistencePolicy,
}

impl RecordStore {
    pub fn new<P: AsRef<Path>>(path: P, policy: PersistencePolicy) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            policy,
        }
    }

    /// Returns the path of the record file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> PersistencePolicy {
        self.policy
    }

    /// Read the most recent stored observation, if any.
    ///
    /// A missing file is treated as an empty store.
    pub fn last(&self) -> Result<Option<Observation>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(self.policy.header().is_some())
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)?;

        let mut last = None;
        for record in reader.records() {
            last = Some(record?);
        }

        let Some(record) = last else {
            return Ok(None);
        };

        let timestamp = record
            .get(0)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| StoreError::Malformed("row has no timestamp".to_string()))?;
        let value = record
            .get(1)
            .ok_or_else(|| StoreError::Malformed(format!("row '{}' has no value", timestamp)))?;
        let value = Decimal::from_str(value).map_err(|e| {
            StoreError::Malformed(format!("row '{}' has value '{}': {}", timestamp, value, e))
        })?;

        Ok(Some(Observation::new(timestamp, value)))
    }

    /// Persist `obs` according to the policy.
    pub fn persist(&self, obs: &Observation) -> Result<(), StoreError> {
        if self.policy.is_append() {
            self.append(obs)
        } else {
            self.overwrite(obs)
        }
    }

    /// Append one row, creating the file (with its header) if absent.
    pub fn append(&self, obs: &Observation) -> Result<(), StoreError> {
        self.ensure_parent()?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;
        let is_new = file.metadata()?.len() == 0;
        if !is_new && !ends_with_newline(&mut file)? {
            file.write_all(b"\n")?;
        }

        let mut writer = csv::WriterBuilder::new().from_writer(file);
        if is_new {
            if let Some(header) = self.policy.header() {
                writer.write_record(header)?;
            }
        }
        writer.write_record(self.row(obs))?;
        writer.flush()?;
        Ok(())
    }

    /// Replace the file with a header and `obs` as the only row.
    pub fn overwrite(&self, obs: &Observation) -> Result<(), StoreError> {
        self.ensure_parent()?;

        let mut writer = csv::WriterBuilder::new().from_writer(File::create(&self.path)?);
        if let Some(header) = self.policy.header() {
            writer.write_record(header)?;
        }
        writer.write_record(self.row(obs))?;
        writer.flush()?;
        Ok(())
    }

    fn row(&self, obs: &Observation) -> Vec<String> {
        let value = obs.value.to_string();
        match self.policy {
            PersistencePolicy::AppendOhlc => vec![
                obs.timestamp.clone(),
                value.clone(),
                value.clone(),
                value.clone(),
                value,
                OHLC_VOLUME.to_string(),
            ],
            _ => vec![obs.timestamp.clone(), value],
        }
    }

    fn ensure_parent(&self) -> Result<(), StoreError> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent)?;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

fn ends_with_newline(file: &mut File) -> Result<bool, StoreError> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
