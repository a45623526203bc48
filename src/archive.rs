//! Record Store: append-only JSON history of processed intakes.
//!
//! The file holds one top-level array. Every append reads the whole array,
//! pushes one record and rewrites the file with 4-space indentation and
//! literal non-ASCII text. The read-modify-write runs under a mutex and the
//! rewrite is persisted through a temp file in the same directory.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Timestamp format of the `tarih` field.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Archive file {} is not a valid record array: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Archive serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Archive lock poisoned")]
    LockPoisoned,

    #[error("Archive I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One persisted history entry. Field names on disk are fixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    #[serde(rename = "ad")]
    pub name: String,
    #[serde(rename = "id")]
    pub patient_id: String,
    #[serde(rename = "semptomlar")]
    pub symptoms: String,
    #[serde(rename = "muayene")]
    pub physical_findings: String,
    #[serde(rename = "ozet")]
    pub summary: String,
    #[serde(rename = "tarih")]
    pub timestamp: String,
}

impl ArchiveRecord {
    /// Build a record stamped with the current local time.
    pub fn new(
        name: &str,
        patient_id: &str,
        symptoms: &str,
        physical_findings: &str,
        summary: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            patient_id: patient_id.to_string(),
            symptoms: symptoms.to_string(),
            physical_findings: physical_findings.to_string(),
            summary: summary.to_string(),
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

pub struct RecordStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record. Returns the number of records now stored.
    ///
    /// A file that exists but does not parse aborts the append and is left
    /// untouched.
    pub fn append(&self, record: ArchiveRecord) -> Result<usize, ArchiveError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| ArchiveError::LockPoisoned)?;

        let mut records = self.read_records()?;
        records.push(record);
        self.write_records(&records)?;

        tracing::info!(
            path = %self.path.display(),
            total = records.len(),
            "Archive record appended"
        );
        Ok(records.len())
    }

    /// Read every stored record, oldest first.
    pub fn load_all(&self) -> Result<Vec<ArchiveRecord>, ArchiveError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| ArchiveError::LockPoisoned)?;
        self.read_records()
    }

    pub fn len(&self) -> Result<usize, ArchiveError> {
        Ok(self.load_all()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, ArchiveError> {
        Ok(self.len()? == 0)
    }

    fn read_records(&self) -> Result<Vec<ArchiveRecord>, ArchiveError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&raw).map_err(|source| {
            tracing::error!(
                path = %self.path.display(),
                error = %source,
                "Archive file is corrupt, refusing to overwrite"
            );
            ArchiveError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })
    }

    fn write_records(&self, records: &[ArchiveRecord]) -> Result<(), ArchiveError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let tmp = tempfile::NamedTempFile::new_in(&dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
            let mut ser = serde_json::Serializer::with_formatter(&mut writer, formatter);
            records.serialize(&mut ser)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| ArchiveError::Io(e.error))?;
        Ok(())
    }
}
