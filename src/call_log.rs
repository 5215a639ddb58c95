//! Append-only record of answered calls.
//!
//! One JSON object per line, appended as each call completes.

use crate::modem::CallerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Errors writing the call log.
#[derive(Debug, Error)]
pub enum CallLogError {
    #[error("failed to open call log '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to append call record: {0}")]
    Append(#[from] std::io::Error),

    #[error("failed to encode call record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// How an answered call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    /// The announcement was streamed and the modem hung up normally.
    Played,
    /// Playback was attempted but an AT step or the stream failed.
    Failed,
}

/// One answered call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    pub id: Uuid,
    pub answered_at: DateTime<Utc>,
    /// Rings counted before answering.
    pub rings: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller: Option<CallerId>,
    pub outcome: CallOutcome,
}

impl CallRecord {
    pub fn new(rings: u32, caller: Option<CallerId>, outcome: CallOutcome) -> Self {
        Self {
            id: Uuid::new_v4(),
            answered_at: Utc::now(),
            rings,
            caller,
            outcome,
        }
    }
}

/// Append-only JSON-lines call log.
#[derive(Debug)]
pub struct CallLog {
    path: PathBuf,
    file: File,
}

impl CallLog {
    /// Open (creating if needed) the log at `path`; missing parent
    /// directories are created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CallLogError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| CallLogError::Open {
                    path: path.clone(),
                    source,
                })?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| CallLogError::Open {
                path: path.clone(),
                source,
            })?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a JSON line.
    pub fn append(&mut self, record: &CallRecord) -> Result<(), CallLogError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        self.file.write_all(line.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modem::caller_id;

    #[test]
    fn test_append_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls.jsonl");

        let mut log = CallLog::open(&path).unwrap();
        let mut caller = CallerId::default();
        caller.apply(caller_id::parse_tag("NMBR = 5550100").unwrap());

        log.append(&CallRecord::new(2, Some(caller), CallOutcome::Played))
            .unwrap();
        log.append(&CallRecord::new(2, None, CallOutcome::Failed))
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let records: Vec<CallRecord> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].outcome, CallOutcome::Played);
        assert_eq!(
            records[0].caller.as_ref().unwrap().number.as_deref(),
            Some("5550100")
        );
        assert_eq!(records[1].outcome, CallOutcome::Failed);
        assert!(records[1].caller.is_none());
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("var").join("log").join("calls.jsonl");

        let log = CallLog::open(&path).unwrap();
        assert_eq!(log.path(), path);
        assert!(path.parent().unwrap().is_dir());
    }

    #[test]
    fn test_reopen_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls.jsonl");

        CallLog::open(&path)
            .unwrap()
            .append(&CallRecord::new(2, None, CallOutcome::Played))
            .unwrap();
        CallLog::open(&path)
            .unwrap()
            .append(&CallRecord::new(3, None, CallOutcome::Played))
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
