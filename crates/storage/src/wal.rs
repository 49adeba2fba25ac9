// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead log for durable storage

use sprig_core::Operation;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur in WAL operations
#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("corrupt WAL entry at line {line}: {source}")]
    Corrupt {
        line: usize,
        source: serde_json::Error,
    },
}

/// Write-ahead log for durable operation storage
pub struct Wal {
    file: File,
    sequence: u64,
}

impl Wal {
    /// Open or create a WAL at the given path
    pub fn open(path: &Path) -> Result<Self, WalError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)?;

        let content = std::fs::read_to_string(path)?;
        let (intact, sequence) = intact_prefix(&content);
        if intact < content.len() {
            tracing::warn!(
                path = %path.display(),
                dropped_bytes = content.len() - intact,
                "truncating torn WAL tail"
            );
            file.set_len(intact as u64)?;
        }

        Ok(Self { file, sequence })
    }

    /// Append an operation to the log and fsync it
    pub fn append(&mut self, op: &Operation) -> Result<u64, WalError> {
        self.sequence += 1;
        let entry = WalEntry {
            seq: self.sequence,
            op: op.clone(),
        };
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');
        // One write: a reader never sees a complete entry without its newline
        self.file.write_all(line.as_bytes())?;
        self.file.sync_all()?;
        Ok(self.sequence)
    }

    /// Get the current sequence number
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Replay all operations from the log
    ///
    /// A malformed final line is a torn write from a crash and is dropped with a warning.
    /// A malformed line anywhere else is an error.
    pub fn replay(path: &Path) -> Result<Vec<Operation>, WalError> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let lines = BufReader::new(file).lines().collect::<Result<Vec<_>, _>>()?;
        let last = lines.len();
        let mut ops = Vec::with_capacity(last);

        for (idx, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<WalEntry>(line) {
                Ok(entry) => ops.push(entry.op),
                Err(e) if idx + 1 == last => {
                    tracing::warn!(line = idx + 1, error = %e, "dropping torn WAL tail");
                }
                Err(source) => {
                    return Err(WalError::Corrupt {
                        line: idx + 1,
                        source,
                    })
                }
            }
        }

        Ok(ops)
    }
}

/// Byte length of the intact prefix and the number of entries in it
///
/// Only the final line can be torn: it is intact when newline-terminated and parseable.
fn intact_prefix(content: &str) -> (usize, u64) {
    let mut offset = 0;
    let mut count = 0;
    let mut segments = content.split_inclusive('\n').peekable();
    while let Some(segment) = segments.next() {
        let is_last = segments.peek().is_none();
        let line = segment.trim_end_matches('\n');
        if is_last
            && !line.is_empty()
            && (!segment.ends_with('\n') || serde_json::from_str::<WalEntry>(line).is_err())
        {
            break;
        }
        offset += segment.len();
        if !line.is_empty() {
            count += 1;
        }
    }
    (offset, count)
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct WalEntry {
    seq: u64,
    op: Operation,
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
