//! JSONL result log: append-only line-delimited JSON for agent-friendly
//! consumption.
//!
//! Each line is a self-contained [`RunResult`] object. Lines are assembled in
//! memory and written atomically via `write_all` to prevent interleaved
//! partial lines when the file is being tailed by another process.
//!
//! Degradation chain: primary file → stderr with `[STH-JSONL]` prefix →
//! silent discard. A run never fails because its result log could not be
//! written.

#![allow(missing_docs)]

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::core::errors::{Result, SthError};
use crate::runner::RunResult;

/// Appends run results to a JSONL file.
#[derive(Debug, Clone)]
pub struct JsonlWriter {
    path: PathBuf,
}

impl JsonlWriter {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record. Infallible by design — see the degradation chain.
    pub fn append(&self, result: &RunResult) {
        let Ok(mut line) = serde_json::to_string(result) else {
            eprintln!("[STH-JSONL] unserializable run result for {}", result.id);
            return;
        };
        line.push('\n');
        if self.try_append(line.as_bytes()).is_err() {
            // Best effort only; a second failure is discarded.
            let _ = std::io::stderr().write_all(line.as_bytes());
        }
    }

    fn try_append(&self, line: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line)
    }
}

/// Load a result log back for summarization. Unparsable lines (e.g. a
/// truncated tail after a crash) are skipped; the count is returned alongside
/// the records.
pub fn load(path: &Path) -> Result<(Vec<RunResult>, usize)> {
    let raw = fs::read_to_string(path).map_err(|source| SthError::io(path, source))?;
    let mut results = Vec::new();
    let mut skipped = 0;
    for line in raw.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<RunResult>(line) {
            Ok(result) => results.push(result),
            Err(_) => skipped += 1,
        }
    }
    Ok((results, skipped))
}
