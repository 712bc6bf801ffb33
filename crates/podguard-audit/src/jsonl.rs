//! File-backed audit log: one JSON object per line.
//!
//! The file is opened in append mode for every event so nothing already
//! written is ever rewritten. Any I/O failure is returned as
//! `GuardError::AuditWriteFailed`.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use podguard_contracts::{
    audit::AuditEvent,
    error::{GuardError, GuardResult},
};
use podguard_core::traits::AuditWriter;

pub struct JsonlAuditLog {
    path: PathBuf,
}

impl JsonlAuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every event back, oldest first.
    ///
    /// Lines that do not parse are skipped with a warning. A missing file is
    /// an empty log.
    pub fn read_all(&self) -> GuardResult<Vec<AuditEvent>> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.failed(e)),
        };

        let mut events = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| self.failed(e))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(event) => events.push(event),
                Err(e) => warn!(line = idx + 1, error = %e, "skipping malformed audit line"),
            }
        }
        Ok(events)
    }

    /// The last `n` events.
    pub fn tail(&self, n: usize) -> GuardResult<Vec<AuditEvent>> {
        let mut events = self.read_all()?;
        let skip = events.len().saturating_sub(n);
        Ok(events.split_off(skip))
    }

    fn failed(&self, e: impl std::fmt::Display) -> GuardError {
        GuardError::AuditWriteFailed { reason: format!("{}: {}", self.path.display(), e) }
    }
}

impl AuditWriter for JsonlAuditLog {
    fn log(&self, event: AuditEvent) -> GuardResult<()> {
        let mut line = serde_json::to_string(&event).map_err(|e| self.failed(e))?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.failed(e))?;
        // One write call per line keeps concurrent appends from interleaving.
        file.write_all(line.as_bytes()).map_err(|e| self.failed(e))?;

        info!(
            event_type = %event.event_type,
            transfer_id = event.transfer_id.as_deref().unwrap_or("-"),
            user_id = event.user_id.as_ref().map(|u| u.0.as_str()).unwrap_or("-"),
            "audit"
        );
        Ok(())
    }
}
