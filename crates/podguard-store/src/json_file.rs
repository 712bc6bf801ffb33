//! A single JSON document on disk.
//!
//! Loading is fail-open: a missing, unreadable or malformed file yields the
//! empty value and a warning. Saving is atomic within the process: the
//! document is written to a sibling temp file and renamed into place, so a
//! reader never observes a half-written file.

use std::ffi::OsString;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use podguard_contracts::error::{GuardError, GuardResult};

pub struct JsonFile<T> {
    path: PathBuf,
    _doc: PhantomData<fn() -> T>,
}

impl<T> JsonFile<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), _doc: PhantomData }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document, or `T::default()` if there is nothing usable.
    pub fn load(&self) -> T {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no record file yet, starting empty");
                return T::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable record file, starting empty");
                return T::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "corrupt record file, starting empty");
                T::default()
            }
        }
    }

    /// Pretty-print the document and atomically replace the file.
    pub fn save(&self, doc: &T) -> GuardResult<()> {
        let mut body = serde_json::to_string_pretty(doc).map_err(|e| self.failed(e))?;
        body.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.failed(e))?;
        }

        let tmp = self.temp_path();
        fs::write(&tmp, body).map_err(|e| self.failed(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            self.failed(e)
        })?;

        debug!(path = %self.path.display(), "record file saved");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("record"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn failed(&self, e: impl std::fmt::Display) -> GuardError {
        GuardError::StorageFailed { path: self.path.display().to_string(), reason: e.to_string() }
    }
}
