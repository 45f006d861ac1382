use std::path::PathBuf;

use pictscan_core::LedgerSnapshot;
use pictscan_logging::{scan_error, scan_info};
use serde::Deserialize;

use crate::persist::{AtomicFileWriter, PersistError};

pub const FOUND_FILENAME: &str = "pass-1-found.json";
pub const ERRORS_FILENAME: &str = "pass-1-errors.json";

/// Where the two result artifacts go.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OutputFiles {
    pub dir: PathBuf,
    pub found_filename: String,
    pub errors_filename: String,
}

impl Default for OutputFiles {
    fn default() -> Self {
        Self::in_dir(PathBuf::from("."))
    }
}

impl OutputFiles {
    pub fn in_dir(dir: PathBuf) -> Self {
        Self {
            dir,
            found_filename: FOUND_FILENAME.to_string(),
            errors_filename: ERRORS_FILENAME.to_string(),
        }
    }

    pub fn found_path(&self) -> PathBuf {
        self.dir.join(&self.found_filename)
    }

    pub fn errors_path(&self) -> PathBuf {
        self.dir.join(&self.errors_filename)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushSummary {
    pub found_count: usize,
    pub error_count: usize,
    pub found_path: PathBuf,
    pub errors_path: PathBuf,
}

/// Serializes a ledger snapshot to the found and errors files.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    files: OutputFiles,
    writer: AtomicFileWriter,
}

impl OutputWriter {
    pub fn new(files: OutputFiles) -> Self {
        let writer = AtomicFileWriter::new(files.dir.clone());
        Self { files, writer }
    }

    pub fn files(&self) -> &OutputFiles {
        &self.files
    }

    /// Writes both files, overwriting previous content. The two writes are
    /// independent: a failure on one does not skip the other. The first error
    /// is returned.
    pub fn flush(&self, snapshot: &LedgerSnapshot) -> Result<FlushSummary, PersistError> {
        let found = self.write_json(&self.files.found_filename, &snapshot.found);
        let errors = self.write_json(&self.files.errors_filename, &snapshot.errors);
        let (found_path, errors_path) = (found?, errors?);

        scan_info!(
            "Wrote {} matches to {:?} and {} errors to {:?}",
            snapshot.found.len(),
            found_path,
            snapshot.errors.len(),
            errors_path
        );
        Ok(FlushSummary {
            found_count: snapshot.found.len(),
            error_count: snapshot.errors.len(),
            found_path,
            errors_path,
        })
    }

    fn write_json<T: serde::Serialize + ?Sized>(
        &self,
        filename: &str,
        value: &T,
    ) -> Result<PathBuf, PersistError> {
        let result = serde_json::to_string_pretty(value)
            .map_err(PersistError::from)
            .and_then(|content| self.writer.write(filename, &content));
        if let Err(err) = &result {
            scan_error!("Failed to write {}: {}", filename, err);
        }
        result
    }
}
