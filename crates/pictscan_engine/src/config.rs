use pictscan_core::DEFAULT_GROUP_COUNT;
use serde::Deserialize;

use crate::{FetchSettings, OutputFiles, ScanError};

/// Settings for one scan run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Number of work groups, which is also the number of concurrent workers.
    pub group_count: usize,
    pub fetch: FetchSettings,
    pub output: OutputFiles,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            group_count: DEFAULT_GROUP_COUNT,
            fetch: FetchSettings::default(),
            output: OutputFiles::default(),
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.group_count == 0 {
            return Err(ScanError::Config("group_count must be at least 1".into()));
        }
        if self.fetch.request_timeout.is_zero() {
            return Err(ScanError::Config("request_timeout must be positive".into()));
        }
        if self.output.found_filename == self.output.errors_filename {
            return Err(ScanError::Config(
                "found and errors outputs must use different files".into(),
            ));
        }
        Ok(())
    }
}
