use crate::persist::PersistError;
use crate::FetchError;

/// Run-level failures. Per-URL problems never surface here; they become
/// error records.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("http client setup failed: {0}")]
    Client(#[from] FetchError),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("worker {index} panicked: {message}")]
    WorkerPanicked { index: usize, message: String },
}
