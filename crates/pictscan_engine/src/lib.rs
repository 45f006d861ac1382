//! Pictscan engine: fetching, parsing, classification and the run pipeline.
mod classify;
mod config;
mod coordinator;
mod decode;
mod error;
mod fetch;
mod output;
mod parse;
mod persist;
mod scan;
mod types;
mod worker;

pub use classify::{classify, first_image, matching_pictures, DEFAULT_SIZES};
pub use config::ScanConfig;
pub use coordinator::{Coordinator, RunOutcome};
pub use decode::{decode_html, DecodedHtml};
pub use error::ScanError;
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use output::{FlushSummary, OutputFiles, OutputWriter, ERRORS_FILENAME, FOUND_FILENAME};
pub use parse::{PageParser, ParseError, ParsedPage, ScraperParser};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use scan::Scanner;
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput};
pub use worker::{PoolReport, Worker, WorkerPool, WorkerReport};
