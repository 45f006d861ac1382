//! Pictscan core: the pure data model of a scan run.
mod dedupe;
mod ledger;
mod partition;
mod record;

pub use dedupe::{dedupe_urls, Deduped};
pub use ledger::{LedgerSnapshot, Progress, ScanLedger};
pub use partition::{partition, WorkGroup, DEFAULT_GROUP_COUNT};
pub use record::{ErrorRecord, FailureReason, UrlOutcome};
