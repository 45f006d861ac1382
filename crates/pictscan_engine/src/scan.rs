use std::future::Future;
use std::sync::Arc;

use pictscan_core::{dedupe_urls, partition, ScanLedger};
use pictscan_logging::scan_info;
use tokio_util::sync::CancellationToken;

use crate::{
    Coordinator, Fetcher, OutputWriter, PageParser, ReqwestFetcher, RunOutcome, ScanConfig,
    ScanError, ScraperParser, WorkerPool,
};

/// Wires dedupe, partitioning, the worker pool and the coordinator together.
pub struct Scanner {
    config: ScanConfig,
    fetcher: Arc<dyn Fetcher>,
    parser: Arc<dyn PageParser>,
}

impl Scanner {
    pub fn new(
        config: ScanConfig,
        fetcher: Arc<dyn Fetcher>,
        parser: Arc<dyn PageParser>,
    ) -> Result<Self, ScanError> {
        config.validate()?;
        Ok(Self {
            config,
            fetcher,
            parser,
        })
    }

    /// Scanner backed by `reqwest` and `scraper`.
    pub fn with_defaults(config: ScanConfig) -> Result<Self, ScanError> {
        let fetcher = ReqwestFetcher::new(config.fetch.clone())?;
        Self::new(config, Arc::new(fetcher), Arc::new(ScraperParser))
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scans `raw_urls` until done or until `interrupt` resolves.
    pub async fn run<I, S, F>(&self, raw_urls: I, interrupt: F) -> Result<RunOutcome, ScanError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Future<Output = ()>,
    {
        let deduped = dedupe_urls(raw_urls);
        scan_info!(
            "Scanning {} unique urls ({} duplicates dropped) with {} workers",
            deduped.urls.len(),
            deduped.duplicates,
            self.config.group_count
        );

        let ledger = Arc::new(ScanLedger::new(&deduped.urls));
        let groups = partition(&deduped.urls, self.config.group_count);
        let cancel = CancellationToken::new();
        let pool = WorkerPool::new(
            groups,
            Arc::clone(&self.fetcher),
            Arc::clone(&self.parser),
            Arc::clone(&ledger),
            cancel.clone(),
        );
        let coordinator = Coordinator::new(
            ledger,
            OutputWriter::new(self.config.output.clone()),
            cancel,
        );
        coordinator.supervise(pool.run(), interrupt).await
    }
}
