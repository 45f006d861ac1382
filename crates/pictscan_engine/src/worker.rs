use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures_util::FutureExt;

use pictscan_core::{FailureReason, ScanLedger, UrlOutcome, WorkGroup};
use pictscan_logging::{scan_debug, scan_error, scan_info, scan_warn};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::classify::{first_image, matching_pictures};
use crate::{FetchOutput, Fetcher, PageParser, ScanError};

/// What one worker got through before finishing or being cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub index: usize,
    pub processed: usize,
    pub assigned: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PoolReport {
    pub workers: Vec<WorkerReport>,
}

impl PoolReport {
    pub fn processed(&self) -> usize {
        self.workers.iter().map(|w| w.processed).sum()
    }
}

/// Processes one work group strictly in order.
pub struct Worker {
    group: WorkGroup,
    fetcher: Arc<dyn Fetcher>,
    parser: Arc<dyn PageParser>,
    ledger: Arc<ScanLedger>,
    cancel: CancellationToken,
}

impl Worker {
    pub fn new(
        group: WorkGroup,
        fetcher: Arc<dyn Fetcher>,
        parser: Arc<dyn PageParser>,
        ledger: Arc<ScanLedger>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            group,
            fetcher,
            parser,
            ledger,
            cancel,
        }
    }

    pub async fn run(self) -> WorkerReport {
        let mut processed = 0;
        for url in self.group.urls() {
            if self.cancel.is_cancelled() {
                scan_debug!("Worker {} stopping before {}", self.group.index(), url);
                break;
            }
            let outcome = match AssertUnwindSafe(self.process(url)).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(payload) => {
                    self.ledger.abandon(url);
                    scan_error!("Worker {} panicked on {}", self.group.index(), url);
                    panic::resume_unwind(payload);
                }
            };
            processed += 1;
            if let Some(progress) = self.ledger.complete(url, outcome) {
                scan_info!("Done {} of {}", progress.done, progress.total);
            }
        }
        scan_debug!(
            "Worker {} finished {} of {} urls",
            self.group.index(),
            processed,
            self.group.len()
        );
        WorkerReport {
            index: self.group.index(),
            processed,
            assigned: self.group.len(),
        }
    }

    async fn process(&self, url: &str) -> UrlOutcome {
        scan_info!("Fetching {}", url);
        let output = match self.fetcher.fetch(url).await {
            Ok(output) => output,
            Err(err) => {
                scan_warn!("Fetch failed for {}: {} ({})", url, err, err.kind);
                return UrlOutcome::Failed(FailureReason::Fetch(err.to_string()));
            }
        };
        scan_info!("Fetched {}", url);
        self.analyze(url, &output)
    }

    /// Parse and classify. Kept synchronous so the document never lives across
    /// an await point.
    fn analyze(&self, url: &str, output: &FetchOutput) -> UrlOutcome {
        let page = match self.parser.parse(
            &output.bytes,
            output.metadata.content_type.as_deref(),
            url,
        ) {
            Ok(page) => page,
            Err(err) => {
                scan_warn!("Parse failed for {}: {}", url, err);
                return UrlOutcome::Failed(FailureReason::Parse(err.to_string()));
            }
        };

        let pictures = matching_pictures(&page.document);
        if pictures.is_empty() {
            return UrlOutcome::NotMatched;
        }
        let sources: Vec<String> = pictures
            .iter()
            .filter_map(|picture| first_image(*picture))
            .filter_map(|img| img.value().attr("src"))
            .filter_map(|src| page.resolve(src))
            .map(String::from)
            .collect();
        scan_info!(
            "Match {}: {} picture(s) {:?}",
            url,
            pictures.len(),
            sources
        );
        UrlOutcome::Matched
    }
}

/// Fixed-size pool: one task per pre-sliced work group, no rebalancing.
pub struct WorkerPool {
    workers: Vec<Worker>,
}

impl WorkerPool {
    pub fn new(
        groups: Vec<WorkGroup>,
        fetcher: Arc<dyn Fetcher>,
        parser: Arc<dyn PageParser>,
        ledger: Arc<ScanLedger>,
        cancel: CancellationToken,
    ) -> Self {
        let workers = groups
            .into_iter()
            .map(|group| {
                Worker::new(
                    group,
                    Arc::clone(&fetcher),
                    Arc::clone(&parser),
                    Arc::clone(&ledger),
                    cancel.clone(),
                )
            })
            .collect();
        Self { workers }
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Runs every worker to completion. Dropping the returned future aborts
    /// the remaining tasks.
    pub async fn run(self) -> Result<PoolReport, ScanError> {
        let mut tasks = JoinSet::new();
        let mut indices = Vec::with_capacity(self.workers.len());
        for worker in self.workers {
            let index = worker.group.index();
            let id = tasks.spawn(worker.run()).id();
            indices.push((id, index));
        }

        let mut report = PoolReport::default();
        let mut failure = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(worker_report) => report.workers.push(worker_report),
                Err(err) => {
                    let index = indices
                        .iter()
                        .find(|(id, _)| *id == err.id())
                        .map_or(usize::MAX, |(_, index)| *index);
                    scan_error!("Worker {} did not finish: {}", index, err);
                    if failure.is_none() {
                        failure = Some(ScanError::WorkerPanicked {
                            index,
                            message: err.to_string(),
                        });
                    }
                }
            }
        }

        report.workers.sort_by_key(|w| w.index);
        match failure {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }
}
