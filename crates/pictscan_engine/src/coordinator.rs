use std::future::Future;
use std::sync::Arc;

use pictscan_core::ScanLedger;
use pictscan_logging::{scan_info, scan_warn};
use tokio_util::sync::CancellationToken;

use crate::{FlushSummary, OutputWriter, PoolReport, ScanError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed {
        report: PoolReport,
        flush: FlushSummary,
    },
    Interrupted {
        cancelled: usize,
        flush: FlushSummary,
    },
}

impl RunOutcome {
    /// The run ended through the interrupt path; the caller should exit
    /// right away without waiting on abandoned work.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, RunOutcome::Interrupted { .. })
    }

    pub fn flush(&self) -> &FlushSummary {
        match self {
            RunOutcome::Completed { flush, .. } | RunOutcome::Interrupted { flush, .. } => flush,
        }
    }
}

/// Owns the end of a run: either the workers finish or the interrupt fires,
/// and in both cases the ledger is sealed and flushed exactly once.
pub struct Coordinator {
    ledger: Arc<ScanLedger>,
    output: OutputWriter,
    cancel: CancellationToken,
}

impl Coordinator {
    pub fn new(ledger: Arc<ScanLedger>, output: OutputWriter, cancel: CancellationToken) -> Self {
        Self {
            ledger,
            output,
            cancel,
        }
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Races `work` against `interrupt`. The interrupt future is only polled
    /// while the work is running; once the work completes it is dropped.
    pub async fn supervise<W, I>(&self, work: W, interrupt: I) -> Result<RunOutcome, ScanError>
    where
        W: Future<Output = Result<PoolReport, ScanError>>,
        I: Future<Output = ()>,
    {
        tokio::select! {
            result = work => {
                self.ledger.seal();
                let flush = self.output.flush(&self.ledger.snapshot())?;
                let report = result?;
                scan_info!(
                    "Scan complete: {} processed, {} matched, {} errors",
                    report.processed(),
                    flush.found_count,
                    flush.error_count
                );
                Ok(RunOutcome::Completed { report, flush })
            }
            () = interrupt => {
                scan_warn!("Interrupt received, cancelling pending urls");
                self.cancel.cancel();
                let cancelled = self.ledger.cancel_pending();
                self.ledger.seal();
                let flush = self.output.flush(&self.ledger.snapshot())?;
                scan_info!("Cancelled {} pending urls", cancelled);
                Ok(RunOutcome::Interrupted { cancelled, flush })
            }
        }
    }
}
