use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{ErrorRecord, FailureReason, UrlOutcome};

/// Progress counters; advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

/// Owned copy of the result collections, taken for output.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LedgerSnapshot {
    pub found: Vec<String>,
    pub errors: Vec<ErrorRecord>,
}

/// Working set plus the match and error collections of one run.
///
/// Every mutation happens under a single lock, so removing a URL from the
/// working set and appending its outcome are one atomic step. A URL is
/// accepted at most once; once the ledger is sealed nothing changes.
#[derive(Debug)]
pub struct ScanLedger {
    inner: Mutex<LedgerState>,
}

#[derive(Debug)]
struct LedgerState {
    order: Vec<String>,
    pending: HashSet<String>,
    found: Vec<String>,
    errors: Vec<ErrorRecord>,
    done: usize,
    sealed: bool,
}

impl ScanLedger {
    /// Creates a ledger whose working set holds `urls`. `urls` should already
    /// be deduplicated; repeats collapse into one pending entry.
    pub fn new(urls: &[String]) -> Self {
        let mut pending = HashSet::with_capacity(urls.len());
        let order = urls
            .iter()
            .filter(|url| pending.insert((*url).clone()))
            .cloned()
            .collect();
        Self {
            inner: Mutex::new(LedgerState {
                order,
                pending,
                found: Vec::new(),
                errors: Vec::new(),
                done: 0,
                sealed: false,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records the terminal outcome of `url` and removes it from the working
    /// set. Returns the updated progress, or `None` if the URL was not pending
    /// or the ledger is sealed.
    pub fn complete(&self, url: &str, outcome: UrlOutcome) -> Option<Progress> {
        let mut state = self.state();
        if state.sealed || !state.pending.remove(url) {
            return None;
        }
        match outcome {
            UrlOutcome::Matched => state.found.push(url.to_string()),
            UrlOutcome::NotMatched => {}
            UrlOutcome::Failed(reason) => state.errors.push(ErrorRecord::new(url, reason)),
        }
        state.done += 1;
        Some(Progress {
            done: state.done,
            total: state.order.len(),
        })
    }

    /// Drops `url` from the working set without recording an outcome. Used
    /// when processing the URL panicked. Returns `false` if it was not pending.
    pub fn abandon(&self, url: &str) -> bool {
        let mut state = self.state();
        if state.sealed || !state.pending.remove(url) {
            return false;
        }
        state.done += 1;
        true
    }

    /// Moves every still-pending URL into the error list as cancelled, in
    /// input order. Returns how many records were added.
    pub fn cancel_pending(&self) -> usize {
        let mut state = self.state();
        if state.sealed {
            return 0;
        }
        let LedgerState {
            order,
            pending,
            errors,
            ..
        } = &mut *state;
        let before = errors.len();
        for url in order.iter() {
            if pending.remove(url) {
                errors.push(ErrorRecord::new(url.clone(), FailureReason::Cancelled));
            }
        }
        errors.len() - before
    }

    /// Freezes the ledger. Later calls to [`complete`](Self::complete) and
    /// [`cancel_pending`](Self::cancel_pending) are ignored.
    pub fn seal(&self) {
        self.state().sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.state().sealed
    }

    pub fn is_pending(&self, url: &str) -> bool {
        self.state().pending.contains(url)
    }

    pub fn pending_count(&self) -> usize {
        self.state().pending.len()
    }

    pub fn progress(&self) -> Progress {
        let state = self.state();
        Progress {
            done: state.done,
            total: state.order.len(),
        }
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        let state = self.state();
        LedgerSnapshot {
            found: state.found.clone(),
            errors: state.errors.clone(),
        }
    }
}
