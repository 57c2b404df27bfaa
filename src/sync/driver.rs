use std::time::Duration;

use super::SyncError;
use crate::feed::Entry;
use crate::publish::Publisher;
use crate::storage::{Ledger, LedgerStore};

/// Fixed pause before retrying an entry the publisher rate limited.
pub const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(60);

/// When the ledger is written to disk during a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistPolicy {
    /// Once, after the batch completes or aborts.
    #[default]
    EndOfBatch,
    /// After every successful submission, and once more at the end.
    ///
    /// Narrows the window in which a crash leaves a published entry
    /// unrecorded, at the cost of one write per post.
    EverySubmission,
}

#[derive(Debug, Clone)]
pub struct DriverOptions {
    pub backoff: Duration,
    pub persist: PersistPolicy,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            backoff: RATE_LIMIT_BACKOFF,
            persist: PersistPolicy::default(),
        }
    }
}

/// What happened to one submission batch.
///
/// `submitted` counts successes even when `result` is an error, since those
/// entries are already live and recorded.
#[derive(Debug)]
pub struct BatchOutcome {
    pub submitted: usize,
    pub rate_limit_waits: usize,
    pub result: Result<(), SyncError>,
}

/// Submits a batch one entry at a time, in order.
pub struct SubmissionDriver<'a> {
    publisher: &'a dyn Publisher,
    store: &'a LedgerStore,
    options: &'a DriverOptions,
}

impl<'a> SubmissionDriver<'a> {
    pub fn new(
        publisher: &'a dyn Publisher,
        store: &'a LedgerStore,
        options: &'a DriverOptions,
    ) -> Self {
        Self {
            publisher,
            store,
            options,
        }
    }

    /// Publishes every entry of `batch` and records each success in `ledger`.
    ///
    /// # Behavior
    ///
    /// - Success: the id is recorded before moving to the next entry
    /// - Rate limited: sleep `options.backoff`, retry the same entry, without limit
    /// - Any other error: stop; earlier successes stay recorded
    ///
    /// The ledger is persisted once after the loop whatever the outcome. If
    /// both a submission and that final write fail, the submission error is
    /// returned and the write error is logged.
    pub async fn run(&self, batch: &[Entry], ledger: &mut Ledger) -> BatchOutcome {
        let mut outcome = BatchOutcome {
            submitted: 0,
            rate_limit_waits: 0,
            result: Ok(()),
        };

        let submitted = self.submit_all(batch, ledger, &mut outcome).await;
        let persisted = self.store.persist(ledger).await;

        outcome.result = match (submitted, persisted) {
            (Ok(()), Ok(())) => Ok(()),
            (Ok(()), Err(e)) => Err(e.into()),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(persist_err)) => {
                tracing::error!(
                    ledger = %ledger.key(),
                    error = %persist_err,
                    "Failed to persist ledger after aborted batch; recorded entries may be resubmitted"
                );
                Err(e)
            }
        };

        outcome
    }

    async fn submit_all(
        &self,
        batch: &[Entry],
        ledger: &mut Ledger,
        outcome: &mut BatchOutcome,
    ) -> Result<(), SyncError> {
        for entry in batch {
            if ledger.contains(&entry.id) {
                tracing::debug!(url = %entry.id, "Already submitted, skipping");
                continue;
            }

            loop {
                match self.publisher.submit(&entry.title, entry.link()).await {
                    Ok(submission) => {
                        ledger.record(entry.id.clone());
                        outcome.submitted += 1;
                        tracing::info!(
                            title = %entry.title,
                            url = %entry.id,
                            post = %submission.url.as_deref().unwrap_or(submission.id.as_str()),
                            "Submitted"
                        );

                        if self.options.persist == PersistPolicy::EverySubmission {
                            self.store.persist(ledger).await?;
                        }
                        break;
                    }
                    Err(e) if e.is_rate_limited() => {
                        outcome.rate_limit_waits += 1;
                        tracing::warn!(
                            url = %entry.id,
                            error = %e,
                            wait_secs = self.options.backoff.as_secs(),
                            "Rate limit exceeded, waiting before retrying"
                        );
                        tokio::time::sleep(self.options.backoff).await;
                    }
                    Err(e) => {
                        tracing::error!(
                            url = %entry.id,
                            error = %e,
                            "Submission failed, abandoning remaining entries"
                        );
                        return Err(e.into());
                    }
                }
            }
        }

        Ok(())
    }
}
