use std::path::{Path, PathBuf};

use super::driver::{DriverOptions, SubmissionDriver};
use super::reconcile::{build_batch, merge_sources};
use super::SyncError;
use crate::config::{self, FeedConfig};
use crate::feed::{Entry, FeedReader};
use crate::publish::Connect;
use crate::storage::{Ledger, LedgerStore};

/// Overall result of a run, as the process reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every configuration was processed without an unrecovered failure.
    Success,
    /// At least one configuration failed.
    PartialFailure,
    /// No configurations were found.
    NoWork,
}

impl RunStatus {
    pub fn exit_code(self) -> u8 {
        match self {
            RunStatus::Success => 0,
            RunStatus::PartialFailure => 1,
            RunStatus::NoWork => 2,
        }
    }
}

/// Outcome of processing one configuration.
#[derive(Debug)]
pub struct ConfigReport {
    pub name: String,
    /// Entries published (and recorded) for this configuration.
    pub submitted: usize,
    pub result: Result<(), SyncError>,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub configs: Vec<ConfigReport>,
}

impl RunReport {
    pub fn status(&self) -> RunStatus {
        if self.configs.is_empty() {
            RunStatus::NoWork
        } else if self.configs.iter().any(|c| c.result.is_err()) {
            RunStatus::PartialFailure
        } else {
            RunStatus::Success
        }
    }

    pub fn submitted(&self) -> usize {
        self.configs.iter().map(|c| c.submitted).sum()
    }

    pub fn failed(&self) -> usize {
        self.configs.iter().filter(|c| c.result.is_err()).count()
    }
}

/// Picks the configuration files of a run.
///
/// Explicit paths win. Otherwise `dir` is scanned with [`config::discover`];
/// a missing directory simply means there is nothing to do.
pub fn config_paths(explicit: &[PathBuf], dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    if !explicit.is_empty() {
        return Ok(explicit.to_vec());
    }

    match config::discover(dir) {
        Ok(paths) => Ok(paths),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(dir = %dir.display(), "Configuration directory does not exist");
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

/// Everything needed to submit one configuration's batch.
struct Prepared {
    config: FeedConfig,
    ledger: Ledger,
    batch: Vec<Entry>,
}

/// Runs every configuration in turn, isolating their failures.
pub struct Orchestrator<'a> {
    reader: &'a dyn FeedReader,
    connector: &'a dyn Connect,
    store: &'a LedgerStore,
    options: DriverOptions,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        reader: &'a dyn FeedReader,
        connector: &'a dyn Connect,
        store: &'a LedgerStore,
        options: DriverOptions,
    ) -> Self {
        Self {
            reader,
            connector,
            store,
            options,
        }
    }

    /// Processes each configuration file in order.
    ///
    /// A failure in one configuration is logged and recorded in its
    /// [`ConfigReport`]; the remaining configurations still run.
    pub async fn run(&self, paths: &[PathBuf]) -> RunReport {
        let mut report = RunReport::default();

        if paths.is_empty() {
            tracing::error!("No feeds to process");
            return report;
        }

        for path in paths {
            let config_report = self.process(path).await;

            match &config_report.result {
                Ok(()) => tracing::info!(
                    config = %config_report.name,
                    submitted = config_report.submitted,
                    "Configuration up to date"
                ),
                Err(e) => tracing::error!(
                    config = %config_report.name,
                    submitted = config_report.submitted,
                    error = %e,
                    "Configuration failed"
                ),
            }

            report.configs.push(config_report);
        }

        report
    }

    async fn process(&self, path: &Path) -> ConfigReport {
        let name = config::config_name(path).unwrap_or_else(|_| path.display().to_string());

        let prepared = match self.prepare(path).await {
            Ok(Some(prepared)) => prepared,
            Ok(None) => {
                return ConfigReport {
                    name,
                    submitted: 0,
                    result: Ok(()),
                }
            }
            Err(e) => {
                return ConfigReport {
                    name,
                    submitted: 0,
                    result: Err(e),
                }
            }
        };

        let Prepared {
            config,
            mut ledger,
            batch,
        } = prepared;

        let publisher = match self.connector.connect(&config).await {
            Ok(publisher) => publisher,
            Err(e) => {
                return ConfigReport {
                    name,
                    submitted: 0,
                    result: Err(e.into()),
                }
            }
        };

        let outcome = SubmissionDriver::new(publisher.as_ref(), self.store, &self.options)
            .run(&batch, &mut ledger)
            .await;

        ConfigReport {
            name,
            submitted: outcome.submitted,
            result: outcome.result,
        }
    }

    /// Loads the configuration and ledger, fetches every source and builds
    /// the batch. `None` means there is nothing new.
    async fn prepare(&self, path: &Path) -> Result<Option<Prepared>, SyncError> {
        let config = FeedConfig::load(path).map_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "Skipping unusable configuration");
            e
        })?;

        let ledger = self.store.load(&config.name).await?;

        let mut sources = Vec::with_capacity(config.feed_urls.len());
        for url in &config.feed_urls {
            let entries = self
                .reader
                .fetch(url)
                .await
                .map_err(|source| SyncError::Fetch {
                    url: url.clone(),
                    source,
                })?;
            sources.push(entries);
        }

        let batch = build_batch(merge_sources(sources), &ledger);
        tracing::info!(
            config = %config.name,
            known = ledger.len(),
            new = batch.len(),
            "Reconciled feed entries"
        );

        if batch.is_empty() {
            return Ok(None);
        }

        Ok(Some(Prepared {
            config,
            ledger,
            batch,
        }))
    }
}
