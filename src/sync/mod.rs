//! Deduplicated, ordered mirroring of feed entries.
//!
//! The pieces, leaf to root:
//!
//! - [`reconcile`]: which entries are new, and in what order to post them
//! - [`driver`]: posts a batch one entry at a time, recording each success
//!   and backing off when rate limited
//! - [`orchestrator`]: walks the configurations of a run, keeping one
//!   configuration's failure from stopping the others
//!
//! Everything runs sequentially. Entries are never posted concurrently, so
//! post order on the remote side matches batch order.

pub mod driver;
pub mod orchestrator;
pub mod reconcile;

use thiserror::Error;

use crate::config::ConfigError;
use crate::feed::FetchError;
use crate::publish::PublishError;
use crate::storage::LedgerError;

pub use driver::{
    BatchOutcome, DriverOptions, PersistPolicy, SubmissionDriver, RATE_LIMIT_BACKOFF,
};
pub use orchestrator::{config_paths, ConfigReport, Orchestrator, RunReport, RunStatus};
pub use reconcile::{build_batch, merge_sources};

/// Why a configuration could not be processed to completion.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to fetch feed {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
