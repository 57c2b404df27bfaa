//! Mirror RSS/Atom feeds into reddit link posts.
//!
//! Each configuration names one or more feeds and a subreddit. On every run
//! the entries of those feeds are reconciled against a per-configuration
//! ledger of what was already posted; whatever is new gets posted oldest
//! first, one at a time, waiting out rate limits as they come.
//!
//! - [`feed`]: entry model, parsing and HTTP retrieval
//! - [`storage`]: the submission ledger and its on-disk store
//! - [`publish`]: the publisher seam and the reddit client
//! - [`sync`]: reconciliation, submission and the run orchestrator
//! - [`config`]: configuration files and their discovery

pub mod config;
pub mod feed;
pub mod publish;
pub mod storage;
pub mod sync;
pub mod util;
