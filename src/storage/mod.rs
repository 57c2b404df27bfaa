//! Submission ledger storage.
//!
//! A [`Ledger`] is the in-memory set of entry ids already submitted for one
//! configuration. [`LedgerStore`] keeps one JSON file per configuration in
//! the output directory, named `<configuration name>.ledger.json`.

mod ledger;
mod store;
mod types;

pub use ledger::Ledger;
pub use store::{is_ledger_file, LedgerStore, LEDGER_SUFFIX};
pub use types::LedgerError;
