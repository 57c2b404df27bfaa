//! Feed retrieval and parsing.
//!
//! - [`entry`]: the [`Entry`] value every other module works with
//! - [`parser`]: RSS/Atom bytes to entries, using the `feed-rs` crate
//! - [`fetcher`]: the [`FeedReader`] seam and its HTTP implementation
//!   with retry, timeout and size limits

mod entry;
mod fetcher;
mod parser;

pub use entry::Entry;
pub use fetcher::{FeedReader, FetchError, HttpFeedReader};
pub use parser::{parse_feed, ParseResult};
