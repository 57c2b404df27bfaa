//! Utility functions for common operations.
//!
//! - **URL validation**: feed sources must be well-formed http(s) URLs
//! - **Text processing**: cleaning feed titles into postable submission titles

mod text;
mod url_validator;

pub use text::{post_title, MAX_TITLE_CHARS};
pub use url_validator::{validate_url, UrlValidationError};
