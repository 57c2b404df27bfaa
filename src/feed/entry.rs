use chrono::{DateTime, Utc};

/// A single feed item, normalized for mirroring.
///
/// The `id` is the entry's link exactly as the feed published it. No
/// normalization happens: `https://a.example/x` and `https://a.example/x/`
/// are different entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Canonical link of the entry; doubles as the dedup key.
    pub id: String,
    /// Title used for the submission.
    pub title: String,
    /// Publication time, if the feed carried a usable one.
    pub published_at: Option<DateTime<Utc>>,
}

impl Entry {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        published_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            published_at,
        }
    }

    /// The link submitted to the publisher.
    pub fn link(&self) -> &str {
        &self.id
    }
}
