use anyhow::Result;
use feed_rs::model::Link;
use feed_rs::parser;

use super::entry::Entry;
use crate::util::post_title;

/// Entries extracted from one feed document.
#[derive(Debug)]
pub struct ParseResult {
    /// Entries in document order.
    pub entries: Vec<Entry>,
    /// Number of items dropped because they had no link to identify them by.
    pub skipped: usize,
}

/// Parses RSS/Atom bytes into entries, preserving document order.
///
/// The canonical link of each item becomes its id (see [`canonical_link`]).
/// Items without any link are counted in [`ParseResult::skipped`]. Publication time falls back to the
/// `updated` field; titles fall back to the link.
pub fn parse_feed(bytes: &[u8]) -> Result<ParseResult> {
    let feed = parser::parse(bytes)?;

    let mut skipped = 0;
    let entries: Vec<Entry> = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let Some(link) = canonical_link(&entry.links) else {
                skipped += 1;
                return None;
            };

            let published_at = entry.published.or(entry.updated);
            let title = entry
                .title
                .map(|t| post_title(&t.content).into_owned())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| link.clone());

            Some(Entry::new(link, title, published_at))
        })
        .collect();

    Ok(ParseResult { entries, skipped })
}

/// The entry's page link: the first `alternate` (or untyped) link, else the
/// first link of any kind.
///
/// Atom entries from Blogger and WordPress list `replies`, `edit` and `self`
/// links ahead of `alternate`.
fn canonical_link(links: &[Link]) -> Option<String> {
    links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| links.first())
        .map(|l| l.href.trim().to_string())
        .filter(|href| !href.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>Example</title>
    <item>
        <title>Newest</title>
        <link>https://example.com/3</link>
        <pubDate>Wed, 03 Jan 2024 10:00:00 GMT</pubDate>
    </item>
    <item>
        <title>Middle</title>
        <link>https://example.com/2</link>
        <pubDate>Tue, 02 Jan 2024 10:00:00 GMT</pubDate>
    </item>
    <item>
        <title>No date</title>
        <link>https://example.com/1</link>
    </item>
</channel></rss>"#;

    #[test]
    fn test_rss_entries_in_document_order() {
        let result = parse_feed(RSS.as_bytes()).unwrap();
        assert_eq!(result.skipped, 0);

        let ids: Vec<&str> = result.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "https://example.com/3",
                "https://example.com/2",
                "https://example.com/1"
            ]
        );
        assert_eq!(result.entries[0].title, "Newest");
        assert_eq!(
            result.entries[0].published_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 3, 10, 0, 0).unwrap())
        );
        assert_eq!(result.entries[2].published_at, None);
    }

    #[test]
    fn test_atom_updated_used_when_published_missing() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
    <title>Atom</title>
    <id>urn:feed</id>
    <updated>2024-02-01T00:00:00Z</updated>
    <entry>
        <title>Only updated</title>
        <id>urn:entry:1</id>
        <link href="https://example.org/post"/>
        <updated>2024-02-01T12:30:00Z</updated>
    </entry>
</feed>"#;

        let result = parse_feed(atom.as_bytes()).unwrap();
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].id, "https://example.org/post");
        assert_eq!(
            result.entries[0].published_at,
            Some(Utc.with_ymd_and_hms(2024, 2, 1, 12, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_atom_alternate_link_preferred() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
    <title>Blog</title>
    <id>urn:blog</id>
    <updated>2024-02-10T00:00:00Z</updated>
    <entry>
        <title>Post</title>
        <id>tag:blog.example,2024:post-1</id>
        <updated>2024-02-10T09:00:00Z</updated>
        <link rel="replies" type="application/atom+xml" href="https://blog.example/feeds/1/comments/default"/>
        <link rel="edit" type="application/atom+xml" href="https://blog.example/feeds/posts/default/1"/>
        <link rel="self" type="application/atom+xml" href="https://blog.example/feeds/posts/default/1"/>
        <link rel="alternate" type="text/html" href="https://blog.example/2024/02/post.html"/>
    </entry>
</feed>"#;

        let result = parse_feed(atom.as_bytes()).unwrap();
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].id, "https://blog.example/2024/02/post.html");
    }

    #[test]
    fn test_non_alternate_link_used_when_only_kind() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
    <title>Blog</title>
    <id>urn:blog</id>
    <updated>2024-02-10T00:00:00Z</updated>
    <entry>
        <title>Linked</title>
        <id>urn:entry:2</id>
        <updated>2024-02-10T09:00:00Z</updated>
        <link rel="related" href="https://elsewhere.example/story"/>
    </entry>
</feed>"#;

        let result = parse_feed(atom.as_bytes()).unwrap();
        assert_eq!(result.entries[0].id, "https://elsewhere.example/story");
    }

    #[test]
    fn test_items_without_link_skipped() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <item><title>No link</title></item>
    <item><title>Linked</title><link>https://example.com/a</link></item>
</channel></rss>"#;

        let result = parse_feed(rss.as_bytes()).unwrap();
        assert_eq!(result.skipped, 1);
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].id, "https://example.com/a");
    }

    #[test]
    fn test_missing_title_falls_back_to_link() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <item><link>https://example.com/untitled</link></item>
</channel></rss>"#;

        let result = parse_feed(rss.as_bytes()).unwrap();
        assert_eq!(result.entries[0].title, "https://example.com/untitled");
    }

    #[test]
    fn test_links_not_normalized() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <item><title>A</title><link>https://example.com/x</link></item>
    <item><title>B</title><link>https://example.com/x/</link></item>
</channel></rss>"#;

        let result = parse_feed(rss.as_bytes()).unwrap();
        assert_ne!(result.entries[0].id, result.entries[1].id);
    }

    #[test]
    fn test_invalid_xml_is_error() {
        assert!(parse_feed(b"<not valid xml").is_err());
    }
}
