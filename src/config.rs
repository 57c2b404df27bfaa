//! Mirror configuration files.
//!
//! Each file describes one mirroring task: the feeds to read, the subreddit to
//! post into, and the account to post with. Files are JSON unless their
//! extension is `.toml`. Unknown keys are accepted but logged, since they are
//! usually typos of a real key.
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::storage::is_ledger_file;
use crate::util::validate_url;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON in config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid TOML in config file: {0}")]
    Toml(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// Parsed fine but a field value is unusable.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Account used to post.
///
/// Secrets are wrapped in [`SecretString`] so `Debug` output never shows them.
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    pub client_id: String,
    pub client_secret: SecretString,
}

/// One mirroring task, validated.
#[derive(Debug)]
pub struct FeedConfig {
    /// File name of the configuration; also the ledger key.
    pub name: String,
    /// Feed sources, in the order their entries are pooled.
    pub feed_urls: Vec<String>,
    /// Target subreddit, without the `r/` prefix.
    pub subreddit: String,
    pub credentials: Credentials,
}

/// `feed_url` may be a single string or a list of strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(url) => vec![url],
            OneOrMany::Many(urls) => urls,
        }
    }
}

/// Wire shape of a configuration file, before validation.
#[derive(Deserialize)]
struct RawFeedConfig {
    username: String,
    password: String,
    client_id: String,
    client_secret: String,
    subreddit: String,
    feed_url: OneOrMany,
}

const KNOWN_KEYS: [&str; 6] = [
    "username",
    "password",
    "client_id",
    "client_secret",
    "subreddit",
    "feed_url",
];

/// Config file format, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

impl Format {
    fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Format::Toml,
            _ => Format::Json,
        }
    }
}

impl FeedConfig {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load and validate a configuration file.
    ///
    /// The configuration name is the file name, so two files with the same
    /// name in different directories share a ledger.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let meta = std::fs::metadata(path)?;
        if meta.len() > Self::MAX_FILE_SIZE {
            return Err(ConfigError::TooLarge(format!(
                "Config file is {} bytes (max {} bytes)",
                meta.len(),
                Self::MAX_FILE_SIZE
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let name = config_name(path)?;
        let config = Self::parse(&name, &content, Format::for_path(path))?;

        tracing::info!(
            path = %path.display(),
            config = %config.name,
            feeds = config.feed_urls.len(),
            subreddit = %config.subreddit,
            "Loaded configuration"
        );
        Ok(config)
    }

    fn parse(name: &str, content: &str, format: Format) -> Result<Self, ConfigError> {
        let raw: RawFeedConfig = match format {
            Format::Json => {
                let value: serde_json::Value = serde_json::from_str(content)?;
                if let Some(map) = value.as_object() {
                    warn_unknown_keys(name, map.keys());
                }
                serde_json::from_value(value)?
            }
            Format::Toml => {
                let table: toml::Table = toml::from_str(content)?;
                warn_unknown_keys(name, table.keys());
                toml::Value::Table(table).try_into()?
            }
        };

        Self::validate(name, raw)
    }

    fn validate(name: &str, raw: RawFeedConfig) -> Result<Self, ConfigError> {
        let feed_urls = raw.feed_url.into_vec();
        if feed_urls.is_empty() {
            return Err(ConfigError::Invalid("feed_url must name at least one feed".into()));
        }

        let feed_urls = feed_urls
            .into_iter()
            .map(|url| {
                validate_url(&url)
                    .map(|_| url.trim().to_string())
                    .map_err(|e| ConfigError::Invalid(format!("feed_url '{url}': {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let subreddit = raw
            .subreddit
            .trim()
            .trim_start_matches("/r/")
            .trim_start_matches("r/")
            .to_string();
        if subreddit.is_empty() {
            return Err(ConfigError::Invalid("subreddit must not be empty".into()));
        }

        let username = raw.username.trim().to_string();
        if username.is_empty() {
            return Err(ConfigError::Invalid("username must not be empty".into()));
        }

        Ok(Self {
            name: name.to_string(),
            feed_urls,
            subreddit,
            credentials: Credentials {
                username,
                password: SecretString::from(raw.password),
                client_id: raw.client_id,
                client_secret: SecretString::from(raw.client_secret),
            },
        })
    }
}

fn warn_unknown_keys<'a>(name: &str, keys: impl Iterator<Item = &'a String>) {
    for key in keys {
        if !KNOWN_KEYS.contains(&key.as_str()) {
            tracing::warn!(config = %name, key = %key, "Unknown key in config file, ignoring");
        }
    }
}

/// Configuration name derived from a path: its file name.
pub fn config_name(path: &Path) -> Result<String, ConfigError> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            ConfigError::Invalid(format!("cannot derive a name from '{}'", path.display()))
        })
}

/// Lists configuration files in `dir`, sorted by name.
///
/// Skips directories, hidden files and ledger files (including their temp
/// files), so persisted state is never read as configuration.
pub fn discover(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();

    for dir_entry in std::fs::read_dir(dir)? {
        let dir_entry = dir_entry?;
        let file_name = dir_entry.file_name();
        let Some(name) = file_name.to_str() else {
            tracing::warn!(path = %dir_entry.path().display(), "Skipping non UTF-8 file name");
            continue;
        };

        if name.starts_with('.') || is_ledger_file(name) {
            continue;
        }
        if !dir_entry.file_type()?.is_file() {
            continue;
        }

        found.push(dir_entry.path());
    }

    found.sort();
    Ok(found)
}

/// Expands a leading `~` to `$HOME`.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    const JSON_CONFIG: &str = r#"{
        "username": "feeder_bot",
        "password": "hunter2",
        "client_id": "abc",
        "client_secret": "shh",
        "subreddit": "rust",
        "feed_url": "https://example.com/feed.xml"
    }"#;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_json_config_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "rust.json", JSON_CONFIG);

        let config = FeedConfig::load(&path).unwrap();
        assert_eq!(config.name, "rust.json");
        assert_eq!(config.feed_urls, vec!["https://example.com/feed.xml"]);
        assert_eq!(config.subreddit, "rust");
        assert_eq!(config.credentials.username, "feeder_bot");
        assert_eq!(config.credentials.password.expose_secret(), "hunter2");
    }

    #[test]
    fn test_feed_url_list() {
        let content = r#"{
            "username": "u", "password": "p", "client_id": "i", "client_secret": "s",
            "subreddit": "r/news",
            "feed_url": ["https://a.example/rss", "https://b.example/atom"]
        }"#;
        let config = FeedConfig::parse("news", content, Format::Json).unwrap();
        assert_eq!(
            config.feed_urls,
            vec!["https://a.example/rss", "https://b.example/atom"]
        );
        assert_eq!(config.subreddit, "news");
    }

    #[test]
    fn test_toml_config_loads() {
        let dir = tempfile::tempdir().unwrap();
        let content = r#"
username = "feeder_bot"
password = "hunter2"
client_id = "abc"
client_secret = "shh"
subreddit = "rust"
feed_url = ["https://example.com/a.xml", "https://example.com/b.xml"]
"#;
        let path = write(dir.path(), "rust.toml", content);

        let config = FeedConfig::load(&path).unwrap();
        assert_eq!(config.name, "rust.toml");
        assert_eq!(config.feed_urls.len(), 2);
    }

    #[test]
    fn test_invalid_json_returns_error() {
        let result = FeedConfig::parse("bad", "{ this is not json", Format::Json);
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
        assert!(err.to_string().contains("Invalid JSON"));
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let result = FeedConfig::parse("bad", "this is not [valid toml", Format::Toml);
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_missing_field_returns_error() {
        let content = r#"{ "username": "u", "password": "p", "subreddit": "r" }"#;
        assert!(FeedConfig::parse("partial", content, Format::Json).is_err());
    }

    #[test]
    fn test_empty_feed_list_rejected() {
        let content = r#"{
            "username": "u", "password": "p", "client_id": "i", "client_secret": "s",
            "subreddit": "r", "feed_url": []
        }"#;
        let result = FeedConfig::parse("empty", content, Format::Json);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_non_http_feed_rejected() {
        let content = r#"{
            "username": "u", "password": "p", "client_id": "i", "client_secret": "s",
            "subreddit": "r", "feed_url": "file:///etc/passwd"
        }"#;
        let result = FeedConfig::parse("bad_url", content, Format::Json);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let content = r#"{
            "username": "u", "password": "p", "client_id": "i", "client_secret": "s",
            "subreddit": "r", "feed_url": "https://example.com/rss",
            "feed_urls": "typo"
        }"#;
        assert!(FeedConfig::parse("typo", content, Format::Json).is_ok());
    }

    #[test]
    fn test_too_large_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "huge.json", &"a".repeat(1_048_577));

        let err = FeedConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_debug_masks_secrets() {
        let config = FeedConfig::parse("rust.json", JSON_CONFIG, Format::Json).unwrap();
        let debug_output = format!("{:?}", config);
        assert!(!debug_output.contains("hunter2"));
        assert!(!debug_output.contains("shh"));
        assert!(debug_output.contains("feeder_bot"));
    }

    #[test]
    fn test_discover_skips_ledgers_hidden_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.json", JSON_CONFIG);
        write(dir.path(), "a.toml", "");
        write(dir.path(), "b.json.ledger.json", r#"{"submitted":[]}"#);
        write(dir.path(), "b.json.ledger.json.tmp.00000000000000ff", "");
        write(dir.path(), "b.json.pickle", "\u{80}\u{3}]q\u{0}.");
        write(dir.path(), ".hidden", "");
        std::fs::create_dir(dir.path().join("subdir")).unwrap();

        let found = discover(dir.path()).unwrap();
        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.toml".to_string(), "b.json".to_string()]);
    }

    #[test]
    fn test_discover_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_expand_home() {
        let plain = Path::new("/var/lib/snoofeeder");
        assert_eq!(expand_home(plain), plain);

        if let Some(home) = std::env::var_os("HOME") {
            assert_eq!(
                expand_home(Path::new("~/.snoofeeder")),
                PathBuf::from(home).join(".snoofeeder")
            );
        }
    }
}
