//! In-memory collaborators for driving the orchestrator in tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use snoofeeder::config::FeedConfig;
use snoofeeder::feed::{Entry, FeedReader, FetchError};
use snoofeeder::publish::{Connect, PublishError, Publisher, Submission};

pub fn at(secs: i64) -> Option<DateTime<Utc>> {
    Some(Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap())
}

pub fn entry(slug: &str, published_at: Option<DateTime<Utc>>) -> Entry {
    Entry::new(format!("https://blog.example/{slug}"), slug, published_at)
}

/// Writes a JSON configuration naming `feeds` into `dir`.
pub fn write_config(dir: &Path, name: &str, feeds: &[&str]) -> PathBuf {
    let config = serde_json::json!({
        "username": "feeder_bot",
        "password": "hunter2",
        "client_id": "client",
        "client_secret": "secret",
        "subreddit": "mirror",
        "feed_url": feeds,
    });
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_vec_pretty(&config).unwrap()).unwrap();
    path
}

/// Feed reader serving fixed entries per URL; unknown URLs fail with 404.
#[derive(Default)]
pub struct MemoryFeeds {
    feeds: Mutex<HashMap<String, Vec<Entry>>>,
}

impl MemoryFeeds {
    pub fn set(&self, url: &str, entries: Vec<Entry>) {
        self.feeds.lock().unwrap().insert(url.to_string(), entries);
    }
}

#[async_trait]
impl FeedReader for MemoryFeeds {
    async fn fetch(&self, url: &str) -> Result<Vec<Entry>, FetchError> {
        self.feeds
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or(FetchError::HttpStatus(404))
    }
}

pub enum Reply {
    Ok,
    RateLimit,
    Fail,
}

/// Connector whose sessions log every post into one shared list.
///
/// Replies are consumed from a shared script; once it runs out every
/// submission succeeds.
#[derive(Default, Clone)]
pub struct RecordingConnector {
    posted: Arc<Mutex<Vec<(String, String)>>>,
    script: Arc<Mutex<VecDeque<Reply>>>,
    connects: Arc<Mutex<usize>>,
    reject_login: bool,
}

impl RecordingConnector {
    pub fn with_script(script: Vec<Reply>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            ..Self::default()
        }
    }

    pub fn rejecting_login() -> Self {
        Self {
            reject_login: true,
            ..Self::default()
        }
    }

    /// `(title, url)` pairs in posting order.
    pub fn posted(&self) -> Vec<(String, String)> {
        self.posted.lock().unwrap().clone()
    }

    pub fn posted_urls(&self) -> Vec<String> {
        self.posted().into_iter().map(|(_, url)| url).collect()
    }

    pub fn connects(&self) -> usize {
        *self.connects.lock().unwrap()
    }
}

struct RecordingSession {
    posted: Arc<Mutex<Vec<(String, String)>>>,
    script: Arc<Mutex<VecDeque<Reply>>>,
}

#[async_trait]
impl Publisher for RecordingSession {
    async fn submit(&self, title: &str, url: &str) -> Result<Submission, PublishError> {
        let reply = self.script.lock().unwrap().pop_front().unwrap_or(Reply::Ok);
        match reply {
            Reply::Ok => {
                let mut posted = self.posted.lock().unwrap();
                posted.push((title.to_string(), url.to_string()));
                Ok(Submission {
                    id: format!("t3_{}", posted.len()),
                    url: None,
                })
            }
            Reply::RateLimit => Err(PublishError::RateLimited("try again later".into())),
            Reply::Fail => Err(PublishError::HttpStatus(500)),
        }
    }
}

#[async_trait]
impl Connect for RecordingConnector {
    async fn connect(&self, _config: &FeedConfig) -> Result<Box<dyn Publisher>, PublishError> {
        *self.connects.lock().unwrap() += 1;
        if self.reject_login {
            return Err(PublishError::Auth("invalid_grant".into()));
        }
        Ok(Box::new(RecordingSession {
            posted: Arc::clone(&self.posted),
            script: Arc::clone(&self.script),
        }))
    }
}
