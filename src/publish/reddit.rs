use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::{Connect, PublishError, Publisher, Submission};
use crate::config::FeedConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Base URLs of the reddit API.
///
/// Overridable so tests can point the client at a mock server.
#[derive(Debug, Clone)]
pub struct RedditEndpoints {
    /// Host issuing OAuth tokens.
    pub auth_base: String,
    /// Host serving authenticated API calls.
    pub api_base: String,
}

impl Default for RedditEndpoints {
    fn default() -> Self {
        Self {
            auth_base: "https://www.reddit.com".to_string(),
            api_base: "https://oauth.reddit.com".to_string(),
        }
    }
}

/// Logs in with a script app's password grant.
#[derive(Clone)]
pub struct RedditConnector {
    client: reqwest::Client,
    endpoints: RedditEndpoints,
}

/// Authenticated session bound to one subreddit.
pub struct RedditSession {
    client: reqwest::Client,
    api_base: String,
    token: SecretString,
    subreddit: String,
    user_agent: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct SubmitResponse {
    json: SubmitBody,
}

#[derive(Deserialize)]
struct SubmitBody {
    #[serde(default)]
    errors: Vec<Vec<serde_json::Value>>,
    data: Option<SubmitData>,
}

#[derive(Deserialize)]
struct SubmitData {
    name: Option<String>,
    id: Option<String>,
    url: Option<String>,
}

/// User agent in the form reddit's API rules ask for.
fn user_agent(username: &str) -> String {
    format!(
        "snoofeeder/{} (by /u/{})",
        env!("CARGO_PKG_VERSION"),
        username
    )
}

fn form_body(pairs: &[(&str, &str)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

async fn send(request: reqwest::RequestBuilder) -> Result<reqwest::Response, PublishError> {
    tokio::time::timeout(REQUEST_TIMEOUT, request.send())
        .await
        .map_err(|_| PublishError::Timeout)?
        .map_err(PublishError::Network)
}

impl RedditConnector {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_endpoints(client, RedditEndpoints::default())
    }

    pub fn with_endpoints(client: reqwest::Client, endpoints: RedditEndpoints) -> Self {
        Self { client, endpoints }
    }

    async fn login(&self, config: &FeedConfig) -> Result<RedditSession, PublishError> {
        let creds = &config.credentials;
        let user_agent = user_agent(&creds.username);
        let url = format!(
            "{}/api/v1/access_token",
            self.endpoints.auth_base.trim_end_matches('/')
        );

        let body = form_body(&[
            ("grant_type", "password"),
            ("username", creds.username.as_str()),
            ("password", creds.password.expose_secret()),
        ]);

        let request = self
            .client
            .post(&url)
            .basic_auth(&creds.client_id, Some(creds.client_secret.expose_secret()))
            .header(USER_AGENT, &user_agent)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body);

        let response = send(request).await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(PublishError::Auth(format!(
                "token request rejected with status {}",
                status.as_u16()
            )));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PublishError::RateLimited("token endpoint".into()));
        }
        if !status.is_success() {
            return Err(PublishError::HttpStatus(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        let token: TokenResponse = serde_json::from_slice(&bytes)
            .map_err(|e| PublishError::InvalidResponse(e.to_string()))?;

        // Reddit answers bad passwords with 200 and an `error` field.
        if let Some(error) = token.error {
            return Err(PublishError::Auth(error));
        }
        let access_token = token
            .access_token
            .ok_or_else(|| PublishError::InvalidResponse("no access_token in response".into()))?;

        tracing::debug!(user = %creds.username, "Reddit session established");

        Ok(RedditSession {
            client: self.client.clone(),
            api_base: self.endpoints.api_base.trim_end_matches('/').to_string(),
            token: SecretString::from(access_token),
            subreddit: config.subreddit.clone(),
            user_agent,
        })
    }
}

#[async_trait]
impl Connect for RedditConnector {
    async fn connect(&self, config: &FeedConfig) -> Result<Box<dyn Publisher>, PublishError> {
        let session = self.login(config).await?;
        Ok(Box::new(session))
    }
}

#[async_trait]
impl Publisher for RedditSession {
    async fn submit(&self, title: &str, url: &str) -> Result<Submission, PublishError> {
        let endpoint = format!("{}/api/submit", self.api_base);
        let body = form_body(&[
            ("sr", self.subreddit.as_str()),
            ("kind", "link"),
            ("title", title),
            ("url", url),
            ("api_type", "json"),
            ("resubmit", "true"),
        ]);

        let request = self
            .client
            .post(&endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", self.token.expose_secret()))
            .header(USER_AGENT, &self.user_agent)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body);

        let response = send(request).await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PublishError::RateLimited(format!("HTTP {}", status.as_u16())));
        }
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(PublishError::Auth(format!(
                "submit rejected with status {}",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            return Err(PublishError::HttpStatus(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        let parsed: SubmitResponse = serde_json::from_slice(&bytes)
            .map_err(|e| PublishError::InvalidResponse(e.to_string()))?;

        if let Some(error) = parsed.json.errors.first() {
            return Err(classify_api_error(error));
        }

        let data = parsed
            .json
            .data
            .ok_or_else(|| PublishError::InvalidResponse("submit returned no data".into()))?;
        let id = data
            .name
            .or(data.id)
            .ok_or_else(|| PublishError::InvalidResponse("submit returned no post id".into()))?;

        Ok(Submission { id, url: data.url })
    }
}

/// Maps one `[code, message, field]` triple from `json.errors`.
fn classify_api_error(error: &[serde_json::Value]) -> PublishError {
    let code = error.first().and_then(|v| v.as_str()).unwrap_or("UNKNOWN");
    let message = error.get(1).and_then(|v| v.as_str()).unwrap_or("");

    match code {
        "RATELIMIT" => PublishError::RateLimited(message.to_string()),
        "USER_REQUIRED" => PublishError::Auth(message.to_string()),
        _ => PublishError::Api(format!("{code}: {message}")),
    }
}
