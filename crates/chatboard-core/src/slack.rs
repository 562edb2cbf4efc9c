//! Slack Web API client.
//!
//! One request per call; pagination and rate-limit waits are handled by the
//! fetcher. HTTP 429 is reported as [`PageResult::RateLimited`] with the
//! `Retry-After` delay.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::api::{ChatApi, HistoryWindow, PageResponse, PageResult};
use crate::config::Settings;

/// Used when a 429 arrives without a parseable `Retry-After`.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

pub struct SlackClient {
    http: reqwest::Client,
    base_url: Url,
    token: String,
    page_limit: u32,
}

impl SlackClient {
    pub fn new(settings: &Settings, token: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: settings.api_base()?,
            token: token.into(),
            page_limit: settings.page_limit,
        })
    }

    async fn get_page(
        &self,
        method: &str,
        mut params: Vec<(&str, String)>,
        cursor: Option<String>,
    ) -> PageResult {
        let url = match self.base_url.join(method) {
            Ok(url) => url,
            Err(e) => return PageResult::Failed(format!("{}: invalid URL: {}", method, e)),
        };
        params.push(("limit", self.page_limit.to_string()));
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor));
        }

        debug!("GET {} {:?}", method, params);
        let response = match self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .query(&params)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return PageResult::Failed(format!("{}: {}", method, e)),
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return PageResult::RateLimited(retry_after(response.headers()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return PageResult::Failed(format!("{}: HTTP {} - {}", method, status, body));
        }

        match response.json::<Value>().await {
            Ok(body) => PageResult::Page(PageResponse::new(body)),
            Err(e) => PageResult::Failed(format!("{}: invalid JSON: {}", method, e)),
        }
    }
}

#[async_trait]
impl ChatApi for SlackClient {
    async fn list_channels(&self, cursor: Option<String>) -> PageResult {
        self.get_page(
            "conversations.list",
            vec![("exclude_archived", "true".to_string())],
            cursor,
        )
        .await
    }

    async fn list_users(&self, cursor: Option<String>) -> PageResult {
        self.get_page("users.list", Vec::new(), cursor).await
    }

    async fn channel_history(
        &self,
        channel_id: &str,
        window: &HistoryWindow,
        cursor: Option<String>,
    ) -> PageResult {
        let mut params = vec![("channel", channel_id.to_string())];
        if let Some(oldest) = &window.oldest {
            params.push(("oldest", oldest.clone()));
        }
        if let Some(latest) = &window.latest {
            params.push(("latest", latest.clone()));
        }
        self.get_page("conversations.history", params, cursor).await
    }

    async fn thread_replies(
        &self,
        channel_id: &str,
        thread_ts: &str,
        cursor: Option<String>,
    ) -> PageResult {
        let params = vec![
            ("channel", channel_id.to_string()),
            ("ts", thread_ts.to_string()),
        ];
        self.get_page("conversations.replies", params, cursor).await
    }
}

/// Server-declared wait from a 429 response.
fn retry_after(headers: &HeaderMap) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_RETRY_AFTER)
}
