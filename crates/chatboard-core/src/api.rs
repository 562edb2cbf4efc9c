//! The remote API seam.
//!
//! Every list endpoint the collector consumes is cursor-paginated and answers
//! a single page with one of three outcomes, captured by [`PageResult`].

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

/// Outcome of requesting one page.
#[derive(Debug, Clone)]
pub enum PageResult {
    /// A decoded response body. It may still carry `ok: false`.
    Page(PageResponse),
    /// The server asked us to wait before retrying the same page.
    RateLimited(Duration),
    /// Transport, HTTP status or decoding failure.
    Failed(String),
}

/// A single decoded page: `{"ok": .., "<field>": [..], "response_metadata": {"next_cursor": ..}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResponse {
    body: Value,
}

impl PageResponse {
    pub fn new(body: Value) -> Self {
        Self { body }
    }

    pub fn ok(&self) -> bool {
        self.body.get("ok").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn error(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }

    /// Continuation cursor; an empty string means the last page.
    pub fn next_cursor(&self) -> Option<&str> {
        self.body
            .get("response_metadata")
            .and_then(|meta| meta.get("next_cursor"))
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
    }

    /// Take the array stored under `field`, if present.
    pub fn take_items(&mut self, field: &str) -> Option<Vec<Value>> {
        match self.body.get_mut(field).map(Value::take) {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        }
    }

    pub fn into_body(self) -> Value {
        self.body
    }
}

/// Bounds for a history request, already rendered as `"{seconds:.6}"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryWindow {
    pub oldest: Option<String>,
    pub latest: Option<String>,
}

impl HistoryWindow {
    pub fn new(oldest: Option<f64>, latest: Option<f64>) -> Self {
        Self {
            oldest: oldest.map(format_ts),
            latest: latest.map(format_ts),
        }
    }
}

/// Platform timestamp rendering: seconds with microsecond precision.
pub fn format_ts(ts: f64) -> String {
    format!("{:.6}", ts)
}

/// The four paged list calls the collector needs.
///
/// Implementations perform exactly one request per call and never retry;
/// retry and pagination live in [`crate::fetch::fetch_all_pages`].
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Non-archived channels. Items under `channels`.
    async fn list_channels(&self, cursor: Option<String>) -> PageResult;

    /// Workspace members. Items under `members`.
    async fn list_users(&self, cursor: Option<String>) -> PageResult;

    /// Channel history inside `window`, newest first. Items under `messages`.
    async fn channel_history(
        &self,
        channel_id: &str,
        window: &HistoryWindow,
        cursor: Option<String>,
    ) -> PageResult;

    /// All messages of a thread, root included. Items under `messages`.
    async fn thread_replies(
        &self,
        channel_id: &str,
        thread_ts: &str,
        cursor: Option<String>,
    ) -> PageResult;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_next_cursor_empty_means_done() {
        let page = PageResponse::new(json!({
            "ok": true,
            "channels": [],
            "response_metadata": { "next_cursor": "" }
        }));
        assert_eq!(page.next_cursor(), None);

        let page = PageResponse::new(json!({
            "ok": true,
            "response_metadata": { "next_cursor": "dGVhbTpDMDYx" }
        }));
        assert_eq!(page.next_cursor(), Some("dGVhbTpDMDYx"));
    }

    #[test]
    fn test_take_items_requires_array() {
        let mut page = PageResponse::new(json!({ "ok": true, "members": [{ "id": "U1" }], "user": {} }));
        assert_eq!(page.take_items("members"), Some(vec![json!({ "id": "U1" })]));
        assert_eq!(page.take_items("user"), None);
        assert_eq!(page.take_items("channels"), None);
    }

    #[test]
    fn test_ok_and_error() {
        let page = PageResponse::new(json!({ "ok": false, "error": "not_in_channel" }));
        assert!(!page.ok());
        assert_eq!(page.error(), Some("not_in_channel"));
        assert!(!PageResponse::new(json!({})).ok());
    }

    #[test]
    fn test_history_window_formatting() {
        let window = HistoryWindow::new(Some(1704067200.5), None);
        assert_eq!(window.oldest.as_deref(), Some("1704067200.500000"));
        assert_eq!(window.latest, None);
        assert_eq!(format_ts(1712345678.123456), "1712345678.123456");
    }
}
