//! Cursor pagination driver with rate-limit handling.

use std::future::Future;

use serde_json::Value;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::api::PageResult;

/// Why a paged fetch stopped early.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),

    /// The server answered with `ok: false`; the raw response is kept for diagnostics.
    #[error("API error `{code}`: {response}")]
    Api { code: String, response: Value },

    #[error("response has no `{0}` list")]
    MissingField(String),
}

/// Result of walking every page of a list call.
#[derive(Debug)]
pub enum FetchOutcome {
    Complete(Vec<Value>),
    /// Stopped early. `partial` holds the items gathered before the failure;
    /// they are diagnostics, never a complete result.
    Failed {
        partial: Vec<Value>,
        error: FetchError,
    },
}

impl FetchOutcome {
    pub fn into_result(self) -> Result<Vec<Value>, FetchError> {
        match self {
            FetchOutcome::Complete(items) => Ok(items),
            FetchOutcome::Failed { error, .. } => Err(error),
        }
    }
}

/// Call `call` until the server stops returning a continuation cursor,
/// accumulating the array under `field` in page order.
///
/// Rate-limited pages are retried after the server-declared delay with the
/// same cursor, without limit. Any other failure, or a response with
/// `ok: false`, ends the walk.
pub async fn fetch_all_pages<F, Fut>(mut call: F, field: &str) -> FetchOutcome
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = PageResult>,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let mut response = match call(cursor.clone()).await {
            PageResult::Page(response) => response,
            PageResult::RateLimited(delay) => {
                warn!("Rate limited fetching `{}`, waiting {:?}", field, delay);
                sleep(delay).await;
                continue;
            }
            PageResult::Failed(detail) => {
                return FetchOutcome::Failed {
                    partial: items,
                    error: FetchError::Transport(detail),
                };
            }
        };

        if !response.ok() {
            return FetchOutcome::Failed {
                partial: items,
                error: FetchError::Api {
                    code: response.error().unwrap_or("unknown_error").to_string(),
                    response: response.into_body(),
                },
            };
        }

        match response.take_items(field) {
            Some(batch) => items.extend(batch),
            None => {
                return FetchOutcome::Failed {
                    partial: items,
                    error: FetchError::MissingField(field.to_string()),
                };
            }
        }
        pages += 1;

        match response.next_cursor() {
            Some(next) => cursor = Some(next.to_string()),
            None => {
                debug!("Fetched {} `{}` over {} pages", items.len(), field, pages);
                return FetchOutcome::Complete(items);
            }
        }
    }
}
