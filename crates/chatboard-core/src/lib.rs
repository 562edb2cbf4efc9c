//! Chat history collection and reporting.
//!
//! [`Collector`] pulls channels, users and message history (thread replies
//! included) through a [`ChatApi`] into a local [`chatboard_store::Store`];
//! the [`report`] module turns the stored history into leaderboards.

pub mod api;
pub mod collector;
pub mod config;
pub mod fetch;
pub mod progress;
pub mod report;
pub mod slack;

pub use api::{ChatApi, HistoryWindow, PageResponse, PageResult};
pub use collector::{CollectError, CollectOptions, CollectSummary, Collector};
pub use config::{resolve_token, ConfigError, Settings};
pub use fetch::{fetch_all_pages, FetchError, FetchOutcome};
pub use progress::{LineProgress, Progress};
pub use slack::SlackClient;
