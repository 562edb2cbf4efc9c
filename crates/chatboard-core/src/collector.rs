//! Collection run: channels, users, then per-channel history and threads.
//!
//! Phases run strictly in order and each one gates the next. Discovery
//! results are committed before any history is fetched, so a failure later
//! in the run still leaves channels and users durable. History for one
//! channel is written in a single transaction only after the channel's
//! history and every thread under it were fetched completely; the next run
//! resumes from the newest committed timestamp.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, instrument};

use chatboard_store::{Channel, Message, Store, User};

use crate::api::{ChatApi, HistoryWindow};
use crate::fetch::{fetch_all_pages, FetchError};
use crate::progress::Progress;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("failed to list channels: {0}")]
    Channels(#[source] FetchError),

    #[error("failed to list users: {0}")]
    Users(#[source] FetchError),

    #[error("failed to fetch history of #{name} ({id}): {source}")]
    History {
        id: String,
        name: String,
        source: FetchError,
    },

    #[error("failed to fetch thread {thread_ts} in {channel_id}: {source}")]
    Replies {
        channel_id: String,
        thread_ts: String,
        source: FetchError,
    },

    #[error("unexpected {kind} record: {detail}")]
    Decode { kind: &'static str, detail: String },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Caller-supplied bounds. Without `since`, each channel resumes from its
/// newest stored message; without `until`, history is fetched up to now.
#[derive(Debug, Clone, Default)]
pub struct CollectOptions {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectSummary {
    pub channels: usize,
    pub users: usize,
    pub channels_scanned: usize,
    pub threads_expanded: usize,
    pub messages: usize,
}

pub struct Collector<'a> {
    api: &'a dyn ChatApi,
    store: &'a Store,
    progress: &'a dyn Progress,
}

impl<'a> Collector<'a> {
    pub fn new(api: &'a dyn ChatApi, store: &'a Store, progress: &'a dyn Progress) -> Self {
        Self {
            api,
            store,
            progress,
        }
    }

    /// Run every phase once. The first failure aborts the run; whatever was
    /// committed before it stays in the store.
    pub async fn run(&self, options: &CollectOptions) -> Result<CollectSummary, CollectError> {
        info!(
            "Starting collection (since: {:?}, until: {:?})",
            options.since, options.until
        );
        let mut summary = CollectSummary::default();

        let channels = self.discover_channels().await?;
        summary.channels = channels.len();

        summary.users = self.discover_users().await?;

        for channel in channels.iter().filter(|c| c.is_member) {
            let (messages, threads) = self.collect_channel(channel, options).await?;
            summary.channels_scanned += 1;
            summary.threads_expanded += threads;
            summary.messages += messages;
        }

        info!(
            "Collection complete: {} channels ({} scanned), {} users, {} messages",
            summary.channels, summary.channels_scanned, summary.users, summary.messages
        );
        Ok(summary)
    }

    /// Close the running phase line with `[OK]` or `[Error]`.
    fn finish<T>(&self, result: Result<T, CollectError>) -> Result<T, CollectError> {
        match &result {
            Ok(_) => self.progress.succeed(),
            Err(e) => self.progress.fail(&e.to_string()),
        }
        result
    }

    async fn discover_channels(&self) -> Result<Vec<Channel>, CollectError> {
        self.progress.begin("Fetching channels");
        let result = self.fetch_channels().await;
        self.finish(result)
    }

    async fn fetch_channels(&self) -> Result<Vec<Channel>, CollectError> {
        let api = self.api;
        let raw = fetch_all_pages(move |cursor| api.list_channels(cursor), "channels")
            .await
            .into_result()
            .map_err(CollectError::Channels)?;

        let channels = raw
            .into_iter()
            .map(channel_from_api)
            .collect::<Result<Vec<_>, _>>()?;

        let mut tx = self.store.begin().await?;
        for channel in &channels {
            tx.upsert_channel(channel).await?;
        }
        tx.commit().await?;

        debug!("Stored {} channels", channels.len());
        Ok(channels)
    }

    async fn discover_users(&self) -> Result<usize, CollectError> {
        self.progress.begin("Fetching users");
        let result = self.fetch_users().await;
        self.finish(result)
    }

    async fn fetch_users(&self) -> Result<usize, CollectError> {
        let api = self.api;
        let raw = fetch_all_pages(move |cursor| api.list_users(cursor), "members")
            .await
            .into_result()
            .map_err(CollectError::Users)?;

        let users = raw
            .into_iter()
            .map(user_from_api)
            .collect::<Result<Vec<_>, _>>()?;

        let mut tx = self.store.begin().await?;
        for user in &users {
            tx.upsert_user(user).await?;
        }
        tx.commit().await?;

        Ok(users.len())
    }

    /// Fetch, merge and store one channel. Returns `(messages stored, threads expanded)`.
    #[instrument(skip_all, fields(channel = %channel.id))]
    async fn collect_channel(
        &self,
        channel: &Channel,
        options: &CollectOptions,
    ) -> Result<(usize, usize), CollectError> {
        self.progress
            .begin(&format!("Fetching history id:{} #{}", channel.id, channel.name));
        let result = self.fetch_channel(channel, options).await;
        self.finish(result)
    }

    async fn fetch_channel(
        &self,
        channel: &Channel,
        options: &CollectOptions,
    ) -> Result<(usize, usize), CollectError> {
        let window = self.history_window(&channel.id, options).await?;
        debug!("History window: {:?}", window);

        let api = self.api;
        let channel_id = channel.id.as_str();
        let window_ref = &window;
        let history = fetch_all_pages(
            move |cursor| api.channel_history(channel_id, window_ref, cursor),
            "messages",
        )
        .await
        .into_result()
        .map_err(|source| CollectError::History {
            id: channel.id.clone(),
            name: channel.name.clone(),
            source,
        })?;

        let threads = thread_roots(&history);
        let mut replies = Vec::new();
        for thread_ts in &threads {
            let thread_ts = thread_ts.as_str();
            let batch = fetch_all_pages(
                move |cursor| api.thread_replies(channel_id, thread_ts, cursor),
                "messages",
            )
            .await
            .into_result()
            .map_err(|source| CollectError::Replies {
                channel_id: channel.id.clone(),
                thread_ts: thread_ts.to_string(),
                source,
            })?;
            replies.extend(batch);
        }

        let messages = merge_messages(channel_id, history.into_iter().chain(replies))?;
        self.progress.note(&format!("{} messages", messages.len()));

        let mut tx = self.store.begin().await?;
        for message in &messages {
            tx.upsert_message(message).await?;
        }
        tx.commit().await?;

        Ok((messages.len(), threads.len()))
    }

    /// Lower bound: explicit `since`, else the channel's high-water mark.
    /// Upper bound: explicit `until`, else open.
    async fn history_window(
        &self,
        channel_id: &str,
        options: &CollectOptions,
    ) -> Result<HistoryWindow, CollectError> {
        let oldest = match options.since {
            Some(since) => Some(epoch_seconds(since)),
            None => self.store.latest_message_ts(channel_id).await?,
        };
        let latest = options.until.map(epoch_seconds);
        Ok(HistoryWindow::new(oldest, latest))
    }
}

fn epoch_seconds(dt: DateTime<Utc>) -> f64 {
    dt.timestamp_micros() as f64 / 1_000_000.0
}

/// Distinct `thread_ts` values in first-seen order.
fn thread_roots(messages: &[Value]) -> Vec<String> {
    let mut seen = HashSet::new();
    messages
        .iter()
        .filter_map(|m| m.get("thread_ts").and_then(Value::as_str))
        .filter(|ts| seen.insert(ts.to_string()))
        .map(str::to_string)
        .collect()
}

/// Convert raw messages to store rows, dropping authorless records and
/// collapsing copies that share `(timestamp, channel, user, subtype)`. A
/// later copy replaces an earlier one, matching the store's upsert.
fn merge_messages(
    channel_id: &str,
    raw: impl IntoIterator<Item = Value>,
) -> Result<Vec<Message>, CollectError> {
    let mut index: HashMap<(u64, String, String), usize> = HashMap::new();
    let mut merged: Vec<Message> = Vec::new();

    for value in raw {
        let Some(message) = message_from_api(channel_id, value)? else {
            continue;
        };
        let key = (
            message.timestamp.to_bits(),
            message.user_id.clone(),
            message.subtype.clone(),
        );
        match index.get(&key) {
            Some(&slot) => merged[slot] = message,
            None => {
                index.insert(key, merged.len());
                merged.push(message);
            }
        }
    }

    Ok(merged)
}

#[derive(Deserialize)]
struct ApiChannel {
    id: String,
    name: Option<String>,
    name_normalized: Option<String>,
    #[serde(default)]
    is_member: bool,
}

fn channel_from_api(raw: Value) -> Result<Channel, CollectError> {
    let parsed: ApiChannel =
        serde_json::from_value(raw.clone()).map_err(|e| decode("channel", e))?;
    let name = parsed
        .name
        .or(parsed.name_normalized)
        .unwrap_or_else(|| parsed.id.clone());
    Ok(Channel {
        id: parsed.id,
        name,
        is_member: parsed.is_member,
        raw,
    })
}

#[derive(Deserialize)]
struct ApiUser {
    id: String,
    name: Option<String>,
    real_name: Option<String>,
    #[serde(default)]
    profile: ApiProfile,
}

#[derive(Deserialize, Default)]
struct ApiProfile {
    display_name: Option<String>,
    real_name: Option<String>,
    email: Option<String>,
}

fn user_from_api(raw: Value) -> Result<User, CollectError> {
    let parsed: ApiUser = serde_json::from_value(raw.clone()).map_err(|e| decode("user", e))?;
    let name = [
        parsed.profile.display_name,
        parsed.real_name,
        parsed.profile.real_name,
        parsed.name,
    ]
    .into_iter()
    .flatten()
    .find(|n| !n.is_empty())
    .unwrap_or_else(|| parsed.id.clone());

    Ok(User {
        id: parsed.id,
        name,
        email: parsed.profile.email.filter(|e| !e.is_empty()),
        raw,
    })
}

#[derive(Deserialize)]
struct ApiMessage {
    ts: String,
    user: Option<String>,
    #[serde(default)]
    subtype: String,
}

/// `None` for records without an author (joins by bots, system events).
fn message_from_api(channel_id: &str, raw: Value) -> Result<Option<Message>, CollectError> {
    let parsed: ApiMessage =
        serde_json::from_value(raw.clone()).map_err(|e| decode("message", e))?;
    let Some(user_id) = parsed.user.filter(|u| !u.is_empty()) else {
        return Ok(None);
    };
    let timestamp = parsed.ts.parse::<f64>().map_err(|e| CollectError::Decode {
        kind: "message",
        detail: format!("bad ts {:?}: {}", parsed.ts, e),
    })?;

    Ok(Some(Message {
        timestamp,
        channel_id: channel_id.to_string(),
        user_id,
        subtype: parsed.subtype,
        raw,
    }))
}

fn decode(kind: &'static str, e: serde_json::Error) -> CollectError {
    CollectError::Decode {
        kind,
        detail: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{PageResponse, PageResult};
    use crate::progress::LineProgress;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// In-memory workspace. Lists are served in pages of `page_size`;
    /// individual calls can be scripted to fail.
    #[derive(Default)]
    struct FakeSlack {
        channels: Vec<Value>,
        users: Vec<Value>,
        history: HashMap<String, Vec<Value>>,
        threads: HashMap<(String, String), Vec<Value>>,
        page_size: usize,
        fail_channels: bool,
        fail_history_of: Option<String>,
        fail_thread: Option<String>,
        history_calls: Mutex<Vec<(String, HistoryWindow)>>,
        reply_calls: Mutex<Vec<(String, String)>>,
    }

    impl FakeSlack {
        fn page(&self, items: &[Value], cursor: Option<String>) -> PageResult {
            let size = self.page_size.max(1);
            let start: usize = cursor.map(|c| c.parse().unwrap()).unwrap_or(0);
            let end = (start + size).min(items.len());
            let next = if end < items.len() {
                end.to_string()
            } else {
                String::new()
            };
            PageResult::Page(PageResponse::new(json!({
                "ok": true,
                "channels": &items[start..end],
                "members": &items[start..end],
                "messages": &items[start..end],
                "response_metadata": { "next_cursor": next }
            })))
        }
    }

    fn api_error() -> PageResult {
        PageResult::Page(PageResponse::new(json!({ "ok": false, "error": "internal_error" })))
    }

    #[async_trait]
    impl ChatApi for FakeSlack {
        async fn list_channels(&self, cursor: Option<String>) -> PageResult {
            if self.fail_channels {
                return api_error();
            }
            self.page(&self.channels, cursor)
        }

        async fn list_users(&self, cursor: Option<String>) -> PageResult {
            self.page(&self.users, cursor)
        }

        async fn channel_history(
            &self,
            channel_id: &str,
            window: &HistoryWindow,
            cursor: Option<String>,
        ) -> PageResult {
            self.history_calls
                .lock()
                .unwrap()
                .push((channel_id.to_string(), window.clone()));
            if self.fail_history_of.as_deref() == Some(channel_id) && cursor.is_some() {
                return api_error();
            }
            let items = self.history.get(channel_id).cloned().unwrap_or_default();
            self.page(&items, cursor)
        }

        async fn thread_replies(
            &self,
            channel_id: &str,
            thread_ts: &str,
            cursor: Option<String>,
        ) -> PageResult {
            self.reply_calls
                .lock()
                .unwrap()
                .push((channel_id.to_string(), thread_ts.to_string()));
            if self.fail_thread.as_deref() == Some(thread_ts) {
                return PageResult::Failed("connection reset".to_string());
            }
            let items = self
                .threads
                .get(&(channel_id.to_string(), thread_ts.to_string()))
                .cloned()
                .unwrap_or_default();
            self.page(&items, cursor)
        }
    }

    fn msg(ts: &str, user: &str) -> Value {
        json!({ "type": "message", "ts": ts, "user": user, "text": format!("hello {}", ts) })
    }

    /// Two channels (one joined), one user, and a member channel holding two
    /// plain posts plus a thread root whose replies repeat the root.
    fn workspace() -> FakeSlack {
        let root = json!({
            "type": "message", "ts": "1700000300.000300", "user": "U1",
            "text": "thread root", "thread_ts": "1700000300.000300", "reply_count": 1
        });
        let reply = json!({
            "type": "message", "ts": "1700000400.000400", "user": "U1",
            "text": "reply", "thread_ts": "1700000300.000300"
        });

        let mut history = HashMap::new();
        history.insert(
            "C1".to_string(),
            vec![
                root.clone(),
                msg("1700000200.000200", "U1"),
                msg("1700000100.000100", "U1"),
            ],
        );
        let mut threads = HashMap::new();
        threads.insert(
            ("C1".to_string(), "1700000300.000300".to_string()),
            vec![root, reply],
        );

        FakeSlack {
            channels: vec![
                json!({ "id": "C1", "name": "general", "is_member": true }),
                json!({ "id": "C2", "name": "secret", "is_member": false }),
            ],
            users: vec![json!({
                "id": "U1", "name": "alice", "real_name": "Alice Smith",
                "profile": { "display_name": "", "real_name": "Alice Smith", "email": "alice@example.com" }
            })],
            history,
            threads,
            page_size: 2,
            ..FakeSlack::default()
        }
    }

    async fn run(
        api: &FakeSlack,
        store: &Store,
        options: &CollectOptions,
    ) -> Result<CollectSummary, CollectError> {
        let progress = LineProgress::new(Vec::new(), Vec::new());
        Collector::new(api, store, &progress).run(options).await
    }

    #[tokio::test]
    async fn test_example_workspace_collapses_duplicate_reply() {
        let store = Store::open_in_memory().await.unwrap();
        let api = workspace();

        let summary = run(&api, &store, &CollectOptions::default()).await.unwrap();

        assert_eq!(
            summary,
            CollectSummary {
                channels: 2,
                users: 1,
                channels_scanned: 1,
                threads_expanded: 1,
                messages: 4,
            }
        );
        assert_eq!(store.channel_count().await.unwrap(), 2);
        assert_eq!(store.user_count().await.unwrap(), 1);
        assert_eq!(store.message_count().await.unwrap(), 4);

        let stored = store.channel_messages("C1").await.unwrap();
        let stamps: Vec<f64> = stored.iter().map(|m| m.timestamp).collect();
        assert_eq!(
            stamps,
            vec![1700000100.0001, 1700000200.0002, 1700000300.0003, 1700000400.0004]
        );

        let user = store.get_user("U1").await.unwrap().unwrap();
        assert_eq!(user.name, "Alice Smith");
        assert_eq!(user.email.as_deref(), Some("alice@example.com"));
    }

    #[tokio::test]
    async fn test_non_member_channel_is_never_scanned() {
        let store = Store::open_in_memory().await.unwrap();
        let api = workspace();
        let options = CollectOptions {
            since: Some(DateTime::from_timestamp(0, 0).unwrap()),
            until: Some(Utc::now()),
        };

        run(&api, &store, &options).await.unwrap();

        let calls = api.history_calls.lock().unwrap();
        assert!(calls.iter().all(|(channel, _)| channel == "C1"));
        let stored = store.get_channel("C2").await.unwrap().unwrap();
        assert!(!stored.is_member);
    }

    #[tokio::test]
    async fn test_second_run_resumes_from_high_water_mark() {
        let store = Store::open_in_memory().await.unwrap();
        let api = workspace();

        run(&api, &store, &CollectOptions::default()).await.unwrap();
        run(&api, &store, &CollectOptions::default()).await.unwrap();

        let calls = api.history_calls.lock().unwrap();
        assert_eq!(calls.first().unwrap().1, HistoryWindow::default());
        let resumed = &calls.last().unwrap().1;
        assert_eq!(resumed.oldest.as_deref(), Some("1700000400.000400"));
        assert_eq!(resumed.latest, None);
        assert_eq!(store.message_count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_explicit_window_overrides_high_water_mark() {
        let store = Store::open_in_memory().await.unwrap();
        let api = workspace();
        run(&api, &store, &CollectOptions::default()).await.unwrap();

        let options = CollectOptions {
            since: DateTime::from_timestamp(1_600_000_000, 0),
            until: DateTime::from_timestamp(1_800_000_000, 500_000_000),
        };
        run(&api, &store, &options).await.unwrap();

        let calls = api.history_calls.lock().unwrap();
        let window = &calls.last().unwrap().1;
        assert_eq!(window.oldest.as_deref(), Some("1600000000.000000"));
        assert_eq!(window.latest.as_deref(), Some("1800000000.500000"));
    }

    #[tokio::test]
    async fn test_channel_failure_aborts_without_partial_write() {
        let store = Store::open_in_memory().await.unwrap();
        let api = FakeSlack {
            fail_history_of: Some("C1".to_string()),
            ..workspace()
        };

        let err = run(&api, &store, &CollectOptions::default()).await.unwrap_err();

        assert!(matches!(err, CollectError::History { ref id, .. } if id == "C1"));
        assert_eq!(store.channel_count().await.unwrap(), 2);
        assert_eq!(store.user_count().await.unwrap(), 1);
        assert_eq!(store.message_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_thread_failure_aborts_the_run() {
        let store = Store::open_in_memory().await.unwrap();
        let api = FakeSlack {
            fail_thread: Some("1700000300.000300".to_string()),
            ..workspace()
        };

        let err = run(&api, &store, &CollectOptions::default()).await.unwrap_err();

        assert!(matches!(err, CollectError::Replies { .. }));
        assert_eq!(store.message_count().await.unwrap(), 0);
        assert_eq!(store.channel_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_channel_list_failure_has_no_side_effects() {
        let store = Store::open_in_memory().await.unwrap();
        let api = FakeSlack {
            fail_channels: true,
            ..workspace()
        };
        let progress = LineProgress::new(Vec::new(), Vec::new());

        let err = Collector::new(&api, &store, &progress)
            .run(&CollectOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CollectError::Channels(_)));
        assert_eq!(store.channel_count().await.unwrap(), 0);
        assert_eq!(store.user_count().await.unwrap(), 0);

        let (out, err) = progress.into_inner();
        assert_eq!(String::from_utf8(out).unwrap(), "Fetching channels... [Error]\n");
        assert!(String::from_utf8(err).unwrap().contains("internal_error"));
    }

    #[tokio::test]
    async fn test_progress_lines_for_successful_run() {
        let store = Store::open_in_memory().await.unwrap();
        let api = workspace();
        let progress = LineProgress::new(Vec::new(), Vec::new());

        Collector::new(&api, &store, &progress)
            .run(&CollectOptions::default())
            .await
            .unwrap();

        let (out, _) = progress.into_inner();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Fetching channels... [OK]\n\
             Fetching users... [OK]\n\
             Fetching history id:C1 #general... 4 messages [OK]\n"
        );
    }

    #[tokio::test]
    async fn test_store_failure_marks_phase_and_writes_nothing() {
        let store = Store::open_in_memory().await.unwrap();
        sqlx::query(
            "CREATE TRIGGER reject_messages BEFORE INSERT ON messages \
             BEGIN SELECT RAISE(ABORT, 'disk full'); END",
        )
        .execute(store.pool())
        .await
        .unwrap();
        let api = workspace();
        let progress = LineProgress::new(Vec::new(), Vec::new());

        let err = Collector::new(&api, &store, &progress)
            .run(&CollectOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CollectError::Store(_)));
        assert_eq!(store.message_count().await.unwrap(), 0);
        assert_eq!(store.channel_count().await.unwrap(), 2);

        let (out, err) = progress.into_inner();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Fetching channels... [OK]\n\
             Fetching users... [OK]\n\
             Fetching history id:C1 #general... 4 messages [Error]\n"
        );
        assert!(String::from_utf8(err).unwrap().contains("disk full"));
    }

    #[test]
    fn test_threads_are_expanded_once() {
        let history = vec![
            json!({ "ts": "3.0", "user": "U1", "thread_ts": "1.0" }),
            json!({ "ts": "2.0", "user": "U1" }),
            json!({ "ts": "1.0", "user": "U1", "thread_ts": "1.0" }),
        ];
        assert_eq!(thread_roots(&history), vec!["1.0"]);
    }

    #[test]
    fn test_merge_drops_authorless_and_keeps_subtypes_apart() {
        let raw = vec![
            json!({ "ts": "5.000001", "user": "U1", "text": "first" }),
            json!({ "ts": "5.000001", "subtype": "channel_join" }),
            json!({ "ts": "5.000001", "user": "", "text": "anonymous" }),
            json!({ "ts": "5.000001", "user": "U1", "subtype": "thread_broadcast" }),
            json!({ "ts": "5.000001", "user": "U1", "text": "second" }),
        ];

        let merged = merge_messages("C1", raw).unwrap();

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].raw["text"], "second");
        assert_eq!(merged[0].subtype, "");
        assert_eq!(merged[1].subtype, "thread_broadcast");
        assert!(merged.iter().all(|m| m.channel_id == "C1"));
    }

    #[test]
    fn test_bad_timestamp_is_a_decode_error() {
        let err = merge_messages("C1", vec![json!({ "ts": "later", "user": "U1" })]).unwrap_err();
        assert!(matches!(err, CollectError::Decode { kind: "message", .. }));
    }

    #[test]
    fn test_user_name_priority() {
        let name = |raw: Value| user_from_api(raw).unwrap().name;

        assert_eq!(
            name(json!({ "id": "U1", "name": "acct", "real_name": "Real",
                         "profile": { "display_name": "Disp", "real_name": "Prof" } })),
            "Disp"
        );
        assert_eq!(
            name(json!({ "id": "U1", "name": "acct", "real_name": "Real",
                         "profile": { "display_name": "", "real_name": "Prof" } })),
            "Real"
        );
        assert_eq!(
            name(json!({ "id": "U1", "name": "acct", "profile": { "real_name": "Prof" } })),
            "Prof"
        );
        assert_eq!(name(json!({ "id": "U1", "name": "acct" })), "acct");
        assert_eq!(name(json!({ "id": "U1" })), "U1");
    }

    #[test]
    fn test_channel_without_membership_flag_is_not_member() {
        let channel = channel_from_api(json!({ "id": "C9", "name_normalized": "ops" })).unwrap();
        assert_eq!(channel.name, "ops");
        assert!(!channel.is_member);
        assert_eq!(channel.raw["id"], "C9");
    }
}
