//! Local SQLite store for collected chat history.
//!
//! Holds three tables (`channels`, `users`, `messages`) with whole-row
//! upsert semantics, plus the read queries the report layer aggregates over.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{SqlitePool, Transaction};
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

/// A conversation scope on the chat platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    /// Whether the collecting token is a member (only member channels are readable).
    pub is_member: bool,
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub raw: serde_json::Value,
}

/// A single post. Identity is `(timestamp, channel_id, user_id, subtype)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub timestamp: f64,
    pub channel_id: String,
    pub user_id: String,
    /// Empty for ordinary posts.
    pub subtype: String,
    pub raw: serde_json::Value,
}

/// Half-open `[since, until)` window in epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub since: f64,
    pub until: f64,
}

/// One row of a grouped count, joined to its display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityCount {
    pub id: String,
    pub name: String,
    pub count: i64,
}

/// Handle to the backing database. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
    schema: Arc<OnceCell<()>>,
}

impl Store {
    /// Open (creating if missing) the database file at `db_path`.
    pub async fn open(db_path: &Path) -> Result<Self> {
        let db_path = if db_path.is_absolute() {
            db_path.to_path_buf()
        } else {
            std::env::current_dir()?.join(db_path)
        };
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let options = SqliteConnectOptions::from_str("sqlite:")?
            .filename(&db_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
        let store = Self::from_pool(pool);
        store.initialize().await?;
        Ok(store)
    }

    /// Private in-memory database on a single pinned connection.
    pub async fn open_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let store = Self::from_pool(pool);
        store.initialize().await?;
        Ok(store)
    }

    fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            schema: Arc::new(OnceCell::new()),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the schema if absent. Safe to call repeatedly; only the first
    /// call on a handle touches the database.
    pub async fn initialize(&self) -> Result<()> {
        self.schema
            .get_or_try_init(|| async { self.init_schema().await })
            .await?;
        Ok(())
    }

    #[instrument(skip_all)]
    async fn init_schema(&self) -> Result<()> {
        sqlx::query("PRAGMA journal_mode=WAL;")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS channels (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                is_member INTEGER NOT NULL,
                raw TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT,
                raw TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS messages (
                timestamp REAL NOT NULL,
                channel_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                subtype TEXT NOT NULL,
                raw TEXT,
                PRIMARY KEY (timestamp, channel_id, user_id, subtype)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_channel_ts ON messages(channel_id, timestamp)",
        )
        .execute(&self.pool)
        .await?;

        debug!("Schema ready");
        Ok(())
    }

    /// Start a unit of work. Writes become visible together on
    /// [`StoreTx::commit`]; dropping the handle rolls them back.
    pub async fn begin(&self) -> Result<StoreTx> {
        let tx = self.pool.begin().await?;
        Ok(StoreTx { tx })
    }

    /// High-water mark for a channel: the newest stored message timestamp.
    pub async fn latest_message_ts(&self, channel_id: &str) -> Result<Option<f64>> {
        let ts: Option<f64> =
            sqlx::query_scalar("SELECT MAX(timestamp) FROM messages WHERE channel_id = ?1")
                .bind(channel_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(ts)
    }

    pub async fn get_channel(&self, id: &str) -> Result<Option<Channel>> {
        let row = sqlx::query_as::<_, (String, String, bool, String)>(
            "SELECT id, name, is_member, raw FROM channels WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(id, name, is_member, raw)| {
            Ok(Channel {
                id,
                name,
                is_member,
                raw: serde_json::from_str(&raw)?,
            })
        })
        .transpose()
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, (String, String, Option<String>, String)>(
            "SELECT id, name, email, raw FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(id, name, email, raw)| {
            Ok(User {
                id,
                name,
                email,
                raw: serde_json::from_str(&raw)?,
            })
        })
        .transpose()
    }

    pub async fn user_name(&self, id: &str) -> Result<Option<String>> {
        let name = sqlx::query_scalar::<_, String>("SELECT name FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(name)
    }

    /// All stored messages of a channel, oldest first.
    pub async fn channel_messages(&self, channel_id: &str) -> Result<Vec<Message>> {
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT timestamp, channel_id, user_id, subtype, raw FROM messages \
             WHERE channel_id = ?1 ORDER BY timestamp, user_id, subtype",
        )
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(message_from_row).collect()
    }

    /// Messages inside `range` whose subtype is in `subtypes`.
    #[instrument(skip(self))]
    pub async fn messages_in_range(
        &self,
        range: TimeRange,
        subtypes: &[String],
    ) -> Result<Vec<Message>> {
        let query = format!(
            "SELECT timestamp, channel_id, user_id, subtype, raw FROM messages \
             WHERE timestamp >= ? AND timestamp < ? AND subtype IN ({}) \
             ORDER BY timestamp",
            placeholders(subtypes.len())
        );
        let mut q = sqlx::query_as::<_, MessageRow>(&query)
            .bind(range.since)
            .bind(range.until);
        for subtype in subtypes {
            q = q.bind(subtype);
        }
        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(message_from_row).collect()
    }

    /// Top `limit` posters in `range`, joined to user names. Users missing
    /// from the `users` table are dropped after ranking.
    #[instrument(skip(self))]
    pub async fn post_counts_by_user(
        &self,
        range: TimeRange,
        subtypes: &[String],
        limit: usize,
    ) -> Result<Vec<ActivityCount>> {
        let query = format!(
            "SELECT c.user_id, u.name, c.n FROM (\
                SELECT user_id, COUNT(*) AS n FROM messages \
                WHERE timestamp >= ? AND timestamp < ? AND subtype IN ({}) \
                GROUP BY user_id ORDER BY n DESC, user_id LIMIT ?\
             ) c JOIN users u ON u.id = c.user_id \
             ORDER BY c.n DESC, c.user_id",
            placeholders(subtypes.len())
        );
        self.grouped_counts(&query, range, subtypes, Some(limit)).await
    }

    /// Top `limit` channels by post count in `range`, joined to channel names.
    #[instrument(skip(self))]
    pub async fn post_counts_by_channel(
        &self,
        range: TimeRange,
        subtypes: &[String],
        limit: usize,
    ) -> Result<Vec<ActivityCount>> {
        let query = format!(
            "SELECT c.channel_id, ch.name, c.n FROM (\
                SELECT channel_id, COUNT(*) AS n FROM messages \
                WHERE timestamp >= ? AND timestamp < ? AND subtype IN ({}) \
                GROUP BY channel_id ORDER BY n DESC, channel_id LIMIT ?\
             ) c JOIN channels ch ON ch.id = c.channel_id \
             ORDER BY c.n DESC, c.channel_id",
            placeholders(subtypes.len())
        );
        self.grouped_counts(&query, range, subtypes, Some(limit)).await
    }

    /// Per-user post counts in `range` keyed by the user's email.
    #[instrument(skip(self))]
    pub async fn post_counts_by_email(
        &self,
        range: TimeRange,
        subtypes: &[String],
    ) -> Result<Vec<(Option<String>, i64)>> {
        let query = format!(
            "SELECT u.email, c.n FROM (\
                SELECT user_id, COUNT(*) AS n FROM messages \
                WHERE timestamp >= ? AND timestamp < ? AND subtype IN ({}) \
                GROUP BY user_id\
             ) c JOIN users u ON u.id = c.user_id",
            placeholders(subtypes.len())
        );
        let mut q = sqlx::query_as::<_, (Option<String>, i64)>(&query)
            .bind(range.since)
            .bind(range.until);
        for subtype in subtypes {
            q = q.bind(subtype);
        }
        Ok(q.fetch_all(&self.pool).await?)
    }

    async fn grouped_counts(
        &self,
        query: &str,
        range: TimeRange,
        subtypes: &[String],
        limit: Option<usize>,
    ) -> Result<Vec<ActivityCount>> {
        let mut q = sqlx::query_as::<_, (String, String, i64)>(query)
            .bind(range.since)
            .bind(range.until);
        for subtype in subtypes {
            q = q.bind(subtype);
        }
        if let Some(limit) = limit {
            q = q.bind(limit as i64);
        }
        let rows = q.fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|(id, name, count)| ActivityCount { id, name, count })
            .collect())
    }

    pub async fn channel_count(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM channels").await
    }

    pub async fn user_count(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM users").await
    }

    pub async fn message_count(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM messages").await
    }

    async fn count(&self, query: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(query).fetch_one(&self.pool).await?;
        Ok(count)
    }
}

/// Open unit of work against the store.
pub struct StoreTx {
    tx: Transaction<'static, Sqlite>,
}

impl StoreTx {
    #[instrument(skip_all, fields(id = %channel.id))]
    pub async fn upsert_channel(&mut self, channel: &Channel) -> Result<()> {
        sqlx::query(
            "INSERT INTO channels (id, name, is_member, raw) VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(id) DO UPDATE SET \
                name = excluded.name, \
                is_member = excluded.is_member, \
                raw = excluded.raw",
        )
        .bind(&channel.id)
        .bind(&channel.name)
        .bind(channel.is_member)
        .bind(serde_json::to_string(&channel.raw)?)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    #[instrument(skip_all, fields(id = %user.id))]
    pub async fn upsert_user(&mut self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, name, email, raw) VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(id) DO UPDATE SET \
                name = excluded.name, \
                email = excluded.email, \
                raw = excluded.raw",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(serde_json::to_string(&user.raw)?)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    pub async fn upsert_message(&mut self, message: &Message) -> Result<()> {
        sqlx::query(
            "INSERT INTO messages (timestamp, channel_id, user_id, subtype, raw) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT(timestamp, channel_id, user_id, subtype) DO UPDATE SET \
                raw = excluded.raw",
        )
        .bind(message.timestamp)
        .bind(&message.channel_id)
        .bind(&message.user_id)
        .bind(&message.subtype)
        .bind(serde_json::to_string(&message.raw)?)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    /// Explicit rollback. Dropping the handle has the same effect.
    pub async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

type MessageRow = (f64, String, String, String, Option<String>);

fn message_from_row(
    (timestamp, channel_id, user_id, subtype, raw): MessageRow,
) -> Result<Message> {
    let raw = match raw {
        Some(raw) => serde_json::from_str(&raw)?,
        None => serde_json::Value::Null,
    };
    Ok(Message {
        timestamp,
        channel_id,
        user_id,
        subtype,
        raw,
    })
}

fn placeholders(n: usize) -> String {
    if n == 0 {
        // `IN ()` is a syntax error; an always-null list matches nothing.
        return "NULL".to_string();
    }
    vec!["?"; n].join(",")
}
