//! Activity leaderboards over a reporting window.

use std::collections::HashMap;
use std::fmt::Write as _;

use anyhow::Result;
use serde_json::Value;

use chatboard_store::{Message, Store};

use super::DateRange;

/// A titled, ranked list ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranking {
    pub title: String,
    pub entries: Vec<String>,
}

impl Ranking {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Title line followed by `"{rank}. {entry}"` lines, ranks starting at 1.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.title);
        for (i, entry) in self.entries.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, entry);
        }
        out
    }
}

/// Reaction counts gathered from message payloads.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReactionTally {
    /// Reactions given, per reacting user id.
    pub by_user: HashMap<String, i64>,
    /// Total uses, per reaction name.
    pub by_name: HashMap<String, i64>,
}

impl ReactionTally {
    pub fn from_messages<'a>(messages: impl IntoIterator<Item = &'a Message>) -> Self {
        let mut tally = Self::default();
        for message in messages {
            let Some(reactions) = message.raw.get("reactions").and_then(Value::as_array) else {
                continue;
            };
            for reaction in reactions {
                let Some(name) = reaction.get("name").and_then(Value::as_str) else {
                    continue;
                };
                let count = reaction.get("count").and_then(Value::as_i64).unwrap_or(0);
                *tally.by_name.entry(name.to_string()).or_default() += count;

                let users = reaction.get("users").and_then(Value::as_array);
                for user in users.into_iter().flatten().filter_map(Value::as_str) {
                    *tally.by_user.entry(user.to_string()).or_default() += 1;
                }
            }
        }
        tally
    }
}

/// Highest counts first; ties broken by key so output is stable.
pub fn most_common(counts: &HashMap<String, i64>, n: usize) -> Vec<(String, i64)> {
    let mut entries: Vec<_> = counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(n);
    entries
}

/// Build the four leaderboards for `range`.
pub async fn leaderboard(
    store: &Store,
    range: &DateRange,
    subtypes: &[String],
    top_n: usize,
) -> Result<Vec<Ranking>> {
    let window = range.time_range();

    let users = store.post_counts_by_user(window, subtypes, top_n).await?;
    let user_posts = Ranking {
        title: format!("Top posters ({})", range.label),
        entries: users
            .iter()
            .map(|u| format!("{} ({} posts)", u.name, u.count))
            .collect(),
    };

    let channels = store.post_counts_by_channel(window, subtypes, top_n).await?;
    let channel_posts = Ranking {
        title: format!("Busiest channels ({})", range.label),
        entries: channels
            .iter()
            .map(|c| format!("#{} ({} posts)", c.name, c.count))
            .collect(),
    };

    let messages = store.messages_in_range(window, subtypes).await?;
    let tally = ReactionTally::from_messages(&messages);

    // Top N first, then names; unknown users drop out as in the post ranking.
    let mut givers = Vec::new();
    for (user_id, count) in most_common(&tally.by_user, top_n) {
        if let Some(name) = store.user_name(&user_id).await? {
            givers.push(format!("{} ({} reactions)", name, count));
        }
    }
    let reaction_givers = Ranking {
        title: format!("Top reactors ({})", range.label),
        entries: givers,
    };

    let popular_reactions = Ranking {
        title: format!("Popular reactions ({})", range.label),
        entries: most_common(&tally.by_name, top_n)
            .into_iter()
            .map(|(name, count)| format!(":{}: ({} times)", name, count))
            .collect(),
    };

    Ok(vec![user_posts, channel_posts, reaction_givers, popular_reactions])
}
