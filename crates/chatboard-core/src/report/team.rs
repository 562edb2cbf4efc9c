//! Team ranking from a roster of `(email, team)` entries.
//!
//! The roster is a TOML file:
//!
//! ```toml
//! [[members]]
//! email = "alice@example.com"
//! team = "platform"
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::Deserialize;

use chatboard_store::Store;

use super::{DateRange, Ranking};

#[derive(Debug, Clone, Deserialize)]
pub struct RosterEntry {
    pub email: String,
    pub team: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Roster {
    #[serde(default)]
    pub members: Vec<RosterEntry>,
}

impl Roster {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read roster file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse roster file: {}", path.display()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamSort {
    Total,
    Average,
}

impl FromStr for TeamSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "total" => Ok(Self::Total),
            "average" => Ok(Self::Average),
            other => Err(format!("unknown sort key {:?} (expected total or average)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamSummary {
    pub team: String,
    pub members: usize,
    /// Members with at least one post in the window.
    pub active: usize,
    pub posts: i64,
}

impl TeamSummary {
    pub fn average(&self) -> f64 {
        if self.members == 0 {
            0.0
        } else {
            self.posts as f64 / self.members as f64
        }
    }

    pub fn inactive(&self) -> usize {
        self.members - self.active
    }

    fn line(&self) -> String {
        let mut line = format!(
            "{}: {} posts, {:.2} posts/member, {} members",
            self.team,
            self.posts,
            self.average(),
            self.members
        );
        if self.inactive() > 0 {
            line.push_str(&format!(" ({} inactive)", self.inactive()));
        }
        line
    }
}

/// Summarize each team and order them, highest first. Emails are matched
/// case-insensitively; teams that tie keep alphabetical order.
pub fn rank_teams(
    roster: &Roster,
    posts_by_email: &HashMap<String, i64>,
    sort: TeamSort,
) -> Vec<TeamSummary> {
    let mut teams: BTreeMap<&str, TeamSummary> = BTreeMap::new();
    for entry in &roster.members {
        let summary = teams.entry(entry.team.as_str()).or_insert_with(|| TeamSummary {
            team: entry.team.clone(),
            members: 0,
            active: 0,
            posts: 0,
        });
        summary.members += 1;
        let posts = posts_by_email
            .get(&entry.email.trim().to_lowercase())
            .copied()
            .unwrap_or(0);
        if posts > 0 {
            summary.active += 1;
            summary.posts += posts;
        }
    }

    let mut ranked: Vec<TeamSummary> = teams.into_values().collect();
    match sort {
        TeamSort::Total => ranked.sort_by(|a, b| b.posts.cmp(&a.posts)),
        TeamSort::Average => ranked.sort_by(|a, b| b.average().total_cmp(&a.average())),
    }
    ranked
}

/// Team ranking over `range`, counting posts by the roster's emails.
pub async fn team_ranking(
    store: &Store,
    roster: &Roster,
    range: &DateRange,
    subtypes: &[String],
    sort: TeamSort,
) -> Result<Ranking> {
    let mut posts_by_email: HashMap<String, i64> = HashMap::new();
    for (email, posts) in store
        .post_counts_by_email(range.time_range(), subtypes)
        .await?
    {
        if let Some(email) = email {
            *posts_by_email.entry(email.trim().to_lowercase()).or_default() += posts;
        }
    }

    let order = match sort {
        TeamSort::Total => "total posts",
        TeamSort::Average => "posts per member",
    };
    Ok(Ranking {
        title: format!("Teams by {} ({})", order, range.label),
        entries: rank_teams(roster, &posts_by_email, sort)
            .iter()
            .map(TeamSummary::line)
            .collect(),
    })
}
