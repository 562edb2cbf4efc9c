use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

use chatboard_core::report::{publish_rankings, team_ranking, ConsoleSink, Roster, TeamSort};

use super::{load_settings, open_existing_store, RangeArgs};
use crate::ui;

pub async fn run(
    config: &Path,
    db: Option<PathBuf>,
    range: &RangeArgs,
    roster: &Path,
    sort: &str,
) -> Result<()> {
    let settings = load_settings(config, db)?;
    let range = range.resolve()?;
    let sort: TeamSort = sort.parse().map_err(|e: String| anyhow!(e))?;
    let roster = Roster::load(roster)?;
    if roster.members.is_empty() {
        ui::info("Roster has no members.");
        return Ok(());
    }

    let store = open_existing_store(&settings.db_path).await?;

    let pb = ui::spinner(&format!("Ranking teams for {}", range.label));
    let ranking = team_ranking(&store, &roster, &range, &settings.target_subtypes, sort).await;
    pb.finish_and_clear();

    publish_rankings(&ConsoleSink, &[ranking?])?;
    Ok(())
}
