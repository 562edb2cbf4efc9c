use std::path::{Path, PathBuf};

use anyhow::Result;

use chatboard_core::report::{leaderboard, publish_rankings, ConsoleSink};

use super::{load_settings, open_existing_store, RangeArgs};
use crate::ui;

pub async fn run(
    config: &Path,
    db: Option<PathBuf>,
    range: &RangeArgs,
    top: Option<usize>,
) -> Result<()> {
    let settings = load_settings(config, db)?;
    let range = range.resolve()?;
    let top_n = top.unwrap_or(settings.top_n);

    let store = open_existing_store(&settings.db_path).await?;

    let pb = ui::spinner(&format!("Ranking activity for {}", range.label));
    let rankings = leaderboard(&store, &range, &settings.target_subtypes, top_n).await;
    pb.finish_and_clear();

    let sent = publish_rankings(&ConsoleSink, &rankings?)?;
    if sent == 0 {
        ui::info(&format!("No activity recorded for {}.", range.label));
    }
    Ok(())
}
