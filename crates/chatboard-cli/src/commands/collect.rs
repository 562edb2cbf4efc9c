use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use chatboard_core::report::{parse_datetime, DateRange};
use chatboard_core::{resolve_token, CollectOptions, Collector, LineProgress, SlackClient};
use chatboard_store::Store;

use super::load_settings;
use crate::ui;

pub async fn run(
    config: &Path,
    db: Option<PathBuf>,
    token: Option<String>,
    since: Option<String>,
    until: Option<String>,
) -> Result<()> {
    // Everything that can be rejected locally is checked before the first request.
    let settings = load_settings(config, db)?;
    let token = resolve_token(token)?;
    let options = collect_options(since.as_deref(), until.as_deref())?;

    let store = Store::open(&settings.db_path).await?;
    let client = SlackClient::new(&settings, token)?;
    info!("Collecting into {}", settings.db_path.display());

    let progress = LineProgress::stdio();
    match Collector::new(&client, &store, &progress).run(&options).await {
        Ok(summary) => {
            ui::success(&format!(
                "{} messages from {} channels ({} threads expanded)",
                summary.messages, summary.channels_scanned, summary.threads_expanded
            ));
            ui::info(&format!(
                "{} channels and {} users known, database: {}",
                summary.channels,
                summary.users,
                settings.db_path.display()
            ));
            Ok(())
        }
        Err(e) => {
            ui::error("Collection stopped; channels finished before the failure were kept.");
            Err(e.into())
        }
    }
}

fn collect_options(since: Option<&str>, until: Option<&str>) -> Result<CollectOptions> {
    let since = since.map(parse_datetime).transpose()?;
    let until = until.map(parse_datetime).transpose()?;
    if let (Some(since), Some(until)) = (since, until) {
        DateRange::explicit(since, until)?;
    }
    Ok(CollectOptions { since, until })
}
